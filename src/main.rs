//! # Scribe
//!
//! Command-line front end over the editor core.
//!
//! ```bash
//! # Highlight a file as JSON spans
//! scribe highlight app.py --json
//!
//! # Replace in place
//! scribe replace app.py old new --write
//!
//! # Run a script with its interpreter
//! scribe run app.py
//! ```

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scribe_core::editor::report_lines;
use scribe_core::{ActionTable, Config, Editor, EditorSession, SearchQuery};
use scribe_runner::{CommandRunner, RunRequest, RunnerConfig};
use scribe_syntax::StyledSpan;

/// Scribe - a small code editor core
#[derive(Parser, Debug)]
#[command(name = "scribe")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file to use instead of the default
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the highlight spans of every line
    Highlight {
        file: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List every occurrence of a literal needle
    Find {
        file: PathBuf,
        needle: String,

        /// Match case
        #[arg(long = "case")]
        case_sensitive: bool,
    },

    /// Replace every occurrence of a literal needle
    Replace {
        file: PathBuf,
        needle: String,
        replacement: String,

        /// Match case
        #[arg(long = "case")]
        case_sensitive: bool,

        /// Save the file instead of printing the result
        #[arg(short, long)]
        write: bool,
    },

    /// Run a shell command
    Exec {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Run a .py or .js file with its interpreter
    Run { file: PathBuf },

    /// Print a directory tree
    Explore {
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Directory levels to expand
        #[arg(short, long, default_value_t = 1)]
        depth: usize,
    },

    /// List or clear the recent files
    Recent {
        #[arg(long)]
        clear: bool,
    },

    /// Show or change settings
    #[command(subcommand)]
    Config(ConfigCommand),

    /// List the keyboard shortcuts
    Shortcuts,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the settings as JSON
    Show,
    /// Print the settings file location
    Path,
    /// Change one setting; the value is read as JSON, or as a string
    Set { key: String, value: String },
}

/// One line's spans in `highlight --json` output.
#[derive(Debug, Serialize)]
struct BlockSpans<'a> {
    line: usize,
    spans: &'a [StyledSpan],
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    tracing::info!("Starting Scribe v{}", env!("CARGO_PKG_VERSION"));

    let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
    runtime.block_on(run(args))
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config_path = match args.config {
        Some(path) => Some(path),
        None => Config::default_path()
            .inspect_err(|e| tracing::warn!("Settings will not be saved: {}", e))
            .ok(),
    };
    let config = config_path
        .as_deref()
        .map(Config::load_or_default)
        .unwrap_or_default();

    let runner = CommandRunner::current(RunnerConfig::default());
    let mut editor = Editor::new(config, config_path, runner);
    let actions = ActionTable::new();

    match args.command {
        Command::Highlight { file, json } => highlight(&file, json),
        Command::Find {
            file,
            needle,
            case_sensitive,
        } => {
            let query = SearchQuery::new(needle).case_sensitive(case_sensitive);
            let lines = find(&file, &query)?;
            if lines.is_empty() {
                println!("Text not found");
            }
            for line in lines {
                println!("{line}");
            }
            Ok(())
        }
        Command::Replace {
            file,
            needle,
            replacement,
            case_sensitive,
            write,
        } => {
            let query = SearchQuery::new(needle)
                .with_replacement(replacement)
                .case_sensitive(case_sensitive);
            replace(&mut editor, &actions, &file, query, write)
        }
        Command::Exec { command } => {
            let command = command.join(" ");
            actions.dispatch_named(&mut editor, "run_command", &[command])?;
            finish_jobs(&mut editor).await;
            Ok(())
        }
        Command::Run { file } => {
            for line in run_script(&file).await {
                println!("{line}");
            }
            Ok(())
        }
        Command::Explore { dir, depth } => {
            explore(&mut editor, &dir, depth);
            Ok(())
        }
        Command::Recent { clear } => {
            if clear {
                actions.dispatch_named(&mut editor, "clear_recent_files", &[])?;
                println!("Recent files cleared");
            } else {
                for path in editor.recent_menu() {
                    println!("{}", path.display());
                }
            }
            Ok(())
        }
        Command::Config(command) => configure(&mut editor, &actions, command),
        Command::Shortcuts => {
            print!("{}", editor.keymap().shortcuts_text());
            Ok(())
        }
    }
}

fn open(editor: &mut Editor, file: &Path) -> anyhow::Result<()> {
    editor
        .open_file(file)
        .with_context(|| format!("Failed to open {}", file.display()))?;
    Ok(())
}

/// Loads `file` without touching the recent-files list.
fn load(file: &Path) -> anyhow::Result<EditorSession> {
    EditorSession::from_file(file).with_context(|| format!("Failed to open {}", file.display()))
}

fn highlight(file: &Path, json: bool) -> anyhow::Result<()> {
    let session = load(file)?;

    if json {
        let blocks: Vec<BlockSpans<'_>> = session
            .all_spans()
            .iter()
            .enumerate()
            .filter(|(_, spans)| !spans.is_empty())
            .map(|(line, spans)| BlockSpans {
                line: line + 1,
                spans,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&blocks)?);
        return Ok(());
    }

    println!("{} ({})", session.title(), session.language().display_name());
    for (line, spans) in session.all_spans().iter().enumerate() {
        for span in spans {
            println!(
                "{:>5}:{:<4} {:<4} {}",
                line + 1,
                span.start + 1,
                span.len,
                span.style.theme_key()
            );
        }
    }
    Ok(())
}

/// One `Ln L, Col C: <line>` entry per occurrence, top to bottom.
fn find(file: &Path, query: &SearchQuery) -> anyhow::Result<Vec<String>> {
    let mut session = load(file)?;

    let mut lines = Vec::new();
    while let Some(found) = session.find_next(&query.needle, query.case_sensitive)? {
        if found.wrapped {
            break;
        }
        let buffer = session.buffer();
        let position = buffer.char_idx_to_position(found.range.start)?;
        let line = buffer.block(position.line)?;
        lines.push(format!("{}: {}", position, line.trim_end()));
    }
    Ok(lines)
}

/// Runs a script to completion and returns its output-log lines.
async fn run_script(file: &Path) -> Vec<String> {
    let outcome = scribe_runner::run_file(file, &RunnerConfig::default()).await;
    report_lines(&RunRequest::File(file.to_path_buf()), &outcome)
}

fn replace(
    editor: &mut Editor,
    actions: &ActionTable,
    file: &Path,
    query: SearchQuery,
    write: bool,
) -> anyhow::Result<()> {
    open(editor, file)?;
    actions.dispatch(editor, &scribe_core::Action::ReplaceAll(query))?;

    if write {
        println!("{}", editor.status());
        if editor.active_session()?.is_modified() {
            editor.save()?;
        }
    } else {
        print!("{}", editor.active_session()?.text());
        tracing::info!("{}", editor.status());
    }
    Ok(())
}

async fn finish_jobs(editor: &mut Editor) {
    editor.wait_for_jobs().await;
    for line in editor.output().lines() {
        println!("{line}");
    }
}

fn explore(editor: &mut Editor, dir: &Path, depth: usize) {
    editor.open_folder(dir);

    for level in 1..depth {
        let folders: Vec<PathBuf> = editor
            .explorer()
            .map(|tree| {
                tree.visible()
                    .into_iter()
                    .filter(|(d, node)| *d + 1 == level && node.is_directory())
                    .map(|(_, node)| node.path.clone())
                    .collect()
            })
            .unwrap_or_default();
        for folder in folders {
            editor.expand_folder(&folder);
        }
    }

    let Some(tree) = editor.explorer() else {
        return;
    };
    println!("{}", tree.root_path().display());
    for (depth, node) in tree.visible() {
        let suffix = if node.is_directory() { "/" } else { "" };
        println!("{}{}{}", "  ".repeat(depth + 1), node.name, suffix);
    }
}

fn configure(editor: &mut Editor, actions: &ActionTable, command: ConfigCommand) -> anyhow::Result<()> {
    match command {
        ConfigCommand::Show => {
            println!("{}", serde_json::to_string_pretty(editor.config())?);
        }
        ConfigCommand::Path => match editor.config_path() {
            Some(path) => println!("{}", path.display()),
            None => bail!("No settings location on this platform"),
        },
        ConfigCommand::Set { key, value } => {
            let settings = with_setting(editor.config(), &key, &value)?;
            actions.dispatch_named(editor, "apply_settings", &[settings])?;
            println!("{key} = {}", value);
        }
    }
    Ok(())
}

/// Returns `config` as JSON with `key` set to `value`.
///
/// The value is parsed as JSON first so numbers and booleans keep their
/// type; anything else is taken as a string.
fn with_setting(config: &Config, key: &str, value: &str) -> anyhow::Result<String> {
    let mut json = serde_json::to_value(config)?;
    let Some(slot) = json.get_mut(key) else {
        bail!("Unknown setting: {key}");
    };
    *slot = serde_json::from_str(value).unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok(json.to_string())
}
