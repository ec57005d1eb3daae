//! Named user actions and the table that dispatches them.
//!
//! Every menu item, toolbar button and shortcut ends up here as an
//! [`Action`]. The [`ActionTable`] maps each action name to a handler;
//! the defaults call straight into [`Editor`], and any name can be
//! re-registered with a custom handler.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::Config;
use crate::editor::Editor;
use crate::keymap::KeyPress;
use crate::{CoreError, CoreResult};

/// Needle, replacement and case flag for find and replace.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    pub needle: String,
    pub replacement: String,
    pub case_sensitive: bool,
}

impl SearchQuery {
    /// A case-insensitive search for `needle`.
    pub fn new(needle: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
            ..Self::default()
        }
    }

    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = replacement.into();
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }
}

/// A user action with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // File
    NewFile,
    OpenFile(PathBuf),
    Save,
    SaveAs(PathBuf),
    SaveAll,
    CloseTab,

    // Edit
    Undo,
    Redo,
    Cut,
    Copy,
    Paste,
    SelectAll,

    // Search
    Find(SearchQuery),
    Replace(SearchQuery),
    ReplaceAll(SearchQuery),

    // View
    ZoomIn,
    ZoomOut,
    ResetZoom,

    // Run
    RunFile,
    RunCommand(String),

    // Tools
    ApplySettings(Box<Config>),
    ClearRecentFiles,
    RefreshExplorer,
    ShowShortcuts,
    Quit,

    /// An action only a registered handler knows
    Custom { name: String, args: Vec<String> },
}

impl Action {
    /// Names of the built-in actions.
    pub const BUILTIN: [&'static str; 25] = [
        "new_file",
        "open_file",
        "save",
        "save_as",
        "save_all",
        "close_tab",
        "undo",
        "redo",
        "cut",
        "copy",
        "paste",
        "select_all",
        "find",
        "replace",
        "replace_all",
        "zoom_in",
        "zoom_out",
        "reset_zoom",
        "run_file",
        "run_command",
        "apply_settings",
        "clear_recent_files",
        "refresh_explorer",
        "show_shortcuts",
        "quit",
    ];

    /// The name the action is dispatched under.
    pub fn name(&self) -> &str {
        match self {
            Action::NewFile => "new_file",
            Action::OpenFile(_) => "open_file",
            Action::Save => "save",
            Action::SaveAs(_) => "save_as",
            Action::SaveAll => "save_all",
            Action::CloseTab => "close_tab",
            Action::Undo => "undo",
            Action::Redo => "redo",
            Action::Cut => "cut",
            Action::Copy => "copy",
            Action::Paste => "paste",
            Action::SelectAll => "select_all",
            Action::Find(_) => "find",
            Action::Replace(_) => "replace",
            Action::ReplaceAll(_) => "replace_all",
            Action::ZoomIn => "zoom_in",
            Action::ZoomOut => "zoom_out",
            Action::ResetZoom => "reset_zoom",
            Action::RunFile => "run_file",
            Action::RunCommand(_) => "run_command",
            Action::ApplySettings(_) => "apply_settings",
            Action::ClearRecentFiles => "clear_recent_files",
            Action::RefreshExplorer => "refresh_explorer",
            Action::ShowShortcuts => "show_shortcuts",
            Action::Quit => "quit",
            Action::Custom { name, .. } => name,
        }
    }

    /// Builds a built-in action from its name and string arguments.
    ///
    /// - `open_file`, `save_as`: a path
    /// - `find`: needle, then optionally `match_case`
    /// - `replace`, `replace_all`: needle, replacement, then optionally
    ///   `match_case`
    /// - `run_command`: the command line (arguments are joined by spaces)
    /// - `apply_settings`: the settings as a JSON object
    ///
    /// Anything else takes no arguments; extra ones are ignored.
    pub fn from_name(name: &str, args: &[String]) -> CoreResult<Self> {
        let arg = |i: usize, expected: &'static str| {
            args.get(i).cloned().ok_or_else(|| CoreError::MissingArgument {
                action: name.to_string(),
                expected,
            })
        };
        let query = |with_replacement: bool| -> CoreResult<SearchQuery> {
            let needle = arg(0, "text to find")?;
            let replacement = if with_replacement {
                arg(1, "replacement text")?
            } else {
                String::new()
            };
            let flag = if with_replacement { 2 } else { 1 };
            let case_sensitive = args.get(flag).is_some_and(|a| a == "match_case");
            Ok(SearchQuery::new(needle)
                .with_replacement(replacement)
                .case_sensitive(case_sensitive))
        };

        let action = match name {
            "new_file" => Action::NewFile,
            "open_file" => Action::OpenFile(arg(0, "path")?.into()),
            "save" => Action::Save,
            "save_as" => Action::SaveAs(arg(0, "path")?.into()),
            "save_all" => Action::SaveAll,
            "close_tab" => Action::CloseTab,
            "undo" => Action::Undo,
            "redo" => Action::Redo,
            "cut" => Action::Cut,
            "copy" => Action::Copy,
            "paste" => Action::Paste,
            "select_all" => Action::SelectAll,
            "find" => Action::Find(query(false)?),
            "replace" => Action::Replace(query(true)?),
            "replace_all" => Action::ReplaceAll(query(true)?),
            "zoom_in" => Action::ZoomIn,
            "zoom_out" => Action::ZoomOut,
            "reset_zoom" => Action::ResetZoom,
            "run_file" => Action::RunFile,
            "run_command" => {
                let command = args.join(" ");
                if command.trim().is_empty() {
                    return Err(CoreError::MissingArgument {
                        action: name.to_string(),
                        expected: "command line",
                    });
                }
                Action::RunCommand(command)
            }
            "apply_settings" => {
                let json = arg(0, "settings JSON")?;
                let settings: Config =
                    serde_json::from_str(&json).map_err(crate::ConfigError::from)?;
                Action::ApplySettings(Box::new(settings))
            }
            "clear_recent_files" => Action::ClearRecentFiles,
            "refresh_explorer" => Action::RefreshExplorer,
            "show_shortcuts" => Action::ShowShortcuts,
            "quit" => Action::Quit,
            other => return Err(CoreError::UnknownAction(other.to_string())),
        };
        Ok(action)
    }
}

/// A handler for one action name.
pub type ActionHandler = Box<dyn Fn(&mut Editor, &Action) -> CoreResult<()> + Send + Sync>;

/// Maps action names to handlers.
pub struct ActionTable {
    handlers: HashMap<String, ActionHandler>,
}

impl ActionTable {
    /// Creates a table with every built-in action.
    pub fn new() -> Self {
        let mut table = Self::empty();
        for name in Action::BUILTIN {
            table.handlers.insert(name.to_string(), Box::new(run_builtin));
        }
        table
    }

    /// Creates a table with no handlers.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers a handler, replacing any earlier one for `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&mut Editor, &Action) -> CoreResult<()> + Send + Sync + 'static,
    {
        let name = name.into();
        tracing::debug!("Registering action {}", name);
        self.handlers.insert(name, Box::new(handler));
    }

    /// Returns true if `name` has a handler.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Every registered name, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Builds an action from a name: built-ins are parsed, other registered
    /// names become [`Action::Custom`].
    pub fn parse(&self, name: &str, args: &[String]) -> CoreResult<Action> {
        if Action::BUILTIN.iter().any(|builtin| *builtin == name) {
            Action::from_name(name, args)
        } else if self.contains(name) {
            Ok(Action::Custom {
                name: name.to_string(),
                args: args.to_vec(),
            })
        } else {
            Err(CoreError::UnknownAction(name.to_string()))
        }
    }

    /// Runs the handler registered under the action's name.
    pub fn dispatch(&self, editor: &mut Editor, action: &Action) -> CoreResult<()> {
        let handler = self
            .handlers
            .get(action.name())
            .ok_or_else(|| CoreError::UnknownAction(action.name().to_string()))?;
        tracing::debug!("Dispatching {}", action.name());
        handler(editor, action)
    }

    /// Parses and dispatches in one step.
    pub fn dispatch_named(&self, editor: &mut Editor, name: &str, args: &[String]) -> CoreResult<()> {
        let action = self.parse(name, args)?;
        self.dispatch(editor, &action)
    }

    /// Dispatches the action bound to a key press. Returns false if the key
    /// is unbound.
    ///
    /// Actions that need an argument (a path, a search needle) fail with
    /// [`CoreError::MissingArgument`]; the front end prompts for it.
    pub fn dispatch_key(&self, editor: &mut Editor, keys: &KeyPress) -> CoreResult<bool> {
        let Some(name) = editor.keymap().resolve(keys).map(str::to_string) else {
            return Ok(false);
        };
        self.dispatch_named(editor, &name, &[])?;
        Ok(true)
    }
}

impl Default for ActionTable {
    fn default() -> Self {
        Self::new()
    }
}

fn run_builtin(editor: &mut Editor, action: &Action) -> CoreResult<()> {
    match action {
        Action::NewFile => {
            editor.new_file();
        }
        Action::OpenFile(path) => {
            editor.open_file(path)?;
        }
        Action::Save => editor.save()?,
        Action::SaveAs(path) => editor.save_as(path)?,
        Action::SaveAll => {
            editor.save_all()?;
        }
        Action::CloseTab => {
            editor.close_active_tab()?;
        }
        Action::Undo => {
            editor.undo()?;
        }
        Action::Redo => {
            editor.redo()?;
        }
        Action::Cut => editor.cut()?,
        Action::Copy => editor.copy()?,
        Action::Paste => editor.paste()?,
        Action::SelectAll => editor.select_all()?,
        Action::Find(query) => {
            editor.find(query)?;
        }
        Action::Replace(query) => {
            editor.replace(query)?;
        }
        Action::ReplaceAll(query) => {
            editor.replace_all(query)?;
        }
        Action::ZoomIn => {
            editor.zoom_in();
        }
        Action::ZoomOut => {
            editor.zoom_out();
        }
        Action::ResetZoom => {
            editor.reset_zoom();
        }
        Action::RunFile => {
            editor.run_file()?;
        }
        Action::RunCommand(command) => {
            editor.run_command(command);
        }
        Action::ApplySettings(settings) => editor.apply_settings(settings.as_ref().clone()),
        Action::ClearRecentFiles => editor.clear_recent_files(),
        Action::RefreshExplorer => editor.refresh_explorer(),
        Action::ShowShortcuts => editor.show_shortcuts(),
        Action::Quit => editor.quit(),
        Action::Custom { name, .. } => return Err(CoreError::UnknownAction(name.clone())),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Theme;
    use scribe_runner::{CommandRunner, RunnerConfig};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    fn editor() -> Editor {
        Editor::new(
            Config::default(),
            None,
            CommandRunner::current(RunnerConfig::default()),
        )
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_every_builtin_has_a_handler() {
        let table = ActionTable::new();
        for name in Action::BUILTIN {
            assert!(table.contains(name), "{name} missing");
        }
        assert_eq!(table.names().len(), Action::BUILTIN.len());
    }

    #[test]
    fn test_from_name_round_trips_names() {
        for name in Action::BUILTIN {
            let action = Action::from_name(name, &args(&["x", "y"])).or_else(|_| {
                Action::from_name(name, &args(&["{}"]))
            });
            assert_eq!(action.unwrap().name(), name);
        }
    }

    #[test]
    fn test_missing_and_unknown() {
        assert!(matches!(
            Action::from_name("open_file", &[]),
            Err(CoreError::MissingArgument { expected: "path", .. })
        ));
        assert!(matches!(
            Action::from_name("run_command", &args(&["  "])),
            Err(CoreError::MissingArgument { .. })
        ));
        assert!(matches!(
            ActionTable::new().parse("frobnicate", &[]),
            Err(CoreError::UnknownAction(name)) if name == "frobnicate"
        ));
    }

    #[test]
    fn test_search_arguments() {
        let action = Action::from_name("replace_all", &args(&["a", "b", "match_case"])).unwrap();
        assert_eq!(
            action,
            Action::ReplaceAll(SearchQuery::new("a").with_replacement("b").case_sensitive(true))
        );
        let action = Action::from_name("find", &args(&["a"])).unwrap();
        assert_eq!(action, Action::Find(SearchQuery::new("a")));
    }

    #[test]
    fn test_apply_settings_from_json() {
        let action = Action::from_name("apply_settings", &args(&[r#"{"theme":"light"}"#])).unwrap();
        let Action::ApplySettings(settings) = action else {
            panic!("wrong action");
        };
        assert_eq!(settings.theme, Theme::Light);

        assert!(matches!(
            Action::from_name("apply_settings", &args(&["{oops"])),
            Err(CoreError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_dispatch_builtin() {
        let table = ActionTable::new();
        let mut editor = editor();

        table.dispatch(&mut editor, &Action::ZoomIn).unwrap();
        assert_eq!(editor.config().font_size, 15);

        table.dispatch_named(&mut editor, "new_file", &[]).unwrap();
        assert_eq!(editor.sessions().len(), 2);

        table.dispatch(&mut editor, &Action::Quit).unwrap();
        assert!(editor.should_quit());
    }

    #[tokio::test]
    async fn test_dispatch_file_actions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<p>hi</p>").unwrap();
        let table = ActionTable::new();
        let mut editor = editor();

        table
            .dispatch(&mut editor, &Action::OpenFile(path.clone()))
            .unwrap();
        table
            .dispatch(
                &mut editor,
                &Action::ReplaceAll(SearchQuery::new("hi").with_replacement("bye")),
            )
            .unwrap();
        table.dispatch(&mut editor, &Action::Save).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>bye</p>");
    }

    #[tokio::test]
    async fn test_custom_handler_overrides_and_extends() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut table = ActionTable::new();

        let counter = Arc::clone(&calls);
        table.register("save", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        table.register("greet", |editor, action| {
            if let Action::Custom { args, .. } = action {
                editor.insert_text(&args.join(" "))?;
            }
            Ok(())
        });

        let mut editor = editor();
        table.dispatch(&mut editor, &Action::Save).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        table
            .dispatch_named(&mut editor, "greet", &args(&["hello", "there"]))
            .unwrap();
        assert_eq!(editor.active_session().unwrap().text(), "hello there");
    }

    #[tokio::test]
    async fn test_dispatch_key() {
        let table = ActionTable::new();
        let mut editor = editor();

        let zoom = KeyPress::parse("ctrl+=").unwrap();
        assert!(table.dispatch_key(&mut editor, &zoom).unwrap());
        assert_eq!(editor.config().font_size, 15);

        let unbound = KeyPress::parse("ctrl+k").unwrap();
        assert!(!table.dispatch_key(&mut editor, &unbound).unwrap());

        let open = KeyPress::parse("ctrl+o").unwrap();
        assert!(matches!(
            table.dispatch_key(&mut editor, &open),
            Err(CoreError::MissingArgument { .. })
        ));
    }
}
