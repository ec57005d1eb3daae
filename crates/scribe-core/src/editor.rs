//! Main editor orchestration.
//!
//! `Editor` is the one object a front end talks to. It owns the open
//! sessions, the configuration, the terminal panel state and the background
//! runner, and reports every change on its [`EventBus`].

use std::ops::Range;
use std::path::{Path, PathBuf};

use scribe_buffer::{Position, SearchMatch};
use scribe_runner::{
    CommandRunner, JobId, ProcessError, ProcessOutput, ProcessResult, RunReport, RunRequest,
};

use crate::action::SearchQuery;
use crate::config::Config;
use crate::event::{EditorEvent, EventBus};
use crate::explorer::FileTree;
use crate::keymap::Keymap;
use crate::registry::{CloseOutcome, SessionRegistry, TabId};
use crate::session::{EditorSession, ReplaceOutcome};
use crate::terminal::{CommandHistory, OutputLog};
use crate::{CoreError, CoreResult};

/// The main editor state.
///
/// Owned by a single thread. Runs go to the [`CommandRunner`], whose
/// reports are collected with [`Editor::poll_runner`] or
/// [`Editor::wait_for_jobs`].
pub struct Editor {
    /// Open tabs
    sessions: SessionRegistry,

    /// Editor configuration
    config: Config,

    /// Where the configuration is persisted; `None` keeps it in memory
    config_path: Option<PathBuf>,

    /// Key bindings
    keymap: Keymap,

    /// File explorer, once a folder is opened
    explorer: Option<FileTree>,

    /// Clipboard content
    clipboard: String,

    /// Terminal panel output
    output: OutputLog,

    /// Terminal panel command history
    history: CommandHistory,

    /// Last status bar message
    status: String,

    /// Background command and script runs
    runner: CommandRunner,

    /// Event bus for notifications
    event_bus: EventBus,

    /// Whether the editor should quit
    should_quit: bool,
}

impl Editor {
    /// Creates an editor with one untitled tab.
    pub fn new(config: Config, config_path: Option<PathBuf>, runner: CommandRunner) -> Self {
        Self {
            sessions: SessionRegistry::new(),
            config,
            config_path,
            keymap: Keymap::new(),
            explorer: None,
            clipboard: String::new(),
            output: OutputLog::new(),
            history: CommandHistory::new(),
            status: "Ready".to_string(),
            runner,
            event_bus: EventBus::new(),
            should_quit: false,
        }
    }

    // ==================== Sessions ====================

    /// Returns the open tabs.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn active_tab(&self) -> TabId {
        self.sessions.active_id()
    }

    /// Returns the active session.
    pub fn active_session(&self) -> CoreResult<&EditorSession> {
        self.sessions.active().ok_or(CoreError::NoActiveSession)
    }

    /// Returns a mutable reference to the active session.
    pub fn active_session_mut(&mut self) -> CoreResult<&mut EditorSession> {
        self.sessions.active_mut().ok_or(CoreError::NoActiveSession)
    }

    /// Returns a session by tab.
    pub fn session(&self, id: TabId) -> CoreResult<&EditorSession> {
        self.sessions.get(id).ok_or(CoreError::SessionNotFound(id))
    }

    /// Opens a new untitled tab.
    pub fn new_file(&mut self) -> TabId {
        let id = self.sessions.add(EditorSession::new());
        self.emit(EditorEvent::SessionOpened(id));
        self.emit(EditorEvent::SessionFocused(id));
        self.log("New file created");
        id
    }

    /// Opens `path` in a new tab, or focuses the tab already showing it.
    ///
    /// The file is added to the recent list. A failure is reported on the
    /// event bus and in the output log; no tab is created.
    pub fn open_file(&mut self, path: impl AsRef<Path>) -> CoreResult<TabId> {
        let path = path.as_ref();

        if let Some(id) = self.sessions.find_by_path(path) {
            self.sessions.set_active(id)?;
            self.emit(EditorEvent::SessionFocused(id));
            return Ok(id);
        }

        let session = match EditorSession::from_file(path) {
            Ok(session) => session,
            Err(err) => {
                self.log(format!("Error opening file: {err}"));
                self.notify("Error", format!("Failed to open: {err}"));
                if !path.exists() {
                    self.forget_recent(path);
                }
                return Err(err);
            }
        };
        let language = session.language();
        let id = self.sessions.add(session);

        self.remember_recent(path);
        self.emit(EditorEvent::SessionOpened(id));
        self.emit(EditorEvent::SessionFocused(id));
        self.emit(EditorEvent::LanguageChanged { tab: id, language });
        self.log(format!("Opened: {}", path.display()));
        Ok(id)
    }

    /// Brings a tab to the front.
    pub fn focus(&mut self, id: TabId) -> CoreResult<()> {
        self.sessions.set_active(id)?;
        self.emit(EditorEvent::SessionFocused(id));
        self.emit_cursor_moved();
        Ok(())
    }

    /// Saves the active session to its file.
    ///
    /// An untitled session fails with [`CoreError::NoFilePath`]; the front
    /// end asks for a path and calls [`Editor::save_as`].
    pub fn save(&mut self) -> CoreResult<()> {
        let id = self.active_tab();
        self.save_session(id, None).map(drop)
    }

    /// Saves the active session under a new path and rebinds it.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> CoreResult<()> {
        let id = self.active_tab();
        self.save_session(id, Some(path.as_ref())).map(drop)
    }

    /// Saves every session bound to a file. Returns how many were written.
    pub fn save_all(&mut self) -> CoreResult<usize> {
        let targets: Vec<TabId> = self
            .sessions
            .iter()
            .filter(|(_, session)| session.path().is_some())
            .map(|(id, _)| id)
            .collect();

        let mut saved = 0;
        for id in targets {
            match self.save_session(id, None) {
                Ok(_) => saved += 1,
                Err(err) if err.is_file_io() => {}
                Err(err) => return Err(err),
            }
        }

        if saved > 0 {
            self.log(format!("Saved {saved} file(s)"));
        } else {
            self.log("No files to save");
        }
        Ok(saved)
    }

    fn save_session(&mut self, id: TabId, path: Option<&Path>) -> CoreResult<PathBuf> {
        let session = self
            .sessions
            .get_mut(id)
            .ok_or(CoreError::SessionNotFound(id))?;
        let previous = session.language();

        let result = match path {
            Some(path) => session.save_as(path),
            None => session.save(),
        };
        if let Err(err) = result {
            if err.is_file_io() {
                self.log(format!("Save error: {err}"));
                self.notify("Error", format!("Save failed: {err}"));
            }
            return Err(err);
        }

        let language = session.language();
        let saved = session
            .path()
            .map(Path::to_path_buf)
            .ok_or(CoreError::NoFilePath)?;

        self.remember_recent(&saved);
        if language != previous {
            self.emit(EditorEvent::LanguageChanged { tab: id, language });
        }
        self.emit(EditorEvent::SessionSaved {
            tab: id,
            path: saved.clone(),
        });
        self.log(format!("Saved: {}", saved.display()));
        Ok(saved)
    }

    /// Closes a tab. Closing the last tab empties it instead.
    pub fn close_tab(&mut self, id: TabId) -> CoreResult<CloseOutcome> {
        let outcome = self.sessions.close(id)?;
        match outcome {
            CloseOutcome::Closed => {
                self.emit(EditorEvent::SessionClosed(id));
                self.emit(EditorEvent::SessionFocused(self.active_tab()));
            }
            CloseOutcome::Reset => self.emit(EditorEvent::SessionChanged {
                tab: id,
                blocks: 0..1,
            }),
        }
        self.emit_cursor_moved();
        Ok(outcome)
    }

    /// Closes the active tab.
    pub fn close_active_tab(&mut self) -> CoreResult<CloseOutcome> {
        self.close_tab(self.active_tab())
    }

    /// Saves every modified session that has a file. Returns the count.
    ///
    /// The front end calls this on a timer of [`Config::autosave_period`].
    /// Untitled and unmodified sessions are skipped. A failed write sends a
    /// notification, leaves that session modified and does not stop the
    /// remaining saves.
    pub fn autosave(&mut self) -> usize {
        let targets: Vec<TabId> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.is_modified() && s.path().is_some())
            .map(|(id, _)| id)
            .collect();

        let mut saved = 0;
        for id in targets {
            let Some(session) = self.sessions.get_mut(id) else {
                continue;
            };
            match session.save() {
                Ok(()) => {
                    saved += 1;
                    if let Some(path) = session.path().map(Path::to_path_buf) {
                        self.emit(EditorEvent::SessionSaved { tab: id, path });
                    }
                }
                Err(err) => {
                    tracing::warn!("Autosave failed: {}", err);
                    self.notify("Autosave", format!("Save failed: {err}"));
                }
            }
        }
        if saved > 0 {
            tracing::debug!("Autosaved {} file(s)", saved);
        }
        saved
    }

    /// Returns true if any session has unsaved changes.
    pub fn has_unsaved_changes(&self) -> bool {
        self.sessions.has_unsaved_changes()
    }

    // ==================== Text Editing ====================

    /// Types text at the caret.
    pub fn insert_text(&mut self, text: &str) -> CoreResult<()> {
        let blocks = self.active_session_mut()?.insert_text(text)?;
        self.emit_changed(blocks);
        Ok(())
    }

    /// Enter: breaks the line, copying indentation if configured.
    pub fn insert_newline(&mut self) -> CoreResult<()> {
        let auto_indent = self.config.auto_indent;
        let blocks = self.active_session_mut()?.insert_newline(auto_indent)?;
        self.emit_changed(blocks);
        Ok(())
    }

    /// Tab: inserts `tab_size` spaces.
    pub fn insert_tab(&mut self) -> CoreResult<()> {
        let tab_size = self.config.tab_size;
        let blocks = self.active_session_mut()?.insert_tab(tab_size)?;
        self.emit_changed(blocks);
        Ok(())
    }

    /// Deletes the selection or the character before the caret.
    pub fn delete_backward(&mut self) -> CoreResult<()> {
        let blocks = self.active_session_mut()?.delete_backward()?;
        self.emit_changed(blocks);
        Ok(())
    }

    /// Deletes the selection or the character after the caret.
    pub fn delete_forward(&mut self) -> CoreResult<()> {
        let blocks = self.active_session_mut()?.delete_forward()?;
        self.emit_changed(blocks);
        Ok(())
    }

    /// Undoes the last step. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> CoreResult<bool> {
        let session = self.active_session_mut()?;
        if !session.buffer().can_undo() {
            return Ok(false);
        }
        let blocks = session.undo()?;
        self.emit_changed(blocks);
        Ok(true)
    }

    /// Redoes the last undone step. Returns false when there is nothing to
    /// redo.
    pub fn redo(&mut self) -> CoreResult<bool> {
        let session = self.active_session_mut()?;
        if !session.buffer().can_redo() {
            return Ok(false);
        }
        let blocks = session.redo()?;
        self.emit_changed(blocks);
        Ok(true)
    }

    /// Moves the caret.
    pub fn move_to(&mut self, position: Position) -> CoreResult<()> {
        self.active_session_mut()?.move_to(position)?;
        self.emit_cursor_moved();
        Ok(())
    }

    /// Selects from `anchor` to `position`.
    pub fn select(&mut self, anchor: Position, position: Position) -> CoreResult<()> {
        self.active_session_mut()?.select(anchor, position)?;
        self.emit_cursor_moved();
        Ok(())
    }

    /// Selects all text.
    pub fn select_all(&mut self) -> CoreResult<()> {
        self.active_session_mut()?.select_all()?;
        self.emit_cursor_moved();
        Ok(())
    }

    /// Copies the selection to the clipboard.
    pub fn copy(&mut self) -> CoreResult<()> {
        if let Some(text) = self.active_session()?.selected_text() {
            self.clipboard = text;
        }
        Ok(())
    }

    /// Moves the selection to the clipboard.
    pub fn cut(&mut self) -> CoreResult<()> {
        if let Some(text) = self.active_session_mut()?.delete_selection()? {
            self.clipboard = text;
            let end = self.active_session()?.buffer().len_lines();
            self.emit_changed(0..end);
        }
        Ok(())
    }

    /// Inserts the clipboard at the caret.
    pub fn paste(&mut self) -> CoreResult<()> {
        if self.clipboard.is_empty() {
            return Ok(());
        }
        let text = self.clipboard.clone();
        self.insert_text(&text)
    }

    pub fn clipboard(&self) -> &str {
        &self.clipboard
    }

    /// Replaces the clipboard, e.g. from the system clipboard.
    pub fn set_clipboard(&mut self, text: impl Into<String>) {
        self.clipboard = text.into();
    }

    // ==================== Find / Replace ====================

    /// Selects the next occurrence after the caret, wrapping once.
    pub fn find(&mut self, query: &SearchQuery) -> CoreResult<Option<SearchMatch>> {
        let found = self
            .active_session_mut()?
            .find_next(&query.needle, query.case_sensitive)?;
        match &found {
            Some(_) => self.emit_cursor_moved(),
            None => self.set_status("Text not found"),
        }
        Ok(found)
    }

    /// Replaces the selected occurrence, then selects the next one.
    pub fn replace(&mut self, query: &SearchQuery) -> CoreResult<ReplaceOutcome> {
        let outcome = self.active_session_mut()?.replace_current(
            &query.needle,
            &query.replacement,
            query.case_sensitive,
        )?;
        if outcome.replaced {
            let end = self.active_session()?.buffer().len_lines();
            self.emit_changed(0..end);
        } else {
            self.emit_cursor_moved();
        }
        if outcome.next.is_none() {
            self.set_status("Text not found");
        }
        Ok(outcome)
    }

    /// Replaces every occurrence as one undo step.
    pub fn replace_all(&mut self, query: &SearchQuery) -> CoreResult<usize> {
        let count = self.active_session_mut()?.replace_all(
            &query.needle,
            &query.replacement,
            query.case_sensitive,
        )?;
        if count > 0 {
            let end = self.active_session()?.buffer().len_lines();
            self.emit_changed(0..end);
        }
        self.set_status(format!("Replaced {count} occurrence(s)"));
        Ok(count)
    }

    // ==================== Settings ====================

    /// Returns the editor configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Grows the font one point, up to the maximum.
    pub fn zoom_in(&mut self) -> bool {
        let changed = self.config.zoom_in();
        self.font_changed(changed);
        changed
    }

    /// Shrinks the font one point, down to the minimum.
    pub fn zoom_out(&mut self) -> bool {
        let changed = self.config.zoom_out();
        self.font_changed(changed);
        changed
    }

    /// Restores the default font size.
    pub fn reset_zoom(&mut self) -> bool {
        let changed = self.config.reset_zoom();
        self.font_changed(changed);
        changed
    }

    fn font_changed(&mut self, changed: bool) {
        if changed {
            self.persist_config();
            self.emit(EditorEvent::FontChanged {
                family: self.config.font_family.clone(),
                size: self.config.font_size,
            });
        }
    }

    /// Replaces the settings, clamped into range, and persists them.
    ///
    /// The recent files list is not a setting and is kept as it is.
    pub fn apply_settings(&mut self, mut settings: Config) {
        settings.recent_files = std::mem::take(&mut self.config.recent_files);
        settings.clamp();

        let theme_changed = settings.theme != self.config.theme;
        let font_changed = settings.font_size != self.config.font_size
            || settings.font_family != self.config.font_family;
        self.config = settings;
        self.persist_config();

        self.emit(EditorEvent::ConfigChanged);
        if theme_changed {
            self.emit(EditorEvent::ThemeChanged(self.config.theme));
        }
        if font_changed {
            self.emit(EditorEvent::FontChanged {
                family: self.config.font_family.clone(),
                size: self.config.font_size,
            });
        }
        self.log("Settings saved");
    }

    /// Writes the configuration to its file. Failures are logged only.
    pub fn persist_config(&self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(err) = self.config.save_to(path) {
            tracing::warn!("Could not save config to {}: {}", path.display(), err);
        }
    }

    // ==================== Recent Files ====================

    /// Recent files for the menu: the newest ten that still exist.
    pub fn recent_menu(&self) -> Vec<&Path> {
        self.config.recent_files.menu_entries()
    }

    /// Empties the recent files list.
    pub fn clear_recent_files(&mut self) {
        self.config.recent_files.clear();
        self.persist_config();
        self.emit(EditorEvent::RecentFilesChanged);
        self.notify("Recent Files", "Recent files cleared");
    }

    fn forget_recent(&mut self, path: &Path) {
        if self.config.recent_files.remove(path) {
            self.persist_config();
            self.emit(EditorEvent::RecentFilesChanged);
        }
    }

    fn remember_recent(&mut self, path: &Path) {
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.config.recent_files.push(path);
        self.persist_config();
        self.emit(EditorEvent::RecentFilesChanged);
    }

    // ==================== Runner ====================

    /// Runs the active session's file with its interpreter.
    ///
    /// The file on disk is what runs. Untitled sessions, missing files and
    /// unsupported extensions are reported in the output log and nothing
    /// is started.
    pub fn run_file(&mut self) -> CoreResult<Option<JobId>> {
        let Some(path) = self.active_session()?.path().map(Path::to_path_buf) else {
            self.log("Save file first");
            return Ok(None);
        };
        if !path.exists() {
            self.log(ProcessError::FileNotFound(path).to_string());
            return Ok(None);
        }
        if let Some(err) = self.runner.config().interpreter_for(&path).err() {
            self.log(err.to_string());
            return Ok(None);
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.log(format!("Running: {name}"));
        Ok(Some(self.runner.spawn_file(path)))
    }

    /// Runs a command line in the platform shell. Blank input is ignored.
    pub fn run_command(&mut self, command: &str) -> Option<JobId> {
        let command = command.trim();
        if command.is_empty() {
            return None;
        }
        self.history.push(command);
        self.log(format!("> {command}"));
        Some(self.runner.spawn_shell(command))
    }

    /// Collects finished runs without waiting. Returns how many finished.
    pub fn poll_runner(&mut self) -> usize {
        let mut finished = 0;
        while let Some(report) = self.runner.poll() {
            self.handle_report(report);
            finished += 1;
        }
        finished
    }

    /// Waits until every spawned run has reported.
    pub async fn wait_for_jobs(&mut self) {
        while let Some(report) = self.runner.recv().await {
            self.handle_report(report);
        }
    }

    /// Number of runs still in flight.
    pub fn pending_jobs(&self) -> usize {
        self.runner.pending()
    }

    fn handle_report(&mut self, report: RunReport) {
        for line in report_lines(&report.request, &report.outcome) {
            self.output.append(line);
        }
        self.emit(EditorEvent::CommandFinished(report.job));
    }

    // ==================== Terminal ====================

    /// Returns the terminal output.
    pub fn output(&self) -> &OutputLog {
        &self.output
    }

    pub fn clear_output(&mut self) {
        self.output.clear();
    }

    /// Returns the terminal command history.
    pub fn history_mut(&mut self) -> &mut CommandHistory {
        &mut self.history
    }

    fn log(&mut self, message: impl AsRef<str>) {
        tracing::debug!("{}", message.as_ref());
        self.output.append(message);
    }

    // ==================== Explorer ====================

    /// Shows `path` in the file explorer.
    pub fn open_folder(&mut self, path: impl AsRef<Path>) {
        self.explorer = Some(FileTree::open(path));
    }

    /// Returns the file explorer tree.
    pub fn explorer(&self) -> Option<&FileTree> {
        self.explorer.as_ref()
    }

    /// Expands a directory in the explorer.
    pub fn expand_folder(&mut self, path: &Path) -> bool {
        self.explorer.as_mut().is_some_and(|tree| tree.expand(path))
    }

    /// Re-reads the explorer root. Lists the working directory when no
    /// folder has been opened yet.
    pub fn refresh_explorer(&mut self) {
        if let Some(tree) = &mut self.explorer {
            tree.refresh();
            return;
        }
        match std::env::current_dir() {
            Ok(dir) => self.open_folder(dir),
            Err(err) => tracing::warn!("No working directory to explore: {}", err),
        }
    }

    /// Opens a file picked in the explorer. Directories are ignored.
    pub fn open_from_explorer(&mut self, path: &Path) -> CoreResult<Option<TabId>> {
        let Some(file) = self
            .explorer
            .as_ref()
            .and_then(|tree| tree.openable(path))
            .map(Path::to_path_buf)
        else {
            return Ok(None);
        };
        self.open_file(file).map(Some)
    }

    // ==================== Keymap ====================

    /// Returns the keymap.
    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn keymap_mut(&mut self) -> &mut Keymap {
        &mut self.keymap
    }

    /// Publishes the shortcuts listing for the help panel.
    pub fn show_shortcuts(&mut self) {
        let text = self.keymap.shortcuts_text();
        self.notify("Keyboard Shortcuts", text);
    }

    // ==================== Status ====================

    /// Returns the last status bar message.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
        self.emit(EditorEvent::StatusMessage(self.status.clone()));
    }

    // ==================== Lifecycle ====================

    /// Persists the configuration and signals that the editor should quit.
    pub fn quit(&mut self) {
        self.persist_config();
        self.should_quit = true;
        self.emit(EditorEvent::Quit);
        tracing::info!("Editor closed");
    }

    /// Returns true if the editor should quit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    // ==================== Events ====================

    /// Subscribes to editor events.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EditorEvent> {
        self.event_bus.subscribe()
    }

    fn emit(&self, event: EditorEvent) {
        self.event_bus.emit(event);
    }

    fn notify(&self, title: impl Into<String>, message: impl Into<String>) {
        self.emit(EditorEvent::Notification {
            title: title.into(),
            message: message.into(),
        });
    }

    fn emit_changed(&self, blocks: Range<usize>) {
        if !blocks.is_empty() {
            self.emit(EditorEvent::SessionChanged {
                tab: self.active_tab(),
                blocks,
            });
        }
        self.emit_cursor_moved();
    }

    fn emit_cursor_moved(&self) {
        if let Some(session) = self.sessions.active() {
            self.emit(EditorEvent::CursorMoved {
                tab: self.active_tab(),
                status: session.cursor_status(),
            });
        }
    }
}

/// Turns a finished run into output log lines.
pub fn report_lines(request: &RunRequest, outcome: &ProcessResult<ProcessOutput>) -> Vec<String> {
    let mut lines = Vec::new();
    match (request, outcome) {
        (_, Ok(output)) => {
            if !output.stdout.is_empty() {
                lines.push(output.stdout.clone());
            }
            if !output.stderr.is_empty() {
                lines.push(format!("Error: {}", output.stderr));
            }
            match request {
                RunRequest::File(_) => match output.exit_code {
                    Some(code) => lines.push(format!("Exit code: {code}")),
                    None => lines.push("Exit code: terminated by signal".to_string()),
                },
                RunRequest::Shell(_) => {
                    if let Err(err) = output.clone().into_result() {
                        lines.push(format!("Error: {err}"));
                    }
                }
            }
        }
        (RunRequest::Shell(_), Err(ProcessError::Timeout(_))) => {
            lines.push("Command timeout".to_string());
        }
        (RunRequest::File(_), Err(ProcessError::Timeout(_))) => lines.push("Timeout".to_string()),
        (RunRequest::File(path), Err(ProcessError::NotFound { .. })) => {
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            lines.push(format!("Interpreter not found for .{ext} files"));
        }
        (_, Err(err @ (ProcessError::FileNotFound(_) | ProcessError::UnsupportedFileType(_)))) => {
            lines.push(err.to_string());
        }
        (_, Err(err)) => lines.push(format!("Error: {err}")),
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Theme;
    use crate::event::EventHandler;
    use scribe_runner::RunnerConfig;
    use std::time::Duration;
    use tempfile::{TempDir, tempdir};

    fn editor(dir: &TempDir) -> Editor {
        Editor::new(
            Config::default(),
            Some(dir.path().join("config/config.json")),
            CommandRunner::current(RunnerConfig::default()),
        )
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_open_file_focuses_existing_tab() {
        let dir = tempdir().unwrap();
        let path = write(&dir, "a.py", "x = 1\n");
        let mut editor = editor(&dir);

        let first = editor.open_file(&path).unwrap();
        let second = editor.open_file(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(editor.sessions().len(), 2);
        assert_eq!(editor.output().last(), Some(format!("Opened: {}", path.display()).as_str()));
    }

    #[tokio::test]
    async fn test_open_file_records_recent_and_persists() {
        let dir = tempdir().unwrap();
        let path = write(&dir, "a.js", "");
        let mut editor = editor(&dir);

        editor.open_file(&path).unwrap();
        assert_eq!(editor.config().recent_files.len(), 1);

        let saved = Config::load_from(editor.config_path().unwrap()).unwrap();
        assert_eq!(saved.recent_files.len(), 1);
    }

    #[tokio::test]
    async fn test_open_missing_file_notifies() {
        let dir = tempdir().unwrap();
        let mut editor = editor(&dir);
        let mut events = EventHandler::new(editor.subscribe());

        let err = editor.open_file(dir.path().join("nope.py")).unwrap_err();
        assert!(err.is_file_io());
        assert_eq!(editor.sessions().len(), 1);
        assert!(editor.output().last().unwrap().starts_with("Error opening file"));
        assert!(events.drain().iter().any(|e| matches!(
            e,
            EditorEvent::Notification { title, .. } if title == "Error"
        )));
    }

    #[tokio::test]
    async fn test_save_untitled_needs_path() {
        let dir = tempdir().unwrap();
        let mut editor = editor(&dir);
        editor.insert_text("print(1)").unwrap();
        assert!(matches!(editor.save(), Err(CoreError::NoFilePath)));

        let path = dir.path().join("script.py");
        editor.save_as(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "print(1)");
        assert_eq!(editor.active_session().unwrap().title(), "script.py");
        assert!(editor.output().last().unwrap().starts_with("Saved: "));
    }

    #[tokio::test]
    async fn test_save_all_counts_bound_sessions() {
        let dir = tempdir().unwrap();
        let mut editor = editor(&dir);

        assert_eq!(editor.save_all().unwrap(), 0);
        assert_eq!(editor.output().last(), Some("No files to save"));

        editor.open_file(write(&dir, "a.py", "")).unwrap();
        editor.open_file(write(&dir, "b.py", "")).unwrap();
        assert_eq!(editor.save_all().unwrap(), 2);
        assert_eq!(editor.output().last(), Some("Saved 2 file(s)"));
    }

    #[tokio::test]
    async fn test_close_last_tab_resets() {
        let dir = tempdir().unwrap();
        let mut editor = editor(&dir);
        editor.insert_text("scratch").unwrap();

        assert_eq!(editor.close_active_tab().unwrap(), CloseOutcome::Reset);
        assert_eq!(editor.active_session().unwrap().text(), "");

        editor.new_file();
        assert_eq!(editor.close_active_tab().unwrap(), CloseOutcome::Closed);
        assert_eq!(editor.sessions().len(), 1);
    }

    #[tokio::test]
    async fn test_edits_emit_changed_blocks_and_cursor() {
        let dir = tempdir().unwrap();
        let mut editor = editor(&dir);
        let mut events = EventHandler::new(editor.subscribe());

        editor.insert_text("a\nb").unwrap();
        let events = events.drain();
        assert!(events.iter().any(|e| matches!(
            e,
            EditorEvent::SessionChanged { blocks, .. } if *blocks == (0..2)
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            EditorEvent::CursorMoved { status, .. } if status == "Ln 2, Col 2"
        )));
    }

    #[tokio::test]
    async fn test_undo_with_empty_history() {
        let dir = tempdir().unwrap();
        let mut editor = editor(&dir);
        assert!(!editor.undo().unwrap());
        editor.insert_text("x").unwrap();
        assert!(editor.undo().unwrap());
        assert!(editor.redo().unwrap());
        assert!(!editor.redo().unwrap());
    }

    #[tokio::test]
    async fn test_cut_and_paste() {
        let dir = tempdir().unwrap();
        let mut editor = editor(&dir);
        editor.insert_text("hello world").unwrap();
        editor
            .select(Position::new(0, 0), Position::new(0, 6))
            .unwrap();

        editor.cut().unwrap();
        assert_eq!(editor.clipboard(), "hello ");
        assert_eq!(editor.active_session().unwrap().text(), "world");

        editor.paste().unwrap();
        assert_eq!(editor.active_session().unwrap().text(), "hello world");
    }

    #[tokio::test]
    async fn test_find_and_replace_status() {
        let dir = tempdir().unwrap();
        let mut editor = editor(&dir);
        editor.insert_text("one two one").unwrap();

        assert!(editor.find(&SearchQuery::new("three")).unwrap().is_none());
        assert_eq!(editor.status(), "Text not found");

        let query = SearchQuery::new("one").with_replacement("1");
        assert_eq!(editor.replace_all(&query).unwrap(), 2);
        assert_eq!(editor.status(), "Replaced 2 occurrence(s)");
        assert_eq!(editor.active_session().unwrap().text(), "1 two 1");
    }

    #[tokio::test]
    async fn test_tab_and_newline_follow_config() {
        let dir = tempdir().unwrap();
        let mut editor = editor(&dir);
        let mut settings = editor.config().clone();
        settings.tab_size = 2;
        settings.auto_indent = false;
        editor.apply_settings(settings);

        editor.insert_tab().unwrap();
        editor.insert_text("x").unwrap();
        editor.insert_newline().unwrap();
        assert_eq!(editor.active_session().unwrap().text(), "  x\n");
    }

    #[tokio::test]
    async fn test_zoom_emits_font_change_within_bounds() {
        let dir = tempdir().unwrap();
        let mut editor = editor(&dir);
        let mut events = EventHandler::new(editor.subscribe());

        assert!(editor.zoom_in());
        assert!(events.drain().iter().any(|e| matches!(
            e,
            EditorEvent::FontChanged { size: 15, .. }
        )));

        for _ in 0..20 {
            editor.zoom_in();
        }
        assert_eq!(editor.config().font_size, 24);
        assert!(!editor.zoom_in());
        assert!(editor.reset_zoom());
        assert_eq!(editor.config().font_size, 14);
    }

    #[tokio::test]
    async fn test_apply_settings_clamps_persists_and_keeps_recent() {
        let dir = tempdir().unwrap();
        let mut editor = editor(&dir);
        editor.open_file(write(&dir, "a.py", "")).unwrap();
        let mut events = EventHandler::new(editor.subscribe());

        let settings = Config {
            theme: Theme::Monokai,
            font_size: 40,
            tab_size: 1,
            ..Config::default()
        };
        editor.apply_settings(settings);

        assert_eq!(editor.config().font_size, 24);
        assert_eq!(editor.config().tab_size, 2);
        assert_eq!(editor.config().recent_files.len(), 1);

        let saved = Config::load_from(editor.config_path().unwrap()).unwrap();
        assert_eq!(saved.theme, Theme::Monokai);

        let events = events.drain();
        assert!(events.iter().any(|e| matches!(e, EditorEvent::ThemeChanged(Theme::Monokai))));
        assert!(events.iter().any(|e| matches!(e, EditorEvent::FontChanged { size: 24, .. })));
    }

    #[tokio::test]
    async fn test_clear_recent_files_notifies() {
        let dir = tempdir().unwrap();
        let mut editor = editor(&dir);
        editor.open_file(write(&dir, "a.py", "")).unwrap();
        let mut events = EventHandler::new(editor.subscribe());

        editor.clear_recent_files();
        assert!(editor.config().recent_files.is_empty());
        assert!(events.drain().iter().any(|e| matches!(
            e,
            EditorEvent::Notification { message, .. } if message == "Recent files cleared"
        )));
    }

    #[tokio::test]
    async fn test_run_file_precondition_messages() {
        let dir = tempdir().unwrap();
        let mut editor = editor(&dir);

        assert_eq!(editor.run_file().unwrap(), None);
        assert_eq!(editor.output().last(), Some("Save file first"));

        editor.open_file(write(&dir, "notes.txt", "")).unwrap();
        assert_eq!(editor.run_file().unwrap(), None);
        assert_eq!(editor.output().last(), Some("Unsupported file type: .txt"));
        assert_eq!(editor.pending_jobs(), 0);
    }

    #[tokio::test]
    async fn test_blank_command_is_ignored() {
        let dir = tempdir().unwrap();
        let mut editor = editor(&dir);
        assert_eq!(editor.run_command("   "), None);
        assert!(editor.history_mut().entries().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_command_logs_output() {
        let dir = tempdir().unwrap();
        let mut editor = editor(&dir);
        let mut events = EventHandler::new(editor.subscribe());

        let job = editor.run_command("echo hi; echo oops >&2").unwrap();
        editor.wait_for_jobs().await;

        assert_eq!(editor.output().lines(), ["> echo hi; echo oops >&2", "hi", "Error: oops"]);
        assert_eq!(editor.history_mut().previous(), Some("echo hi; echo oops >&2"));
        assert!(events.drain().iter().any(|e| matches!(
            e,
            EditorEvent::CommandFinished(id) if *id == job
        )));
    }

    #[test]
    fn test_report_lines() {
        let script = RunRequest::File(PathBuf::from("/tmp/app.JS"));
        let shell = RunRequest::Shell("sleep 99".into());
        let timeout = || Err(ProcessError::Timeout(Duration::from_secs(30)));

        assert_eq!(report_lines(&shell, &timeout()), ["Command timeout"]);
        assert_eq!(report_lines(&script, &timeout()), ["Timeout"]);
        assert_eq!(
            report_lines(
                &script,
                &Err(ProcessError::NotFound {
                    program: "node".into()
                })
            ),
            ["Interpreter not found for .js files"]
        );

        let output = ProcessOutput {
            stdout: "done\n".into(),
            stderr: String::new(),
            exit_code: Some(0),
        };
        assert_eq!(report_lines(&script, &Ok(output.clone())), ["done\n", "Exit code: 0"]);
        assert_eq!(report_lines(&shell, &Ok(output)), ["done\n"]);
    }

    #[test]
    fn test_report_lines_shell_failure_without_output() {
        let shell = RunRequest::Shell("exit 3".into());
        let output = ProcessOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: Some(3),
        };
        assert_eq!(report_lines(&shell, &Ok(output)), ["Error: Exited with code 3"]);

        let output = ProcessOutput {
            stdout: String::new(),
            stderr: "no such file\n".into(),
            exit_code: Some(1),
        };
        assert_eq!(
            report_lines(&shell, &Ok(output)),
            ["Error: no such file\n", "Error: Exited with code 1"]
        );
    }

    #[tokio::test]
    async fn test_autosave_writes_only_modified_files() {
        let dir = tempdir().unwrap();
        let mut editor = editor(&dir);
        editor.insert_text("scratch").unwrap();

        let clean = write(&dir, "clean.py", "a = 1\n");
        editor.open_file(&clean).unwrap();
        let dirty = write(&dir, "dirty.py", "");
        let dirty_tab = editor.open_file(&dirty).unwrap();
        editor.insert_text("b = 2").unwrap();
        let mut events = EventHandler::new(editor.subscribe());

        assert_eq!(editor.autosave(), 1);
        assert_eq!(std::fs::read_to_string(&dirty).unwrap(), "b = 2");
        assert_eq!(std::fs::read_to_string(&clean).unwrap(), "a = 1\n");
        assert!(!editor.session(dirty_tab).unwrap().is_modified());
        // the untitled tab is still unsaved
        assert!(editor.has_unsaved_changes());
        assert!(events.drain().iter().any(|e| matches!(
            e,
            EditorEvent::SessionSaved { tab, .. } if *tab == dirty_tab
        )));

        assert_eq!(editor.autosave(), 0);
    }

    #[tokio::test]
    async fn test_autosave_failure_keeps_buffer_dirty() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        let path = sub.join("a.py");
        std::fs::write(&path, "").unwrap();

        let mut editor = editor(&dir);
        editor.open_file(&path).unwrap();
        editor.insert_text("x = 1").unwrap();
        std::fs::remove_dir_all(&sub).unwrap();
        let mut events = EventHandler::new(editor.subscribe());

        assert_eq!(editor.autosave(), 0);
        assert!(editor.active_session().unwrap().is_modified());
        assert_eq!(editor.active_session().unwrap().text(), "x = 1");
        assert!(events.drain().iter().any(|e| matches!(
            e,
            EditorEvent::Notification { title, .. } if title == "Autosave"
        )));
    }

    #[tokio::test]
    async fn test_missing_recent_file_is_dropped() {
        let dir = tempdir().unwrap();
        let path = write(&dir, "gone.py", "");
        let mut editor = editor(&dir);
        editor.open_file(&path).unwrap();
        editor.close_active_tab().unwrap();

        let stored = editor.config().recent_files.iter().next().unwrap().to_path_buf();
        std::fs::remove_file(&path).unwrap();

        assert!(editor.open_file(&stored).is_err());
        assert!(editor.config().recent_files.is_empty());
        let saved = Config::load_from(editor.config_path().unwrap()).unwrap();
        assert!(saved.recent_files.is_empty());
    }

    #[tokio::test]
    async fn test_open_from_explorer_skips_directories() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("pkg")).unwrap();
        let file = write(&dir, "main.py", "");
        let mut editor = editor(&dir);

        editor.open_folder(dir.path());
        assert_eq!(editor.open_from_explorer(&dir.path().join("pkg")).unwrap(), None);
        assert!(editor.open_from_explorer(&file).unwrap().is_some());
        assert_eq!(editor.active_session().unwrap().title(), "main.py");
    }
}
