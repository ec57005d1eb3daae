//! Open tabs.
//!
//! `TabId` is a newtype over `Uuid`, so a tab can be addressed without
//! holding a reference into the registry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

use crate::session::EditorSession;
use crate::{CoreError, CoreResult};

/// Unique identifier for a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabId(Uuid);

impl TabId {
    /// Creates a new unique tab ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What closing a tab did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The tab was removed
    Closed,
    /// It was the last tab; it was emptied instead
    Reset,
}

/// Every open session, in tab order, with one active.
///
/// The registry is never empty: it starts with one untitled session and
/// closing the last tab resets it instead of removing it.
pub struct SessionRegistry {
    sessions: HashMap<TabId, EditorSession>,
    order: Vec<TabId>,
    active: TabId,
}

impl SessionRegistry {
    /// Creates a registry holding one untitled session.
    pub fn new() -> Self {
        let id = TabId::new();
        Self {
            sessions: HashMap::from([(id, EditorSession::new())]),
            order: vec![id],
            active: id,
        }
    }

    /// Adds a session as the last tab and activates it.
    pub fn add(&mut self, session: EditorSession) -> TabId {
        let id = TabId::new();
        self.sessions.insert(id, session);
        self.order.push(id);
        self.active = id;
        id
    }

    /// Closes a tab. The last remaining tab is reset rather than removed.
    ///
    /// When the active tab closes, the tab that took its place (or the new
    /// last tab) becomes active.
    pub fn close(&mut self, id: TabId) -> CoreResult<CloseOutcome> {
        let index = self
            .order
            .iter()
            .position(|&t| t == id)
            .ok_or(CoreError::SessionNotFound(id))?;

        if self.order.len() == 1 {
            if let Some(session) = self.sessions.get_mut(&id) {
                session.reset();
            }
            return Ok(CloseOutcome::Reset);
        }

        self.sessions.remove(&id);
        self.order.remove(index);
        if self.active == id {
            self.active = self.order[index.min(self.order.len() - 1)];
        }
        Ok(CloseOutcome::Closed)
    }

    /// Returns a session by ID.
    pub fn get(&self, id: TabId) -> Option<&EditorSession> {
        self.sessions.get(&id)
    }

    /// Returns a mutable session by ID.
    pub fn get_mut(&mut self, id: TabId) -> Option<&mut EditorSession> {
        self.sessions.get_mut(&id)
    }

    pub fn active_id(&self) -> TabId {
        self.active
    }

    /// Returns the active session.
    pub fn active(&self) -> Option<&EditorSession> {
        self.sessions.get(&self.active)
    }

    /// Returns a mutable reference to the active session.
    pub fn active_mut(&mut self) -> Option<&mut EditorSession> {
        self.sessions.get_mut(&self.active)
    }

    /// Sets the active tab.
    pub fn set_active(&mut self, id: TabId) -> CoreResult<()> {
        if !self.sessions.contains_key(&id) {
            return Err(CoreError::SessionNotFound(id));
        }
        self.active = id;
        Ok(())
    }

    /// Finds the tab bound to `path`.
    pub fn find_by_path(&self, path: &Path) -> Option<TabId> {
        let canonical = path.canonicalize().ok();
        self.iter()
            .find(|(_, session)| {
                session.path().is_some_and(|p| {
                    p == path || (canonical.is_some() && p.canonicalize().ok() == canonical)
                })
            })
            .map(|(id, _)| id)
    }

    /// Iterates over sessions in tab order.
    pub fn iter(&self) -> impl Iterator<Item = (TabId, &EditorSession)> {
        self.order
            .iter()
            .filter_map(|id| self.sessions.get(id).map(|s| (*id, s)))
    }

    /// Tab IDs in tab order.
    pub fn order(&self) -> &[TabId] {
        &self.order
    }

    /// Returns the number of open tabs.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if no tabs are open.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns true if any session has unsaved changes.
    pub fn has_unsaved_changes(&self) -> bool {
        self.sessions.values().any(EditorSession::is_modified)
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_starts_with_one_untitled_tab() {
        let registry = SessionRegistry::new();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.active().unwrap().title(), "Untitled");
    }

    #[test]
    fn test_add_activates() {
        let mut registry = SessionRegistry::new();
        let id = registry.add(EditorSession::new());
        assert_eq!(registry.active_id(), id);
        assert_eq!(registry.order().last(), Some(&id));
    }

    #[test]
    fn test_close_active_moves_to_neighbour() {
        let mut registry = SessionRegistry::new();
        let first = registry.active_id();
        let second = registry.add(EditorSession::new());
        let third = registry.add(EditorSession::new());

        registry.set_active(second).unwrap();
        assert_eq!(registry.close(second).unwrap(), CloseOutcome::Closed);
        assert_eq!(registry.active_id(), third);

        assert_eq!(registry.close(third).unwrap(), CloseOutcome::Closed);
        assert_eq!(registry.active_id(), first);
    }

    #[test]
    fn test_close_last_resets() {
        let mut registry = SessionRegistry::new();
        let id = registry.active_id();
        registry.active_mut().unwrap().insert_text("scratch").unwrap();

        assert_eq!(registry.close(id).unwrap(), CloseOutcome::Reset);
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
        assert_eq!(registry.active().unwrap().text(), "");
    }

    #[test]
    fn test_unknown_tab() {
        let mut registry = SessionRegistry::new();
        let stranger = TabId::new();
        assert!(matches!(
            registry.close(stranger),
            Err(CoreError::SessionNotFound(id)) if id == stranger
        ));
        assert!(registry.set_active(stranger).is_err());
    }

    #[test]
    fn test_find_by_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.py");
        std::fs::write(&path, "").unwrap();

        let mut registry = SessionRegistry::new();
        let id = registry.add(EditorSession::from_file(&path).unwrap());

        assert_eq!(registry.find_by_path(&path), Some(id));
        assert_eq!(
            registry.find_by_path(&dir.path().join(".").join("a.py")),
            Some(id)
        );
        assert_eq!(registry.find_by_path(&dir.path().join("b.py")), None);
    }
}
