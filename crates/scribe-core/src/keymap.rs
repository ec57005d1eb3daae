//! Keyboard shortcuts.
//!
//! Key presses resolve to action names, which the [`ActionTable`] then
//! dispatches. Bindings are parsed from strings like `"ctrl+shift+s"`.
//!
//! [`ActionTable`]: crate::action::ActionTable

use std::collections::HashMap;

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Modifiers {
    /// No modifiers pressed.
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
    };

    /// Ctrl modifier.
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        alt: false,
        shift: false,
    };

    /// Alt modifier.
    pub const ALT: Modifiers = Modifiers {
        ctrl: false,
        alt: true,
        shift: false,
    };

    /// Ctrl+Shift.
    pub const CTRL_SHIFT: Modifiers = Modifiers {
        ctrl: true,
        alt: false,
        shift: true,
    };

    /// Ctrl+Alt.
    pub const CTRL_ALT: Modifiers = Modifiers {
        ctrl: true,
        alt: true,
        shift: false,
    };

    /// Returns true if no modifiers are pressed.
    pub fn is_empty(&self) -> bool {
        !self.ctrl && !self.alt && !self.shift
    }

    /// Parses one modifier name into `self`. Returns false for anything
    /// that is not a modifier.
    fn add(&mut self, name: &str) -> bool {
        match name.to_ascii_lowercase().as_str() {
            "ctrl" | "control" | "cmd" => self.ctrl = true,
            "alt" | "option" => self.alt = true,
            "shift" => self.shift = true,
            _ => return false,
        }
        true
    }
}

impl std::fmt::Display for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.alt {
            parts.push("Alt");
        }
        if self.shift {
            parts.push("Shift");
        }
        write!(f, "{}", parts.join("+"))
    }
}

/// A key code. Letters are stored lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Delete,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    F(u8),
}

impl Key {
    /// Parses a key name such as `"s"`, `"F5"`, `"enter"` or `","`.
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "enter" | "return" => Some(Key::Enter),
            "tab" => Some(Key::Tab),
            "backspace" => Some(Key::Backspace),
            "delete" | "del" => Some(Key::Delete),
            "escape" | "esc" => Some(Key::Escape),
            "up" => Some(Key::Up),
            "down" => Some(Key::Down),
            "left" => Some(Key::Left),
            "right" => Some(Key::Right),
            "home" => Some(Key::Home),
            "end" => Some(Key::End),
            "space" => Some(Key::Char(' ')),
            _ if lower.len() > 1 && lower.starts_with('f') => {
                lower[1..].parse().ok().filter(|n| (1..=12).contains(n)).map(Key::F)
            }
            _ => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Key::Char(c)),
                    _ => None,
                }
            }
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Char(' ') => write!(f, "Space"),
            Key::Char(c) => write!(f, "{}", c.to_uppercase()),
            Key::Enter => write!(f, "Enter"),
            Key::Tab => write!(f, "Tab"),
            Key::Backspace => write!(f, "Backspace"),
            Key::Delete => write!(f, "Delete"),
            Key::Escape => write!(f, "Escape"),
            Key::Up => write!(f, "Up"),
            Key::Down => write!(f, "Down"),
            Key::Left => write!(f, "Left"),
            Key::Right => write!(f, "Right"),
            Key::Home => write!(f, "Home"),
            Key::End => write!(f, "End"),
            Key::F(n) => write!(f, "F{}", n),
        }
    }
}

/// A key press event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyPress {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyPress {
    /// Creates a new key press.
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// Parses a binding such as `"ctrl+s"`, `"Ctrl+Shift+S"` or `"ctrl++"`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        // a trailing "++" means the plus key itself
        let (mods, key) = match s.strip_suffix("++") {
            Some(mods) => (mods, "+"),
            None => match s.rsplit_once('+') {
                Some((mods, key)) => (mods, key),
                None => ("", s),
            },
        };

        let key = Key::parse(key)?;
        let mut modifiers = Modifiers::NONE;
        for name in mods.split('+').filter(|m| !m.is_empty()) {
            if !modifiers.add(name.trim()) {
                return None;
            }
        }
        Some(Self { key, modifiers })
    }
}

impl std::fmt::Display for KeyPress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}+{}", self.modifiers, self.key)
        }
    }
}

/// One entry of the shortcuts listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
    pub keys: KeyPress,
    pub action: String,
    pub label: &'static str,
    pub group: &'static str,
}

/// Maps key presses to action names.
pub struct Keymap {
    bindings: Vec<Shortcut>,
    by_key: HashMap<KeyPress, usize>,
}

const DEFAULT_BINDINGS: &[(&str, &str, &str, &str)] = &[
    ("File", "ctrl+n", "new_file", "New File"),
    ("File", "ctrl+o", "open_file", "Open File"),
    ("File", "ctrl+s", "save", "Save File"),
    ("File", "ctrl+shift+s", "save_as", "Save As"),
    ("File", "ctrl+alt+s", "save_all", "Save All"),
    ("File", "ctrl+w", "close_tab", "Close Tab"),
    ("File", "alt+f4", "quit", "Exit"),
    ("Edit", "ctrl+z", "undo", "Undo"),
    ("Edit", "ctrl+y", "redo", "Redo"),
    ("Edit", "ctrl+x", "cut", "Cut"),
    ("Edit", "ctrl+c", "copy", "Copy"),
    ("Edit", "ctrl+v", "paste", "Paste"),
    ("Edit", "ctrl+a", "select_all", "Select All"),
    ("Edit", "ctrl+f", "find", "Find"),
    ("Edit", "ctrl+h", "replace", "Replace"),
    ("View", "ctrl+=", "zoom_in", "Zoom In"),
    ("View", "ctrl++", "zoom_in", "Zoom In"),
    ("View", "ctrl+-", "zoom_out", "Zoom Out"),
    ("View", "ctrl+0", "reset_zoom", "Reset Zoom"),
    ("Run", "f5", "run_file", "Run Current File"),
    ("Tools", "ctrl+,", "apply_settings", "Settings"),
    ("Tools", "f1", "show_shortcuts", "Show Shortcuts"),
];

impl Keymap {
    /// Creates a keymap with the default bindings.
    pub fn new() -> Self {
        let mut keymap = Self {
            bindings: Vec::new(),
            by_key: HashMap::new(),
        };
        for &(group, keys, action, label) in DEFAULT_BINDINGS {
            match KeyPress::parse(keys) {
                Some(keys) => keymap.push(Shortcut {
                    keys,
                    action: action.to_string(),
                    label,
                    group,
                }),
                None => tracing::warn!("Skipping unparsable binding {:?}", keys),
            }
        }
        keymap
    }

    /// Binds `keys` to `action`, replacing any earlier binding of the same
    /// keys.
    pub fn bind(&mut self, keys: KeyPress, action: impl Into<String>) {
        self.push(Shortcut {
            keys,
            action: action.into(),
            label: "Custom",
            group: "Custom",
        });
    }

    fn push(&mut self, shortcut: Shortcut) {
        match self.by_key.get(&shortcut.keys) {
            Some(&i) => self.bindings[i] = shortcut,
            None => {
                self.by_key.insert(shortcut.keys, self.bindings.len());
                self.bindings.push(shortcut);
            }
        }
    }

    /// Returns the action bound to a key press.
    pub fn resolve(&self, keys: &KeyPress) -> Option<&str> {
        self.by_key
            .get(keys)
            .map(|&i| self.bindings[i].action.as_str())
    }

    /// All bindings in listing order.
    pub fn shortcuts(&self) -> &[Shortcut] {
        &self.bindings
    }

    /// The help panel text: one line per binding under its group heading.
    pub fn shortcuts_text(&self) -> String {
        let mut out = String::new();
        let mut group = "";
        for shortcut in &self.bindings {
            if shortcut.group != group {
                if !out.is_empty() {
                    out.push('\n');
                }
                group = shortcut.group;
                out.push_str(group);
                out.push('\n');
            }
            out.push_str(&format!("  {:<14} {}\n", shortcut.keys.to_string(), shortcut.label));
        }
        out
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}
