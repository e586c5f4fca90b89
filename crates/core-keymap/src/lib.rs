//! core-keymap: key chord bindings.
//!
//! Maps a [`KeyEvent`] to an ordered chain of action names. The crate knows
//! nothing about what an action does; `core-actions` resolves the names.
//!
//! Chords are written the way users write them in `quill.toml`:
//! `"Ctrl-k"`, `"Alt-Left"`, `"ShiftUp"`, `"CtrlShiftEnd"`, `"Backtab"`,
//! `"F5"` or a single printable character. A binding value may chain several
//! actions separated by commas (`"IndentSelection,InsertTab"`); the chain runs
//! in order. An empty value removes the binding.

use std::collections::{BTreeMap, HashMap};

use core_events::{KeyCode, KeyEvent, KeyModifiers};
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

/// Ordered action names bound to one chord.
pub type ActionChain = SmallVec<[String; 2]>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyParseError {
    #[error("empty key chord")]
    Empty,
    #[error("unknown key `{0}`")]
    UnknownKey(String),
}

const NAMED_KEYS: &[(&str, KeyCode)] = &[
    ("Up", KeyCode::Up),
    ("Down", KeyCode::Down),
    ("Left", KeyCode::Left),
    ("Right", KeyCode::Right),
    ("Home", KeyCode::Home),
    ("End", KeyCode::End),
    ("PageUp", KeyCode::PageUp),
    ("PageDown", KeyCode::PageDown),
    ("Enter", KeyCode::Enter),
    ("Esc", KeyCode::Esc),
    ("Escape", KeyCode::Esc),
    ("Backspace", KeyCode::Backspace),
    ("Delete", KeyCode::Delete),
    ("Tab", KeyCode::Tab),
    ("Space", KeyCode::Char(' ')),
];

/// Parse a chord string into a key event.
pub fn parse_key(chord: &str) -> Result<KeyEvent, KeyParseError> {
    let chord = chord.trim();
    if chord.is_empty() {
        return Err(KeyParseError::Empty);
    }
    if chord == "Backtab" {
        return Ok(KeyEvent::new(KeyCode::Tab, KeyModifiers::SHIFT));
    }

    let mut mods = KeyModifiers::empty();
    let mut rest = chord;
    loop {
        let before = rest;
        for (prefix, flag) in [
            ("Ctrl", KeyModifiers::CTRL),
            ("Alt", KeyModifiers::ALT),
            ("Shift", KeyModifiers::SHIFT),
        ] {
            if let Some(tail) = rest.strip_prefix(prefix) {
                let tail = tail.strip_prefix('-').unwrap_or(tail);
                if !tail.is_empty() {
                    mods |= flag;
                    rest = tail;
                }
            }
        }
        if rest == before {
            break;
        }
    }

    if let Some((_, code)) = NAMED_KEYS.iter().find(|(name, _)| *name == rest) {
        return Ok(KeyEvent::new(*code, mods));
    }
    if let Some(n) = rest.strip_prefix('F').and_then(|n| n.parse::<u8>().ok()) {
        return Ok(KeyEvent::new(KeyCode::F(n), mods));
    }
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => {
            // Ctrl/Alt letters are case-insensitive in terminals
            let c = if mods.intersects(KeyModifiers::CTRL | KeyModifiers::ALT) {
                c.to_ascii_lowercase()
            } else {
                c
            };
            Ok(KeyEvent::new(KeyCode::Char(c), mods))
        }
        _ => Err(KeyParseError::UnknownKey(chord.to_string())),
    }
}

/// Default chord table.
pub fn default_bindings() -> &'static [(&'static str, &'static str)] {
    &[
        ("Up", "CursorUp"),
        ("Down", "CursorDown"),
        ("Left", "CursorLeft"),
        ("Right", "CursorRight"),
        ("ShiftUp", "SelectUp"),
        ("ShiftDown", "SelectDown"),
        ("ShiftLeft", "SelectLeft"),
        ("ShiftRight", "SelectRight"),
        ("Alt-Left", "WordLeft"),
        ("Alt-Right", "WordRight"),
        ("Alt-ShiftLeft", "SelectWordLeft"),
        ("Alt-ShiftRight", "SelectWordRight"),
        ("Alt-Up", "MoveLinesUp"),
        ("Alt-Down", "MoveLinesDown"),
        ("Home", "StartOfLine"),
        ("End", "EndOfLine"),
        ("ShiftHome", "SelectToStartOfLine"),
        ("ShiftEnd", "SelectToEndOfLine"),
        ("CtrlHome", "CursorStart"),
        ("CtrlEnd", "CursorEnd"),
        ("CtrlShiftHome", "SelectToStart"),
        ("CtrlShiftEnd", "SelectToEnd"),
        ("Enter", "InsertNewline"),
        ("Backspace", "Backspace"),
        ("Alt-Backspace", "DeleteWordLeft"),
        ("Alt-Delete", "DeleteWordRight"),
        ("Delete", "Delete"),
        ("Tab", "IndentSelection,InsertTab"),
        ("Backtab", "OutdentSelection,OutdentLine"),
        ("Esc", "Escape"),
        ("Ctrl-s", "Save"),
        ("Ctrl-f", "Find"),
        ("Ctrl-n", "FindNext"),
        ("Ctrl-p", "FindPrevious"),
        ("Ctrl-z", "Undo"),
        ("Ctrl-y", "Redo"),
        ("Ctrl-c", "Copy"),
        ("Ctrl-x", "Cut"),
        ("Ctrl-k", "CutLine"),
        ("Ctrl-d", "DuplicateLine"),
        ("Ctrl-v", "Paste"),
        ("Alt-v", "PastePrimary"),
        ("Ctrl-a", "SelectAll"),
        ("Alt-w", "SelectWord"),
        ("Alt-d", "DeleteLine"),
        ("Ctrl-u", "ToggleMacro"),
        ("Ctrl-j", "PlayMacro"),
        ("Alt-,", "PrevLoc"),
        ("Alt-.", "NextLoc"),
        ("Alt-g", "GotoGutterMessage"),
        ("Alt-e", "ExtractVariable"),
        ("F7", "Lint"),
        ("F8", "Format"),
        ("F12", "GotoDefinition"),
    ]
}

#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: HashMap<KeyEvent, ActionChain>,
}

fn split_chain(value: &str) -> ActionChain {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Keymap {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Keymap populated from [`default_bindings`].
    pub fn with_defaults() -> Self {
        let mut map = Self::empty();
        for (chord, value) in default_bindings() {
            // the built-in table only holds parseable chords
            if let Ok(key) = parse_key(chord) {
                map.bindings.insert(key, split_chain(value));
            }
        }
        debug!(target: "keymap", bindings = map.bindings.len(), "default_keymap_built");
        map
    }

    pub fn bind(&mut self, key: KeyEvent, value: &str) {
        let chain = split_chain(value);
        if chain.is_empty() {
            self.bindings.remove(&key);
            trace!(target: "keymap", %key, "unbind");
        } else {
            trace!(target: "keymap", %key, actions = ?chain, "bind");
            self.bindings.insert(key, chain);
        }
    }

    /// Apply `[keys]` overrides. Unparseable chords are skipped, logged and
    /// returned.
    pub fn apply_overrides(&mut self, overrides: &BTreeMap<String, String>) -> Vec<KeyParseError> {
        let mut errors = Vec::new();
        for (chord, value) in overrides {
            match parse_key(chord) {
                Ok(key) => self.bind(key, value),
                Err(err) => {
                    warn!(target: "keymap", chord = %chord, %err, "binding_override_rejected");
                    errors.push(err);
                }
            }
        }
        errors
    }

    pub fn lookup(&self, key: &KeyEvent) -> Option<&[String]> {
        self.bindings.get(key).map(|c| c.as_slice())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Every action name referenced by a binding.
    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.bindings.values().flatten().map(String::as_str)
    }
}
