//! Core event types for quill.
//!
//! Key events are the normalized input the router consumes; the `probe`
//! module runs background work whose results are tagged with the buffer
//! revision they were computed against.

use std::fmt;

pub mod probe;

pub use probe::{ProbeKind, ProbeResult, ProbeScheduler, ProbeTicket};

/// Normalized input events fed to the editing engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    /// Bracketed paste delivered as one block of text.
    Paste(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub mods: KeyModifiers,
}

impl KeyEvent {
    pub const fn new(code: KeyCode, mods: KeyModifiers) -> Self {
        Self { code, mods }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            mods: KeyModifiers::empty(),
        }
    }

    /// Character this key types, if it is unmodified printable input.
    /// Shift alone still types (the character already carries the case).
    pub fn printable(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c)
                if !self.mods.intersects(KeyModifiers::CTRL | KeyModifiers::ALT) && !c.is_control() =>
            {
                Some(c)
            }
            _ => None,
        }
    }
}

/// Logical key identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Delete,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct KeyModifiers: u8 {
        const CTRL = 0b0000_0001;
        const ALT  = 0b0000_0010;
        const SHIFT= 0b0000_0100;
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mods.contains(KeyModifiers::CTRL) {
            f.write_str("Ctrl-")?;
        }
        if self.mods.contains(KeyModifiers::ALT) {
            f.write_str("Alt-")?;
        }
        if self.mods.contains(KeyModifiers::SHIFT) {
            f.write_str("Shift")?;
        }
        match self.code {
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::F(n) => write!(f, "F{n}"),
            other => write!(f, "{other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_event_display() {
        let k = KeyEvent::new(KeyCode::Char('k'), KeyModifiers::CTRL);
        assert_eq!(k.to_string(), "Ctrl-k");
        let up = KeyEvent::new(KeyCode::Up, KeyModifiers::SHIFT);
        assert_eq!(up.to_string(), "ShiftUp");
        assert_eq!(KeyEvent::plain(KeyCode::F(5)).to_string(), "F5");
    }

    #[test]
    fn printable_ignores_ctrl_and_alt() {
        assert_eq!(KeyEvent::plain(KeyCode::Char('a')).printable(), Some('a'));
        assert_eq!(
            KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT).printable(),
            Some('A')
        );
        assert_eq!(
            KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CTRL).printable(),
            None
        );
        assert_eq!(KeyEvent::plain(KeyCode::Enter).printable(), None);
    }
}
