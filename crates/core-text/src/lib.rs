//! Line-oriented text storage for quill.
//!
//! The buffer keeps the document as a `Vec<String>` of lines (no line
//! terminators) and addresses text with [`Location`] values: a line index and
//! a column counted in Unicode scalar values. Every mutation goes through
//! [`TextBuffer::insert`], [`TextBuffer::remove`] or [`TextBuffer::replace`]
//! and is recorded as an invertible [`undo::Mutation`] so that
//! [`TextBuffer::undo`] / [`TextBuffer::redo`] can replay history exactly.
//!
//! Invariants:
//! - A buffer always holds at least one (possibly empty) line.
//! - Every `Location` returned by the buffer satisfies `is_valid`.
//! - The line break between two lines counts as one character for char
//!   offsets and one byte (`\n`) for byte offsets, independent of the line
//!   ending the file used on disk.

use std::cmp::Ordering;
use std::fmt;

pub mod buffer;
pub mod eol;
pub mod motion;
pub mod search;
pub mod settings;
pub mod undo;
pub mod width;

pub use buffer::TextBuffer;
pub use eol::{LineEnding, NormalizedText, normalize_line_endings};
pub use settings::{BufferSettings, SettingError, SettingKey};
pub use undo::{Mutation, MutationKind, UNDO_HISTORY_MAX};

/// A (line, column) coordinate inside a [`TextBuffer`].
///
/// Columns are character (scalar value) offsets; `column == line_len` is the
/// end-of-line position. Ordering is lexicographic, line first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    pub const fn origin() -> Self {
        Self { line: 0, column: 0 }
    }

    /// Move by `delta` characters, crossing line breaks and clamping to the
    /// buffer start/end.
    pub fn move_by(self, delta: isize, buf: &TextBuffer) -> Location {
        let mut loc = buf.clamp(self);
        if delta >= 0 {
            let mut remaining = delta as usize;
            while remaining > 0 {
                let len = buf.line_len(loc.line);
                let room = len - loc.column;
                if remaining <= room {
                    loc.column += remaining;
                    break;
                }
                if loc.line + 1 >= buf.line_count() {
                    loc.column = len;
                    break;
                }
                // consume the rest of the line plus its line break
                remaining -= room + 1;
                loc = Location::new(loc.line + 1, 0);
            }
        } else {
            let mut remaining = delta.unsigned_abs();
            while remaining > 0 {
                if remaining <= loc.column {
                    loc.column -= remaining;
                    break;
                }
                if loc.line == 0 {
                    loc.column = 0;
                    break;
                }
                remaining -= loc.column + 1;
                loc = Location::new(loc.line - 1, buf.line_len(loc.line - 1));
            }
        }
        loc
    }

    /// Absolute character offset of this location.
    pub fn to_char_offset(self, buf: &TextBuffer) -> usize {
        let loc = buf.clamp(self);
        let before: usize = (0..loc.line).map(|i| buf.line_len(i) + 1).sum();
        before + loc.column
    }

    /// Inverse of [`Location::to_char_offset`]; offsets past the end clamp to
    /// `buf.end()`.
    pub fn from_char_offset(offset: usize, buf: &TextBuffer) -> Location {
        let mut remaining = offset;
        for line in 0..buf.line_count() {
            let len = buf.line_len(line);
            if remaining <= len {
                return Location::new(line, remaining);
            }
            remaining -= len + 1;
        }
        buf.end()
    }

    /// Absolute UTF-8 byte offset of this location (lines joined with `\n`).
    pub fn to_byte_offset(self, buf: &TextBuffer) -> usize {
        let loc = buf.clamp(self);
        let before: usize = (0..loc.line)
            .map(|i| buf.line(i).map_or(0, str::len) + 1)
            .sum();
        let within = buf
            .line(loc.line)
            .map_or(0, |l| char_to_byte(l, loc.column));
        before + within
    }

    /// Inverse of [`Location::to_byte_offset`]. A byte offset inside a
    /// multi-byte character resolves to that character's column.
    pub fn from_byte_offset(offset: usize, buf: &TextBuffer) -> Location {
        let mut remaining = offset;
        for line in 0..buf.line_count() {
            let text = buf.line(line).unwrap_or_default();
            if remaining <= text.len() {
                let column = text
                    .char_indices()
                    .take_while(|(b, _)| *b < remaining)
                    .count();
                let column = if text.is_char_boundary(remaining) {
                    column
                } else {
                    column - 1
                };
                return Location::new(line, column);
            }
            remaining -= text.len() + 1;
        }
        buf.end()
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then(self.column.cmp(&other.column))
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1-based like every status line ever
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// Errors raised by buffer mutations given invalid input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    #[error("location {loc:?} is outside the buffer")]
    OutOfRange { loc: Location },
    #[error("invalid range {start:?}..{end:?}")]
    InvalidRange { start: Location, end: Location },
}

/// Byte index of character column `col` in `line` (clamped to the line end).
pub fn char_to_byte(line: &str, col: usize) -> usize {
    line.char_indices()
        .nth(col)
        .map_or(line.len(), |(byte, _)| byte)
}

/// Location reached by writing `text` starting at `start`.
pub fn advance(start: Location, text: &str) -> Location {
    match text.rfind('\n') {
        None => Location::new(start.line, start.column + text.chars().count()),
        Some(last_nl) => Location::new(
            start.line + text.matches('\n').count(),
            text[last_nl + 1..].chars().count(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(text: &str) -> TextBuffer {
        TextBuffer::from_text("t", text)
    }

    #[test]
    fn ordering_is_line_first() {
        assert!(Location::new(0, 9) < Location::new(1, 0));
        assert!(Location::new(2, 1) > Location::new(2, 0));
    }

    #[test]
    fn move_by_crosses_lines() {
        let b = buf("ab\ncd");
        assert_eq!(Location::new(0, 2).move_by(1, &b), Location::new(1, 0));
        assert_eq!(Location::new(1, 0).move_by(-1, &b), Location::new(0, 2));
        assert_eq!(Location::new(0, 1).move_by(3, &b), Location::new(1, 1));
    }

    #[test]
    fn move_by_clamps_at_buffer_edges() {
        let b = buf("ab\ncd");
        assert_eq!(Location::new(0, 1).move_by(-10, &b), Location::origin());
        assert_eq!(Location::new(1, 0).move_by(99, &b), Location::new(1, 2));
    }

    #[test]
    fn char_and_byte_offsets_count_newline_once() {
        let b = buf("h\u{e9}llo\nw\u{f6}rld");
        let loc = Location::new(1, 2);
        assert_eq!(loc.to_char_offset(&b), 8);
        // 'é' is two bytes, 'ö' is two bytes
        assert_eq!(loc.to_byte_offset(&b), 10);
        assert_eq!(Location::from_char_offset(8, &b), loc);
        assert_eq!(Location::from_byte_offset(10, &b), loc);
    }

    #[test]
    fn byte_offset_inside_char_rounds_down() {
        let b = buf("a\u{e9}b");
        assert_eq!(Location::from_byte_offset(2, &b), Location::new(0, 1));
    }

    #[test]
    fn advance_over_multiline_text() {
        assert_eq!(advance(Location::new(3, 4), "xy"), Location::new(3, 6));
        assert_eq!(advance(Location::new(3, 4), "x\nyz"), Location::new(4, 2));
    }
}
