//! Word-class motions.
//!
//! These operate purely on a `TextBuffer` + `Location` pair and are free of
//! cursor state. Characters fall into three classes (word, punctuation,
//! whitespace); a word motion skips whitespace and then one run of a single
//! class. Reaching a line edge crosses to the neighbouring line and stops.

use crate::{Location, TextBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Word,
    Punct,
    Whitespace,
}

pub fn char_class(c: char) -> CharClass {
    if c.is_whitespace() {
        CharClass::Whitespace
    } else if c.is_alphanumeric() || c == '_' {
        CharClass::Word
    } else {
        CharClass::Punct
    }
}

pub fn is_word_char(c: char) -> bool {
    char_class(c) == CharClass::Word
}

pub fn word_right(buf: &TextBuffer, loc: Location) -> Location {
    let loc = buf.clamp(loc);
    let chars: Vec<char> = buf.line(loc.line).unwrap_or_default().chars().collect();
    let len = chars.len();
    if loc.column >= len {
        if loc.line + 1 < buf.line_count() {
            return Location::new(loc.line + 1, 0);
        }
        return loc;
    }
    let mut col = loc.column;
    while col < len && char_class(chars[col]) == CharClass::Whitespace {
        col += 1;
    }
    if col < len {
        let class = char_class(chars[col]);
        while col < len && char_class(chars[col]) == class {
            col += 1;
        }
    }
    Location::new(loc.line, col)
}

pub fn word_left(buf: &TextBuffer, loc: Location) -> Location {
    let loc = buf.clamp(loc);
    if loc.column == 0 {
        if loc.line > 0 {
            return Location::new(loc.line - 1, buf.line_len(loc.line - 1));
        }
        return loc;
    }
    let chars: Vec<char> = buf.line(loc.line).unwrap_or_default().chars().collect();
    let mut col = loc.column;
    while col > 0 && char_class(chars[col - 1]) == CharClass::Whitespace {
        col -= 1;
    }
    if col > 0 {
        let class = char_class(chars[col - 1]);
        while col > 0 && char_class(chars[col - 1]) == class {
            col -= 1;
        }
    }
    Location::new(loc.line, col)
}

/// Bounds of the word touching `loc` (the character under it, or the one
/// before it at a word end). `None` when neither is a word character.
pub fn word_at(buf: &TextBuffer, loc: Location) -> Option<(Location, Location)> {
    let loc = buf.clamp(loc);
    let chars: Vec<char> = buf.line(loc.line)?.chars().collect();
    let anchor = if chars.get(loc.column).is_some_and(|c| is_word_char(*c)) {
        loc.column
    } else if loc.column > 0 && is_word_char(chars[loc.column - 1]) {
        loc.column - 1
    } else {
        return None;
    };
    let mut start = anchor;
    while start > 0 && is_word_char(chars[start - 1]) {
        start -= 1;
    }
    let mut end = anchor + 1;
    while end < chars.len() && is_word_char(chars[end]) {
        end += 1;
    }
    Some((Location::new(loc.line, start), Location::new(loc.line, end)))
}

/// Leading whitespace of `line`.
pub fn leading_whitespace(line: &str) -> &str {
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}
