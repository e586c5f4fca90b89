use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::undo::{Mutation, MutationKind, UndoEntry, UndoHistory};
use crate::{
    BufferError, BufferSettings, LineEnding, Location, advance, char_to_byte,
    normalize_line_endings,
};

/// Document text plus modification state and undo history.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    lines: Vec<String>,
    name: String,
    path: Option<PathBuf>,
    modified: bool,
    revision: u64,
    line_ending: LineEnding,
    trailing_newline: bool,
    history: UndoHistory,
    pub settings: BufferSettings,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::from_text("untitled", "")
    }
}

impl TextBuffer {
    /// Build a buffer from in-memory text. Line endings are normalized to LF
    /// and restored by [`TextBuffer::serialize`].
    pub fn from_text(name: impl Into<String>, content: &str) -> Self {
        let norm = normalize_line_endings(content);
        let body = if norm.had_trailing_newline {
            &norm.normalized[..norm.normalized.len() - 1]
        } else {
            norm.normalized.as_str()
        };
        Self {
            lines: body.split('\n').map(str::to_string).collect(),
            name: name.into(),
            path: None,
            modified: false,
            revision: 0,
            line_ending: norm.original,
            trailing_newline: norm.had_trailing_newline,
            history: UndoHistory::new(),
            settings: BufferSettings::default(),
        }
    }

    /// Build a buffer for `path`, naming it after the file name.
    pub fn for_path(path: impl Into<PathBuf>, content: &str) -> Self {
        let path = path.into();
        let mut buf = Self::from_text(display_name(&path), content);
        buf.path = Some(path);
        buf
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.name = display_name(&path);
        self.path = Some(path);
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Clear the modified flag after a successful save.
    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    /// Counter bumped by every applied mutation, undo and redo included.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn undo_depth(&self) -> usize {
        self.history.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.history.redo_depth()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Line text without its terminator.
    pub fn line(&self, idx: usize) -> Option<&str> {
        self.lines.get(idx).map(String::as_str)
    }

    /// Line length in characters (0 for out-of-range lines).
    pub fn line_len(&self, idx: usize) -> usize {
        self.lines.get(idx).map_or(0, |l| l.chars().count())
    }

    pub fn start(&self) -> Location {
        Location::origin()
    }

    pub fn end(&self) -> Location {
        let last = self.lines.len() - 1;
        Location::new(last, self.line_len(last))
    }

    pub fn is_valid(&self, loc: Location) -> bool {
        loc.line < self.lines.len() && loc.column <= self.line_len(loc.line)
    }

    pub fn clamp(&self, loc: Location) -> Location {
        if loc.line >= self.lines.len() {
            return self.end();
        }
        Location::new(loc.line, loc.column.min(self.line_len(loc.line)))
    }

    /// Character at `loc`, `None` at end of line.
    pub fn char_at(&self, loc: Location) -> Option<char> {
        self.lines.get(loc.line)?.chars().nth(loc.column)
    }

    /// Text of the half-open range `[start, end)`, clamped to the buffer.
    pub fn substr(&self, start: Location, end: Location) -> String {
        let (start, end) = (self.clamp(start), self.clamp(end));
        if start >= end {
            return String::new();
        }
        if start.line == end.line {
            let line = &self.lines[start.line];
            return line[char_to_byte(line, start.column)..char_to_byte(line, end.column)]
                .to_string();
        }
        let first = &self.lines[start.line];
        let mut out = first[char_to_byte(first, start.column)..].to_string();
        for line in &self.lines[start.line + 1..end.line] {
            out.push('\n');
            out.push_str(line);
        }
        let last = &self.lines[end.line];
        out.push('\n');
        out.push_str(&last[..char_to_byte(last, end.column)]);
        out
    }

    /// Full buffer contents joined with `\n`.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Contents as they should be written to disk (original line ending and
    /// trailing newline preserved).
    pub fn serialize(&self) -> String {
        let mut out = self.lines.join(self.line_ending.as_str());
        if self.trailing_newline {
            out.push_str(self.line_ending.as_str());
        }
        out
    }

    pub fn indent_string(&self) -> String {
        self.settings.indent_string()
    }

    /// Insert `text` at `loc`, returning the location just past it.
    pub fn insert(&mut self, loc: Location, text: &str) -> Result<Location, BufferError> {
        if !self.is_valid(loc) {
            return Err(BufferError::OutOfRange { loc });
        }
        if text.is_empty() {
            return Ok(loc);
        }
        let text = normalize_line_endings(text).normalized;
        let mutation = Mutation {
            kind: MutationKind::Insert,
            start: loc,
            removed: String::new(),
            inserted: text,
        };
        let end = mutation.new_end();
        self.commit(mutation);
        Ok(end)
    }

    /// Remove `[start, end)` and return the removed text.
    pub fn remove(&mut self, start: Location, end: Location) -> Result<String, BufferError> {
        self.check_range(start, end)?;
        if start == end {
            return Ok(String::new());
        }
        let removed = self.substr(start, end);
        self.commit(Mutation {
            kind: MutationKind::Remove,
            start,
            removed: removed.clone(),
            inserted: String::new(),
        });
        Ok(removed)
    }

    /// Replace `[start, end)` with `text` as a single mutation. Returns the end
    /// of the inserted text.
    pub fn replace(
        &mut self,
        start: Location,
        end: Location,
        text: &str,
    ) -> Result<Location, BufferError> {
        self.check_range(start, end)?;
        let text = normalize_line_endings(text).normalized;
        let removed = self.substr(start, end);
        if removed == text {
            return Ok(advance(start, &text));
        }
        let mutation = Mutation {
            kind: MutationKind::Replace,
            start,
            removed,
            inserted: text,
        };
        let new_end = mutation.new_end();
        self.commit(mutation);
        Ok(new_end)
    }

    /// Replace the whole document in one undo step. Returns the end of the
    /// new text.
    pub fn replace_all(&mut self, text: &str) -> Result<Location, BufferError> {
        let (start, end) = (self.start(), self.end());
        let new_end = self.replace(start, end, text)?;
        debug!(target: "text.buffer", lines = self.lines.len(), "replace_all");
        Ok(new_end)
    }

    /// Run `f` with every mutation it makes recorded as one undo step.
    pub fn group<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.history.begin_group();
        let out = f(self);
        self.history.end_group();
        out
    }

    /// Move lines `start..end` up by one, swapping them with line `start - 1`.
    /// Returns false (and changes nothing) at the top of the buffer.
    pub fn move_lines_up(&mut self, start: usize, end: usize) -> bool {
        if start < 1 || start >= end || end > self.lines.len() {
            return false;
        }
        let mut rotated = self.lines[start..end].join("\n");
        rotated.push('\n');
        rotated.push_str(&self.lines[start - 1]);
        let from = Location::new(start - 1, 0);
        let to = Location::new(end - 1, self.line_len(end - 1));
        self.replace(from, to, &rotated).is_ok()
    }

    /// Move lines `start..end` down by one, swapping them with line `end`.
    /// Returns false at the bottom of the buffer.
    pub fn move_lines_down(&mut self, start: usize, end: usize) -> bool {
        if start >= end || end >= self.lines.len() {
            return false;
        }
        let mut rotated = self.lines[end].clone();
        rotated.push('\n');
        rotated.push_str(&self.lines[start..end].join("\n"));
        let from = Location::new(start, 0);
        let to = Location::new(end, self.line_len(end));
        self.replace(from, to, &rotated).is_ok()
    }

    /// Undo the newest entry. Returns where the cursor should go, or `None`
    /// when there is nothing to undo.
    pub fn undo(&mut self) -> Option<Location> {
        let entry = self.history.pop_undo()?;
        let inverses: UndoEntry = entry.iter().rev().map(Mutation::inverse).collect();
        for m in &inverses {
            self.apply(m);
        }
        self.touch();
        entry.iter().map(|m| m.start).min()
    }

    /// Redo the newest undone entry.
    pub fn redo(&mut self) -> Option<Location> {
        let entry = self.history.pop_redo()?;
        for m in &entry {
            self.apply(m);
        }
        self.touch();
        entry.iter().map(|m| m.start).min()
    }

    fn check_range(&self, start: Location, end: Location) -> Result<(), BufferError> {
        if !self.is_valid(start) {
            return Err(BufferError::OutOfRange { loc: start });
        }
        if !self.is_valid(end) {
            return Err(BufferError::OutOfRange { loc: end });
        }
        if start > end {
            return Err(BufferError::InvalidRange { start, end });
        }
        Ok(())
    }

    fn commit(&mut self, mutation: Mutation) {
        self.apply(&mutation);
        self.touch();
        trace!(target: "text.buffer", kind = ?mutation.kind, start = %mutation.start, removed = mutation.removed.len(), inserted = mutation.inserted.len(), revision = self.revision, "mutation");
        self.history.record(mutation);
    }

    fn touch(&mut self) {
        self.modified = true;
        self.revision += 1;
    }

    /// Splice `m` into the line vector without touching history.
    fn apply(&mut self, m: &Mutation) {
        let start = m.start;
        let end = m.old_end();
        let first = &self.lines[start.line];
        let head = first[..char_to_byte(first, start.column)].to_string();
        let last = &self.lines[end.line];
        let tail = last[char_to_byte(last, end.column)..].to_string();

        let joined = format!("{head}{}{tail}", m.inserted);
        let replacement: Vec<String> = joined.split('\n').map(str::to_string).collect();
        self.lines.splice(start.line..=end.line, replacement);
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string()
}
