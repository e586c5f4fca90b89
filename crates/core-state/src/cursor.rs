//! Cursor and selection state machine.
//!
//! The cursor never holds a reference to its buffer; every operation takes
//! the owning [`TextBuffer`] and clamps instead of failing. The selection is
//! stored as a normalized pair (`start <= end`); an empty pair means "no
//! selection".

use core_text::motion::{self, leading_whitespace};
use core_text::width::{column_for_visual, visual_column};
use core_text::{BufferError, Location, TextBuffer};
use tracing::trace;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    pub loc: Location,
    selection: (Location, Location),
    /// Fixed end of a keyboard-extended selection.
    anchor: Option<Location>,
    /// Visual column requested by the last horizontal move.
    last_visual_x: usize,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(loc: Location, buf: &TextBuffer) -> Self {
        let mut c = Self::new();
        c.goto(loc, buf);
        c
    }

    /// Jump to `loc` (clamped) and remember its visual column.
    pub fn goto(&mut self, loc: Location, buf: &TextBuffer) {
        self.loc = buf.clamp(loc);
        self.store_visual_x(buf);
    }

    pub fn last_visual_x(&self) -> usize {
        self.last_visual_x
    }

    pub fn visual_x(&self, buf: &TextBuffer) -> usize {
        let line = buf.line(self.loc.line).unwrap_or_default();
        visual_column(line, self.loc.column, buf.settings.tab_size)
    }

    fn store_visual_x(&mut self, buf: &TextBuffer) {
        self.last_visual_x = self.visual_x(buf);
    }

    pub fn left(&mut self, buf: &TextBuffer) {
        if self.loc == buf.start() {
            return;
        }
        self.loc = self.loc.move_by(-1, buf);
        self.store_visual_x(buf);
    }

    pub fn right(&mut self, buf: &TextBuffer) {
        if self.loc == buf.end() {
            return;
        }
        self.loc = self.loc.move_by(1, buf);
        self.store_visual_x(buf);
    }

    pub fn up(&mut self, buf: &TextBuffer) {
        self.up_n(1, buf);
    }

    pub fn down(&mut self, buf: &TextBuffer) {
        self.down_n(1, buf);
    }

    /// Move up `n` lines keeping the remembered visual column.
    pub fn up_n(&mut self, n: usize, buf: &TextBuffer) {
        let target = self.loc.line.saturating_sub(n);
        if self.loc.line < n {
            self.last_visual_x = 0;
        }
        self.vertical_to(target, buf);
    }

    pub fn down_n(&mut self, n: usize, buf: &TextBuffer) {
        let target = (self.loc.line + n).min(buf.line_count() - 1);
        self.vertical_to(target, buf);
    }

    fn vertical_to(&mut self, line: usize, buf: &TextBuffer) {
        if line == self.loc.line {
            return;
        }
        let text = buf.line(line).unwrap_or_default();
        let column = column_for_visual(text, self.last_visual_x, buf.settings.tab_size);
        self.loc = Location::new(line, column);
        trace!(target: "state.cursor", line, column, visual_x = self.last_visual_x, "vertical_move");
    }

    pub fn word_left(&mut self, buf: &TextBuffer) {
        self.loc = motion::word_left(buf, self.loc);
        self.store_visual_x(buf);
    }

    pub fn word_right(&mut self, buf: &TextBuffer) {
        self.loc = motion::word_right(buf, self.loc);
        self.store_visual_x(buf);
    }

    /// Column 0 of the current line.
    pub fn start(&mut self) {
        self.loc.column = 0;
        self.last_visual_x = 0;
    }

    /// First non-whitespace character of the current line.
    pub fn start_of_text(&mut self, buf: &TextBuffer) {
        let line = buf.line(self.loc.line).unwrap_or_default();
        self.loc.column = leading_whitespace(line).chars().count();
        self.store_visual_x(buf);
    }

    pub fn end(&mut self, buf: &TextBuffer) {
        self.loc.column = buf.line_len(self.loc.line);
        self.store_visual_x(buf);
    }

    pub fn buffer_start(&mut self, buf: &TextBuffer) {
        self.goto(buf.start(), buf);
    }

    pub fn buffer_end(&mut self, buf: &TextBuffer) {
        self.goto(buf.end(), buf);
    }

    /// Clamp cursor and selection after the buffer changed underneath.
    pub fn relocate(&mut self, buf: &TextBuffer) {
        self.loc = buf.clamp(self.loc);
        let (a, b) = self.selection;
        self.selection = (buf.clamp(a), buf.clamp(b));
        self.anchor = self.anchor.map(|a| buf.clamp(a));
    }

    // ---------------------------------------------------------------------
    // Selection
    // ---------------------------------------------------------------------

    pub fn has_selection(&self) -> bool {
        self.selection.0 < self.selection.1
    }

    /// Normalized selection bounds, `None` when empty.
    pub fn selection(&self) -> Option<(Location, Location)> {
        self.has_selection().then_some(self.selection)
    }

    /// Raw bounds, possibly empty.
    pub fn selection_bounds(&self) -> (Location, Location) {
        self.selection
    }

    pub fn anchor(&self) -> Option<Location> {
        self.anchor
    }

    pub fn set_anchor(&mut self, loc: Location) {
        self.anchor = Some(loc);
    }

    /// Set the selection start; an end before it collapses onto it.
    pub fn set_selection_start(&mut self, loc: Location) {
        self.selection.0 = loc;
        if self.selection.1 < loc {
            self.selection.1 = loc;
        }
    }

    /// Set the selection end; a start after it collapses onto it.
    pub fn set_selection_end(&mut self, loc: Location) {
        self.selection.1 = loc;
        if self.selection.0 > loc {
            self.selection.0 = loc;
        }
    }

    /// Select between `a` and `b` in either order.
    pub fn set_selection(&mut self, a: Location, b: Location) {
        self.selection = (a.min(b), a.max(b));
    }

    /// Extend the selection from the anchor to `loc`. Without an anchor the
    /// current cursor location becomes the anchor.
    pub fn select_to(&mut self, loc: Location) {
        let anchor = *self.anchor.get_or_insert(self.loc);
        self.set_selection(anchor, loc);
    }

    pub fn reset_selection(&mut self) {
        self.selection = (Location::origin(), Location::origin());
        self.anchor = None;
    }

    /// Selected text, empty without a selection.
    pub fn get_selection(&self, buf: &TextBuffer) -> String {
        match self.selection() {
            Some((start, end)) => buf.substr(start, end),
            None => String::new(),
        }
    }

    /// Remove the selected range, leaving the cursor at its start.
    pub fn delete_selection(&mut self, buf: &mut TextBuffer) -> Result<String, BufferError> {
        let Some((start, end)) = self.selection() else {
            return Ok(String::new());
        };
        let removed = buf.remove(start, end)?;
        self.reset_selection();
        self.goto(start, buf);
        Ok(removed)
    }

    /// Select the current line including its line break (the last line has
    /// none).
    pub fn select_line(&mut self, buf: &TextBuffer) {
        self.start();
        let start = self.loc;
        self.end(buf);
        let end = if self.loc.line + 1 < buf.line_count() {
            self.loc.move_by(1, buf)
        } else {
            self.loc
        };
        self.set_selection(start, end);
        self.anchor = Some(start);
    }

    pub fn select_all(&mut self, buf: &TextBuffer) {
        self.set_selection(buf.start(), buf.end());
        self.anchor = Some(buf.start());
        self.goto(buf.end(), buf);
    }

    /// Grow the selection to the innermost region in `regions` that contains
    /// it and differs from it. `regions` must be ordered innermost first.
    /// Returns false when no region grows the selection.
    pub fn select_enclosing(&mut self, regions: &[(Location, Location)], buf: &TextBuffer) -> bool {
        let current = self.selection().unwrap_or((self.loc, self.loc));
        let next = regions
            .iter()
            .copied()
            .map(|(a, b)| (buf.clamp(a.min(b)), buf.clamp(a.max(b))))
            .find(|r| r.0 <= current.0 && r.1 >= current.1 && *r != current);
        match next {
            Some((start, end)) => {
                self.set_selection(start, end);
                self.anchor = Some(start);
                self.goto(end, buf);
                true
            }
            None => false,
        }
    }
}

/// Lexical fallback for enclosing-region selection: the word under the
/// cursor, the line's text, then the whole buffer.
pub fn lexical_scopes(buf: &TextBuffer, loc: Location) -> Vec<(Location, Location)> {
    let mut scopes = Vec::with_capacity(3);
    if let Some(word) = motion::word_at(buf, loc) {
        scopes.push(word);
    }
    let line = buf.line(loc.line).unwrap_or_default();
    let indent = leading_whitespace(line).chars().count();
    let line_text = (
        Location::new(loc.line, indent),
        Location::new(loc.line, buf.line_len(loc.line)),
    );
    if line_text.0 < line_text.1 {
        scopes.push(line_text);
    }
    scopes.push((buf.start(), buf.end()));
    scopes
}
