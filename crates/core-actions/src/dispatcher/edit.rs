//! Text mutation: character insertion, deletion and indentation.
//!
//! Every handler goes through `TextBuffer` mutations so each user-visible
//! operation is one undo step; multi-line indent and outdent are grouped.

use core_state::View;
use core_text::motion::leading_whitespace;
use core_text::{BufferError, Location, TextBuffer};

use super::{DispatchResult, report};
use crate::context::EditorContext;

/// Type `ch` at the cursor, replacing any selection. Records the character
/// into a recording macro and notifies plugins.
pub fn insert_char(ctx: &mut EditorContext, view: &mut View, ch: char) {
    if let Err(err) = type_char(view, ch) {
        report(view, "insert_char", err);
        return;
    }
    ctx.macros.record_char(ch);
    ctx.plugins.on_rune(ch, view);
}

fn type_char(view: &mut View, ch: char) -> Result<(), BufferError> {
    view.cursor.delete_selection(&mut view.buffer)?;
    let mut utf8 = [0u8; 4];
    view.buffer.insert(view.cursor.loc, ch.encode_utf8(&mut utf8))?;
    view.cursor.right(&view.buffer);
    tracing::trace!(target: "actions.dispatch", op = "insert_char", %ch, line = view.cursor.loc.line, column = view.cursor.loc.column, "edit");
    Ok(())
}

/// Insert a block of text (bracketed paste) at the cursor, replacing any
/// selection.
pub fn insert_text(view: &mut View, text: &str) {
    if let Err(err) = paste_text(view, text) {
        report(view, "insert_text", err);
    }
}

pub(crate) fn paste_text(view: &mut View, text: &str) -> Result<(), BufferError> {
    let View { buffer, cursor, .. } = view;
    let end = buffer.group(|buf| {
        cursor.delete_selection(buf)?;
        buf.insert(cursor.loc, text)
    })?;
    view.cursor.goto(end, &view.buffer);
    tracing::trace!(target: "actions.dispatch", op = "insert_text", bytes = text.len(), line = end.line, column = end.column, "edit");
    Ok(())
}

pub(crate) fn handle_insert_space(view: &mut View) -> DispatchResult {
    match type_char(view, ' ') {
        Ok(()) => DispatchResult::done(),
        Err(err) => report(view, "insert_space", err),
    }
}

pub(crate) fn handle_insert_newline(view: &mut View) -> DispatchResult {
    let View { buffer, cursor, .. } = view;
    let result = buffer.group(|buf| -> Result<(), BufferError> {
        cursor.delete_selection(buf)?;
        let ws = leading_whitespace(buf.line(cursor.loc.line).unwrap_or_default()).to_string();
        let at = buf.insert(cursor.loc, "\n")?;
        cursor.goto(at, buf);
        if !buf.settings.autoindent {
            return Ok(());
        }
        let at = buf.insert(cursor.loc, &ws)?;
        cursor.goto(at, buf);
        let prev = cursor.loc.line - 1;
        let prev_line = buf.line(prev).unwrap_or_default();
        if !prev_line.is_empty() && leading_whitespace(prev_line).len() == prev_line.len() && !buf.settings.keep_autoindent {
            let len = buf.line_len(prev);
            buf.remove(Location::new(prev, 0), Location::new(prev, len))?;
        }
        Ok(())
    });
    match result {
        Ok(()) => {
            tracing::trace!(target: "actions.dispatch", op = "insert_newline", line = view.cursor.loc.line, column = view.cursor.loc.column, "edit");
            DispatchResult::done()
        }
        Err(err) => report(view, "insert_newline", err),
    }
}

/// Insert indentation up to the next tab stop.
pub(crate) fn handle_insert_tab(view: &mut View) -> DispatchResult {
    if view.cursor.has_selection() {
        return DispatchResult::declined();
    }
    let indent = view.buffer.indent_string();
    let width = indent.chars().count().max(1);
    let n = width - view.cursor.visual_x(&view.buffer) % width;
    let piece: String = indent.chars().take(n).collect();
    match view.buffer.insert(view.cursor.loc, &piece) {
        Ok(end) => {
            view.cursor.goto(end, &view.buffer);
            DispatchResult::done()
        }
        Err(err) => report(view, "insert_tab", err),
    }
}

pub(crate) fn handle_backspace(view: &mut View) -> DispatchResult {
    if view.cursor.has_selection() {
        return match view.cursor.delete_selection(&mut view.buffer) {
            Ok(_) => DispatchResult::done(),
            Err(err) => report(view, "backspace", err),
        };
    }
    let loc = view.cursor.loc;
    if loc <= view.buffer.start() {
        return DispatchResult::done();
    }
    let settings = &view.buffer.settings;
    let tab_size = settings.tab_size.max(1);
    let line = view.buffer.line(loc.line).unwrap_or_default();
    let before: String = line.chars().take(loc.column).collect();
    let span = if settings.tabs_to_spaces
        && !before.is_empty()
        && before.chars().all(|c| c == ' ')
        && before.chars().count() % tab_size == 0
    {
        tab_size as isize
    } else {
        1
    };
    let from = loc.move_by(-span, &view.buffer);
    match view.buffer.remove(from, loc) {
        Ok(_) => {
            view.cursor.goto(from, &view.buffer);
            tracing::trace!(target: "actions.dispatch", op = "backspace", span, line = from.line, column = from.column, "edit");
            DispatchResult::done()
        }
        Err(err) => report(view, "backspace", err),
    }
}

pub(crate) fn handle_delete(view: &mut View) -> DispatchResult {
    if view.cursor.has_selection() {
        return match view.cursor.delete_selection(&mut view.buffer) {
            Ok(_) => DispatchResult::done(),
            Err(err) => report(view, "delete", err),
        };
    }
    let loc = view.cursor.loc;
    if loc < view.buffer.end() {
        let to = loc.move_by(1, &view.buffer);
        if let Err(err) = view.buffer.remove(loc, to) {
            return report(view, "delete", err);
        }
    }
    DispatchResult::done()
}

pub(crate) fn handle_delete_word(view: &mut View, right: bool) -> DispatchResult {
    if !view.cursor.has_selection() {
        view.cursor.set_anchor(view.cursor.loc);
    }
    if right {
        view.cursor.word_right(&view.buffer);
    } else {
        view.cursor.word_left(&view.buffer);
    }
    view.cursor.select_to(view.cursor.loc);
    match view.cursor.delete_selection(&mut view.buffer) {
        Ok(_) => DispatchResult::done(),
        Err(err) => report(view, "delete_word", err),
    }
}

/// Line span of a selection: its start line and the line of its last
/// selected character.
fn selected_lines(view: &View, start: Location, end: Location) -> (usize, Location) {
    (start.line, end.move_by(-1, &view.buffer))
}

pub(crate) fn handle_indent_selection(view: &mut View) -> DispatchResult {
    let Some((start, end)) = view.cursor.selection() else {
        return DispatchResult::declined();
    };
    let (start_line, last) = selected_lines(view, start, end);
    let indent = view.buffer.indent_string();
    let width = indent.chars().count();
    let View { buffer, cursor, .. } = view;
    let result = buffer.group(|buf| -> Result<(), BufferError> {
        for line in start_line..=last.line {
            buf.insert(Location::new(line, 0), &indent)?;
            if line == start_line && start.column > 0 {
                cursor.set_selection_start(Location::new(line, start.column + width));
            }
            if line == last.line {
                let end = Location::new(line, last.column + width).move_by(1, buf);
                cursor.set_selection_end(end);
            }
        }
        Ok(())
    });
    finish_block(view, "indent_selection", result)
}

pub(crate) fn handle_outdent_selection(view: &mut View) -> DispatchResult {
    let Some((start, end)) = view.cursor.selection() else {
        return DispatchResult::declined();
    };
    let (start_line, last) = selected_lines(view, start, end);
    let width = view.buffer.indent_string().chars().count();
    let View { buffer, cursor, .. } = view;
    let result = buffer.group(|buf| -> Result<(), BufferError> {
        for line in start_line..=last.line {
            let removed = strip_indent(buf, line, width)?;
            if removed == 0 {
                continue;
            }
            if line == start_line && start.column > 0 {
                let column = start.column.saturating_sub(removed);
                cursor.set_selection_start(Location::new(line, column));
            }
            if line == last.line {
                let column = last.column.saturating_sub(removed);
                let end = Location::new(line, column).move_by(1, buf);
                cursor.set_selection_end(end);
            }
        }
        Ok(())
    });
    finish_block(view, "outdent_selection", result)
}

pub(crate) fn handle_outdent_line(view: &mut View) -> DispatchResult {
    if view.cursor.has_selection() {
        return DispatchResult::declined();
    }
    let width = view.buffer.indent_string().chars().count();
    let line = view.cursor.loc.line;
    match strip_indent(&mut view.buffer, line, width) {
        Ok(removed) => {
            let column = view.cursor.loc.column.saturating_sub(removed);
            view.cursor.goto(Location::new(line, column), &view.buffer);
            DispatchResult::done()
        }
        Err(err) => report(view, "outdent_line", err),
    }
}

/// Remove up to `width` leading whitespace characters from `line`, stopping
/// early when the whitespace runs out. Returns how many were removed.
fn strip_indent(buf: &mut TextBuffer, line: usize, width: usize) -> Result<usize, BufferError> {
    let available = leading_whitespace(buf.line(line).unwrap_or_default()).chars().count();
    let n = available.min(width);
    if n > 0 {
        buf.remove(Location::new(line, 0), Location::new(line, n))?;
    }
    Ok(n)
}

fn finish_block(view: &mut View, op: &'static str, result: Result<(), BufferError>) -> DispatchResult {
    if let Err(err) = result {
        return report(view, op, err);
    }
    if let Some((_, end)) = view.cursor.selection() {
        view.cursor.goto(end, &view.buffer);
    }
    view.cursor.relocate(&view.buffer);
    tracing::trace!(target: "actions.dispatch", op, selection = ?view.cursor.selection(), "edit");
    DispatchResult::done()
}
