//! Cursor and selection movement.
//!
//! Plain motions collapse an existing selection first (onto its start or
//! end depending on direction); `Select*` motions anchor at the cursor when
//! nothing is selected yet and extend from that anchor.

use std::path::Path;

use core_state::{JumpLocation, View};
use core_text::Location;

use super::DispatchResult;
use crate::ActionId;
use crate::context::EditorContext;

pub(crate) fn handle_motion(id: ActionId, ctx: &mut EditorContext, view: &mut View) -> DispatchResult {
    let before = view.cursor.loc;
    match id {
        ActionId::CursorUp => {
            deselect(view, 0);
            view.cursor.up(&view.buffer);
        }
        ActionId::CursorDown => {
            deselect(view, 1);
            view.cursor.down(&view.buffer);
        }
        ActionId::CursorLeft => match view.cursor.selection() {
            Some((start, _)) => {
                view.cursor.goto(start, &view.buffer);
                view.cursor.reset_selection();
            }
            None => view.cursor.left(&view.buffer),
        },
        ActionId::CursorRight => match view.cursor.selection() {
            Some((_, end)) => {
                let to = end.move_by(-1, &view.buffer);
                view.cursor.goto(to, &view.buffer);
                view.cursor.reset_selection();
            }
            None => view.cursor.right(&view.buffer),
        },
        ActionId::WordLeft => view.cursor.word_left(&view.buffer),
        ActionId::WordRight => view.cursor.word_right(&view.buffer),
        ActionId::SelectUp => extend(view, |v| v.cursor.up(&v.buffer)),
        ActionId::SelectDown => extend(view, |v| v.cursor.down(&v.buffer)),
        ActionId::SelectLeft => {
            clamp_anchor(view);
            extend(view, |v| v.cursor.left(&v.buffer));
        }
        ActionId::SelectRight => {
            clamp_anchor(view);
            extend(view, |v| v.cursor.right(&v.buffer));
        }
        ActionId::SelectWordLeft => extend(view, |v| v.cursor.word_left(&v.buffer)),
        ActionId::SelectWordRight => extend(view, |v| v.cursor.word_right(&v.buffer)),
        ActionId::StartOfLine => {
            deselect(view, 0);
            view.cursor.start();
        }
        ActionId::EndOfLine => {
            deselect(view, 0);
            view.cursor.end(&view.buffer);
        }
        ActionId::SelectToStartOfLine => extend(view, |v| v.cursor.start()),
        ActionId::SelectToEndOfLine => extend(view, |v| v.cursor.end(&v.buffer)),
        ActionId::CursorStart => cursor_start(ctx, view),
        ActionId::CursorEnd => cursor_end(ctx, view),
        ActionId::SelectToStart => {
            let anchor = selection_anchor(view);
            cursor_start(ctx, view);
            view.cursor.set_anchor(anchor);
            view.cursor.select_to(view.cursor.loc);
        }
        ActionId::SelectToEnd => {
            let anchor = selection_anchor(view);
            cursor_end(ctx, view);
            view.cursor.set_anchor(anchor);
            view.cursor.select_to(view.cursor.loc);
        }
        ActionId::SelectAll => view.cursor.select_all(&view.buffer),
        other => {
            tracing::warn!(target: "actions.dispatch", action = %other, "not_a_motion");
            return DispatchResult::declined();
        }
    }
    tracing::trace!(target: "actions.dispatch", op = "motion", action = %id, from_line = before.line, from_column = before.column, line = view.cursor.loc.line, column = view.cursor.loc.column, "motion");
    DispatchResult::done()
}

/// Collapse the selection onto bound `index` (0 = start, 1 = end).
fn deselect(view: &mut View, index: usize) -> bool {
    let Some((start, end)) = view.cursor.selection() else {
        return false;
    };
    let to = if index == 0 { start } else { end };
    view.cursor.goto(to, &view.buffer);
    view.cursor.reset_selection();
    true
}

/// Anchor the buffer-wide selections keep across the jump.
fn selection_anchor(view: &View) -> Location {
    match view.cursor.anchor() {
        Some(anchor) if view.cursor.has_selection() => anchor,
        _ => view.cursor.loc,
    }
}

fn anchor_if_unselected(view: &mut View) {
    if !view.cursor.has_selection() {
        view.cursor.set_anchor(view.cursor.loc);
    }
}

/// Horizontal selection never anchors past the last character.
fn clamp_anchor(view: &mut View) {
    if view.cursor.has_selection() {
        return;
    }
    let last = view.buffer.end().move_by(-1, &view.buffer);
    view.cursor.set_anchor(view.cursor.loc.min(last));
}

fn extend(view: &mut View, step: impl FnOnce(&mut View)) {
    anchor_if_unselected(view);
    step(view);
    view.cursor.select_to(view.cursor.loc);
}

fn push_jump(ctx: &mut EditorContext, view: &View) {
    ctx.jumps.push(JumpLocation {
        path: view.buffer.path().map(Path::to_path_buf),
        loc: view.cursor.loc,
    });
}

fn cursor_start(ctx: &mut EditorContext, view: &mut View) {
    deselect(view, 0);
    view.cursor.goto(Location::origin(), &view.buffer);
    push_jump(ctx, view);
}

fn cursor_end(ctx: &mut EditorContext, view: &mut View) {
    deselect(view, 0);
    view.cursor.buffer_end(&view.buffer);
    push_jump(ctx, view);
}
