//! Undo / redo dispatch.
//!
//! The buffer owns both stacks; this layer moves the cursor to the edited
//! region and reports empty stacks as information, not errors.

use core_state::View;

use super::DispatchResult;

pub(crate) fn handle_undo(view: &mut View) -> DispatchResult {
    let before = view.buffer.undo_depth();
    match view.buffer.undo() {
        Some(loc) => {
            view.cursor.reset_selection();
            view.cursor.goto(loc, &view.buffer);
            tracing::trace!(target: "actions.dispatch", op = "undo", depth = before, line = loc.line, column = loc.column, "undo");
            view.set_info("Undid action");
        }
        None => view.set_info("Nothing to undo"),
    }
    DispatchResult::done()
}

pub(crate) fn handle_redo(view: &mut View) -> DispatchResult {
    let before = view.buffer.redo_depth();
    match view.buffer.redo() {
        Some(loc) => {
            view.cursor.reset_selection();
            view.cursor.goto(loc, &view.buffer);
            tracing::trace!(target: "actions.dispatch", op = "redo", depth = before, line = loc.line, column = loc.column, "redo");
            view.set_info("Redid action");
        }
        None => view.set_info("Nothing to redo"),
    }
    DispatchResult::done()
}
