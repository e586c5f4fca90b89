//! Jump history navigation and gutter-message hopping.

use core_state::View;
use core_text::Location;

use super::{DispatchResult, io, report};
use crate::context::EditorContext;

/// Move the jump-history pointer and show its location, switching files when
/// it belongs to another buffer.
pub(crate) fn handle_jump(ctx: &mut EditorContext, view: &mut View, next: bool) -> DispatchResult {
    let target = if next { ctx.jumps.next() } else { ctx.jumps.prev() }.cloned();
    let Some(jump) = target else {
        view.set_info(if next { "No next location" } else { "No previous location" });
        return DispatchResult::done();
    };
    tracing::debug!(target: "actions.dispatch", op = "jump", next, line = jump.loc.line, column = jump.loc.column, "jump");
    match jump.path {
        Some(path) if view.buffer.path() != Some(path.as_path()) => {
            if let Err(err) = io::switch_file(ctx, view, &path, jump.loc) {
                return report(view, "jump", err);
            }
        }
        _ => {
            view.cursor.reset_selection();
            view.cursor.goto(jump.loc, &view.buffer);
        }
    }
    DispatchResult::done()
}

/// Move to the next line carrying a gutter message, wrapping to the top.
pub(crate) fn handle_goto_gutter_message(view: &mut View) -> DispatchResult {
    let line = view.gutter.first_line_after(view.cursor.loc.line).unwrap_or(0);
    view.cursor.reset_selection();
    view.cursor.goto(Location::new(line, 0), &view.buffer);
    DispatchResult::done()
}
