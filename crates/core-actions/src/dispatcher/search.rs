//! Find / FindNext / FindPrevious and Escape.
//!
//! The search term is process-wide (it lives in the context), so it carries
//! over when another file is opened in the view.

use core_state::View;
use core_text::Location;

use super::DispatchResult;
use crate::context::EditorContext;

/// Ask for a pattern (pre-filled with the selection) and jump to its first
/// match after the cursor.
pub(crate) fn handle_find(ctx: &mut EditorContext, view: &mut View) -> DispatchResult {
    let initial = view.cursor.get_selection(&view.buffer);
    let from = search_start(view, true);
    let Some(pattern) = ctx.prompter.prompt("Find: ", &initial) else {
        return DispatchResult::declined();
    };
    if let Err(err) = ctx.search.set(&pattern) {
        view.set_error(format!("Invalid search pattern: {err}"));
        return DispatchResult::declined();
    }
    jump_to_match(ctx, view, from, true)
}

/// Search again. A selection becomes the new (literal) term for forward
/// searches.
pub(crate) fn handle_find_next(ctx: &mut EditorContext, view: &mut View, forward: bool) -> DispatchResult {
    if forward && view.cursor.has_selection() {
        let selected = view.cursor.get_selection(&view.buffer);
        ctx.search.set_literal(&selected);
    }
    if !ctx.search.is_active() {
        return DispatchResult::done();
    }
    let from = search_start(view, forward);
    view.set_info(format!("Finding: {}", ctx.search.pattern()));
    jump_to_match(ctx, view, from, forward)
}

/// Leave search mode. Declines when no search is active.
pub(crate) fn handle_escape(ctx: &mut EditorContext, view: &mut View) -> DispatchResult {
    if !ctx.search.is_active() {
        return DispatchResult::declined();
    }
    tracing::debug!(target: "actions.search", pattern = ctx.search.pattern(), "search_cleared");
    ctx.search.clear();
    view.cursor.reset_selection();
    DispatchResult::done()
}

/// Forward searches start after the selection, backward ones before it.
fn search_start(view: &View, forward: bool) -> Location {
    match view.cursor.selection() {
        Some((start, end)) => {
            if forward {
                end
            } else {
                start
            }
        }
        None => view.cursor.loc,
    }
}

fn jump_to_match(ctx: &mut EditorContext, view: &mut View, from: Location, forward: bool) -> DispatchResult {
    let Some(re) = ctx.search.regex() else {
        return DispatchResult::declined();
    };
    match view.buffer.find(re, from, forward) {
        Some((start, end)) => {
            view.cursor.set_selection(start, end);
            view.cursor.set_anchor(start);
            view.cursor.goto(end, &view.buffer);
            tracing::trace!(target: "actions.search", pattern = ctx.search.pattern(), line = start.line, column = start.column, "search_hit");
        }
        None => view.set_info("No matches found"),
    }
    DispatchResult::done()
}
