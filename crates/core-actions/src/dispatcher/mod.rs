//! Action bodies.
//!
//! `dispatch` maps an [`ActionId`] onto the handler that mutates the view.
//! Handlers never call plugin hooks themselves; the pipeline brackets them.
//! Handlers that compose other actions call them directly (no hooks) the way
//! `SelectToStart` reuses `CursorStart`.
//!
//! Sub-modules:
//! * `motion`    - cursor and selection movement
//! * `edit`      - character insertion, deletion, indentation
//! * `clipboard` - copy / cut / paste / line duplication
//! * `lines`     - moving line blocks
//! * `undo`      - undo / redo
//! * `search`    - find / find next / find previous
//! * `io`        - save / save as, switching files
//! * `recording` - macro toggle and playback
//! * `intel`     - actions backed by code intelligence
//! * `history`   - jump history and gutter navigation

use core_state::View;

use crate::ActionId;
use crate::context::EditorContext;
use crate::probes::refresh_highlight;

mod clipboard;
pub(crate) mod edit;
mod history;
mod intel;
pub(crate) mod io;
mod lines;
mod motion;
mod recording;
mod search;
mod undo;

/// Result of running one action body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchResult {
    /// False when the body had nothing to do (e.g. `Cut` without a
    /// selection); the pipeline then skips the post-hook.
    pub done: bool,
}

impl DispatchResult {
    pub fn done() -> Self {
        Self { done: true }
    }

    pub fn declined() -> Self {
        Self { done: false }
    }

    pub(crate) fn from_bool(done: bool) -> Self {
        Self { done }
    }
}

pub(crate) fn dispatch(ctx: &mut EditorContext, view: &mut View, id: ActionId) -> DispatchResult {
    use ActionId::*;
    let result = match id {
        CursorUp | CursorDown | CursorLeft | CursorRight | WordLeft | WordRight | SelectUp
        | SelectDown | SelectLeft | SelectRight | SelectWordLeft | SelectWordRight | StartOfLine
        | EndOfLine | SelectToStartOfLine | SelectToEndOfLine | CursorStart | CursorEnd
        | SelectToStart | SelectToEnd | SelectAll => motion::handle_motion(id, ctx, view),
        InsertSpace => edit::handle_insert_space(view),
        InsertNewline => edit::handle_insert_newline(view),
        InsertTab => edit::handle_insert_tab(view),
        Backspace => edit::handle_backspace(view),
        Delete => edit::handle_delete(view),
        DeleteWordLeft => edit::handle_delete_word(view, false),
        DeleteWordRight => edit::handle_delete_word(view, true),
        IndentSelection => edit::handle_indent_selection(view),
        OutdentSelection => edit::handle_outdent_selection(view),
        OutdentLine => edit::handle_outdent_line(view),
        Copy => clipboard::handle_copy(ctx, view),
        Cut => clipboard::handle_cut(ctx, view),
        CutLine => clipboard::handle_cut_line(ctx, view),
        DuplicateLine => clipboard::handle_duplicate_line(view),
        DeleteLine => clipboard::handle_delete_line(view),
        Paste => clipboard::handle_paste(ctx, view, core_state::SelectionKind::Clipboard),
        PastePrimary => clipboard::handle_paste(ctx, view, core_state::SelectionKind::Primary),
        MoveLinesUp => lines::handle_move_lines(view, true),
        MoveLinesDown => lines::handle_move_lines(view, false),
        Undo => undo::handle_undo(view),
        Redo => undo::handle_redo(view),
        Find => search::handle_find(ctx, view),
        FindNext => search::handle_find_next(ctx, view, true),
        FindPrevious => search::handle_find_next(ctx, view, false),
        Save => io::handle_save(ctx, view),
        SaveAs => io::handle_save_as(ctx, view),
        Format => intel::handle_format(ctx, view),
        Lint => intel::handle_lint(ctx, view),
        Template => intel::handle_template(ctx, view),
        ExtractVariable => intel::handle_extract_variable(ctx, view),
        Autocomplete => intel::handle_autocomplete(ctx, view),
        Rename => intel::handle_rename(ctx, view),
        Describe => intel::handle_describe(ctx, view),
        Referrers => intel::handle_referrers(ctx, view),
        GotoDefinition => intel::handle_goto_definition(ctx, view),
        SelectWord => intel::handle_select_word(ctx, view),
        NextLoc => history::handle_jump(ctx, view, true),
        PrevLoc => history::handle_jump(ctx, view, false),
        GotoGutterMessage => history::handle_goto_gutter_message(view),
        ToggleMacro => recording::handle_toggle(ctx, view),
        PlayMacro => recording::handle_play(ctx, view),
        Escape => search::handle_escape(ctx, view),
    };
    tracing::trace!(target: "actions.dispatch", action = %id, done = result.done, line = view.cursor.loc.line, column = view.cursor.loc.column, "dispatched");
    if result.done {
        refresh_highlight(ctx, view);
    }
    result
}

/// Report a buffer error as a status message instead of propagating it.
pub(crate) fn report<E: std::fmt::Display>(view: &mut View, op: &'static str, err: E) -> DispatchResult {
    tracing::warn!(target: "actions.dispatch", op, %err, "action_failed");
    view.set_error(err.to_string());
    DispatchResult::declined()
}
