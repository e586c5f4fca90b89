//! Copy, cut, paste and whole-line operations.

use core_state::{CutLineMode, SelectionKind, View};

use super::edit::paste_text;
use super::{DispatchResult, report};
use crate::context::EditorContext;

pub(crate) fn handle_copy(ctx: &mut EditorContext, view: &mut View) -> DispatchResult {
    if view.cursor.has_selection() {
        let text = view.cursor.get_selection(&view.buffer);
        if let Err(err) = ctx.clipboard.write_all(&text, SelectionKind::Clipboard) {
            return report(view, "copy", err);
        }
        view.cut_line.note_copy();
        view.set_info("Copied selection");
    }
    DispatchResult::done()
}

pub(crate) fn handle_cut(ctx: &mut EditorContext, view: &mut View) -> DispatchResult {
    if !view.cursor.has_selection() {
        return DispatchResult::declined();
    }
    let text = view.cursor.get_selection(&view.buffer);
    if let Err(err) = ctx.clipboard.write_all(&text, SelectionKind::Clipboard) {
        return report(view, "cut", err);
    }
    if let Err(err) = view.cursor.delete_selection(&mut view.buffer) {
        return report(view, "cut", err);
    }
    view.cut_line.note_copy();
    view.set_info("Cut selection");
    DispatchResult::done()
}

/// Cut the current line. Consecutive line cuts inside the configured window
/// accumulate in the clipboard.
pub(crate) fn handle_cut_line(ctx: &mut EditorContext, view: &mut View) -> DispatchResult {
    view.cursor.select_line(&view.buffer);
    if !view.cursor.has_selection() {
        return DispatchResult::declined();
    }
    let line = view.cursor.get_selection(&view.buffer);
    let now = ctx.clock.now();
    let mode = view.cut_line.decide(now, ctx.editor.cut_line_window());
    let written = match mode {
        CutLineMode::Append => ctx
            .clipboard
            .read_all(SelectionKind::Clipboard)
            .and_then(|clip| ctx.clipboard.write_all(&(clip + &line), SelectionKind::Clipboard)),
        CutLineMode::Replace => ctx.clipboard.write_all(&line, SelectionKind::Clipboard),
    };
    if let Err(err) = &written {
        // the line is still removed; only the clipboard update failed
        view.set_error(err.to_string());
    }
    view.cut_line.note_cut_line(now);
    if let Err(err) = view.cursor.delete_selection(&mut view.buffer) {
        return report(view, "cut_line", err);
    }
    tracing::debug!(target: "actions.clipboard", ?mode, bytes = line.len(), "cut_line");
    if written.is_ok() {
        view.set_info("Cut line");
    }
    DispatchResult::done()
}

pub(crate) fn handle_paste(ctx: &mut EditorContext, view: &mut View, kind: SelectionKind) -> DispatchResult {
    let clip = match ctx.clipboard.read_all(kind) {
        Ok(clip) => clip,
        Err(err) => return report(view, "paste", err),
    };
    if let Err(err) = paste_text(view, &clip) {
        return report(view, "paste", err);
    }
    view.cut_line = Default::default();
    view.set_info(format!("Pasted {}", kind.as_str()));
    DispatchResult::done()
}

pub(crate) fn handle_duplicate_line(view: &mut View) -> DispatchResult {
    let result = match view.cursor.selection() {
        Some((_, end)) => {
            let text = view.cursor.get_selection(&view.buffer);
            view.buffer.insert(end, &text).map(|_| ())
        }
        None => {
            view.cursor.end(&view.buffer);
            let line = view.buffer.line(view.cursor.loc.line).unwrap_or_default();
            let dup = format!("\n{line}");
            view.buffer.insert(view.cursor.loc, &dup).map(|_| {
                view.cursor.right(&view.buffer);
            })
        }
    };
    if let Err(err) = result {
        return report(view, "duplicate_line", err);
    }
    view.set_info("Duplicated line");
    DispatchResult::done()
}

pub(crate) fn handle_delete_line(view: &mut View) -> DispatchResult {
    view.cursor.select_line(&view.buffer);
    if !view.cursor.has_selection() {
        return DispatchResult::declined();
    }
    if let Err(err) = view.cursor.delete_selection(&mut view.buffer) {
        return report(view, "delete_line", err);
    }
    view.set_info("Deleted line");
    DispatchResult::done()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_state::ViewId;
    use core_text::{Location, TextBuffer};

    fn setup(text: &str) -> (EditorContext, View) {
        (
            EditorContext::default(),
            View::new(ViewId(0), TextBuffer::from_text("t", text)),
        )
    }

    #[test]
    fn cut_without_selection_declines() {
        let (mut ctx, mut v) = setup("abc");
        assert!(!handle_cut(&mut ctx, &mut v).done);
        assert!(v.status().is_none());
    }

    #[test]
    fn copy_then_paste_replaces_selection() {
        let (mut ctx, mut v) = setup("hello world");
        v.cursor.set_selection(Location::new(0, 0), Location::new(0, 5));
        handle_copy(&mut ctx, &mut v);
        assert_eq!(v.status().map(|s| s.text.as_str()), Some("Copied selection"));
        v.cursor.set_selection(Location::new(0, 6), Location::new(0, 11));
        handle_paste(&mut ctx, &mut v, SelectionKind::Clipboard);
        assert_eq!(v.buffer.text(), "hello hello");
        assert_eq!(v.cursor.loc, Location::new(0, 11));
    }

    #[test]
    fn duplicate_line_places_cursor_on_copy() {
        let (_, mut v) = setup("one\ntwo");
        handle_duplicate_line(&mut v);
        assert_eq!(v.buffer.text(), "one\none\ntwo");
        assert_eq!(v.cursor.loc, Location::new(1, 0));
    }

    #[test]
    fn duplicate_selection_inserts_after_it() {
        let (_, mut v) = setup("ab");
        v.cursor.set_selection(Location::new(0, 0), Location::new(0, 1));
        handle_duplicate_line(&mut v);
        assert_eq!(v.buffer.text(), "aab");
    }

    #[test]
    fn delete_line_removes_line_break() {
        let (_, mut v) = setup("one\ntwo\nthree");
        v.cursor.goto(Location::new(1, 1), &v.buffer);
        handle_delete_line(&mut v);
        assert_eq!(v.buffer.text(), "one\nthree");
        assert_eq!(v.cursor.loc, Location::new(1, 0));
    }
}
