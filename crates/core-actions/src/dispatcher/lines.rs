//! Moving line blocks up and down.
//!
//! Boundary checks happen here: the buffer's own move is a silent no-op at
//! the edges, the action reports it.

use core_state::View;
use core_text::Location;

use super::DispatchResult;

pub(crate) fn handle_move_lines(view: &mut View, up: bool) -> DispatchResult {
    let selection = view.cursor.selection();
    // half-open line range [start, end)
    let (start, end) = match selection {
        Some((s, e)) if e.column == 0 && e.line > s.line => (s.line, e.line),
        Some((s, e)) => (s.line, e.line + 1),
        None => (view.cursor.loc.line, view.cursor.loc.line + 1),
    };
    let what = if selection.is_some() { "selected line(s)" } else { "current line" };

    let moved = if up {
        start > 0 && view.buffer.move_lines_up(start, end)
    } else {
        end < view.buffer.line_count() && view.buffer.move_lines_down(start, end)
    };
    if !moved {
        let dir = if up { "up" } else { "down" };
        view.set_info(format!("Can not move further {dir}"));
        tracing::debug!(target: "actions.dispatch", op = "move_lines", up, start, end, "move_lines_at_boundary");
        return DispatchResult::done();
    }

    let shift = |loc: Location| {
        let line = if up { loc.line.saturating_sub(1) } else { loc.line + 1 };
        Location::new(line, loc.column)
    };
    if let Some((s, e)) = selection {
        view.cursor.set_selection(shift(s), shift(e));
        if let Some(anchor) = view.cursor.anchor() {
            view.cursor.set_anchor(shift(anchor));
        }
    }
    let to = shift(view.cursor.loc);
    view.cursor.goto(to, &view.buffer);
    let dir = if up { "up" } else { "down" };
    view.set_info(format!("Moved {dir} {what}"));
    tracing::trace!(target: "actions.dispatch", op = "move_lines", up, start, end, "move_lines");
    DispatchResult::done()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_state::ViewId;
    use core_text::TextBuffer;

    fn view(text: &str) -> View {
        View::new(ViewId(0), TextBuffer::from_text("t", text))
    }

    fn status(v: &View) -> &str {
        v.status().map_or("", |s| s.text.as_str())
    }

    #[test]
    fn current_line_moves_with_cursor() {
        let mut v = view("a\nb\nc");
        v.cursor.goto(Location::new(1, 1), &v.buffer);
        handle_move_lines(&mut v, true);
        assert_eq!(v.buffer.text(), "b\na\nc");
        assert_eq!(v.cursor.loc, Location::new(0, 1));
        assert_eq!(status(&v), "Moved up current line");
    }

    #[test]
    fn selected_block_moves_down() {
        let mut v = view("a\nb\nc\nd");
        v.cursor.set_selection(Location::new(0, 0), Location::new(2, 0));
        handle_move_lines(&mut v, false);
        assert_eq!(v.buffer.text(), "c\na\nb\nd");
        assert_eq!(v.cursor.selection(), Some((Location::new(1, 0), Location::new(3, 0))));
        assert_eq!(status(&v), "Moved down selected line(s)");
    }

    #[test]
    fn edges_report_and_leave_buffer_alone() {
        let mut v = view("a\nb");
        handle_move_lines(&mut v, true);
        assert_eq!(status(&v), "Can not move further up");
        v.cursor.goto(Location::new(1, 0), &v.buffer);
        handle_move_lines(&mut v, false);
        assert_eq!(status(&v), "Can not move further down");
        assert_eq!(v.buffer.text(), "a\nb");
        assert!(!v.buffer.is_modified());
    }
}
