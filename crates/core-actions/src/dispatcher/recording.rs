//! Macro toggle and playback.

use core_state::View;

use super::DispatchResult;
use super::edit::insert_char;
use crate::context::EditorContext;
use crate::macros::MacroEntry;
use crate::pipeline::perform_action;

pub(crate) fn handle_toggle(ctx: &mut EditorContext, view: &mut View) -> DispatchResult {
    if ctx.macros.toggle() {
        view.set_info("Recording");
    } else {
        view.set_info("Stopped recording");
    }
    DispatchResult::done()
}

/// Replay the last recording. Characters go through `insert_char` so
/// plugins see each rune; actions run through the full hook pipeline.
pub(crate) fn handle_play(ctx: &mut EditorContext, view: &mut View) -> DispatchResult {
    let entries = ctx.macros.begin_playback();
    tracing::debug!(target: "actions.macro", entries = entries.len(), "macro_play");
    for entry in entries {
        match entry {
            MacroEntry::Char(ch) => insert_char(ctx, view, ch),
            MacroEntry::Action(id) => {
                perform_action(ctx, view, id, true);
            }
        }
    }
    ctx.macros.end_playback();
    DispatchResult::done()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ActionId;
    use core_state::ViewId;
    use core_text::{Location, TextBuffer};

    #[test]
    fn toggle_reports_state() {
        let mut ctx = EditorContext::default();
        let mut v = View::new(ViewId(0), TextBuffer::from_text("t", ""));
        handle_toggle(&mut ctx, &mut v);
        assert_eq!(v.status().map(|s| s.text.as_str()), Some("Recording"));
        handle_toggle(&mut ctx, &mut v);
        assert_eq!(v.status().map(|s| s.text.as_str()), Some("Stopped recording"));
    }

    #[test]
    fn playback_replays_chars_and_actions_without_rerecording() {
        let mut ctx = EditorContext::default();
        ctx.macros.set_entries(vec![
            MacroEntry::Char('x'),
            MacroEntry::Action(ActionId::CursorLeft),
            MacroEntry::Char('y'),
        ]);
        let mut v = View::new(ViewId(0), TextBuffer::from_text("t", "ab"));
        v.cursor.goto(Location::new(0, 1), &v.buffer);
        assert!(handle_play(&mut ctx, &mut v).done);
        assert_eq!(v.buffer.text(), "ayxb");
        assert_eq!(ctx.macros.entries().len(), 3);
        assert!(!ctx.macros.is_playing());
    }
}
