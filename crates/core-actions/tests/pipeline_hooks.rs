mod common;

use std::sync::Arc;

use common::{HookLog, Recorder, run, status, view};
use core_actions::{ActionId, ActionOutcome, EditorContext, MacroEntry, ScriptedPrompter, handle_key};
use core_events::{KeyCode, KeyEvent};
use core_plugin::PluginRegistry;
use core_state::ViewId;
use core_text::Location;
use pretty_assertions::assert_eq;

#[test]
fn vetoed_save_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "on disk\n").unwrap();

    let log = Arc::new(HookLog::default());
    let mut ctx = EditorContext::default();
    ctx.plugins.register(Recorder::boxed(&log, Some("Save")));
    let mut v = ctx.open_view(ViewId(1), Some(path.as_path())).unwrap();
    v.buffer.insert(Location::new(0, 0), "edited ").unwrap();

    assert_eq!(run(&mut ctx, &mut v, ActionId::Save), ActionOutcome::Vetoed);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "on disk\n");
    assert!(v.buffer.is_modified());
    assert_eq!(log.calls(), vec!["preSave"]);

    ctx.plugins = PluginRegistry::new();
    assert!(run(&mut ctx, &mut v, ActionId::Save).is_completed());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "edited on disk\n");
    assert_eq!(status(&v), format!("Saved {}", path.display()));
}

#[test]
fn save_as_fires_save_hooks_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");
    let log = Arc::new(HookLog::default());
    let mut ctx = EditorContext::default()
        .with_prompter(ScriptedPrompter::new([path.to_string_lossy().into_owned()]));
    ctx.plugins.register(Recorder::boxed(&log, None));
    let mut v = view("body");

    assert!(run(&mut ctx, &mut v, ActionId::SaveAs).is_completed());
    assert_eq!(log.calls(), vec!["preSaveAs", "preSave", "onSave", "onSaveAs"]);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "body");
}

#[test]
fn recorded_macro_replays_runes_through_plugins() {
    let log = Arc::new(HookLog::default());
    let mut ctx = EditorContext::default();
    ctx.plugins.register(Recorder::boxed(&log, None));
    let mut v = view("");

    run(&mut ctx, &mut v, ActionId::ToggleMacro);
    for c in ['h', 'i'] {
        handle_key(&mut ctx, &mut v, &KeyEvent::plain(KeyCode::Char(c)));
    }
    handle_key(&mut ctx, &mut v, &KeyEvent::plain(KeyCode::Enter));
    run(&mut ctx, &mut v, ActionId::ToggleMacro);
    assert_eq!(status(&v), "Stopped recording");
    assert_eq!(
        ctx.macros.entries(),
        &[
            MacroEntry::Char('h'),
            MacroEntry::Char('i'),
            MacroEntry::Action(ActionId::InsertNewline),
        ]
    );

    run(&mut ctx, &mut v, ActionId::PlayMacro);
    assert_eq!(v.buffer.text(), "hi\nhi\n");
    assert_eq!(log.runes(), vec!['h', 'i', 'h', 'i']);
    assert_eq!(ctx.macros.entries().len(), 3);
    let newline_hooks = log.calls().iter().filter(|c| *c == "onInsertNewline").count();
    assert_eq!(newline_hooks, 2);
}

#[test]
fn unknown_binding_reports_and_continues_chain() {
    let mut ctx = EditorContext::default();
    ctx.keymap.bind(KeyEvent::plain(KeyCode::F(2)), "Frobnicate,CursorEnd");
    let mut v = view("abc\ndef");
    handle_key(&mut ctx, &mut v, &KeyEvent::plain(KeyCode::F(2)));
    assert_eq!(v.cursor.loc, Location::new(1, 3));
}
