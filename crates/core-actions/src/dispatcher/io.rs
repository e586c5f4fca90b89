//! Saving buffers and switching the file a view shows.
//!
//! A save that hits "permission denied" asks whether to retry elevated.
//! `SaveAs` asks for a file name and then runs `Save` through the pipeline
//! so save hooks observe it.

use std::path::{Path, PathBuf};

use core_state::{Cursor, View};
use core_text::Location;

use super::DispatchResult;
use crate::ActionId;
use crate::context::EditorContext;
use crate::persist::PersistError;
use crate::pipeline::{ActionOutcome, perform_action};

const SUDO_QUESTION: &str = "Permission denied. Do you want to save this file using sudo? (y,n)";

pub(crate) fn handle_save(ctx: &mut EditorContext, view: &mut View) -> DispatchResult {
    let path = match view.buffer.path() {
        Some(path) => path.to_path_buf(),
        None => match ask_file_name(ctx) {
            Some(path) => {
                view.buffer.set_path(&path);
                path
            }
            None => return DispatchResult::declined(),
        },
    };
    save_to(ctx, view, &path)
}

pub(crate) fn handle_save_as(ctx: &mut EditorContext, view: &mut View) -> DispatchResult {
    let Some(path) = ask_file_name(ctx) else {
        return DispatchResult::declined();
    };
    view.buffer.set_path(&path);
    let outcome = perform_action(ctx, view, ActionId::Save, true);
    DispatchResult::from_bool(!matches!(outcome, ActionOutcome::Declined))
}

fn ask_file_name(ctx: &mut EditorContext) -> Option<PathBuf> {
    let answer = ctx.prompter.prompt("Filename: ", "")?;
    let name = answer.trim().trim_matches(|c| c == '"' || c == '\'');
    (!name.is_empty()).then(|| PathBuf::from(name))
}

fn save_to(ctx: &mut EditorContext, view: &mut View, path: &Path) -> DispatchResult {
    let contents = view.buffer.serialize();
    let result = match ctx.persistence.save(path, &contents) {
        Err(PersistError::PermissionDenied(_)) => {
            if !ctx.prompter.confirm(SUDO_QUESTION) {
                tracing::info!(target: "io", file = %path.display(), "elevated_save_declined");
                return DispatchResult::done();
            }
            ctx.persistence.save_elevated(path, &contents)
        }
        other => other,
    };
    match result {
        Ok(()) => {
            view.buffer.mark_saved();
            view.set_info(format!("Saved {}", path.display()));
            DispatchResult::done()
        }
        Err(err) => {
            tracing::error!(target: "io", file = %path.display(), %err, "file_write_error");
            view.set_error(err.to_string());
            DispatchResult::declined()
        }
    }
}

/// Save the current buffer (when it has unsaved changes on disk) and load
/// `path` into the view, placing the cursor at `loc`.
pub(crate) fn switch_file(
    ctx: &mut EditorContext,
    view: &mut View,
    path: &Path,
    loc: Location,
) -> Result<(), PersistError> {
    if view.buffer.path() != Some(path) {
        if let Some(current) = view.buffer.path().map(Path::to_path_buf)
            && view.buffer.is_modified()
        {
            ctx.persistence.save(&current, &view.buffer.serialize())?;
            view.buffer.mark_saved();
        }
        let buffer = ctx.open_buffer(Some(path))?;
        tracing::info!(target: "actions.dispatch", file = %path.display(), lines = buffer.line_count(), "switch_file");
        view.cancel_template();
        view.buffer = buffer;
        view.cursor = Cursor::new();
        view.gutter.clear_all();
        view.highlights.clear();
    }
    view.cursor.reset_selection();
    view.cursor.goto(loc, &view.buffer);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ScriptedPrompter;
    use crate::persist::Persistence;
    use core_state::ViewId;
    use core_text::TextBuffer;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct LockedDisk {
        writes: Arc<Mutex<Vec<(PathBuf, String, bool)>>>,
    }

    impl Persistence for LockedDisk {
        fn load(&mut self, _path: &Path) -> Result<Option<String>, PersistError> {
            Ok(Some("other".into()))
        }
        fn save(&mut self, path: &Path, _contents: &str) -> Result<(), PersistError> {
            Err(PersistError::PermissionDenied(path.to_path_buf()))
        }
        fn save_elevated(&mut self, path: &Path, contents: &str) -> Result<(), PersistError> {
            self.writes.lock().unwrap().push((path.to_path_buf(), contents.to_string(), true));
            Ok(())
        }
    }

    #[test]
    fn permission_denied_retries_elevated_on_yes() {
        let disk = LockedDisk::default();
        let mut ctx = EditorContext::default()
            .with_persistence(disk.clone())
            .with_prompter(ScriptedPrompter::new(["y"]));
        let mut v = View::new(ViewId(0), TextBuffer::for_path("/etc/motd", "hi"));
        v.buffer.insert(Location::new(0, 2), "!").unwrap();
        assert!(handle_save(&mut ctx, &mut v).done);
        assert!(!v.buffer.is_modified());
        assert_eq!(v.status().map(|s| s.text.as_str()), Some("Saved /etc/motd"));
        assert_eq!(disk.writes.lock().unwrap().len(), 1);
    }

    #[test]
    fn declining_sudo_keeps_buffer_modified() {
        let mut ctx = EditorContext::default()
            .with_persistence(LockedDisk::default())
            .with_prompter(ScriptedPrompter::new(["n"]));
        let mut v = View::new(ViewId(0), TextBuffer::for_path("/etc/motd", "hi"));
        v.buffer.insert(Location::new(0, 0), "x").unwrap();
        handle_save(&mut ctx, &mut v);
        assert!(v.buffer.is_modified());
    }

    #[test]
    fn unnamed_buffer_without_answer_is_not_saved() {
        let mut ctx = EditorContext::default();
        let mut v = View::new(ViewId(0), TextBuffer::from_text("scratch", "x"));
        assert!(!handle_save(&mut ctx, &mut v).done);
        assert!(v.buffer.path().is_none());
    }

    #[test]
    fn save_as_names_and_writes_the_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("named.txt");
        let mut ctx = EditorContext::default()
            .with_prompter(ScriptedPrompter::new([target.to_string_lossy().into_owned()]));
        let mut v = View::new(ViewId(0), TextBuffer::from_text("scratch", "body"));
        assert!(handle_save_as(&mut ctx, &mut v).done);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "body");
        assert_eq!(v.buffer.path(), Some(target.as_path()));
    }

    #[test]
    fn switch_file_loads_other_buffer() {
        let mut ctx = EditorContext::default().with_persistence(LockedDisk::default());
        let mut v = View::new(ViewId(0), TextBuffer::from_text("scratch", "x"));
        switch_file(&mut ctx, &mut v, Path::new("/tmp/other.rs"), Location::new(0, 3)).unwrap();
        assert_eq!(v.buffer.text(), "other");
        assert_eq!(v.cursor.loc, Location::new(0, 3));
    }
}
