use std::collections::VecDeque;

use tracing::trace;

use crate::{Location, advance};

/// Maximum number of entries retained in undo history.
pub const UNDO_HISTORY_MAX: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Insert,
    Remove,
    Replace,
}

/// One applied edit: `removed` was replaced by `inserted` at `start`.
///
/// An insert has an empty `removed`, a remove an empty `inserted`. The
/// affected range before the edit is `start..advance(start, removed)`, after
/// it `start..advance(start, inserted)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub kind: MutationKind,
    pub start: Location,
    pub removed: String,
    pub inserted: String,
}

impl Mutation {
    pub fn old_end(&self) -> Location {
        advance(self.start, &self.removed)
    }

    pub fn new_end(&self) -> Location {
        advance(self.start, &self.inserted)
    }

    pub fn inverse(&self) -> Mutation {
        let kind = match self.kind {
            MutationKind::Insert => MutationKind::Remove,
            MutationKind::Remove => MutationKind::Insert,
            MutationKind::Replace => MutationKind::Replace,
        };
        Mutation {
            kind,
            start: self.start,
            removed: self.inserted.clone(),
            inserted: self.removed.clone(),
        }
    }
}

/// A single undo step. Compound operations record several mutations.
pub type UndoEntry = Vec<Mutation>;

/// Two-stack mutation history. A new recorded edit clears the redo stack.
#[derive(Debug, Default, Clone)]
pub struct UndoHistory {
    undo_stack: VecDeque<UndoEntry>,
    redo_stack: Vec<UndoEntry>,
    open_group: Vec<Mutation>,
    group_depth: usize,
}

impl UndoHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn begin_group(&mut self) {
        self.group_depth += 1;
    }

    /// Close a group; the outermost close commits the collected mutations as
    /// one entry.
    pub fn end_group(&mut self) {
        if self.group_depth == 0 {
            return;
        }
        self.group_depth -= 1;
        if self.group_depth == 0 && !self.open_group.is_empty() {
            let entry = std::mem::take(&mut self.open_group);
            trace!(target: "text.undo", mutations = entry.len(), "group_committed");
            self.push_entry(entry);
        }
    }

    pub fn record(&mut self, mutation: Mutation) {
        if self.group_depth > 0 {
            self.open_group.push(mutation);
        } else {
            self.push_entry(vec![mutation]);
        }
    }

    fn push_entry(&mut self, entry: UndoEntry) {
        self.undo_stack.push_back(entry);
        trace!(target: "text.undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), "push_entry");
        if self.undo_stack.len() > UNDO_HISTORY_MAX {
            self.undo_stack.pop_front();
            trace!(target: "text.undo", "undo_stack_trimmed");
        }
        if !self.redo_stack.is_empty() {
            self.redo_stack.clear();
            trace!(target: "text.undo", "redo_stack_cleared_on_new_edit");
        }
    }

    /// Pop the newest undo entry, moving it onto the redo stack. The caller
    /// applies the inverse mutations in reverse order.
    pub fn pop_undo(&mut self) -> Option<UndoEntry> {
        let entry = self.undo_stack.pop_back()?;
        trace!(target: "text.undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len() + 1, "undo_pop");
        self.redo_stack.push(entry.clone());
        Some(entry)
    }

    /// Pop the newest redo entry, moving it back onto the undo stack.
    pub fn pop_redo(&mut self) -> Option<UndoEntry> {
        let entry = self.redo_stack.pop()?;
        trace!(target: "text.undo", redo_depth = self.redo_stack.len(), undo_depth = self.undo_stack.len() + 1, "redo_pop");
        self.undo_stack.push_back(entry.clone());
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ins(col: usize, text: &str) -> Mutation {
        Mutation {
            kind: MutationKind::Insert,
            start: Location::new(0, col),
            removed: String::new(),
            inserted: text.into(),
        }
    }

    #[test]
    fn new_record_clears_redo() {
        let mut h = UndoHistory::new();
        h.record(ins(0, "a"));
        h.record(ins(1, "b"));
        assert!(h.pop_undo().is_some());
        assert_eq!(h.redo_depth(), 1);
        h.record(ins(1, "c"));
        assert_eq!(h.redo_depth(), 0);
        assert_eq!(h.undo_depth(), 2);
    }

    #[test]
    fn nested_groups_commit_once() {
        let mut h = UndoHistory::new();
        h.begin_group();
        h.record(ins(0, "a"));
        h.begin_group();
        h.record(ins(1, "b"));
        h.end_group();
        assert_eq!(h.undo_depth(), 0);
        h.end_group();
        assert_eq!(h.undo_depth(), 1);
        assert_eq!(h.pop_undo().map(|e| e.len()), Some(2));
    }

    #[test]
    fn history_is_bounded() {
        let mut h = UndoHistory::new();
        for i in 0..UNDO_HISTORY_MAX + 5 {
            h.record(ins(i, "x"));
        }
        assert_eq!(h.undo_depth(), UNDO_HISTORY_MAX);
        let mut oldest = None;
        while let Some(entry) = h.pop_undo() {
            oldest = entry.first().map(|m| m.start.column);
        }
        assert_eq!(oldest, Some(5));
        assert_eq!(h.undo_depth(), 0);
    }

    #[test]
    fn inverse_swaps_text() {
        let m = Mutation {
            kind: MutationKind::Replace,
            start: Location::new(1, 2),
            removed: "old".into(),
            inserted: "new\ntext".into(),
        };
        let inv = m.inverse();
        assert_eq!(inv.removed, "new\ntext");
        assert_eq!(inv.inserted, "old");
        assert_eq!(m.new_end(), Location::new(2, 4));
        assert_eq!(inv.new_end(), Location::new(1, 5));
    }
}
