//! Cross-file cursor jump history.

use std::collections::VecDeque;
use std::path::PathBuf;

use core_text::Location;
use serde::{Deserialize, Serialize};
use tracing::trace;

pub const JUMP_HISTORY_DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JumpLocation {
    pub path: Option<PathBuf>,
    pub loc: Location,
}

/// Bounded list of jump locations with a movable "current" pointer.
///
/// Pushing truncates everything after the pointer, appends, and moves the
/// pointer onto the new entry. Navigating moves only the pointer.
#[derive(Debug, Clone)]
pub struct CursorHistory {
    entries: VecDeque<JumpLocation>,
    current: usize,
    capacity: usize,
}

impl Default for CursorHistory {
    fn default() -> Self {
        Self::with_capacity(JUMP_HISTORY_DEFAULT_CAPACITY)
    }
}

impl CursorHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            current: 0,
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current(&self) -> Option<&JumpLocation> {
        self.entries.get(self.current)
    }

    pub fn push(&mut self, jump: JumpLocation) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.current + 1);
        }
        if self.entries.back() == Some(&jump) {
            return;
        }
        self.entries.push_back(jump);
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.current = self.entries.len() - 1;
        trace!(target: "state.history", len = self.entries.len(), current = self.current, "jump_push");
    }

    pub fn next(&mut self) -> Option<&JumpLocation> {
        if self.current + 1 >= self.entries.len() {
            return None;
        }
        self.current += 1;
        self.entries.get(self.current)
    }

    pub fn prev(&mut self) -> Option<&JumpLocation> {
        if self.current == 0 || self.entries.is_empty() {
            return None;
        }
        self.current -= 1;
        self.entries.get(self.current)
    }

    pub fn iter(&self) -> impl Iterator<Item = &JumpLocation> {
        self.entries.iter()
    }
}
