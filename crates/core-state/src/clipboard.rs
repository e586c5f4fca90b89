//! Clipboard contract and the cut-line coalescing policy.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::trace;

/// Which system selection to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionKind {
    Clipboard,
    Primary,
}

impl SelectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SelectionKind::Clipboard => "clipboard",
            SelectionKind::Primary => "primary",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClipboardError {
    #[error("{0} selection is not available")]
    Unavailable(&'static str),
    #[error("clipboard backend failed: {0}")]
    Backend(String),
}

pub trait Clipboard: Send {
    fn read_all(&mut self, kind: SelectionKind) -> Result<String, ClipboardError>;
    fn write_all(&mut self, text: &str, kind: SelectionKind) -> Result<(), ClipboardError>;
}

/// Process-local clipboard used when no OS clipboard is wired in.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    slots: HashMap<SelectionKind, String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self, kind: SelectionKind) -> Option<&str> {
        self.slots.get(&kind).map(String::as_str)
    }
}

impl Clipboard for MemoryClipboard {
    fn read_all(&mut self, kind: SelectionKind) -> Result<String, ClipboardError> {
        Ok(self.slots.get(&kind).cloned().unwrap_or_default())
    }

    fn write_all(&mut self, text: &str, kind: SelectionKind) -> Result<(), ClipboardError> {
        self.slots.insert(kind, text.to_string());
        Ok(())
    }
}

/// What a `CutLine` should do with the clipboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutLineMode {
    /// Append the cut line to the current clipboard content.
    Append,
    /// Replace the clipboard with the cut line.
    Replace,
}

/// Per-view bookkeeping for consecutive line cuts.
///
/// `fresh_clip` is set by every copy or cut. A line cut appends only while
/// the clip is fresh and the previous line cut happened within the window;
/// anything else replaces, after which the clip is fresh again.
#[derive(Debug, Clone, Default)]
pub struct CutLineState {
    fresh_clip: bool,
    last_cut: Option<Instant>,
}

impl CutLineState {
    pub fn fresh_clip(&self) -> bool {
        self.fresh_clip
    }

    /// A plain copy or cut happened.
    pub fn note_copy(&mut self) {
        self.fresh_clip = true;
        self.last_cut = None;
    }

    /// Decide how the line cut at `now` treats the clipboard.
    pub fn decide(&mut self, now: Instant, window: Duration) -> CutLineMode {
        let within = self
            .last_cut
            .is_some_and(|t| now.saturating_duration_since(t) < window);
        let mode = if self.fresh_clip && within {
            CutLineMode::Append
        } else {
            self.fresh_clip = false;
            CutLineMode::Replace
        };
        trace!(target: "state.clipboard", ?mode, within, "cut_line_decision");
        mode
    }

    /// Record a completed line cut at `now`.
    pub fn note_cut_line(&mut self, now: Instant) {
        self.fresh_clip = true;
        self.last_cut = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_clipboard_keeps_kinds_apart() {
        let mut cb = MemoryClipboard::new();
        cb.write_all("sys", SelectionKind::Clipboard).unwrap();
        cb.write_all("prim", SelectionKind::Primary).unwrap();
        assert_eq!(cb.read_all(SelectionKind::Clipboard).unwrap(), "sys");
        assert_eq!(cb.read_all(SelectionKind::Primary).unwrap(), "prim");
    }

    #[test]
    fn cut_line_appends_only_inside_window() {
        let window = Duration::from_secs(10);
        let t0 = Instant::now();
        let mut st = CutLineState::default();
        assert_eq!(st.decide(t0, window), CutLineMode::Replace);
        st.note_cut_line(t0);
        assert_eq!(st.decide(t0 + Duration::from_secs(1), window), CutLineMode::Append);
        st.note_cut_line(t0 + Duration::from_secs(1));
        assert_eq!(st.decide(t0 + Duration::from_secs(12), window), CutLineMode::Replace);
    }

    #[test]
    fn copy_between_cuts_starts_fresh() {
        let window = Duration::from_secs(10);
        let t0 = Instant::now();
        let mut st = CutLineState::default();
        st.note_cut_line(t0);
        st.note_copy();
        assert_eq!(st.decide(t0 + Duration::from_secs(1), window), CutLineMode::Replace);
    }
}
