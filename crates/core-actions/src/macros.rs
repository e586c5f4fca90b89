//! Macro recording.
//!
//! A macro is an ordered list of typed characters and action ids. Entries are
//! plain data (no closures) so a recording can be saved as JSON and replayed
//! in another session; playback lives in the dispatcher.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::ActionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MacroEntry {
    Char(char),
    Action(ActionId),
}

#[derive(Debug, Clone, Default)]
pub struct MacroRecorder {
    recording: bool,
    playing: bool,
    entries: Vec<MacroEntry>,
}

impl MacroRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Flip recording on or off. Starting a recording discards the previous
    /// macro. Returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.recording = !self.recording;
        if self.recording {
            self.entries.clear();
        }
        debug!(target: "actions.macro", recording = self.recording, entries = self.entries.len(), "macro_toggle");
        self.recording
    }

    fn capturing(&self) -> bool {
        self.recording && !self.playing
    }

    pub fn record_char(&mut self, ch: char) {
        if self.capturing() {
            trace!(target: "actions.macro", %ch, "macro_record_char");
            self.entries.push(MacroEntry::Char(ch));
        }
    }

    pub fn record_action(&mut self, action: ActionId) {
        if self.capturing() && action.is_recordable() {
            trace!(target: "actions.macro", %action, "macro_record_action");
            self.entries.push(MacroEntry::Action(action));
        }
    }

    pub fn entries(&self) -> &[MacroEntry] {
        &self.entries
    }

    pub fn set_entries(&mut self, entries: Vec<MacroEntry>) {
        self.entries = entries;
    }

    /// Mark playback as started; returns the entries to replay.
    pub(crate) fn begin_playback(&mut self) -> Vec<MacroEntry> {
        self.playing = true;
        self.entries.clone()
    }

    pub(crate) fn end_playback(&mut self) {
        self.playing = false;
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.entries)
    }

    pub fn load_json(&mut self, json: &str) -> Result<usize, serde_json::Error> {
        let entries: Vec<MacroEntry> = serde_json::from_str(json)?;
        let count = entries.len();
        self.entries = entries;
        Ok(count)
    }
}
