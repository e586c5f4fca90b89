//! Process-scoped editor context.
//!
//! Everything an action body needs besides the view it edits: loaded
//! plugins, the macro recorder, the search term, the jump history, the key
//! map and the collaborators (clipboard, persistence, code intelligence,
//! clock, prompter). It is created once at startup and passed explicitly.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use core_config::{Config, EditorConfig};
use core_events::probe::ProbeScheduler;
use core_keymap::Keymap;
use core_plugin::PluginRegistry;
use core_state::{Clipboard, Clock, CursorHistory, MemoryClipboard, SystemClock, View, ViewId};
use core_text::{BufferSettings, TextBuffer};
use regex::Regex;
use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::intel::{CodeIntel, ExternalTools, NoIntel};
use crate::macros::MacroRecorder;
use crate::persist::{FsPersistence, PersistError, Persistence, open_buffer};
use crate::probes::ProbePayload;

/// Questions an action may need answered (file names, yes/no).
pub trait Prompter: Send {
    /// `None` means cancelled.
    fn prompt(&mut self, question: &str, initial: &str) -> Option<String>;
    fn confirm(&mut self, question: &str) -> bool;
}

/// Cancels every prompt and declines every question.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompter;

impl Prompter for NoPrompter {
    fn prompt(&mut self, _question: &str, _initial: &str) -> Option<String> {
        None
    }
    fn confirm(&mut self, _question: &str) -> bool {
        false
    }
}

/// Answers prompts from a queue, for batch runs and tests. Confirmations
/// accept `y` / `yes`.
#[derive(Debug, Default, Clone)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    /// Questions asked so far.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt(&mut self, question: &str, _initial: &str) -> Option<String> {
        self.asked.push(question.to_string());
        self.answers.pop_front()
    }

    fn confirm(&mut self, question: &str) -> bool {
        self.asked.push(question.to_string());
        self.answers
            .pop_front()
            .is_some_and(|a| matches!(a.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
    }
}

/// Last search term.
#[derive(Debug, Default, Clone)]
pub struct SearchState {
    pattern: String,
    regex: Option<Regex>,
}

impl SearchState {
    pub fn set(&mut self, pattern: &str) -> Result<(), regex::Error> {
        let re = Regex::new(pattern)?;
        self.pattern = pattern.to_string();
        self.regex = Some(re);
        Ok(())
    }

    /// Search for `text` literally.
    pub fn set_literal(&mut self, text: &str) {
        self.pattern = text.to_string();
        self.regex = Regex::new(&regex::escape(text)).ok();
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn regex(&self) -> Option<&Regex> {
        self.regex.as_ref().filter(|_| !self.pattern.is_empty())
    }

    pub fn is_active(&self) -> bool {
        self.regex().is_some()
    }

    pub fn clear(&mut self) {
        self.pattern.clear();
        self.regex = None;
    }
}

pub struct EditorContext {
    pub plugins: PluginRegistry,
    pub macros: MacroRecorder,
    pub search: SearchState,
    pub jumps: CursorHistory,
    pub keymap: Keymap,
    pub editor: EditorConfig,
    pub buffer_defaults: BufferSettings,
    pub clipboard: Box<dyn Clipboard>,
    pub persistence: Box<dyn Persistence>,
    pub intel: Arc<dyn CodeIntel>,
    pub clock: Arc<dyn Clock>,
    pub prompter: Box<dyn Prompter>,
    pub probes: Option<ProbeScheduler<ProbePayload>>,
    /// Depth of pipeline calls currently running.
    pub(crate) nesting: usize,
}

impl std::fmt::Debug for EditorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorContext")
            .field("plugins", &self.plugins)
            .field("macros", &self.macros)
            .field("search", &self.search.pattern())
            .field("jumps", &self.jumps.len())
            .field("keymap", &self.keymap.len())
            .field("probes", &self.probes.is_some())
            .finish()
    }
}

impl Default for EditorContext {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl EditorContext {
    pub fn new(config: &Config) -> Self {
        let file = &config.file;
        let mut keymap = Keymap::with_defaults();
        for err in keymap.apply_overrides(&file.keys) {
            warn!(target: "config", %err, "key_binding_ignored");
        }
        let intel: Arc<dyn CodeIntel> = if file.tools.format.is_empty() && file.tools.lint.is_empty() {
            Arc::new(NoIntel)
        } else {
            Arc::new(ExternalTools::new(&file.tools))
        };
        info!(target: "actions.context", bindings = keymap.len(), "context_ready");
        Self {
            plugins: PluginRegistry::new(),
            macros: MacroRecorder::new(),
            search: SearchState::default(),
            jumps: CursorHistory::with_capacity(file.editor.jump_history_capacity),
            keymap,
            editor: file.editor.clone(),
            buffer_defaults: file.buffer.clone(),
            clipboard: Box::new(MemoryClipboard::new()),
            persistence: Box::new(FsPersistence),
            intel,
            clock: Arc::new(SystemClock),
            prompter: Box::new(NoPrompter),
            probes: None,
            nesting: 0,
        }
    }

    pub fn with_clipboard(mut self, clipboard: impl Clipboard + 'static) -> Self {
        self.clipboard = Box::new(clipboard);
        self
    }

    pub fn with_persistence(mut self, persistence: impl Persistence + 'static) -> Self {
        self.persistence = Box::new(persistence);
        self
    }

    pub fn with_intel(mut self, intel: impl CodeIntel + 'static) -> Self {
        self.intel = Arc::new(intel);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_prompter(mut self, prompter: impl Prompter + 'static) -> Self {
        self.prompter = Box::new(prompter);
        self
    }

    /// Run highlight and lint probes in the background on `handle`.
    pub fn with_probes(mut self, handle: Handle) -> Self {
        self.probes = Some(ProbeScheduler::new(handle));
        self
    }

    /// New buffer for `path` (or an empty scratch buffer) using the
    /// configured buffer defaults.
    pub fn open_buffer(&mut self, path: Option<&Path>) -> Result<TextBuffer, PersistError> {
        match path {
            Some(path) => open_buffer(self.persistence.as_mut(), path, &self.buffer_defaults),
            None => {
                let mut buffer = TextBuffer::from_text("untitled", "");
                buffer.settings = self.buffer_defaults.clone();
                Ok(buffer)
            }
        }
    }

    pub fn open_view(&mut self, id: ViewId, path: Option<&Path>) -> Result<View, PersistError> {
        let buffer = self.open_buffer(path)?;
        info!(target: "actions.context", view = id.0, buffer = buffer.name(), lines = buffer.line_count(), "view_open");
        Ok(View::new(id, buffer))
    }

    /// Abort background work.
    pub fn shutdown(&mut self) {
        if let Some(probes) = self.probes.as_mut() {
            probes.shutdown();
        }
    }
}
