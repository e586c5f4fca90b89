#![allow(dead_code)] // Shared across integration tests; each test binary uses a subset of helpers.

use std::sync::{Arc, Mutex};

use core_actions::{ActionId, ActionOutcome, EditorContext, perform_action};
use core_plugin::{Extension, Hook, HookError};
use core_state::{View, ViewId};
use core_text::TextBuffer;

pub fn view(text: &str) -> View {
    View::new(ViewId(0), TextBuffer::from_text("scratch", text))
}

pub fn status(view: &View) -> &str {
    view.status().map_or("", |s| s.text.as_str())
}

pub fn run(ctx: &mut EditorContext, view: &mut View, id: ActionId) -> ActionOutcome {
    perform_action(ctx, view, id, true)
}

/// Hook calls observed by a [`Recorder`] extension.
#[derive(Debug, Default)]
pub struct HookLog {
    pub calls: Mutex<Vec<String>>,
    pub runes: Mutex<Vec<char>>,
}

impl HookLog {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn runes(&self) -> Vec<char> {
        self.runes.lock().unwrap().clone()
    }
}

/// Extension that logs every hook and can veto one action by hook name.
pub struct Recorder {
    pub log: Arc<HookLog>,
    pub veto: Option<&'static str>,
}

impl Recorder {
    pub fn boxed(log: &Arc<HookLog>, veto: Option<&'static str>) -> Box<dyn Extension> {
        Box::new(Self {
            log: Arc::clone(log),
            veto,
        })
    }
}

impl Extension for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn pre_action(&mut self, hook: &Hook, _view: &mut View) -> Result<Option<bool>, HookError> {
        self.log.calls.lock().unwrap().push(hook.pre.to_string());
        Ok((self.veto == Some(hook.action)).then_some(false))
    }

    fn post_action(&mut self, hook: &Hook, _view: &mut View) -> Result<Option<bool>, HookError> {
        self.log.calls.lock().unwrap().push(hook.post.to_string());
        Ok(None)
    }

    fn on_rune(&mut self, ch: char, _view: &mut View) -> Result<(), HookError> {
        self.log.runes.lock().unwrap().push(ch);
        Ok(())
    }
}
