//! Extension capability interface and the plugin registry.
//!
//! Every loaded extension implements [`Extension`]: a pre-action hook that
//! may veto, a post-action hook that may suppress the viewport relocation,
//! and a character hook fired for every typed (or replayed) character. An
//! absent hook is `Ok(None)`, which is different from a hook that answered
//! `false`.
//!
//! Hooks are addressed through a [`Hook`] entry from the caller's static
//! action table, so no function name is ever assembled at dispatch time.
//!
//! Script-backed plugins go through [`ScriptExtension`], which adapts a
//! [`HookRuntime`] ("call a function of a plugin") into the interface. The
//! runtime reports "function does not exist" as [`CallError::NotDefined`];
//! the adapter turns that into "no hook" rather than a failure.
//!
//! [`PluginRegistry`] runs hooks for all extensions in registration order.
//! A failing hook is logged and reported on the view's status line, and the
//! loop carries on with the next extension.

use anyhow::Context;
use core_state::View;
use tracing::{debug, info, warn};

/// Value returned by a script function.
#[derive(Debug, Clone, PartialEq)]
pub enum HookValue {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
}

impl HookValue {
    /// Only an explicit boolean is an answer; anything else means "no opinion".
    pub fn as_answer(&self) -> Option<bool> {
        match self {
            HookValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Argument passed to a script function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookArg {
    View(usize),
    Char(char),
    Str(String),
}

/// Hook functions of one action: `pre<Action>` and `on<Action>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hook {
    pub action: &'static str,
    pub pre: &'static str,
    pub post: &'static str,
}

/// Script function fired for every typed character.
pub const ON_RUNE: &str = "onRune";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    #[error("function does not exist")]
    NotDefined,
    #[error("{0}")]
    Failed(String),
}

/// The embedded scripting runtime, seen only as "call a named function".
pub trait HookRuntime: Send {
    /// Call `function` of `plugin` (the qualified name `<plugin>.<function>`).
    fn call(&mut self, plugin: &str, function: &str, args: &[HookArg]) -> Result<HookValue, CallError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{plugin}: {hook}: {message}")]
pub struct HookError {
    pub plugin: String,
    pub hook: String,
    pub message: String,
}

pub trait Extension: Send {
    fn name(&self) -> &str;

    /// `Some(false)` vetoes `action`.
    fn pre_action(&mut self, _hook: &Hook, _view: &mut View) -> Result<Option<bool>, HookError> {
        Ok(None)
    }

    /// `Some(false)` suppresses the relocation that normally follows `action`.
    fn post_action(&mut self, _hook: &Hook, _view: &mut View) -> Result<Option<bool>, HookError> {
        Ok(None)
    }

    fn on_rune(&mut self, _ch: char, _view: &mut View) -> Result<(), HookError> {
        Ok(())
    }
}

/// Adapts a script runtime to [`Extension`]: the plugin's `pre<Action>`,
/// `on<Action>` and `onRune` functions are the hooks.
pub struct ScriptExtension<R> {
    name: String,
    runtime: R,
}

impl<R: HookRuntime> ScriptExtension<R> {
    pub fn new(name: impl Into<String>, runtime: R) -> Self {
        Self {
            name: name.into(),
            runtime,
        }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    fn call(&mut self, hook: &'static str, args: &[HookArg]) -> Result<Option<bool>, HookError> {
        match self.runtime.call(&self.name, hook, args) {
            Ok(value) => Ok(value.as_answer()),
            Err(CallError::NotDefined) => Ok(None),
            Err(CallError::Failed(message)) => Err(HookError {
                plugin: self.name.clone(),
                hook: hook.to_string(),
                message,
            }),
        }
    }
}

impl<R: HookRuntime> Extension for ScriptExtension<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn pre_action(&mut self, hook: &Hook, view: &mut View) -> Result<Option<bool>, HookError> {
        self.call(hook.pre, &[HookArg::View(view.id.0)])
    }

    fn post_action(&mut self, hook: &Hook, view: &mut View) -> Result<Option<bool>, HookError> {
        self.call(hook.post, &[HookArg::View(view.id.0)])
    }

    fn on_rune(&mut self, ch: char, view: &mut View) -> Result<(), HookError> {
        self.call(ON_RUNE, &[HookArg::Char(ch), HookArg::View(view.id.0)])
            .map(|_| ())
    }
}

/// Loaded extensions, in registration order.
#[derive(Default)]
pub struct PluginRegistry {
    extensions: Vec<Box<dyn Extension>>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("extensions", &self.names())
            .finish()
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, ext: Box<dyn Extension>) {
        info!(target: "plugin", name = ext.name(), "plugin_registered");
        self.extensions.push(ext);
    }

    /// Register everything `host` discovers. Returns how many were added.
    pub fn load_from(&mut self, host: &mut dyn PluginHost) -> anyhow::Result<usize> {
        let loaded = host
            .load_all()
            .with_context(|| format!("loading plugins from {}", host.name()))?;
        let count = loaded.len();
        for ext in loaded {
            self.register(ext);
        }
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.extensions.iter().map(|e| e.name()).collect()
    }

    /// Run every pre-hook. Returns false if any hook vetoed; all hooks run
    /// regardless.
    pub fn pre_action(&mut self, hook: &Hook, view: &mut View) -> bool {
        let mut allowed = true;
        for ext in &mut self.extensions {
            match ext.pre_action(hook, view) {
                Ok(Some(false)) => {
                    debug!(target: "plugin", plugin = ext.name(), action = hook.action, "pre_hook_veto");
                    allowed = false;
                }
                Ok(_) => {}
                Err(err) => report(view, &err),
            }
        }
        allowed
    }

    /// Run every post-hook. Returns false if any hook asked to skip the
    /// relocation.
    pub fn post_action(&mut self, hook: &Hook, view: &mut View) -> bool {
        let mut relocate = true;
        for ext in &mut self.extensions {
            match ext.post_action(hook, view) {
                Ok(Some(false)) => relocate = false,
                Ok(_) => {}
                Err(err) => report(view, &err),
            }
        }
        relocate
    }

    pub fn on_rune(&mut self, ch: char, view: &mut View) {
        for ext in &mut self.extensions {
            if let Err(err) = ext.on_rune(ch, view) {
                report(view, &err);
            }
        }
    }
}

fn report(view: &mut View, err: &HookError) {
    warn!(target: "plugin", plugin = %err.plugin, hook = %err.hook, error = %err.message, "hook_failed");
    view.set_error(err.to_string());
}

/// Discovers extensions at startup.
pub trait PluginHost: Send {
    /// Stable identifier for logs.
    fn name(&self) -> &'static str;
    fn load_all(&mut self) -> anyhow::Result<Vec<Box<dyn Extension>>>;
}

impl<T: PluginHost + ?Sized> PluginHost for &mut T {
    fn name(&self) -> &'static str {
        (**self).name()
    }
    fn load_all(&mut self) -> anyhow::Result<Vec<Box<dyn Extension>>> {
        (**self).load_all()
    }
}

/// Host used when no scripting runtime is embedded.
#[derive(Debug, Default)]
pub struct NoopPluginHost;

impl NoopPluginHost {
    pub fn new() -> Self {
        Self
    }
}

impl PluginHost for NoopPluginHost {
    fn name(&self) -> &'static str {
        "noop-plugin-host"
    }
    fn load_all(&mut self) -> anyhow::Result<Vec<Box<dyn Extension>>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_state::ViewId;
    use core_text::TextBuffer;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    const SAVE: Hook = Hook { action: "Save", pre: "preSave", post: "onSave" };
    const CUT: Hook = Hook { action: "Cut", pre: "preCut", post: "onCut" };
    const UNDO: Hook = Hook { action: "Undo", pre: "preUndo", post: "onUndo" };

    type Calls = Arc<Mutex<Vec<String>>>;

    /// Runtime answering from a fixed table; unknown names are not defined.
    struct TableRuntime {
        answers: HashMap<String, Result<HookValue, CallError>>,
        calls: Calls,
    }

    impl TableRuntime {
        fn new(answers: &[(&str, Result<HookValue, CallError>)]) -> (Self, Calls) {
            let calls = Calls::default();
            let rt = Self {
                answers: answers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
                calls: calls.clone(),
            };
            (rt, calls)
        }
    }

    impl HookRuntime for TableRuntime {
        fn call(&mut self, plugin: &str, function: &str, _args: &[HookArg]) -> Result<HookValue, CallError> {
            let name = format!("{plugin}.{function}");
            self.calls.lock().unwrap().push(name.clone());
            self.answers
                .get(&name)
                .cloned()
                .unwrap_or(Err(CallError::NotDefined))
        }
    }

    fn view() -> View {
        View::new(ViewId(1), TextBuffer::from_text("t", "abc"))
    }

    #[test]
    fn missing_hook_is_not_an_answer() {
        let (rt, calls) = TableRuntime::new(&[]);
        let mut ext = ScriptExtension::new("fmt", rt);
        let mut v = view();
        assert_eq!(ext.pre_action(&SAVE, &mut v), Ok(None));
        assert_eq!(calls.lock().unwrap().as_slice(), ["fmt.preSave"]);
        assert!(v.status().is_none());
    }

    #[test]
    fn veto_runs_remaining_hooks() {
        let (a, a_calls) = TableRuntime::new(&[("a.preSave", Ok(HookValue::Bool(false)))]);
        let (b, b_calls) = TableRuntime::new(&[("b.preSave", Ok(HookValue::Bool(true)))]);
        let mut reg = PluginRegistry::new();
        reg.register(Box::new(ScriptExtension::new("a", a)));
        reg.register(Box::new(ScriptExtension::new("b", b)));
        let mut v = view();
        assert!(!reg.pre_action(&SAVE, &mut v));
        assert_eq!(a_calls.lock().unwrap().len(), 1);
        assert_eq!(b_calls.lock().unwrap().as_slice(), ["b.preSave"]);
    }

    #[test]
    fn failing_hook_is_reported_and_loop_continues() {
        let (a, _) = TableRuntime::new(&[("a.onCut", Err(CallError::Failed("boom".into())))]);
        let (b, _) = TableRuntime::new(&[("b.onCut", Ok(HookValue::Bool(false)))]);
        let mut reg = PluginRegistry::new();
        reg.register(Box::new(ScriptExtension::new("a", a)));
        reg.register(Box::new(ScriptExtension::new("b", b)));
        let mut v = view();
        assert!(!reg.post_action(&CUT, &mut v), "b still asked to skip relocation");
        assert_eq!(v.status().map(|s| s.text.as_str()), Some("a: onCut: boom"));
    }

    #[test]
    fn non_boolean_results_do_not_veto() {
        let (a, _) = TableRuntime::new(&[("a.preUndo", Ok(HookValue::Str("no".into())))]);
        let mut reg = PluginRegistry::new();
        reg.register(Box::new(ScriptExtension::new("a", a)));
        assert!(reg.pre_action(&UNDO, &mut view()));
    }

    #[test]
    fn typed_characters_call_on_rune() {
        let (rt, calls) = TableRuntime::new(&[]);
        let mut ext = ScriptExtension::new("fmt", rt);
        assert_eq!(ext.on_rune('x', &mut view()), Ok(()));
        assert_eq!(calls.lock().unwrap().as_slice(), ["fmt.onRune"]);
    }

    #[test]
    fn noop_host_loads_nothing() {
        let mut reg = PluginRegistry::new();
        let mut host = NoopPluginHost::new();
        assert_eq!(reg.load_from(&mut host).unwrap(), 0);
        assert!(reg.is_empty());
    }
}
