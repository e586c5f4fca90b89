//! Hook bracketing around action bodies.
//!
//! `perform_action(id, allow_plugins)`:
//! 1. with plugins allowed, every extension's pre-hook runs; any explicit
//!    `false` vetoes the action (the remaining hooks still run);
//! 2. the body runs;
//! 3. with plugins allowed and the body done, every post-hook runs; an
//!    explicit `false` suppresses the viewport relocation.
//!
//! Bodies may re-enter the pipeline (e.g. `SaveAs` runs `Save`). Only the
//! outermost call is captured by a recording macro.

use core_state::View;

use crate::context::EditorContext;
use crate::dispatcher::dispatch;
use crate::{ActionId, UnknownAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// A pre-hook returned false; the body did not run.
    Vetoed,
    /// The body ran. `relocate` is false when a post-hook asked to keep the
    /// viewport where it is.
    Completed { relocate: bool },
    /// The body had nothing to do; no post-hook ran.
    Declined,
}

impl ActionOutcome {
    pub fn is_completed(self) -> bool {
        matches!(self, ActionOutcome::Completed { .. })
    }
}

pub fn perform_action(
    ctx: &mut EditorContext,
    view: &mut View,
    id: ActionId,
    allow_plugins: bool,
) -> ActionOutcome {
    if allow_plugins && ctx.nesting == 0 {
        ctx.macros.record_action(id);
    }
    let hook = id.hook();
    if allow_plugins && !ctx.plugins.pre_action(hook, view) {
        tracing::debug!(target: "actions.pipeline", action = %id, "action_vetoed");
        return ActionOutcome::Vetoed;
    }

    ctx.nesting += 1;
    let result = dispatch(ctx, view, id);
    ctx.nesting -= 1;
    if !result.done {
        tracing::trace!(target: "actions.pipeline", action = %id, "action_declined");
        return ActionOutcome::Declined;
    }

    let relocate = !allow_plugins || ctx.plugins.post_action(hook, view);
    if relocate {
        view.relocate();
    }
    tracing::trace!(target: "actions.pipeline", action = %id, relocate, "action_completed");
    ActionOutcome::Completed { relocate }
}

/// Run an action by name with plugins allowed. Unknown names are reported on
/// the view's status line.
pub fn perform_named(ctx: &mut EditorContext, view: &mut View, name: &str) -> Result<ActionOutcome, UnknownAction> {
    match name.parse::<ActionId>() {
        Ok(id) => Ok(perform_action(ctx, view, id, true)),
        Err(err) => {
            tracing::warn!(target: "actions.pipeline", name, "unknown_action");
            view.set_error(err.to_string());
            Err(err)
        }
    }
}
