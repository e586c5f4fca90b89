//! Key routing.
//!
//! An open template session sees every key first. Without one the keymap
//! chain bound to the key runs action by action through the pipeline, and
//! unbound printable keys are typed literally.

use core_events::{InputEvent, KeyCode, KeyEvent};
use core_state::{SelectionKind, TemplateMotion, View};
use tracing::trace;

use crate::context::EditorContext;
use crate::dispatcher::edit::{insert_char, insert_text};
use crate::dispatcher::report;
use crate::ActionId;
use crate::pipeline::{ActionOutcome, perform_named};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    /// The key was consumed by the open template session.
    Template,
    /// The bound chain ran; one outcome per action (unknown names skipped).
    Actions(Vec<ActionOutcome>),
    /// An unbound printable key was typed.
    Inserted(char),
    /// A bracketed paste was inserted as one edit.
    Pasted,
    /// Nothing is bound and the key does not type.
    Unbound,
}

pub fn handle_input(ctx: &mut EditorContext, view: &mut View, event: &InputEvent) -> InputOutcome {
    match event {
        InputEvent::Key(key) => handle_key(ctx, view, key),
        InputEvent::Paste(text) if view.has_template() => {
            if let Err(err) = view.template_insert(text) {
                report(view, "paste", err);
            }
            InputOutcome::Template
        }
        InputEvent::Paste(text) => {
            insert_text(view, text);
            InputOutcome::Pasted
        }
    }
}

pub fn handle_key(ctx: &mut EditorContext, view: &mut View, key: &KeyEvent) -> InputOutcome {
    if view.has_template() {
        template_key(ctx, view, key);
        return InputOutcome::Template;
    }
    if let Some(chain) = ctx.keymap.lookup(key).map(<[String]>::to_vec) {
        trace!(target: "actions.input", %key, actions = ?chain, "key_bound");
        let outcomes = chain
            .iter()
            .filter_map(|name| perform_named(ctx, view, name).ok())
            .collect();
        return InputOutcome::Actions(outcomes);
    }
    match key.printable() {
        Some(ch) => {
            insert_char(ctx, view, ch);
            InputOutcome::Inserted(ch)
        }
        None => {
            trace!(target: "actions.input", %key, "key_unbound");
            InputOutcome::Unbound
        }
    }
}

fn template_key(ctx: &mut EditorContext, view: &mut View, key: &KeyEvent) {
    let result = match key.code {
        KeyCode::Tab | KeyCode::Enter => view.advance_template(),
        KeyCode::Esc => {
            view.cancel_template();
            Ok(())
        }
        KeyCode::Backspace => view.template_backspace(),
        _ => match key.printable() {
            Some(ch) => {
                ctx.macros.record_char(ch);
                let mut utf8 = [0u8; 4];
                view.template_insert(ch.encode_utf8(&mut utf8))
            }
            None => template_binding(ctx, view, key),
        },
    };
    if let Err(err) = result {
        report(view, "template_key", err);
    }
}

/// The few bound actions that make sense inside a field; the rest are
/// swallowed.
fn template_binding(ctx: &mut EditorContext, view: &mut View, key: &KeyEvent) -> Result<(), core_state::TemplateError> {
    let Some(first) = ctx.keymap.lookup(key).and_then(|chain| chain.first()) else {
        return Ok(());
    };
    let Ok(id) = first.parse::<ActionId>() else {
        return Ok(());
    };
    match id {
        ActionId::CursorLeft => view.template_motion(TemplateMotion::Left),
        ActionId::CursorRight => view.template_motion(TemplateMotion::Right),
        ActionId::StartOfLine | ActionId::CursorStart => view.template_motion(TemplateMotion::Home),
        ActionId::EndOfLine | ActionId::CursorEnd => view.template_motion(TemplateMotion::End),
        ActionId::Paste | ActionId::PastePrimary => {
            let kind = if id == ActionId::Paste { SelectionKind::Clipboard } else { SelectionKind::Primary };
            match ctx.clipboard.read_all(kind) {
                Ok(text) => view.template_insert(&text),
                Err(err) => {
                    report(view, "template_paste", err);
                    Ok(())
                }
            }
        }
        other => {
            trace!(target: "actions.input", action = %other, "template_swallowed");
            Ok(())
        }
    }
}
