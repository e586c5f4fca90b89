//! Named editing actions and the pipeline that runs them.
//!
//! Every user-visible operation is an [`ActionId`]. [`perform_action`] brackets
//! the action body with the plugin pre-hook (which may veto) and post-hook
//! (which may suppress the viewport relocation). Bodies live in the
//! `dispatcher` submodules and mutate a [`core_state::View`] through the
//! process-scoped [`EditorContext`] (plugins, clipboard, macro recorder,
//! search state, jump history, persistence and code intelligence).
//!
//! Key input enters through [`input::handle_key`]: an open template session
//! sees the key first, then the keymap, then unbound printable characters
//! are inserted literally.

use std::fmt;
use std::str::FromStr;

use core_plugin::Hook;
use serde::{Deserialize, Serialize};

pub mod context;
mod dispatcher;
pub mod input;
pub mod intel;
pub mod macros;
pub mod persist;
mod pipeline;
pub mod probes;

pub use context::{EditorContext, NoPrompter, Prompter, ScriptedPrompter, SearchState};
pub use dispatcher::DispatchResult;
pub use dispatcher::edit::{insert_char, insert_text};
pub use input::{InputOutcome, handle_input, handle_key};
pub use macros::{MacroEntry, MacroRecorder};
pub use pipeline::{ActionOutcome, perform_action, perform_named};

macro_rules! action_ids {
    ($($id:ident),* $(,)?) => {
        /// Catalogue of named actions, addressable from key bindings, macros
        /// and the command line by their variant name.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum ActionId {
            $($id),*
        }

        impl ActionId {
            pub const ALL: &'static [ActionId] = &[$(ActionId::$id),*];

            /// Plugin hooks per action, indexed by discriminant.
            const HOOKS: &'static [Hook] = &[$(Hook {
                action: stringify!($id),
                pre: concat!("pre", stringify!($id)),
                post: concat!("on", stringify!($id)),
            }),*];

            pub fn name(self) -> &'static str {
                match self {
                    $(ActionId::$id => stringify!($id)),*
                }
            }
        }
    };
}

action_ids! {
    CursorUp,
    CursorDown,
    CursorLeft,
    CursorRight,
    WordLeft,
    WordRight,
    SelectUp,
    SelectDown,
    SelectLeft,
    SelectRight,
    SelectWordLeft,
    SelectWordRight,
    StartOfLine,
    EndOfLine,
    SelectToStartOfLine,
    SelectToEndOfLine,
    CursorStart,
    CursorEnd,
    SelectToStart,
    SelectToEnd,
    InsertSpace,
    InsertNewline,
    InsertTab,
    Backspace,
    Delete,
    DeleteWordLeft,
    DeleteWordRight,
    IndentSelection,
    OutdentSelection,
    OutdentLine,
    Copy,
    Cut,
    CutLine,
    DuplicateLine,
    DeleteLine,
    MoveLinesUp,
    MoveLinesDown,
    Paste,
    PastePrimary,
    SelectAll,
    SelectWord,
    Undo,
    Redo,
    Find,
    FindNext,
    FindPrevious,
    Save,
    SaveAs,
    Format,
    Lint,
    Template,
    ExtractVariable,
    Autocomplete,
    Rename,
    Describe,
    Referrers,
    GotoDefinition,
    NextLoc,
    PrevLoc,
    GotoGutterMessage,
    ToggleMacro,
    PlayMacro,
    Escape,
}

impl ActionId {
    /// Hooks plugins see for this action. A few actions share the hooks of
    /// the action they specialise.
    pub fn hook(self) -> &'static Hook {
        let owner = match self {
            ActionId::ExtractVariable => ActionId::Template,
            ActionId::PastePrimary => ActionId::Paste,
            other => other,
        };
        &Self::HOOKS[owner as usize]
    }


    /// Whether a recording macro captures this action.
    pub fn is_recordable(self) -> bool {
        !matches!(self, ActionId::ToggleMacro | ActionId::PlayMacro)
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for ActionId {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionId::ALL
            .iter()
            .copied()
            .find(|a| a.name() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for id in ActionId::ALL {
            assert_eq!(id.name().parse::<ActionId>(), Ok(*id));
        }
        assert!("Frobnicate".parse::<ActionId>().is_err());
    }

    #[test]
    fn default_bindings_name_known_actions() {
        let keymap = core_keymap::Keymap::with_defaults();
        for name in keymap.action_names() {
            assert!(name.parse::<ActionId>().is_ok(), "{name} is bound but unknown");
        }
    }

    #[test]
    fn specialised_actions_share_hooks() {
        assert_eq!(ActionId::ExtractVariable.hook().action, "Template");
        assert_eq!(ActionId::PastePrimary.hook().action, "Paste");
        assert_eq!(ActionId::Save.hook().action, "Save");
        assert_eq!(ActionId::PastePrimary.hook().post, "onPaste");
    }

    #[test]
    fn hook_table_follows_catalogue_order() {
        for id in ActionId::ALL {
            let hook = ActionId::HOOKS[*id as usize];
            assert_eq!(hook.action, id.name());
            assert_eq!(hook.pre, format!("pre{}", id.name()));
            assert_eq!(hook.post, format!("on{}", id.name()));
        }
    }
}
