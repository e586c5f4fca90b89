//! Per-view editing state.
//!
//! A [`View`] exclusively owns one [`TextBuffer`] and the [`Cursor`] that
//! edits it, plus the state that only makes sense next to that pair: the
//! open template session (at most one), line-cut bookkeeping, gutter
//! diagnostics, same-identifier highlights, the viewport and the last status
//! message. Nothing here is shared between views.
//!
//! Status messages replace the modal prompts and message bars of an
//! interactive front end: action bodies report through [`View::set_info`] and
//! [`View::set_error`], and whoever drives the engine reads them back.

mod clipboard;
mod clock;
mod cursor;
mod highlight;
mod history;
pub mod template;
pub mod viewport;

pub use clipboard::{
    Clipboard, ClipboardError, CutLineMode, CutLineState, MemoryClipboard, SelectionKind,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use cursor::{Cursor, lexical_scopes};
pub use highlight::{GutterMessage, GutterMessages, HighlightIndex, Severity};
pub use history::{CursorHistory, JUMP_HISTORY_DEFAULT_CAPACITY, JumpLocation};
pub use template::{ParsedField, TemplateError, TemplateSession, parse_template};
pub use viewport::Viewport;

use core_text::TextBuffer;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

/// Field-local cursor motions available inside a template session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateMotion {
    Left,
    Right,
    Home,
    End,
}

#[derive(Debug)]
pub struct View {
    pub id: ViewId,
    pub buffer: TextBuffer,
    pub cursor: Cursor,
    pub cut_line: CutLineState,
    pub gutter: GutterMessages,
    pub highlights: HighlightIndex,
    pub viewport: Viewport,
    template: Option<TemplateSession>,
    status: Option<StatusMessage>,
}

impl View {
    pub fn new(id: ViewId, buffer: TextBuffer) -> Self {
        Self {
            id,
            buffer,
            cursor: Cursor::new(),
            cut_line: CutLineState::default(),
            gutter: GutterMessages::default(),
            highlights: HighlightIndex::default(),
            viewport: Viewport::default(),
            template: None,
            status: None,
        }
    }

    pub fn set_info<S: Into<String>>(&mut self, msg: S) {
        self.status = Some(StatusMessage {
            kind: StatusKind::Info,
            text: msg.into(),
        });
    }

    pub fn set_error<S: Into<String>>(&mut self, msg: S) {
        self.status = Some(StatusMessage {
            kind: StatusKind::Error,
            text: msg.into(),
        });
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn take_status(&mut self) -> Option<StatusMessage> {
        self.status.take()
    }

    /// Clamp the cursor to the buffer and scroll it into view.
    pub fn relocate(&mut self) -> bool {
        self.cursor.relocate(&self.buffer);
        self.viewport.relocate(self.cursor.loc.line)
    }

    pub fn template(&self) -> Option<&TemplateSession> {
        self.template.as_ref()
    }

    pub fn has_template(&self) -> bool {
        self.template.is_some()
    }

    /// Expand `template` at the cursor. Returns true if a session was opened
    /// (the template had at least one field).
    /// A selection is replaced; removal and expansion are one undo step.
    pub fn open_template(&mut self, template: &str) -> Result<bool, TemplateError> {
        let View { buffer, cursor, .. } = self;
        let session = buffer.group(|buf| {
            if let Some((start, end)) = cursor.selection() {
                buf.remove(start, end)?;
                cursor.goto(start, buf);
                cursor.reset_selection();
            }
            TemplateSession::open(template, cursor, buf)
        })?;
        self.template = session;
        Ok(self.template.is_some())
    }

    /// Move to the next field; the session closes after the last one.
    pub fn advance_template(&mut self) -> Result<(), TemplateError> {
        let session = self.template.as_mut().ok_or(TemplateError::NoSession)?;
        if !session.advance(&mut self.cursor, &self.buffer) {
            self.template = None;
        }
        Ok(())
    }

    /// Close the session, leaving the buffer as it is.
    pub fn cancel_template(&mut self) {
        if self.template.take().is_some() {
            debug!(target: "state.template", view = self.id.0, "template_cancel");
            self.cursor.reset_selection();
        }
    }

    pub fn template_insert(&mut self, text: &str) -> Result<(), TemplateError> {
        let session = self.template.as_mut().ok_or(TemplateError::NoSession)?;
        session.insert_text(text, &mut self.cursor, &mut self.buffer)?;
        Ok(())
    }

    pub fn template_backspace(&mut self) -> Result<(), TemplateError> {
        let session = self.template.as_mut().ok_or(TemplateError::NoSession)?;
        session.backspace(&mut self.cursor, &mut self.buffer)?;
        Ok(())
    }

    pub fn template_motion(&mut self, motion: TemplateMotion) -> Result<(), TemplateError> {
        let session = self.template.as_mut().ok_or(TemplateError::NoSession)?;
        let (cursor, buf) = (&mut self.cursor, &mut self.buffer);
        match motion {
            TemplateMotion::Left => session.move_left(cursor, buf)?,
            TemplateMotion::Right => session.move_right(cursor, buf)?,
            TemplateMotion::Home => session.move_home(cursor, buf)?,
            TemplateMotion::End => session.move_end(cursor, buf)?,
        }
        Ok(())
    }
}
