//! Tab-stop templates (snippets).
//!
//! A template is plain text with fields written as `$<index>_<label>$`. On
//! open the visible text (labels only, markers removed) is inserted at the
//! cursor as one edit and the fields are visited in index order: index 0
//! first, then 1, 2, ... regardless of where they sit in the text. Markers
//! without a numeric index are visited after all numbered ones, in textual
//! order. A `$` with no closing `$` on the same line is literal text.
//!
//! Field positions are kept as the absolute character offsets they had right
//! after insertion. A field's current start is its original offset shifted by
//! `resolved_len - label_len` of every already resolved field that started
//! before it; only the field being edited changes length at any time.
//!
//! While a session is open typing replaces the selected placeholder, and
//! Backspace / Left / Right / Home / End / paste operate on a response buffer
//! and column local to the current field.

use core_text::{BufferError, Location, TextBuffer};
use tracing::{debug, trace};

use crate::Cursor;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("no template is open")]
    NoSession,
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// A field as found by [`parse_template`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedField {
    pub index: Option<u32>,
    pub label: String,
    /// Character offset of the label inside the visible text.
    pub offset: usize,
}

/// Split `template` into its visible text and fields.
pub fn parse_template(template: &str) -> (String, Vec<ParsedField>) {
    let mut visible = String::with_capacity(template.len());
    let mut visible_chars = 0usize;
    let mut fields = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('$') {
        let before = &rest[..open];
        visible.push_str(before);
        visible_chars += before.chars().count();
        let after = &rest[open + 1..];
        let close = after.find('$').filter(|c| !after[..*c].contains('\n'));
        let Some(close) = close else {
            visible.push('$');
            visible_chars += 1;
            rest = after;
            continue;
        };
        let marker = &after[..close];
        let (index, label) = match marker.split_once('_') {
            Some((idx, label)) if !idx.is_empty() && idx.bytes().all(|b| b.is_ascii_digit()) => {
                (idx.parse::<u32>().ok(), label)
            }
            _ => (None, marker),
        };
        fields.push(ParsedField {
            index,
            label: label.to_string(),
            offset: visible_chars,
        });
        visible.push_str(label);
        visible_chars += label.chars().count();
        rest = &after[close + 1..];
    }
    visible.push_str(rest);
    (visible, fields)
}

#[derive(Debug, Clone)]
struct Field {
    index: Option<u32>,
    label: String,
    label_len: usize,
    origin: usize,
    resolved: Option<String>,
}

impl Field {
    fn delta(&self) -> isize {
        self.resolved
            .as_ref()
            .map_or(0, |r| r.chars().count() as isize - self.label_len as isize)
    }
}

#[derive(Debug, Clone)]
pub struct TemplateSession {
    fields: Vec<Field>,
    current: usize,
    response: String,
    cursor_x: usize,
    editing: bool,
}

impl TemplateSession {
    /// Insert `template` at the cursor and select its first field. Returns
    /// `None` (after inserting the text) when the template has no fields.
    pub fn open(
        template: &str,
        cursor: &mut Cursor,
        buf: &mut TextBuffer,
    ) -> Result<Option<Self>, BufferError> {
        cursor.relocate(buf);
        cursor.reset_selection();
        let at = cursor.loc;
        let (visible, parsed) = parse_template(template);
        let end = buf.insert(at, &visible)?;
        if parsed.is_empty() {
            cursor.goto(end, buf);
            return Ok(None);
        }

        let base = at.to_char_offset(buf);
        let mut fields: Vec<Field> = parsed
            .into_iter()
            .map(|p| Field {
                index: p.index,
                label_len: p.label.chars().count(),
                label: p.label,
                origin: base + p.offset,
                resolved: None,
            })
            .collect();
        // stable: equal indices and unnumbered markers keep textual order
        fields.sort_by_key(|f| (f.index.is_none(), f.index));

        let session = Self {
            fields,
            current: 0,
            response: String::new(),
            cursor_x: 0,
            editing: false,
        };
        debug!(target: "state.template", fields = session.fields.len(), first = %session.fields[0].label, "template_open");
        session.select_current(cursor, buf);
        Ok(Some(session))
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Position of the current field in visit order.
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn current_label(&self) -> &str {
        &self.fields[self.current].label
    }

    /// Labels in visit order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.label.as_str())
    }

    /// Text recorded for the field at `visit` once it was advanced past.
    pub fn resolved(&self, visit: usize) -> Option<&str> {
        self.fields.get(visit)?.resolved.as_deref()
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn cursor_x(&self) -> usize {
        self.cursor_x
    }

    fn start_offset(&self, visit: usize) -> usize {
        let field = &self.fields[visit];
        let shift: isize = self
            .fields
            .iter()
            .filter(|f| f.origin < field.origin)
            .map(Field::delta)
            .sum();
        (field.origin as isize + shift).max(0) as usize
    }

    fn current_len(&self) -> usize {
        if self.editing {
            self.response.chars().count()
        } else {
            self.fields[self.current].label_len
        }
    }

    /// Current buffer span of the field being visited.
    pub fn current_span(&self, buf: &TextBuffer) -> (Location, Location) {
        let start = self.start_offset(self.current);
        (
            Location::from_char_offset(start, buf),
            Location::from_char_offset(start + self.current_len(), buf),
        )
    }

    fn select_current(&self, cursor: &mut Cursor, buf: &TextBuffer) {
        let (start, end) = self.current_span(buf);
        cursor.reset_selection();
        cursor.set_selection(start, end);
        cursor.set_anchor(start);
        cursor.goto(start, buf);
    }

    fn sync_cursor(&self, cursor: &mut Cursor, buf: &TextBuffer) {
        let at = self.start_offset(self.current) + self.cursor_x;
        cursor.goto(Location::from_char_offset(at, buf), buf);
    }

    /// Record the current field and move to the next one. Returns false when
    /// the last field was resolved and the session is finished.
    pub fn advance(&mut self, cursor: &mut Cursor, buf: &TextBuffer) -> bool {
        let resolved = if self.editing {
            std::mem::take(&mut self.response)
        } else {
            self.fields[self.current].label.clone()
        };
        trace!(target: "state.template", field = self.current, resolved = %resolved, "field_resolved");
        let resolved_len = resolved.chars().count();
        self.fields[self.current].resolved = Some(resolved);
        self.editing = false;
        self.cursor_x = 0;
        self.response.clear();

        if self.current + 1 >= self.fields.len() {
            let end = self.start_offset(self.current) + resolved_len;
            debug!(target: "state.template", "template_complete");
            cursor.reset_selection();
            cursor.goto(Location::from_char_offset(end, buf), buf);
            return false;
        }
        self.current += 1;
        self.select_current(cursor, buf);
        true
    }

    /// Start editing the current field. The placeholder is either removed
    /// (typing over it) or kept as the initial response (cursor motion).
    fn begin_edit(
        &mut self,
        keep_label: bool,
        cursor: &mut Cursor,
        buf: &mut TextBuffer,
    ) -> Result<(), BufferError> {
        if self.editing {
            return Ok(());
        }
        if keep_label {
            self.response = self.fields[self.current].label.clone();
        } else {
            let (start, end) = self.current_span(buf);
            buf.remove(start, end)?;
            self.response.clear();
        }
        self.editing = true;
        self.cursor_x = 0;
        cursor.reset_selection();
        Ok(())
    }

    /// Type `text` into the current field at the field-local column.
    pub fn insert_text(
        &mut self,
        text: &str,
        cursor: &mut Cursor,
        buf: &mut TextBuffer,
    ) -> Result<(), BufferError> {
        self.begin_edit(false, cursor, buf)?;
        let at = Location::from_char_offset(self.start_offset(self.current) + self.cursor_x, buf);
        buf.insert(at, text)?;
        let byte = core_text::char_to_byte(&self.response, self.cursor_x);
        self.response.insert_str(byte, text);
        self.cursor_x += text.chars().count();
        self.sync_cursor(cursor, buf);
        Ok(())
    }

    pub fn backspace(&mut self, cursor: &mut Cursor, buf: &mut TextBuffer) -> Result<(), BufferError> {
        if !self.editing {
            self.begin_edit(false, cursor, buf)?;
            self.sync_cursor(cursor, buf);
            return Ok(());
        }
        if self.cursor_x == 0 {
            return Ok(());
        }
        let start = self.start_offset(self.current);
        let from = Location::from_char_offset(start + self.cursor_x - 1, buf);
        let to = Location::from_char_offset(start + self.cursor_x, buf);
        buf.remove(from, to)?;
        let b0 = core_text::char_to_byte(&self.response, self.cursor_x - 1);
        let b1 = core_text::char_to_byte(&self.response, self.cursor_x);
        self.response.replace_range(b0..b1, "");
        self.cursor_x -= 1;
        self.sync_cursor(cursor, buf);
        Ok(())
    }

    pub fn move_left(&mut self, cursor: &mut Cursor, buf: &mut TextBuffer) -> Result<(), BufferError> {
        if self.editing {
            self.cursor_x = self.cursor_x.saturating_sub(1);
        } else {
            self.begin_edit(true, cursor, buf)?;
        }
        self.sync_cursor(cursor, buf);
        Ok(())
    }

    pub fn move_right(&mut self, cursor: &mut Cursor, buf: &mut TextBuffer) -> Result<(), BufferError> {
        if self.editing {
            self.cursor_x = (self.cursor_x + 1).min(self.response.chars().count());
        } else {
            self.begin_edit(true, cursor, buf)?;
            self.cursor_x = self.response.chars().count();
        }
        self.sync_cursor(cursor, buf);
        Ok(())
    }

    pub fn move_home(&mut self, cursor: &mut Cursor, buf: &mut TextBuffer) -> Result<(), BufferError> {
        self.begin_edit(true, cursor, buf)?;
        self.cursor_x = 0;
        self.sync_cursor(cursor, buf);
        Ok(())
    }

    pub fn move_end(&mut self, cursor: &mut Cursor, buf: &mut TextBuffer) -> Result<(), BufferError> {
        self.begin_edit(true, cursor, buf)?;
        self.cursor_x = self.response.chars().count();
        self.sync_cursor(cursor, buf);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(text: &str, template: &str, at: Location) -> (TextBuffer, Cursor, Option<TemplateSession>) {
        let mut buf = TextBuffer::from_text("t", text);
        let mut cursor = Cursor::at(at, &buf);
        let session = TemplateSession::open(template, &mut cursor, &mut buf).unwrap();
        (buf, cursor, session)
    }

    #[test]
    fn parse_strips_markers() {
        let (visible, fields) = parse_template("$1_b$ := $0_a$");
        assert_eq!(visible, "b := a");
        assert_eq!(
            fields,
            vec![
                ParsedField { index: Some(1), label: "b".into(), offset: 0 },
                ParsedField { index: Some(0), label: "a".into(), offset: 5 },
            ]
        );
    }

    #[test]
    fn parse_handles_unterminated_and_unnumbered_markers() {
        let (visible, fields) = parse_template("cost $5 and $name$");
        // the first `$` closes at the next one on the same line
        assert_eq!(visible, "cost 5 and name$");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].index, None);
        assert_eq!(fields[0].label, "5 and ");

        let (visible, fields) = parse_template("price: $9");
        assert_eq!(visible, "price: $9");
        assert!(fields.is_empty());
    }

    #[test]
    fn index_zero_is_visited_first() {
        let (buf, cursor, session) = open("", "$1_b$ := $0_a$", Location::origin());
        let session = session.unwrap();
        assert_eq!(buf.text(), "b := a");
        assert_eq!(session.current_label(), "a");
        assert_eq!(cursor.get_selection(&buf), "a");
        assert_eq!(session.labels().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn advance_walks_fields_then_closes() {
        let (buf, mut cursor, session) = open("", "$1_b$ := $0_a$", Location::origin());
        let mut session = session.unwrap();
        assert!(session.advance(&mut cursor, &buf));
        assert_eq!(session.current_label(), "b");
        assert_eq!(cursor.get_selection(&buf), "b");
        assert!(!session.advance(&mut cursor, &buf));
        assert!(!cursor.has_selection());
    }

    #[test]
    fn typed_text_shifts_later_fields() {
        let (mut buf, mut cursor, session) =
            open("x", "$0_first$($1_arg$, $2_more$)", Location::new(0, 1));
        let mut s = session.unwrap();
        assert_eq!(buf.text(), "xfirst(arg, more)");
        s.insert_text("f", &mut cursor, &mut buf).unwrap();
        assert_eq!(buf.text(), "xf(arg, more)");
        assert!(s.advance(&mut cursor, &buf));
        assert_eq!(cursor.get_selection(&buf), "arg");
        s.insert_text("value", &mut cursor, &mut buf).unwrap();
        s.insert_text("s", &mut cursor, &mut buf).unwrap();
        assert_eq!(buf.text(), "xf(values, more)");
        assert!(s.advance(&mut cursor, &buf));
        assert_eq!(cursor.get_selection(&buf), "more");
        assert_eq!(s.resolved(0), Some("f"));
        assert_eq!(s.resolved(1), Some("values"));
    }

    #[test]
    fn later_field_textually_before_is_shifted_too() {
        let (mut buf, mut cursor, session) = open("", "$1_b$ := $0_a$", Location::origin());
        let mut s = session.unwrap();
        s.insert_text("longer", &mut cursor, &mut buf).unwrap();
        assert_eq!(buf.text(), "b := longer");
        assert!(s.advance(&mut cursor, &buf));
        // field b starts before a, so it does not move
        assert_eq!(cursor.get_selection(&buf), "b");
        s.insert_text("err", &mut cursor, &mut buf).unwrap();
        assert_eq!(buf.text(), "err := longer");
    }

    #[test]
    fn field_local_editing_keys() {
        let (mut buf, mut cursor, session) = open("", "let $0_name$ = 1;", Location::origin());
        let mut s = session.unwrap();
        s.move_end(&mut cursor, &mut buf).unwrap();
        assert_eq!(s.response(), "name");
        s.backspace(&mut cursor, &mut buf).unwrap();
        s.move_home(&mut cursor, &mut buf).unwrap();
        s.insert_text("my_", &mut cursor, &mut buf).unwrap();
        assert_eq!(buf.text(), "let my_nam = 1;");
        assert_eq!(cursor.loc, Location::new(0, 7));
        s.move_right(&mut cursor, &mut buf).unwrap();
        s.move_right(&mut cursor, &mut buf).unwrap();
        s.move_right(&mut cursor, &mut buf).unwrap();
        s.move_right(&mut cursor, &mut buf).unwrap();
        assert_eq!(s.cursor_x(), 6, "clamped to response length");
        s.move_left(&mut cursor, &mut buf).unwrap();
        assert_eq!(s.cursor_x(), 5);
    }

    #[test]
    fn template_without_fields_opens_no_session() {
        let (buf, cursor, session) = open("ab", "--", Location::new(0, 1));
        assert!(session.is_none());
        assert_eq!(buf.text(), "a--b");
        assert_eq!(cursor.loc, Location::new(0, 3));
    }

    #[test]
    fn expansion_is_one_undo_step() {
        let (mut buf, _, _) = open("", "$0_a$ $1_b$", Location::origin());
        assert_eq!(buf.undo_depth(), 1);
        buf.undo();
        assert_eq!(buf.text(), "");
    }
}
