//! Selection normalization and template shifting under arbitrary input.

use core_state::{Cursor, TemplateMotion, View, ViewId};
use core_text::{Location, TextBuffer};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum SelOp {
    Start(usize),
    End(usize),
    SelectTo(usize),
    Goto(usize),
    Reset,
}

fn sel_op() -> impl Strategy<Value = SelOp> {
    prop_oneof![
        any::<usize>().prop_map(SelOp::Start),
        any::<usize>().prop_map(SelOp::End),
        any::<usize>().prop_map(SelOp::SelectTo),
        any::<usize>().prop_map(SelOp::Goto),
        Just(SelOp::Reset),
    ]
}

fn loc(buf: &TextBuffer, seed: usize) -> Location {
    let total = buf.end().to_char_offset(buf);
    Location::from_char_offset(seed % (total + 1), buf)
}

proptest! {
    #[test]
    fn selection_start_never_after_end(
        text in "[a-z \\n]{0,40}",
        ops in proptest::collection::vec(sel_op(), 1..30),
    ) {
        let buf = TextBuffer::from_text("p", &text);
        let mut cursor = Cursor::new();
        for op in &ops {
            match op {
                SelOp::Start(s) => cursor.set_selection_start(loc(&buf, *s)),
                SelOp::End(s) => cursor.set_selection_end(loc(&buf, *s)),
                SelOp::SelectTo(s) => cursor.select_to(loc(&buf, *s)),
                SelOp::Goto(s) => cursor.goto(loc(&buf, *s), &buf),
                SelOp::Reset => cursor.reset_selection(),
            }
            let (start, end) = cursor.selection_bounds();
            prop_assert!(start <= end, "{start:?} > {end:?} after {op:?}");
        }
    }

    #[test]
    fn filled_template_matches_expected_text(
        first in "[a-z]{0,6}",
        second in "[a-z]{0,6}",
        third in "[a-z]{0,6}",
    ) {
        let mut v = View::new(ViewId(0), TextBuffer::from_text("p", ""));
        v.open_template("$2_c$ <- $0_a$ + $1_b$").unwrap();
        for answer in [&first, &second, &third] {
            if answer.is_empty() {
                // leave the placeholder in place
                v.template_motion(TemplateMotion::End).unwrap();
            } else {
                v.template_insert(answer).unwrap();
            }
            v.advance_template().unwrap();
        }
        prop_assert!(!v.has_template());
        let or = |s: &String, label: &str| if s.is_empty() { label.to_string() } else { s.clone() };
        let expected = format!("{} <- {} + {}", or(&third, "c"), or(&first, "a"), or(&second, "b"));
        prop_assert_eq!(v.buffer.text(), expected);
    }
}
