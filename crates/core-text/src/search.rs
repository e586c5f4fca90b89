//! Regex search over a buffer with wrap-around.

use regex::Regex;

use crate::{Location, TextBuffer};

impl TextBuffer {
    /// First non-empty match of `re` at or after `from` (forward) or strictly
    /// before it (backward), wrapping around the document. Returns the
    /// match bounds.
    pub fn find(&self, re: &Regex, from: Location, forward: bool) -> Option<(Location, Location)> {
        let text = self.text();
        let pos = self.clamp(from).to_byte_offset(self);
        let mut matches = re.find_iter(&text).filter(|m| m.start() < m.end());

        let hit = if forward {
            let mut first = None;
            let mut after = None;
            for m in matches.by_ref() {
                if first.is_none() {
                    first = Some(m);
                }
                if m.start() >= pos {
                    after = Some(m);
                    break;
                }
            }
            after.or(first)
        } else {
            let mut before = None;
            let mut last = None;
            for m in matches {
                if m.start() < pos {
                    before = Some(m);
                }
                last = Some(m);
            }
            before.or(last)
        }?;

        Some((
            Location::from_byte_offset(hit.start(), self),
            Location::from_byte_offset(hit.end(), self),
        ))
    }
}
