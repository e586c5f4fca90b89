//! Same-identifier highlight spans and per-source gutter messages.

use std::collections::BTreeMap;

use core_text::Location;

/// Highlight spans computed against a specific buffer revision.
#[derive(Debug, Clone, Default)]
pub struct HighlightIndex {
    revision: Option<u64>,
    spans: Vec<(Location, Location)>,
}

impl HighlightIndex {
    pub fn set(&mut self, revision: u64, spans: Vec<(Location, Location)>) {
        self.revision = Some(revision);
        self.spans = spans;
    }

    pub fn clear(&mut self) {
        self.revision = None;
        self.spans.clear();
    }

    /// Spans valid for `revision`; empty once the buffer moved on.
    pub fn spans(&self, revision: u64) -> &[(Location, Location)] {
        if self.revision == Some(revision) {
            &self.spans
        } else {
            &[]
        }
    }

    pub fn contains(&self, revision: u64, loc: Location) -> bool {
        self.spans(revision)
            .iter()
            .any(|(s, e)| *s <= loc && loc < *e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GutterMessage {
    pub line: usize,
    pub text: String,
    pub severity: Severity,
}

/// Diagnostics keyed by the tool that produced them, so one tool can clear
/// its own messages without disturbing the others.
#[derive(Debug, Clone, Default)]
pub struct GutterMessages {
    by_source: BTreeMap<String, Vec<GutterMessage>>,
}

impl GutterMessages {
    pub fn add(&mut self, source: &str, msg: GutterMessage) {
        self.by_source.entry(source.to_string()).or_default().push(msg);
    }

    pub fn clear(&mut self, source: &str) {
        self.by_source.remove(source);
    }

    pub fn clear_all(&mut self) {
        self.by_source.clear();
    }

    pub fn for_source(&self, source: &str) -> &[GutterMessage] {
        self.by_source.get(source).map_or(&[], Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.by_source.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted, de-duplicated lines carrying at least one message.
    pub fn lines(&self) -> Vec<usize> {
        let mut lines: Vec<usize> = self.by_source.values().flatten().map(|m| m.line).collect();
        lines.sort_unstable();
        lines.dedup();
        lines
    }

    /// First message line strictly after `line`.
    pub fn first_line_after(&self, line: usize) -> Option<usize> {
        self.lines().into_iter().find(|l| *l > line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(line: usize) -> GutterMessage {
        GutterMessage {
            line,
            text: format!("problem on {line}"),
            severity: Severity::Warning,
        }
    }

    #[test]
    fn stale_highlights_are_hidden() {
        let mut h = HighlightIndex::default();
        h.set(4, vec![(Location::new(0, 0), Location::new(0, 3))]);
        assert!(h.contains(4, Location::new(0, 1)));
        assert!(h.spans(5).is_empty());
    }

    #[test]
    fn clearing_one_source_keeps_others() {
        let mut g = GutterMessages::default();
        g.add("lint", msg(3));
        g.add("vet", msg(7));
        g.clear("lint");
        assert!(g.for_source("lint").is_empty());
        assert_eq!(g.for_source("vet").len(), 1);
    }

    #[test]
    fn first_line_after_skips_current_and_earlier() {
        let mut g = GutterMessages::default();
        g.add("lint", msg(3));
        g.add("vet", msg(7));
        g.add("lint", msg(7));
        assert_eq!(g.lines(), vec![3, 7]);
        assert_eq!(g.first_line_after(0), Some(3));
        assert_eq!(g.first_line_after(3), Some(7));
        assert_eq!(g.first_line_after(7), None);
    }
}
