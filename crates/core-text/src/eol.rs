//! Line ending detection and normalization.
//!
//! Files are read into an LF-only representation; the dominant original style
//! is remembered so the buffer serializes back the way it was read.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
    Cr,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
            LineEnding::Cr => "\r",
        }
    }
}

/// Result of normalizing line endings.
#[derive(Debug, Clone)]
pub struct NormalizedText {
    pub normalized: String,
    pub original: LineEnding,
    pub had_trailing_newline: bool,
    pub mixed: bool,
}

/// Rewrite `input` to LF-only content. The majority style wins, ties resolve
/// CRLF > LF > CR.
pub fn normalize_line_endings(input: &str) -> NormalizedText {
    let (mut crlf, mut lf, mut cr) = (0usize, 0usize, 0usize);
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                crlf += 1;
                out.push('\n');
            }
            '\r' => {
                cr += 1;
                out.push('\n');
            }
            '\n' => {
                lf += 1;
                out.push('\n');
            }
            other => out.push(other),
        }
    }

    let mut original = LineEnding::Lf;
    let mut max = 0usize;
    for (style, count) in [
        (LineEnding::Crlf, crlf),
        (LineEnding::Lf, lf),
        (LineEnding::Cr, cr),
    ] {
        if count > max {
            max = count;
            original = style;
        }
    }
    let styles_seen = [crlf, lf, cr].iter().filter(|c| **c > 0).count();

    NormalizedText {
        had_trailing_newline: out.ends_with('\n'),
        normalized: out,
        original,
        mixed: styles_seen > 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crlf_majority_detected() {
        let n = normalize_line_endings("a\r\nb\r\nc\n");
        assert_eq!(n.normalized, "a\nb\nc\n");
        assert_eq!(n.original, LineEnding::Crlf);
        assert!(n.mixed);
        assert!(n.had_trailing_newline);
    }

    #[test]
    fn plain_lf_untouched() {
        let n = normalize_line_endings("x\ny");
        assert_eq!(n.normalized, "x\ny");
        assert_eq!(n.original, LineEnding::Lf);
        assert!(!n.mixed);
        assert!(!n.had_trailing_newline);
    }
}
