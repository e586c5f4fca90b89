//! Tab-aware display columns.
//!
//! Vertical cursor motion keeps a *visual* column rather than a character
//! column so that moving across lines mixing tabs and wide characters keeps
//! the cursor visually aligned. Tabs advance to the next multiple of
//! `tab_size`; every other character uses its `unicode-width` cell count
//! (control characters count as zero).

use unicode_width::UnicodeWidthChar;

/// Display width of `c` when it starts at visual column `at`.
pub fn char_width(c: char, at: usize, tab_size: usize) -> usize {
    if c == '\t' {
        let ts = tab_size.max(1);
        ts - at % ts
    } else {
        c.width().unwrap_or(0)
    }
}

/// Visual column of character column `col` in `line`.
pub fn visual_column(line: &str, col: usize, tab_size: usize) -> usize {
    line.chars()
        .take(col)
        .fold(0, |at, c| at + char_width(c, at, tab_size))
}

/// Character column whose cell covers visual column `visual`. Positions past
/// the end of the line resolve to the end-of-line column.
pub fn column_for_visual(line: &str, visual: usize, tab_size: usize) -> usize {
    let mut at = 0usize;
    for (col, c) in line.chars().enumerate() {
        let next = at + char_width(c, at, tab_size);
        if next > visual {
            return col;
        }
        at = next;
    }
    line.chars().count()
}
