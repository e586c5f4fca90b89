//! Vertical viewport tracking for a view.
//!
//! Actions that move the cursor finish with a relocation step that scrolls
//! the viewport so the cursor stays inside it, keeping `margin` lines of
//! context where the height allows.

/// Compute the new first visible line needed to keep `cursor_line` visible,
/// or `None` when no scroll is needed.
pub fn compute_scroll_intent(
    first: usize,
    cursor_line: usize,
    height: usize,
    margin: usize,
) -> Option<usize> {
    if height == 0 {
        return None;
    }
    let m = margin.min(height / 2);
    let bottom = first + height;
    if cursor_line < first + m {
        let new_first = cursor_line.saturating_sub(m);
        if new_first != first {
            return Some(new_first);
        }
    } else if cursor_line + m >= bottom {
        let new_first = cursor_line + m + 1 - height;
        if new_first != first {
            return Some(new_first);
        }
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub first_line: usize,
    /// Number of text rows; zero disables scrolling (headless).
    pub height: usize,
    pub margin: usize,
}

impl Viewport {
    pub fn new(height: usize, margin: usize) -> Self {
        Self {
            first_line: 0,
            height,
            margin,
        }
    }

    /// Scroll to keep `cursor_line` visible. Returns true if the first line changed.
    pub fn relocate(&mut self, cursor_line: usize) -> bool {
        match compute_scroll_intent(self.first_line, cursor_line, self.height, self.margin) {
            Some(first) => {
                self.first_line = first;
                true
            }
            None => false,
        }
    }
}
