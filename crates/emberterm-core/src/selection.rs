//! Selection spans over the combined scrollback + viewport line space.

use crate::cell::Cell;
use crate::screen::Screen;

/// A position in the combined buffer: `line` counts from the oldest
/// scrollback line, so viewport row `r` is `scrollback.len() + r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BufferPos {
    pub line: u32,
    pub col: u16,
}

impl BufferPos {
    #[must_use]
    pub const fn new(line: u32, col: u16) -> Self {
        Self { line, col }
    }

    /// Position of viewport cell `(row, col)` given the current scrollback
    /// depth.
    #[must_use]
    pub fn from_viewport(screen: &Screen, row: u16, col: u16) -> Self {
        Self {
            line: screen.scrollback().len() as u32 + u32::from(row),
            col,
        }
    }
}

/// An anchored selection. `start` is where the drag began; the span may
/// run in either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: BufferPos,
    pub end: BufferPos,
}

impl Selection {
    #[must_use]
    pub const fn new(anchor: BufferPos) -> Self {
        Self {
            start: anchor,
            end: anchor,
        }
    }

    /// The span ordered top-left to bottom-right.
    #[must_use]
    pub fn normalized(&self) -> (BufferPos, BufferPos) {
        if self.start <= self.end {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether the cell at `pos` falls inside the span (inclusive ends).
    #[must_use]
    pub fn contains(&self, pos: BufferPos) -> bool {
        let (first, last) = self.normalized();
        if pos.line < first.line || pos.line > last.line {
            return false;
        }
        if first.line == last.line {
            return pos.col >= first.col && pos.col <= last.col;
        }
        if pos.line == first.line {
            return pos.col >= first.col;
        }
        if pos.line == last.line {
            return pos.col <= last.col;
        }
        true
    }

    /// Extract the selected text.
    ///
    /// Wide tails are skipped, trailing whitespace is trimmed per row, and
    /// rows are joined with `\n`.
    #[must_use]
    pub fn extract_text(&self, screen: &Screen) -> String {
        let (first, last) = self.normalized();
        let mut out = String::new();
        for line in first.line..=last.line {
            let Some(cells) = line_cells(screen, line) else {
                continue;
            };
            let start_col = if line == first.line { first.col } else { 0 };
            let end_col = if line == last.line {
                usize::from(last.col).min(cells.len().saturating_sub(1))
            } else {
                cells.len().saturating_sub(1)
            };
            let mut row_text = String::new();
            for cell in cells
                .iter()
                .take(end_col + 1)
                .skip(usize::from(start_col))
            {
                if cell.is_wide_tail() {
                    continue;
                }
                row_text.push(cell.content);
            }
            let trimmed = row_text.trim_end();
            if line > first.line {
                out.push('\n');
            }
            out.push_str(trimmed);
        }
        out
    }
}

/// Cells of one combined-buffer line: scrollback below `len`, viewport
/// above.
fn line_cells<'a>(screen: &'a Screen, line: u32) -> Option<&'a [Cell]> {
    let sb_len = screen.scrollback().len() as u32;
    if line < sb_len {
        screen
            .scrollback()
            .line(line as usize)
            .map(|l| l.cells.as_slice())
    } else {
        let row = line - sb_len;
        if row > u32::from(u16::MAX) {
            return None;
        }
        screen.grid().row_cells(row as u16)
    }
}
