//! The visible cell matrix.
//!
//! `Grid` is a pure 2D buffer: it knows nothing about cursors, styles, or
//! parsing. All operations clamp their coordinates; out-of-range calls are
//! no-ops. Erase operations always fill with blank default-attribute cells.

use crate::cell::{Cell, SgrAttrs};
use crate::scrollback::Scrollback;

/// Flat row-major cell matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Cell>,
    cols: u16,
    rows: u16,
}

impl Grid {
    #[must_use]
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cells: vec![Cell::blank(); cols as usize * rows as usize],
            cols,
            rows,
        }
    }

    #[must_use]
    pub fn cols(&self) -> u16 {
        self.cols
    }

    #[must_use]
    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Cell at `(row, col)`, or `None` if out of bounds.
    #[must_use]
    pub fn cell(&self, row: u16, col: u16) -> Option<&Cell> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells.get(self.index(row, col))
    }

    pub fn cell_mut(&mut self, row: u16, col: u16) -> Option<&mut Cell> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        let idx = self.index(row, col);
        self.cells.get_mut(idx)
    }

    /// All cells of one row as a slice.
    #[must_use]
    pub fn row_cells(&self, row: u16) -> Option<&[Cell]> {
        if row >= self.rows {
            return None;
        }
        let start = self.index(row, 0);
        Some(&self.cells[start..start + self.cols as usize])
    }

    // ── Erase operations ────────────────────────────────────────────
    //
    // Fills are always blank cells with default attributes.

    /// ED 0: erase from `(row, col)` to the end of the screen.
    pub fn erase_below(&mut self, row: u16, col: u16) {
        if row >= self.rows {
            return;
        }
        let start = self.index(row, col.min(self.cols));
        self.fixup_wide_boundary(row, col);
        for cell in &mut self.cells[start..] {
            cell.erase();
        }
    }

    /// ED 1: erase from the start of the screen through `(row, col)`.
    pub fn erase_above(&mut self, row: u16, col: u16) {
        if row >= self.rows || self.cols == 0 {
            return;
        }
        let end = self.index(row, col.min(self.cols.saturating_sub(1))) + 1;
        for cell in &mut self.cells[..end] {
            cell.erase();
        }
        self.fixup_wide_tail(row, col.saturating_add(1));
    }

    /// ED 2: erase the whole screen.
    pub fn erase_all(&mut self) {
        for cell in &mut self.cells {
            cell.erase();
        }
    }

    /// EL 0: erase from `(row, col)` to the end of the line.
    pub fn erase_line_right(&mut self, row: u16, col: u16) {
        self.fixup_wide_boundary(row, col);
        self.erase_row_range(row, col, self.cols);
    }

    /// EL 1: erase from the start of the line through `(row, col)`.
    pub fn erase_line_left(&mut self, row: u16, col: u16) {
        self.erase_row_range(row, 0, col.saturating_add(1));
        self.fixup_wide_tail(row, col.saturating_add(1));
    }

    /// EL 2: erase the whole line.
    pub fn erase_line(&mut self, row: u16) {
        self.erase_row_range(row, 0, self.cols);
    }

    /// ECH: erase `count` cells starting at `(row, col)` without shifting.
    pub fn erase_chars(&mut self, row: u16, col: u16, count: u16) {
        self.fixup_wide_boundary(row, col);
        let end = col.saturating_add(count);
        self.erase_row_range(row, col, end);
        self.fixup_wide_tail(row, end);
    }

    fn erase_row_range(&mut self, row: u16, start_col: u16, end_col: u16) {
        if row >= self.rows {
            return;
        }
        let start_col = start_col.min(self.cols);
        let end_col = end_col.min(self.cols);
        if start_col >= end_col {
            return;
        }
        let start = self.index(row, start_col);
        let end = self.index(row, end_col - 1) + 1;
        for cell in &mut self.cells[start..end] {
            cell.erase();
        }
    }

    /// If `(row, col)` is the tail of a wide pair, blank the lead at `col-1`
    /// so a half-erased wide character never survives.
    fn fixup_wide_boundary(&mut self, row: u16, col: u16) {
        if row >= self.rows || col == 0 || col >= self.cols {
            return;
        }
        let idx = self.index(row, col);
        if self.cells[idx].is_wide_tail() {
            let lead_idx = self.index(row, col - 1);
            self.cells[lead_idx].erase();
        }
    }

    /// If `(row, col)` is an orphaned wide tail (its lead was just erased),
    /// blank it too.
    fn fixup_wide_tail(&mut self, row: u16, col: u16) {
        if row >= self.rows || col >= self.cols {
            return;
        }
        let idx = self.index(row, col);
        if self.cells[idx].is_wide_tail() {
            self.cells[idx].erase();
        }
    }

    // ── Character shifts ────────────────────────────────────────────

    /// ICH: insert `count` blank cells at `(row, col)`, shifting the rest of
    /// the line right. Cells pushed past the right margin are discarded.
    pub fn insert_chars(&mut self, row: u16, col: u16, count: u16) {
        if row >= self.rows || col >= self.cols || count == 0 {
            return;
        }
        self.fixup_wide_boundary(row, col);
        let count = count.min(self.cols - col);
        let start = self.index(row, col);
        let row_end = self.index(row, 0) + self.cols as usize;
        let move_len = (self.cols - col - count) as usize;
        self.cells
            .copy_within(start..start + move_len, start + count as usize);
        for cell in &mut self.cells[start..start + count as usize] {
            cell.erase();
        }
        // A wide lead shifted into the last column loses its tail.
        if self.cells[row_end - 1].is_wide() {
            self.cells[row_end - 1].erase();
        }
        self.fixup_wide_tail(row, col + count);
    }

    /// DCH: delete `count` cells at `(row, col)`, shifting the rest of the
    /// line left and blanking the vacated cells at the right margin.
    pub fn delete_chars(&mut self, row: u16, col: u16, count: u16) {
        if row >= self.rows || col >= self.cols || count == 0 {
            return;
        }
        self.fixup_wide_boundary(row, col);
        let count = count.min(self.cols - col);
        let start = self.index(row, col);
        let src = start + count as usize;
        let move_len = (self.cols - col - count) as usize;
        self.cells.copy_within(src..src + move_len, start);
        let row_end = self.index(row, 0) + self.cols as usize;
        for cell in &mut self.cells[row_end - count as usize..row_end] {
            cell.erase();
        }
        self.fixup_wide_tail(row, col);
    }

    // ── Scroll operations ───────────────────────────────────────────

    /// Scroll lines up within `[top, bottom)` (exclusive bottom): remove
    /// `count` rows at `top`, shift the rest up, blank the vacated bottom.
    pub fn scroll_up(&mut self, top: u16, bottom: u16, count: u16) {
        let top = top.min(self.rows);
        let bottom = bottom.min(self.rows);
        if top >= bottom || count == 0 {
            return;
        }
        let count = count.min(bottom - top);
        let cols = self.cols as usize;

        let src_start = (top + count) as usize * cols;
        let dst_start = top as usize * cols;
        let move_len = (bottom - top - count) as usize * cols;
        self.cells
            .copy_within(src_start..src_start + move_len, dst_start);

        let blank_start = (bottom - count) as usize * cols;
        let blank_end = bottom as usize * cols;
        for cell in &mut self.cells[blank_start..blank_end] {
            cell.erase();
        }
    }

    /// Scroll lines down within `[top, bottom)`: insert `count` blank rows at
    /// `top`, shifting the rest down; rows pushed past `bottom` are discarded.
    pub fn scroll_down(&mut self, top: u16, bottom: u16, count: u16) {
        let top = top.min(self.rows);
        let bottom = bottom.min(self.rows);
        if top >= bottom || count == 0 {
            return;
        }
        let count = count.min(bottom - top);
        let cols = self.cols as usize;

        let src_start = top as usize * cols;
        let src_len = (bottom - top - count) as usize * cols;
        let dst_start = (top + count) as usize * cols;
        self.cells
            .copy_within(src_start..src_start + src_len, dst_start);

        let blank_end = (top + count) as usize * cols;
        for cell in &mut self.cells[src_start..blank_end] {
            cell.erase();
        }
    }

    /// Scroll up, pushing the evicted top rows into `scrollback` first.
    ///
    /// This is the "content scrolls off the top" path for a newline at the
    /// bottom of a full-screen scroll region.
    pub fn scroll_up_into(&mut self, top: u16, bottom: u16, count: u16, scrollback: &mut Scrollback) {
        let top = top.min(self.rows);
        let bottom = bottom.min(self.rows);
        if top >= bottom || count == 0 {
            return;
        }
        let count = count.min(bottom - top);
        for r in top..top + count {
            if let Some(row) = self.row_cells(r) {
                scrollback.push_row(row);
            }
        }
        self.scroll_up(top, bottom, count);
    }

    /// IL: insert `count` blank lines at `row` within `[top, bottom)`.
    pub fn insert_lines(&mut self, row: u16, count: u16, top: u16, bottom: u16) {
        if row < top || row >= bottom {
            return;
        }
        self.scroll_down(row, bottom, count);
    }

    /// DL: delete `count` lines at `row` within `[top, bottom)`.
    pub fn delete_lines(&mut self, row: u16, count: u16, top: u16, bottom: u16) {
        if row < top || row >= bottom {
            return;
        }
        self.scroll_up(row, bottom, count);
    }

    // ── Writes ──────────────────────────────────────────────────────

    /// Write a wide (2-column) character at `(row, col)`.
    ///
    /// Sets the lead at `col` and the tail at `col + 1`. If `col + 1` is past
    /// the right margin, no write occurs: the caller decides wrap policy.
    /// Partially overwritten wide pairs are blanked (the wide fixup).
    pub fn write_wide_char(&mut self, row: u16, col: u16, ch: char, attrs: SgrAttrs) {
        if row >= self.rows || col.saturating_add(1) >= self.cols {
            return;
        }
        self.fixup_wide_boundary(row, col);
        // Overwriting the lead of an existing wide pair at col+1 orphans its
        // tail at col+2.
        let next_idx = self.index(row, col + 1);
        if self.cells[next_idx].is_wide() && col + 2 < self.cols {
            let tail_idx = self.index(row, col + 2);
            self.cells[tail_idx].erase();
        }
        let lead_idx = self.index(row, col);
        self.cells[lead_idx] = Cell::wide(ch, attrs);
        self.cells[next_idx] = Cell::wide_tail(attrs);
    }

    /// Write one printable scalar with terminal-width semantics.
    ///
    /// Returns the width written: 0 (ignored zero-width or non-fitting wide),
    /// 1, or 2. Wrap policy belongs to the caller.
    pub fn write_printable(&mut self, row: u16, col: u16, ch: char, attrs: SgrAttrs) -> u8 {
        if row >= self.rows || col >= self.cols {
            return 0;
        }
        match Cell::display_width(ch) {
            0 => 0,
            1 => {
                self.fixup_wide_boundary(row, col);
                let idx = self.index(row, col);
                if self.cells[idx].is_wide() && col + 1 < self.cols {
                    let tail_idx = self.index(row, col + 1);
                    self.cells[tail_idx].erase();
                }
                self.cells[idx] = Cell::with_attrs(ch, attrs);
                1
            }
            _ => {
                if col + 1 >= self.cols {
                    return 0;
                }
                self.write_wide_char(row, col, ch, attrs);
                2
            }
        }
    }

    // ── Resize ──────────────────────────────────────────────────────

    /// Resize to new dimensions, preserving content top-left aligned.
    ///
    /// Rows and columns that fit are kept, extras are truncated, new space is
    /// blanked. A wide lead stranded in the new last column is blanked.
    pub fn resize(&mut self, new_cols: u16, new_rows: u16) {
        if new_cols == self.cols && new_rows == self.rows {
            return;
        }
        let mut next = vec![Cell::blank(); new_cols as usize * new_rows as usize];
        let copy_rows = self.rows.min(new_rows);
        let copy_cols = self.cols.min(new_cols);
        for r in 0..copy_rows {
            let src = self.index(r, 0);
            let dst = r as usize * new_cols as usize;
            next[dst..dst + copy_cols as usize]
                .copy_from_slice(&self.cells[src..src + copy_cols as usize]);
            if copy_cols > 0 {
                let last = &mut next[dst + copy_cols as usize - 1];
                if last.is_wide() {
                    last.erase();
                }
            }
        }
        self.cells = next;
        self.cols = new_cols;
        self.rows = new_rows;
    }

    fn index(&self, row: u16, col: u16) -> usize {
        row as usize * self.cols as usize + col as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::SgrFlags;

    fn row_text(g: &Grid, row: u16) -> String {
        g.row_cells(row)
            .unwrap()
            .iter()
            .map(|c| c.content)
            .collect()
    }

    fn fill_letters(g: &mut Grid) {
        for r in 0..g.rows() {
            for c in 0..g.cols() {
                let ch = (b'A' + (r * g.cols() + c) as u8 % 26) as char;
                *g.cell_mut(r, c).unwrap() = Cell::with_attrs(ch, SgrAttrs::new());
            }
        }
    }

    #[test]
    fn new_grid_is_blank() {
        let g = Grid::new(4, 3);
        assert_eq!(g.cols(), 4);
        assert_eq!(g.rows(), 3);
        assert_eq!(row_text(&g, 0), "    ");
    }

    #[test]
    fn out_of_bounds_access_is_none() {
        let g = Grid::new(4, 3);
        assert!(g.cell(3, 0).is_none());
        assert!(g.cell(0, 4).is_none());
        assert!(g.row_cells(3).is_none());
    }

    #[test]
    fn erase_line_variants() {
        let mut g = Grid::new(5, 1);
        fill_letters(&mut g);
        g.erase_line_right(0, 3);
        assert_eq!(row_text(&g, 0), "ABC  ");
        fill_letters(&mut g);
        g.erase_line_left(0, 1);
        assert_eq!(row_text(&g, 0), "  CDE");
        g.erase_line(0);
        assert_eq!(row_text(&g, 0), "     ");
    }

    #[test]
    fn erase_uses_default_attrs() {
        let styled = SgrAttrs {
            flags: SgrFlags::BOLD,
            fg: crate::Color::Named(1),
            bg: crate::Color::Named(4),
        };
        let mut g = Grid::new(3, 1);
        *g.cell_mut(0, 1).unwrap() = Cell::with_attrs('x', styled);
        g.erase_line(0);
        assert_eq!(*g.cell(0, 1).unwrap(), Cell::blank());
    }

    #[test]
    fn erase_below_and_above() {
        let mut g = Grid::new(3, 3);
        fill_letters(&mut g);
        g.erase_below(1, 1);
        assert_eq!(row_text(&g, 0), "ABC");
        assert_eq!(row_text(&g, 1), "D  ");
        assert_eq!(row_text(&g, 2), "   ");

        fill_letters(&mut g);
        g.erase_above(1, 1);
        assert_eq!(row_text(&g, 0), "   ");
        assert_eq!(row_text(&g, 1), "  F");
        assert_eq!(row_text(&g, 2), "GHI");
    }

    #[test]
    fn erase_chars_within_row() {
        let mut g = Grid::new(5, 1);
        fill_letters(&mut g);
        g.erase_chars(0, 1, 2);
        assert_eq!(row_text(&g, 0), "A  DE");
        g.erase_chars(0, 3, 99);
        assert_eq!(row_text(&g, 0), "A    ");
    }

    #[test]
    fn insert_chars_shifts_right() {
        let mut g = Grid::new(5, 1);
        fill_letters(&mut g);
        g.insert_chars(0, 1, 2);
        assert_eq!(row_text(&g, 0), "A  BC");
    }

    #[test]
    fn delete_chars_shifts_left() {
        let mut g = Grid::new(5, 1);
        fill_letters(&mut g);
        g.delete_chars(0, 1, 2);
        assert_eq!(row_text(&g, 0), "ADE  ");
        g.delete_chars(0, 2, 99);
        assert_eq!(row_text(&g, 0), "AD   ");
    }

    #[test]
    fn scroll_up_shifts_and_blanks() {
        let mut g = Grid::new(3, 3);
        fill_letters(&mut g);
        g.scroll_up(0, 3, 1);
        assert_eq!(row_text(&g, 0), "DEF");
        assert_eq!(row_text(&g, 1), "GHI");
        assert_eq!(row_text(&g, 2), "   ");
    }

    #[test]
    fn scroll_down_shifts_and_blanks() {
        let mut g = Grid::new(3, 3);
        fill_letters(&mut g);
        g.scroll_down(0, 3, 1);
        assert_eq!(row_text(&g, 0), "   ");
        assert_eq!(row_text(&g, 1), "ABC");
        assert_eq!(row_text(&g, 2), "DEF");
    }

    #[test]
    fn region_scroll_leaves_outside_rows() {
        let mut g = Grid::new(3, 4);
        fill_letters(&mut g);
        g.scroll_up(1, 3, 1);
        assert_eq!(row_text(&g, 0), "ABC");
        assert_eq!(row_text(&g, 1), "GHI");
        assert_eq!(row_text(&g, 2), "   ");
        assert_eq!(row_text(&g, 3), "JKL");
    }

    #[test]
    fn insert_delete_lines_respect_region() {
        let mut g = Grid::new(3, 4);
        fill_letters(&mut g);
        g.insert_lines(1, 1, 1, 3);
        assert_eq!(row_text(&g, 1), "   ");
        assert_eq!(row_text(&g, 2), "DEF");
        assert_eq!(row_text(&g, 3), "JKL");

        fill_letters(&mut g);
        g.delete_lines(0, 1, 1, 3);
        // Row 0 is outside the region: no-op.
        assert_eq!(row_text(&g, 0), "ABC");
    }

    #[test]
    fn scroll_up_into_pushes_scrollback() {
        let mut g = Grid::new(3, 3);
        let mut sb = Scrollback::new(10);
        fill_letters(&mut g);
        g.scroll_up_into(0, 3, 2, &mut sb);
        assert_eq!(sb.len(), 2);
        let oldest: String = sb.line(0).unwrap().cells.iter().map(|c| c.content).collect();
        assert_eq!(oldest, "ABC");
        assert_eq!(row_text(&g, 0), "GHI");
    }

    #[test]
    fn wide_char_occupies_two_cells() {
        let mut g = Grid::new(4, 1);
        let w = g.write_printable(0, 0, '中', SgrAttrs::new());
        assert_eq!(w, 2);
        assert!(g.cell(0, 0).unwrap().is_wide());
        assert!(g.cell(0, 1).unwrap().is_wide_tail());
    }

    #[test]
    fn wide_char_at_margin_is_rejected() {
        let mut g = Grid::new(4, 1);
        let w = g.write_printable(0, 3, '中', SgrAttrs::new());
        assert_eq!(w, 0);
        assert_eq!(*g.cell(0, 3).unwrap(), Cell::blank());
    }

    #[test]
    fn wide_char_at_max_column_is_rejected() {
        let mut g = Grid::new(4, 1);
        g.write_wide_char(0, u16::MAX, '中', SgrAttrs::new());
        assert!(g.row_cells(0).unwrap().iter().all(|c| *c == Cell::blank()));
    }

    #[test]
    fn overwriting_wide_tail_blanks_lead() {
        let mut g = Grid::new(4, 1);
        g.write_printable(0, 0, '中', SgrAttrs::new());
        g.write_printable(0, 1, 'x', SgrAttrs::new());
        assert_eq!(g.cell(0, 0).unwrap().content, ' ');
        assert_eq!(g.cell(0, 1).unwrap().content, 'x');
    }

    #[test]
    fn overwriting_wide_lead_blanks_tail() {
        let mut g = Grid::new(4, 1);
        g.write_printable(0, 1, '中', SgrAttrs::new());
        g.write_printable(0, 1, 'x', SgrAttrs::new());
        assert_eq!(g.cell(0, 1).unwrap().content, 'x');
        assert!(!g.cell(0, 2).unwrap().is_wide_tail());
    }

    #[test]
    fn erase_through_wide_pair_clears_both_halves() {
        let mut g = Grid::new(4, 1);
        g.write_printable(0, 1, '中', SgrAttrs::new());
        g.erase_chars(0, 2, 1);
        assert!(!g.cell(0, 1).unwrap().is_wide());
        assert_eq!(g.cell(0, 1).unwrap().content, ' ');
    }

    #[test]
    fn zero_width_scalar_is_ignored() {
        let mut g = Grid::new(4, 1);
        assert_eq!(g.write_printable(0, 0, '\u{0301}', SgrAttrs::new()), 0);
        assert_eq!(*g.cell(0, 0).unwrap(), Cell::blank());
    }

    #[test]
    fn resize_preserves_top_left() {
        let mut g = Grid::new(3, 3);
        fill_letters(&mut g);
        g.resize(2, 2);
        assert_eq!(row_text(&g, 0), "AB");
        assert_eq!(row_text(&g, 1), "DE");
        g.resize(4, 3);
        assert_eq!(row_text(&g, 0), "AB  ");
        assert_eq!(row_text(&g, 2), "    ");
    }

    #[test]
    fn resize_blanks_stranded_wide_lead() {
        let mut g = Grid::new(4, 1);
        g.write_printable(0, 2, '中', SgrAttrs::new());
        g.resize(3, 1);
        assert_eq!(*g.cell(0, 2).unwrap(), Cell::blank());
    }

    #[test]
    fn clamped_calls_never_panic() {
        let mut g = Grid::new(3, 3);
        g.erase_below(99, 99);
        g.erase_chars(0, 99, 99);
        g.insert_chars(99, 0, 1);
        g.delete_chars(0, 0, 99);
        g.scroll_up(5, 99, 4);
        g.scroll_down(2, 1, 1);
        let mut z = Grid::new(0, 0);
        z.erase_all();
        z.scroll_up(0, 0, 1);
        assert!(z.cell(0, 0).is_none());
        let mut thin = Grid::new(0, 3);
        thin.erase_above(1, 0);
        thin.erase_below(1, 0);
        assert!(thin.row_cells(1).unwrap().is_empty());
    }
}
