//! Screen state: grid plus cursor, style, scroll region, alternate screen,
//! scrollback, and dirty-row tracking.
//!
//! [`Screen::apply`] is the interpreter for parser [`Action`]s. Every
//! mutator clamps its inputs; nothing in this module panics on hostile
//! escape-sequence output.

use std::collections::BTreeSet;

use bitflags::bitflags;

use crate::cell::{Cell, Color, SgrAttrs, SgrFlags};
use crate::grid::Grid;
use crate::parser::Action;
use crate::scrollback::Scrollback;

const TAB_WIDTH: u16 = 8;

bitflags! {
    /// Terminal modes toggled via SM/RM and DECSET/DECRST.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Mode: u16 {
        const AUTOWRAP = 1 << 0;
        const CURSOR_VISIBLE = 1 << 1;
        const ALT_SCREEN = 1 << 2;
        const BRACKETED_PASTE = 1 << 3;
        const MOUSE_BUTTON = 1 << 4;
        const MOUSE_DRAG = 1 << 5;
        const MOUSE_ANY = 1 << 6;
        const FOCUS_TRACKING = 1 << 7;
        const SGR_MOUSE = 1 << 8;
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::AUTOWRAP | Mode::CURSOR_VISIBLE
    }
}

/// Cursor position in 0-based grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub row: u16,
    pub col: u16,
}

/// DECSC/DECRC snapshot: position plus the active style.
#[derive(Debug, Clone, Copy)]
struct SavedCursor {
    cursor: Cursor,
    attrs: SgrAttrs,
}

/// Scrolling region, 0-based inclusive rows. Defaults to the full grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRegion {
    pub top: u16,
    pub bottom: u16,
}

/// Rows that changed since the renderer last drained them.
#[derive(Debug, Clone, Default)]
pub struct DirtyLines {
    all: bool,
    rows: BTreeSet<u16>,
}

impl DirtyLines {
    pub fn mark(&mut self, row: u16) {
        if !self.all {
            self.rows.insert(row);
        }
    }

    pub fn mark_range(&mut self, start: u16, end_inclusive: u16) {
        if !self.all {
            for r in start..=end_inclusive {
                self.rows.insert(r);
            }
        }
    }

    pub fn mark_all(&mut self) {
        self.all = true;
        self.rows.clear();
    }

    #[must_use]
    pub fn is_all(&self) -> bool {
        self.all
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.all && self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.rows.iter().copied()
    }
}

/// Primary-screen state parked while the alternate screen is active.
#[derive(Debug, Clone)]
struct SavedPrimary {
    grid: Grid,
    cursor: Cursor,
}

/// The complete terminal screen model.
#[derive(Debug, Clone)]
pub struct Screen {
    grid: Grid,
    cursor: Cursor,
    attrs: SgrAttrs,
    modes: Mode,
    region: ScrollRegion,
    saved_cursor: Option<SavedCursor>,
    alt_saved: Option<SavedPrimary>,
    scrollback: Scrollback,
    dirty: DirtyLines,
    wrap_pending: bool,
}

impl Screen {
    #[must_use]
    pub fn new(cols: u16, rows: u16, max_scrollback: usize) -> Self {
        let mut dirty = DirtyLines::default();
        dirty.mark_all();
        Self {
            grid: Grid::new(cols, rows),
            cursor: Cursor::default(),
            attrs: SgrAttrs::new(),
            modes: Mode::default(),
            region: ScrollRegion {
                top: 0,
                bottom: rows.saturating_sub(1),
            },
            saved_cursor: None,
            alt_saved: None,
            scrollback: Scrollback::new(max_scrollback),
            dirty,
            wrap_pending: false,
        }
    }

    #[must_use]
    pub fn cols(&self) -> u16 {
        self.grid.cols()
    }

    #[must_use]
    pub fn rows(&self) -> u16 {
        self.grid.rows()
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    #[must_use]
    pub fn cursor_visible(&self) -> bool {
        self.modes.contains(Mode::CURSOR_VISIBLE)
    }

    #[must_use]
    pub fn attrs(&self) -> SgrAttrs {
        self.attrs
    }

    #[must_use]
    pub fn modes(&self) -> Mode {
        self.modes
    }

    #[must_use]
    pub fn scroll_region(&self) -> ScrollRegion {
        self.region
    }

    #[must_use]
    pub fn scrollback(&self) -> &Scrollback {
        &self.scrollback
    }

    #[must_use]
    pub fn is_alternate(&self) -> bool {
        self.modes.contains(Mode::ALT_SCREEN)
    }

    /// Dirty rows accumulated since the last drain.
    #[must_use]
    pub fn dirty(&self) -> &DirtyLines {
        &self.dirty
    }

    /// Drain dirty state, leaving the screen clean.
    pub fn take_dirty(&mut self) -> DirtyLines {
        std::mem::take(&mut self.dirty)
    }

    // ── Action interpretation ───────────────────────────────────────

    pub fn apply(&mut self, action: &Action) {
        match action {
            Action::Print(ch) => self.write_char(*ch),
            Action::LineFeed => self.line_feed(),
            Action::CarriageReturn => self.carriage_return(),
            Action::Tab => self.tab(),
            Action::Backspace => self.backspace(),
            Action::Bell => {}
            Action::CursorUp(n) => self.move_cursor(-(i32::from(*n)), 0),
            Action::CursorDown(n) => self.move_cursor(i32::from(*n), 0),
            Action::CursorForward(n) => self.move_cursor(0, i32::from(*n)),
            Action::CursorBack(n) => self.move_cursor(0, -(i32::from(*n))),
            Action::CursorNextLine(n) => {
                self.move_cursor(i32::from(*n), 0);
                self.cursor.col = 0;
            }
            Action::CursorPrevLine(n) => {
                self.move_cursor(-(i32::from(*n)), 0);
                self.cursor.col = 0;
            }
            Action::CursorColumn(col) => {
                self.cursor.col = col.saturating_sub(1).min(self.cols().saturating_sub(1));
                self.wrap_pending = false;
            }
            Action::CursorRow(row) => {
                self.cursor.row = row.saturating_sub(1).min(self.rows().saturating_sub(1));
                self.wrap_pending = false;
            }
            Action::CursorPosition { row, col } => self.set_cursor(
                row.saturating_sub(1),
                col.saturating_sub(1),
            ),
            Action::BackTab(n) => self.back_tab(*n),
            Action::EraseInDisplay(mode) => self.erase_in_display(*mode),
            Action::EraseInLine(mode) => self.erase_in_line(*mode),
            Action::EraseChars(n) => {
                self.grid.erase_chars(self.cursor.row, self.cursor.col, *n);
                self.dirty.mark(self.cursor.row);
            }
            Action::InsertChars(n) => {
                self.grid.insert_chars(self.cursor.row, self.cursor.col, *n);
                self.dirty.mark(self.cursor.row);
            }
            Action::DeleteChars(n) => {
                self.grid.delete_chars(self.cursor.row, self.cursor.col, *n);
                self.dirty.mark(self.cursor.row);
            }
            Action::InsertLines(n) => {
                self.grid.insert_lines(
                    self.cursor.row,
                    *n,
                    self.region.top,
                    self.region.bottom + 1,
                );
                self.dirty.mark_range(self.cursor.row, self.region.bottom);
            }
            Action::DeleteLines(n) => {
                self.grid.delete_lines(
                    self.cursor.row,
                    *n,
                    self.region.top,
                    self.region.bottom + 1,
                );
                self.dirty.mark_range(self.cursor.row, self.region.bottom);
            }
            Action::ScrollUp(n) => self.scroll_up(*n),
            Action::ScrollDown(n) => self.scroll_down(*n),
            Action::SetScrollRegion { top, bottom } => self.set_scroll_region(*top, *bottom),
            Action::Sgr(params) => self.apply_sgr(params),
            Action::SetMode { params, .. } => {
                for &m in params {
                    self.set_mode(m, true);
                }
            }
            Action::ResetMode { params, .. } => {
                for &m in params {
                    self.set_mode(m, false);
                }
            }
            Action::SaveCursor => self.save_cursor(),
            Action::RestoreCursor => self.restore_cursor(),
            Action::Index => self.line_feed(),
            Action::ReverseIndex => self.reverse_index(),
            Action::NextLine => {
                self.line_feed();
                self.cursor.col = 0;
            }
            Action::FullReset => self.reset(),
        }
    }

    // ── Writes and basic motion ─────────────────────────────────────

    /// Write one printable character at the cursor, advancing it.
    ///
    /// Wrapping is deferred: the character in the last column leaves the
    /// cursor on it with a pending-wrap flag, and the next printable
    /// triggers the actual wrap. A wide character that would straddle the
    /// right margin wraps whole, leaving the stub cell blank.
    pub fn write_char(&mut self, ch: char) {
        let width = Cell::display_width(ch) as u16;
        if width == 0 || self.cols() == 0 || self.rows() == 0 {
            return;
        }
        let autowrap = self.modes.contains(Mode::AUTOWRAP);
        if self.wrap_pending && autowrap {
            self.wrap_pending = false;
            self.cursor.col = 0;
            self.line_feed();
        }
        if width == 2 && self.cursor.col + 1 >= self.cols() {
            if autowrap {
                // Early wrap: blank the stub and place the wide pair on the
                // next line.
                self.grid.erase_chars(self.cursor.row, self.cursor.col, 1);
                self.dirty.mark(self.cursor.row);
                self.cursor.col = 0;
                self.line_feed();
            } else {
                return;
            }
        }
        let written = self
            .grid
            .write_printable(self.cursor.row, self.cursor.col, ch, self.attrs);
        self.dirty.mark(self.cursor.row);
        let advance = u16::from(written);
        if self.cursor.col + advance >= self.cols() {
            self.cursor.col = self.cols() - 1;
            self.wrap_pending = autowrap;
        } else {
            self.cursor.col += advance;
        }
    }

    /// Move the cursor down one row, scrolling when it sits on the region
    /// bottom.
    pub fn line_feed(&mut self) {
        self.wrap_pending = false;
        if self.cursor.row == self.region.bottom {
            self.scroll_up(1);
        } else if self.cursor.row + 1 < self.rows() {
            self.cursor.row += 1;
        }
    }

    pub fn carriage_return(&mut self) {
        self.cursor.col = 0;
        self.wrap_pending = false;
    }

    pub fn backspace(&mut self) {
        self.cursor.col = self.cursor.col.saturating_sub(1);
        self.wrap_pending = false;
    }

    /// Advance to the next multiple-of-8 column, clamped to the last column.
    pub fn tab(&mut self) {
        let next = (self.cursor.col / TAB_WIDTH + 1) * TAB_WIDTH;
        self.cursor.col = next.min(self.cols().saturating_sub(1));
        self.wrap_pending = false;
    }

    fn back_tab(&mut self, n: u16) {
        for _ in 0..n {
            if self.cursor.col == 0 {
                break;
            }
            self.cursor.col = (self.cursor.col - 1) / TAB_WIDTH * TAB_WIDTH;
        }
        self.wrap_pending = false;
    }

    /// Move the cursor up one row, scrolling down when it sits on the
    /// region top.
    pub fn reverse_index(&mut self) {
        self.wrap_pending = false;
        if self.cursor.row == self.region.top {
            self.scroll_down(1);
        } else {
            self.cursor.row = self.cursor.row.saturating_sub(1);
        }
    }

    fn move_cursor(&mut self, d_row: i32, d_col: i32) {
        let row = i32::from(self.cursor.row) + d_row;
        let col = i32::from(self.cursor.col) + d_col;
        self.cursor.row = row.clamp(0, i32::from(self.rows().saturating_sub(1))) as u16;
        self.cursor.col = col.clamp(0, i32::from(self.cols().saturating_sub(1))) as u16;
        self.wrap_pending = false;
    }

    /// Set the cursor to 0-based coordinates, clamping into bounds.
    pub fn set_cursor(&mut self, row: u16, col: u16) {
        self.cursor.row = row.min(self.rows().saturating_sub(1));
        self.cursor.col = col.min(self.cols().saturating_sub(1));
        self.wrap_pending = false;
    }

    // ── Scrolling ───────────────────────────────────────────────────

    /// Scroll the region up; a full-screen region on the primary screen
    /// feeds scrollback.
    pub fn scroll_up(&mut self, n: u16) {
        let bottom_excl = self.region.bottom + 1;
        if self.feeds_scrollback() {
            self.grid
                .scroll_up_into(self.region.top, bottom_excl, n, &mut self.scrollback);
        } else {
            self.grid.scroll_up(self.region.top, bottom_excl, n);
        }
        self.dirty.mark_range(self.region.top, self.region.bottom);
    }

    /// Scroll the region down, inserting blank rows at the top.
    pub fn scroll_down(&mut self, n: u16) {
        self.grid
            .scroll_down(self.region.top, self.region.bottom + 1, n);
        self.dirty.mark_range(self.region.top, self.region.bottom);
    }

    fn feeds_scrollback(&self) -> bool {
        !self.is_alternate()
            && self.region.top == 0
            && self.region.bottom + 1 == self.rows()
    }

    /// DECSTBM with raw wire values (1-based, 0 meaning default).
    ///
    /// A region where top would not be above bottom is ignored. On success
    /// the cursor homes to the top-left.
    pub fn set_scroll_region(&mut self, top: u16, bottom: u16) {
        let rows = self.rows();
        if rows == 0 {
            return;
        }
        let top0 = top.max(1) - 1;
        let bottom0 = if bottom == 0 { rows - 1 } else { bottom.min(rows) - 1 };
        if top0 >= bottom0 {
            return;
        }
        self.region = ScrollRegion {
            top: top0,
            bottom: bottom0,
        };
        self.set_cursor(0, 0);
    }

    // ── Erase ───────────────────────────────────────────────────────

    fn erase_in_display(&mut self, mode: u8) {
        match mode {
            0 => {
                self.grid.erase_below(self.cursor.row, self.cursor.col);
                self.dirty
                    .mark_range(self.cursor.row, self.rows().saturating_sub(1));
            }
            1 => {
                self.grid.erase_above(self.cursor.row, self.cursor.col);
                self.dirty.mark_range(0, self.cursor.row);
            }
            2 => {
                self.grid.erase_all();
                self.dirty.mark_all();
            }
            3 => {
                // xterm extension: clear scrollback only.
                self.scrollback.clear();
            }
            _ => {}
        }
    }

    fn erase_in_line(&mut self, mode: u8) {
        match mode {
            0 => self.grid.erase_line_right(self.cursor.row, self.cursor.col),
            1 => self.grid.erase_line_left(self.cursor.row, self.cursor.col),
            2 => self.grid.erase_line(self.cursor.row),
            _ => return,
        }
        self.dirty.mark(self.cursor.row);
    }

    // ── SGR ─────────────────────────────────────────────────────────

    fn apply_sgr(&mut self, params: &[u16]) {
        if params.is_empty() {
            self.attrs = SgrAttrs::new();
            return;
        }
        let mut i = 0;
        while i < params.len() {
            match params[i] {
                0 => self.attrs = SgrAttrs::new(),
                1 => self.attrs.flags.insert(SgrFlags::BOLD),
                4 => self.attrs.flags.insert(SgrFlags::UNDERLINE),
                7 => self.attrs.flags.insert(SgrFlags::INVERSE),
                22 => self.attrs.flags.remove(SgrFlags::BOLD),
                24 => self.attrs.flags.remove(SgrFlags::UNDERLINE),
                27 => self.attrs.flags.remove(SgrFlags::INVERSE),
                30..=37 => self.attrs.fg = Color::Named((params[i] - 30) as u8),
                39 => self.attrs.fg = Color::Default,
                40..=47 => self.attrs.bg = Color::Named((params[i] - 40) as u8),
                49 => self.attrs.bg = Color::Default,
                90..=97 => self.attrs.fg = Color::Named((params[i] - 90 + 8) as u8),
                100..=107 => self.attrs.bg = Color::Named((params[i] - 100 + 8) as u8),
                38 | 48 => {
                    let is_fg = params[i] == 38;
                    match Self::extended_color(&params[i + 1..]) {
                        Some((color, consumed)) => {
                            if is_fg {
                                self.attrs.fg = color;
                            } else {
                                self.attrs.bg = color;
                            }
                            i += consumed;
                        }
                        // Malformed extended color: nothing after this can
                        // be trusted.
                        None => break,
                    }
                }
                _ => {}
            }
            i += 1;
        }
    }

    /// Parse the tail of a 38/48 extended-color sequence. Returns the color
    /// and how many parameters were consumed.
    fn extended_color(rest: &[u16]) -> Option<(Color, usize)> {
        match rest.first()? {
            5 => {
                let idx = *rest.get(1)?;
                Some((Color::Indexed(idx.min(255) as u8), 2))
            }
            2 => {
                let r = *rest.get(1)?;
                let g = *rest.get(2)?;
                let b = *rest.get(3)?;
                Some((
                    Color::Rgb(r.min(255) as u8, g.min(255) as u8, b.min(255) as u8),
                    4,
                ))
            }
            _ => None,
        }
    }

    // ── Modes ───────────────────────────────────────────────────────

    fn set_mode(&mut self, mode: u16, on: bool) {
        match mode {
            7 => self.modes.set(Mode::AUTOWRAP, on),
            25 => self.modes.set(Mode::CURSOR_VISIBLE, on),
            47 | 1047 => {
                if on {
                    self.enter_alternate_screen();
                } else {
                    self.exit_alternate_screen();
                }
            }
            1049 => {
                if on {
                    self.save_cursor();
                    self.enter_alternate_screen();
                } else {
                    self.exit_alternate_screen();
                    self.restore_cursor();
                }
            }
            1000 => self.modes.set(Mode::MOUSE_BUTTON, on),
            1002 => self.modes.set(Mode::MOUSE_DRAG, on),
            1003 => self.modes.set(Mode::MOUSE_ANY, on),
            1004 => self.modes.set(Mode::FOCUS_TRACKING, on),
            1006 => self.modes.set(Mode::SGR_MOUSE, on),
            2004 => self.modes.set(Mode::BRACKETED_PASTE, on),
            _ => {}
        }
    }

    // ── Cursor save / restore ───────────────────────────────────────

    pub fn save_cursor(&mut self) {
        self.saved_cursor = Some(SavedCursor {
            cursor: self.cursor,
            attrs: self.attrs,
        });
    }

    /// Restore the saved cursor and style; without a prior save this homes
    /// the cursor with default style.
    pub fn restore_cursor(&mut self) {
        let saved = self.saved_cursor.unwrap_or(SavedCursor {
            cursor: Cursor::default(),
            attrs: SgrAttrs::new(),
        });
        self.set_cursor(saved.cursor.row, saved.cursor.col);
        self.attrs = saved.attrs;
    }

    // ── Alternate screen ────────────────────────────────────────────

    /// Switch to a fresh blank grid, parking the primary. Entering while
    /// already active is a no-op.
    pub fn enter_alternate_screen(&mut self) {
        if self.alt_saved.is_some() {
            return;
        }
        let blank = Grid::new(self.cols(), self.rows());
        let parked = std::mem::replace(&mut self.grid, blank);
        self.alt_saved = Some(SavedPrimary {
            grid: parked,
            cursor: self.cursor,
        });
        self.modes.insert(Mode::ALT_SCREEN);
        self.cursor = Cursor::default();
        self.wrap_pending = false;
        self.dirty.mark_all();
    }

    /// Restore the parked primary grid and cursor. Exiting while inactive
    /// is a no-op.
    pub fn exit_alternate_screen(&mut self) {
        let Some(parked) = self.alt_saved.take() else {
            return;
        };
        self.grid = parked.grid;
        self.cursor = parked.cursor;
        self.modes.remove(Mode::ALT_SCREEN);
        self.wrap_pending = false;
        self.dirty.mark_all();
    }

    // ── Resize and reset ────────────────────────────────────────────

    /// Resize both the active grid and any parked primary, preserving
    /// content top-left aligned. The scroll region resets to the full grid.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        if cols == self.cols() && rows == self.rows() {
            return;
        }
        self.grid.resize(cols, rows);
        if let Some(parked) = &mut self.alt_saved {
            parked.grid.resize(cols, rows);
            parked.cursor.row = parked.cursor.row.min(rows.saturating_sub(1));
            parked.cursor.col = parked.cursor.col.min(cols.saturating_sub(1));
        }
        self.region = ScrollRegion {
            top: 0,
            bottom: rows.saturating_sub(1),
        };
        self.set_cursor(self.cursor.row, self.cursor.col);
        self.wrap_pending = false;
        self.dirty.mark_all();
    }

    /// RIS: blank screen, home cursor, default modes and style, full-grid
    /// scroll region. Scrollback is kept.
    pub fn reset(&mut self) {
        let cols = self.cols();
        let rows = self.rows();
        self.alt_saved = None;
        self.grid = Grid::new(cols, rows);
        self.cursor = Cursor::default();
        self.attrs = SgrAttrs::new();
        self.modes = Mode::default();
        self.region = ScrollRegion {
            top: 0,
            bottom: rows.saturating_sub(1),
        };
        self.saved_cursor = None;
        self.wrap_pending = false;
        self.dirty.mark_all();
    }
}
