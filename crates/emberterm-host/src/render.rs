//! Dirty-row rendering over an abstract row surface.
//!
//! The renderer owns no pixels. It turns screen state into row-draw calls
//! on a [`RowSurface`] the host implements (canvas, texture, cell buffer),
//! redrawing only rows whose content actually changed. A per-row content
//! hash catches rows marked dirty that ended up visually identical.

use std::hash::{Hash, Hasher};

use emberterm_core::{Cell, CellFlags, Palette, Rgb, Screen, Selection, SgrFlags};
use tracing::debug;

use crate::glyph_cache::{GlyphCache, GlyphKey};

/// One glyph draw, fully resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphSpec {
    pub ch: char,
    pub glyph_id: u32,
    pub fg: Rgb,
    pub bold: bool,
    /// Wide glyphs span two columns.
    pub wide: bool,
}

/// Host-implemented draw target. Calls arrive row by row; a row is always
/// cleared before anything else is drawn into it.
pub trait RowSurface {
    fn clear_row(&mut self, row: u16);
    fn fill_bg(&mut self, row: u16, col: u16, width: u16, color: Rgb);
    fn draw_glyph(&mut self, row: u16, col: u16, spec: &GlyphSpec);
    fn draw_underline(&mut self, row: u16, col: u16, width: u16, color: Rgb);
    /// Inclusive column range of the selection overlay on this row, or
    /// `None` to clear it.
    fn set_row_highlight(&mut self, row: u16, range: Option<(u16, u16)>);
    fn set_cursor(&mut self, pos: Option<(u16, u16)>);
    /// Scroll position overlay. `Some` while the view is scrolled into
    /// history; hosts draw it as a position marker plus a jump-to-live
    /// affordance. `None` hides it.
    fn set_scroll_indicator(&mut self, indicator: Option<ScrollIndicator>);
}

/// How far into history the view sits and how much history exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollIndicator {
    /// Lines above the live viewport, always non-zero.
    pub offset: usize,
    /// Total scrollback lines available.
    pub total: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub rows_drawn: u32,
    pub glyphs_drawn: u32,
    pub full_redraw: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct RendererConfig {
    pub font_px: u16,
    pub glyph_cache_capacity: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            font_px: 14,
            glyph_cache_capacity: 4096,
        }
    }
}

pub struct Renderer {
    palette: Palette,
    glyphs: GlyphCache,
    config: RendererConfig,
    /// Lines scrolled back into history; 0 shows the live viewport.
    view_offset: usize,
    row_hashes: Vec<Option<u64>>,
    selection: Option<Selection>,
    force_full: bool,
}

impl Renderer {
    #[must_use]
    pub fn new(palette: Palette, config: RendererConfig) -> Self {
        Self {
            palette,
            glyphs: GlyphCache::new(config.glyph_cache_capacity),
            config,
            view_offset: 0,
            row_hashes: Vec::new(),
            selection: None,
            force_full: true,
        }
    }

    #[must_use]
    pub fn view_offset(&self) -> usize {
        self.view_offset
    }

    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    #[must_use]
    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Scroll the view by `delta` lines (positive = further into history),
    /// clamped to the available scrollback.
    pub fn scroll_view(&mut self, delta: isize, screen: &Screen) {
        let max = screen.scrollback().len();
        let next = self
            .view_offset
            .saturating_add_signed(delta)
            .min(max);
        if next != self.view_offset {
            self.view_offset = next;
            self.force_full = true;
        }
    }

    /// Snap back to the live view.
    pub fn reset_view(&mut self) {
        if self.view_offset != 0 {
            self.view_offset = 0;
            self.force_full = true;
        }
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        if self.selection != selection {
            self.selection = selection;
            self.force_full = true;
        }
    }

    /// Drain the screen's dirty rows and redraw them on `surface`.
    ///
    /// New output snaps the view back to live, matching how terminals
    /// behave when a scrolled-back session produces output.
    pub fn render_frame(
        &mut self,
        screen: &mut Screen,
        surface: &mut impl RowSurface,
    ) -> FrameStats {
        let rows = screen.rows() as usize;
        if self.row_hashes.len() != rows {
            self.row_hashes = vec![None; rows];
            self.force_full = true;
        }

        let dirty = screen.take_dirty();
        if !dirty.is_empty() && self.view_offset != 0 {
            self.reset_view();
        }
        // Scrollback can shrink without dirtying any row (ED 3); a stale
        // offset past the new history end would point above line zero.
        let sb_len = screen.scrollback().len();
        if self.view_offset > sb_len {
            self.view_offset = sb_len;
            self.force_full = true;
        }
        let full = self.force_full || dirty.is_all();
        self.force_full = false;

        let mut stats = FrameStats {
            full_redraw: full,
            ..FrameStats::default()
        };
        let rows_to_draw: Vec<u16> = if full {
            (0..screen.rows()).collect()
        } else {
            dirty.iter().collect()
        };

        for row in rows_to_draw {
            let drawn = self.draw_row(screen, surface, row, full);
            if drawn.redrew {
                stats.rows_drawn += 1;
                stats.glyphs_drawn += drawn.glyphs;
            }
            if drawn.cache_cleared {
                // All previously issued glyph ids just died; every other
                // row must be repainted with fresh ids on the next frame.
                debug!(row, "glyph cache cleared mid-frame");
                for h in &mut self.row_hashes {
                    *h = None;
                }
                self.force_full = true;
            }
        }

        surface.set_cursor(self.cursor_marker(screen));
        surface.set_scroll_indicator(self.scroll_marker(screen));
        stats
    }

    fn scroll_marker(&self, screen: &Screen) -> Option<ScrollIndicator> {
        if self.view_offset == 0 {
            return None;
        }
        Some(ScrollIndicator {
            offset: self.view_offset,
            total: screen.scrollback().len(),
        })
    }

    fn cursor_marker(&self, screen: &Screen) -> Option<(u16, u16)> {
        if self.view_offset != 0 || !screen.cursor_visible() {
            return None;
        }
        let c = screen.cursor();
        Some((c.row, c.col))
    }

    fn draw_row(
        &mut self,
        screen: &Screen,
        surface: &mut impl RowSurface,
        row: u16,
        forced: bool,
    ) -> RowDrawResult {
        let mut result = RowDrawResult::default();
        let Some(cells) = self.visible_row(screen, row) else {
            return result;
        };

        let hash = row_hash(&cells);
        if !forced && self.row_hashes[row as usize] == Some(hash) {
            return result;
        }
        self.row_hashes[row as usize] = Some(hash);
        result.redrew = true;

        surface.clear_row(row);
        for (col, cell) in cells.iter().enumerate() {
            if cell.flags.contains(CellFlags::WIDE_TAIL) {
                continue;
            }
            let col = col as u16;
            let wide = cell.flags.contains(CellFlags::WIDE);
            let span = if wide { 2 } else { 1 };
            let mut fg = self.palette.resolve_fg(cell.attrs.fg);
            let mut bg = self.palette.resolve_bg(cell.attrs.bg);
            if cell.attrs.flags.contains(SgrFlags::INVERSE) {
                std::mem::swap(&mut fg, &mut bg);
            }
            if cell.content != ' ' {
                // Blank cells never get a background rect, even under
                // inverse; this keeps cursor and selection overlays from
                // leaving artifacts on empty regions.
                if bg != self.palette.default_bg() {
                    surface.fill_bg(row, col, span, bg);
                }
                let bold = cell.attrs.flags.contains(SgrFlags::BOLD);
                let (glyph_id, cleared) = self.glyphs.resolve(GlyphKey {
                    ch: cell.content,
                    fg,
                    bold,
                    font_px: self.config.font_px,
                });
                result.cache_cleared |= cleared;
                surface.draw_glyph(
                    row,
                    col,
                    &GlyphSpec {
                        ch: cell.content,
                        glyph_id,
                        fg,
                        bold,
                        wide,
                    },
                );
                result.glyphs += 1;
            }
            if cell.attrs.flags.contains(SgrFlags::UNDERLINE) {
                surface.draw_underline(row, col, span, fg);
            }
        }
        surface.set_row_highlight(row, self.selection_range(screen, row));
        result
    }

    /// The cells shown at viewport `row` under the current view offset:
    /// scrollback snapshots above, live grid rows below.
    fn visible_row(&self, screen: &Screen, row: u16) -> Option<Vec<Cell>> {
        if self.view_offset == 0 {
            return screen.grid().row_cells(row).map(<[Cell]>::to_vec);
        }
        let sb_len = screen.scrollback().len();
        let line = sb_len - self.view_offset.min(sb_len) + usize::from(row);
        if line < sb_len {
            let mut cells = screen.scrollback().line(line)?.cells.clone();
            cells.resize(screen.cols() as usize, Cell::blank());
            Some(cells)
        } else {
            screen
                .grid()
                .row_cells((line - sb_len) as u16)
                .map(<[Cell]>::to_vec)
        }
    }

    fn selection_range(&self, screen: &Screen, row: u16) -> Option<(u16, u16)> {
        let selection = self.selection?;
        let (first, last) = selection.normalized();
        let sb_len = screen.scrollback().len();
        let line = (sb_len - self.view_offset.min(sb_len) + usize::from(row)) as u32;
        if line < first.line || line > last.line {
            return None;
        }
        let start = if line == first.line { first.col } else { 0 };
        let end = if line == last.line {
            last.col
        } else {
            screen.cols().saturating_sub(1)
        };
        Some((start, end))
    }
}

#[derive(Debug, Default)]
struct RowDrawResult {
    redrew: bool,
    glyphs: u32,
    cache_cleared: bool,
}

fn row_hash(cells: &[Cell]) -> u64 {
    let mut hasher = std::hash::DefaultHasher::new();
    cells.hash(&mut hasher);
    hasher.finish()
}
