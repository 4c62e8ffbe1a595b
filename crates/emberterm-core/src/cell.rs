//! Terminal cell: character content plus SGR attributes.

use bitflags::bitflags;
use unicode_width::UnicodeWidthChar;

bitflags! {
    /// Text style attributes set via SGR sequences.
    ///
    /// The engine's style model is deliberately small: bold, underline, and
    /// inverse are honored end to end. Other SGR attributes are parsed and
    /// dropped so that unknown styling never corrupts state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SgrFlags: u8 {
        const BOLD = 1 << 0;
        const UNDERLINE = 1 << 1;
        const INVERSE = 1 << 2;
    }
}

bitflags! {
    /// Structural cell flags (distinct from visual SGR attributes).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CellFlags: u8 {
        /// Leading cell of a character occupying two columns.
        const WIDE = 1 << 0;
        /// Trailing placeholder of a wide character. Never rendered standalone.
        const WIDE_TAIL = 1 << 1;
    }
}

/// A color as specified by SGR sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// Terminal default foreground or background.
    #[default]
    Default,
    /// One of the 16 base colors (0-7 normal, 8-15 bright).
    Named(u8),
    /// 256-color palette index.
    Indexed(u8),
    /// 24-bit truecolor.
    Rgb(u8, u8, u8),
}

/// The visual attributes a cell carries: style flags plus colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SgrAttrs {
    pub flags: SgrFlags,
    pub fg: Color,
    pub bg: Color,
}

impl SgrAttrs {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            flags: SgrFlags::empty(),
            fg: Color::Default,
            bg: Color::Default,
        }
    }
}

/// A single terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub content: char,
    pub flags: CellFlags,
    pub attrs: SgrAttrs,
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank()
    }
}

impl Cell {
    /// A blank cell with default attributes.
    #[must_use]
    pub const fn blank() -> Self {
        Self {
            content: ' ',
            flags: CellFlags::empty(),
            attrs: SgrAttrs::new(),
        }
    }

    /// A cell holding `content` with the given attributes.
    #[must_use]
    pub const fn with_attrs(content: char, attrs: SgrAttrs) -> Self {
        Self {
            content,
            flags: CellFlags::empty(),
            attrs,
        }
    }

    /// The leading cell of a wide character.
    #[must_use]
    pub const fn wide(content: char, attrs: SgrAttrs) -> Self {
        Self {
            content,
            flags: CellFlags::WIDE,
            attrs,
        }
    }

    /// The trailing placeholder of a wide character.
    #[must_use]
    pub const fn wide_tail(attrs: SgrAttrs) -> Self {
        Self {
            content: ' ',
            flags: CellFlags::WIDE_TAIL,
            attrs,
        }
    }

    /// Reset to a blank with default attributes.
    ///
    /// Erase operations always fill with defaults; the current writing style
    /// never leaks into erased regions.
    pub fn erase(&mut self) {
        *self = Self::blank();
    }

    #[must_use]
    pub fn is_wide(&self) -> bool {
        self.flags.contains(CellFlags::WIDE)
    }

    #[must_use]
    pub fn is_wide_tail(&self) -> bool {
        self.flags.contains(CellFlags::WIDE_TAIL)
    }

    /// Display width of `ch` in terminal columns: 0, 1, or 2.
    ///
    /// Zero-width characters (combining marks) are reported as 0 and are not
    /// given their own cell. Control characters never reach this path; the
    /// parser consumes them.
    #[must_use]
    pub fn display_width(ch: char) -> usize {
        UnicodeWidthChar::width(ch).unwrap_or(0)
    }
}
