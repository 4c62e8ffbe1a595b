//! Color resolution: named / indexed / truecolor to concrete RGB.

use crate::cell::Color;

/// A resolved 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// The standard 16-color base palette (0-7 normal, 8-15 bright).
const BASE: [Rgb; 16] = [
    Rgb::new(0x00, 0x00, 0x00),
    Rgb::new(0xcd, 0x00, 0x00),
    Rgb::new(0x00, 0xcd, 0x00),
    Rgb::new(0xcd, 0xcd, 0x00),
    Rgb::new(0x00, 0x00, 0xee),
    Rgb::new(0xcd, 0x00, 0xcd),
    Rgb::new(0x00, 0xcd, 0xcd),
    Rgb::new(0xe5, 0xe5, 0xe5),
    Rgb::new(0x7f, 0x7f, 0x7f),
    Rgb::new(0xff, 0x00, 0x00),
    Rgb::new(0x00, 0xff, 0x00),
    Rgb::new(0xff, 0xff, 0x00),
    Rgb::new(0x5c, 0x5c, 0xff),
    Rgb::new(0xff, 0x00, 0xff),
    Rgb::new(0x00, 0xff, 0xff),
    Rgb::new(0xff, 0xff, 0xff),
];

/// Full 256-entry palette plus configurable defaults.
///
/// The table is computed once at construction: 16 base colors, a 6x6x6
/// color cube, and a 24-step grayscale ramp. Instances are plain values
/// owned by whoever renders; there is no global palette.
#[derive(Debug, Clone)]
pub struct Palette {
    table: [Rgb; 256],
    default_fg: Rgb,
    default_bg: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(Rgb::new(0xe5, 0xe5, 0xe5), Rgb::new(0x00, 0x00, 0x00))
    }
}

impl Palette {
    #[must_use]
    pub fn new(default_fg: Rgb, default_bg: Rgb) -> Self {
        let mut table = [Rgb::new(0, 0, 0); 256];
        table[..16].copy_from_slice(&BASE);
        // 6x6x6 cube, xterm levels.
        const LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];
        for i in 0..216 {
            table[16 + i] = Rgb::new(
                LEVELS[i / 36],
                LEVELS[i / 6 % 6],
                LEVELS[i % 6],
            );
        }
        // 24-step grayscale ramp.
        for i in 0..24 {
            let v = 8 + 10 * i as u8;
            table[232 + i] = Rgb::new(v, v, v);
        }
        Self {
            table,
            default_fg,
            default_bg,
        }
    }

    #[must_use]
    pub fn default_fg(&self) -> Rgb {
        self.default_fg
    }

    #[must_use]
    pub fn default_bg(&self) -> Rgb {
        self.default_bg
    }

    /// Resolve a foreground color to RGB.
    #[must_use]
    pub fn resolve_fg(&self, color: Color) -> Rgb {
        self.resolve(color, self.default_fg)
    }

    /// Resolve a background color to RGB.
    #[must_use]
    pub fn resolve_bg(&self, color: Color) -> Rgb {
        self.resolve(color, self.default_bg)
    }

    fn resolve(&self, color: Color, default: Rgb) -> Rgb {
        match color {
            Color::Default => default,
            Color::Named(n) => self.table[usize::from(n & 0x0f)],
            Color::Indexed(n) => self.table[usize::from(n)],
            Color::Rgb(r, g, b) => Rgb::new(r, g, b),
        }
    }
}
