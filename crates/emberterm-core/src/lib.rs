#![forbid(unsafe_code)]

//! Platform-neutral VT/ANSI terminal model.
//!
//! `emberterm-core` is the platform-independent terminal model. It owns grid
//! state, VT/ANSI parsing, cursor positioning, scroll regions, the alternate
//! screen, and scrollback, all without any host I/O dependencies.
//!
//! # Primary responsibilities
//!
//! - **Cell**: character content + SGR attributes (colors, bold, underline, inverse).
//! - **Grid**: 2D cell matrix representing the visible viewport.
//! - **Screen**: cursor, current style, scroll region, alternate screen, dirty rows.
//! - **Parser**: VT/ANSI byte state machine emitting [`Action`] values.
//! - **Palette**: named/indexed/truecolor resolution to RGB.
//! - **Scrollback**: bounded ring of lines scrolled off the top.
//! - **Selection**: spans over scrollback + viewport with text extraction.
//!
//! # Design principles
//!
//! - **No I/O**: all types are pure data + logic; the host supplies bytes.
//! - **Never panic on input**: malformed sequences degrade to no-ops, coordinates clamp.
//! - **Deterministic**: identical byte sequences always produce identical state.

pub mod cell;
pub mod grid;
pub mod palette;
pub mod parser;
pub mod screen;
pub mod scrollback;
pub mod selection;

pub use cell::{Cell, CellFlags, Color, SgrAttrs, SgrFlags};
pub use grid::Grid;
pub use palette::{Palette, Rgb};
pub use parser::{Action, CsiParams, Parser};
pub use screen::{Cursor, DirtyLines, Mode, Screen, ScrollRegion};
pub use scrollback::{Scrollback, ScrollbackLine};
pub use selection::{BufferPos, Selection};
