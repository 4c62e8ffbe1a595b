#![forbid(unsafe_code)]

//! Host integration for emberterm.
//!
//! `emberterm-host` wraps the `emberterm-core` model with everything an
//! embedding application needs:
//!
//! - **Renderer**: dirty-row redraws over an abstract [`RowSurface`].
//! - **Glyph cache**: stable glyph ids with bounded, wholesale eviction.
//! - **Scheduler**: frame throttling and latest-wins resize debouncing.
//! - **Input**: key/mouse/paste encoding honoring the screen's tracking modes.
//! - **Links**: URL/path detection for modifier-clicks.
//! - **Engine**: the single-owner facade tying it all together.
//!
//! The host owns the clock, the pixels, and the byte transport; this crate
//! owns everything in between.

pub mod engine;
pub mod glyph_cache;
pub mod input;
pub mod links;
pub mod render;
pub mod scheduler;

pub use engine::{EngineConfig, EngineEvent, TerminalEngine};
pub use glyph_cache::{GlyphCache, GlyphCacheStats, GlyphKey};
pub use input::{InputRecord, KeyCode, Modifiers, MouseButton, MouseEvent, MouseEventKind};
pub use links::{Link, link_at, scan_row};
pub use render::{FrameStats, GlyphSpec, Renderer, RendererConfig, RowSurface, ScrollIndicator};
pub use scheduler::{RenderScheduler, ResizeDebouncer, SizeLimits, round_size};
