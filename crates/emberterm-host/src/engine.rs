//! The embedding facade: one object a host drives with bytes, input
//! events, and clock ticks.
//!
//! The engine owns parser, screen, renderer, and schedulers, and is a
//! single-owner object: hosts marshal PTY output and UI events onto
//! whatever thread owns it. Results flow back through a polled event
//! queue, never callbacks, so after [`TerminalEngine::shutdown`] nothing
//! can fire.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use emberterm_core::{Action, BufferPos, Palette, Parser, Screen, Selection};
use tracing::debug;

use crate::input::{self, KeyCode, Modifiers, MouseButton, MouseEvent, MouseEventKind};
use crate::links;
use crate::render::{FrameStats, Renderer, RendererConfig, RowSurface};
use crate::scheduler::{RenderScheduler, ResizeDebouncer, SizeLimits};

/// Wheel steps per notch when scrolling locally through history.
const WHEEL_SCROLL_LINES: isize = 3;

/// Events the host drains after driving the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Bytes to forward to whatever feeds the terminal.
    Input(Vec<u8>),
    /// The debounced grid size actually changed.
    SizeChanged { cols: u16, rows: u16 },
    /// A modifier-click landed on a detected link.
    LinkClicked(String),
    /// BEL arrived in the output stream.
    Bell,
}

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub cols: u16,
    pub rows: u16,
    pub max_scrollback: usize,
    pub frame_interval: Duration,
    pub resize_quiet: Duration,
    pub size_limits: SizeLimits,
    pub renderer: RendererConfig,
    /// Holding this modifier keeps mouse events local for selection even
    /// when the application tracks the mouse.
    pub selection_modifier: Modifiers,
    /// Clicking with this modifier held opens links.
    pub link_modifier: Modifiers,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cols: 80,
            rows: 24,
            max_scrollback: 10_000,
            frame_interval: Duration::from_millis(16),
            resize_quiet: Duration::from_millis(150),
            size_limits: SizeLimits::default(),
            renderer: RendererConfig::default(),
            selection_modifier: Modifiers::SHIFT,
            link_modifier: Modifiers::CTRL,
        }
    }
}

pub struct TerminalEngine {
    parser: Parser,
    screen: Screen,
    renderer: Renderer,
    frames: RenderScheduler,
    resizes: ResizeDebouncer,
    events: VecDeque<EngineEvent>,
    selecting: bool,
    config: EngineConfig,
}

impl TerminalEngine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            parser: Parser::new(),
            screen: Screen::new(config.cols, config.rows, config.max_scrollback),
            renderer: Renderer::new(Palette::default(), config.renderer),
            frames: RenderScheduler::new(config.frame_interval),
            resizes: ResizeDebouncer::new(config.resize_quiet, config.size_limits),
            events: VecDeque::new(),
            selecting: false,
            config,
        }
    }

    #[must_use]
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    #[must_use]
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Feed output bytes. Chunk boundaries are arbitrary; sequences split
    /// anywhere reassemble.
    pub fn write(&mut self, bytes: &[u8]) {
        for action in self.parser.feed(bytes) {
            if action == Action::Bell {
                self.events.push_back(EngineEvent::Bell);
            }
            self.screen.apply(&action);
        }
        if !self.screen.dirty().is_empty() {
            self.frames.request();
        }
    }

    /// Record a raw resize request; it commits after the quiet period.
    pub fn resize_request(&mut self, cols: u16, rows: u16, now: Instant) {
        self.resizes.request(cols, rows, now);
    }

    /// Periodic tick: commits due resizes and renders at most one frame.
    pub fn tick(&mut self, now: Instant, surface: &mut impl RowSurface) -> Option<FrameStats> {
        if let Some((cols, rows)) = self.resizes.poll(now) {
            self.apply_resize(cols, rows);
        }
        if self.frames.poll(now) {
            return Some(self.renderer.render_frame(&mut self.screen, surface));
        }
        None
    }

    fn apply_resize(&mut self, cols: u16, rows: u16) {
        debug!(cols, rows, "committing resize");
        self.screen.resize(cols, rows);
        self.events.push_back(EngineEvent::SizeChanged { cols, rows });
        self.frames.request();
    }

    /// A key press. Typing snaps a scrolled-back view to live.
    pub fn key(&mut self, code: KeyCode, mods: Modifiers) {
        let bytes = input::encode_key(code, mods);
        if bytes.is_empty() {
            return;
        }
        if self.renderer.view_offset() != 0 {
            self.renderer.reset_view();
            self.frames.request();
        }
        self.events.push_back(EngineEvent::Input(bytes));
    }

    /// Committed text from the host (IME composition, character input that
    /// bypassed key translation). Passed through as UTF-8.
    pub fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.renderer.view_offset() != 0 {
            self.renderer.reset_view();
            self.frames.request();
        }
        self.events
            .push_back(EngineEvent::Input(text.as_bytes().to_vec()));
    }

    pub fn paste(&mut self, text: &str) {
        let bracketed = self
            .screen
            .modes()
            .contains(emberterm_core::Mode::BRACKETED_PASTE);
        self.events
            .push_back(EngineEvent::Input(input::encode_paste(text, bracketed)));
    }

    pub fn focus(&mut self, gained: bool) {
        let bytes = input::encode_focus(gained, self.screen.modes());
        if !bytes.is_empty() {
            self.events.push_back(EngineEvent::Input(bytes));
        }
    }

    /// A mouse event. Goes to the application when its tracking modes
    /// capture it, unless the selection modifier forces local handling.
    pub fn mouse(&mut self, event: MouseEvent) {
        let force_local = event.mods.contains(self.config.selection_modifier);
        if !force_local && input::mouse_captured(event.kind, self.screen.modes()) {
            let bytes = input::encode_mouse(&event, self.screen.modes());
            if !bytes.is_empty() {
                self.events.push_back(EngineEvent::Input(bytes));
            }
            return;
        }
        self.mouse_local(event);
    }

    fn mouse_local(&mut self, event: MouseEvent) {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if event.mods.contains(self.config.link_modifier) {
                    if let Some(text) = self.link_under(event.row, event.col) {
                        self.events.push_back(EngineEvent::LinkClicked(text));
                        return;
                    }
                }
                let anchor = self.buffer_pos(event.row, event.col);
                self.selecting = true;
                self.renderer.set_selection(Some(Selection::new(anchor)));
                self.frames.request();
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if self.selecting
                    && let Some(mut sel) = self.renderer.selection()
                {
                    sel.end = self.buffer_pos(event.row, event.col);
                    self.renderer.set_selection(Some(sel));
                    self.frames.request();
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.selecting = false;
            }
            MouseEventKind::WheelUp => self.scroll_view(WHEEL_SCROLL_LINES),
            MouseEventKind::WheelDown => self.scroll_view(-WHEEL_SCROLL_LINES),
            _ => {}
        }
    }

    /// Scroll the view through history; positive moves toward older lines.
    pub fn scroll_view(&mut self, lines: isize) {
        self.renderer.scroll_view(lines, &self.screen);
        self.frames.request();
    }

    /// Extract and clear the selection.
    pub fn copy_selection(&mut self) -> Option<String> {
        let selection = self.renderer.selection()?;
        let text = selection.extract_text(&self.screen);
        self.renderer.set_selection(None);
        self.selecting = false;
        self.frames.request();
        if text.is_empty() { None } else { Some(text) }
    }

    /// Drain all queued events in arrival order.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain(..).collect()
    }

    /// Drop all pending work; subsequent ticks render nothing.
    pub fn shutdown(&mut self) {
        self.frames.shutdown();
        self.events.clear();
    }

    fn buffer_pos(&self, row: u16, col: u16) -> BufferPos {
        let sb_len = self.screen.scrollback().len();
        // The offset can exceed the history length right after ED 3
        // (clearing scrollback dirties no rows, so the view has not
        // snapped back yet).
        let line = sb_len - self.renderer.view_offset().min(sb_len) + usize::from(row);
        BufferPos::new(line as u32, col.min(self.screen.cols().saturating_sub(1)))
    }

    fn link_under(&self, row: u16, col: u16) -> Option<String> {
        let text = self.visible_row_text(row)?;
        let found = links::scan_row(&text);
        links::link_at(&found, col).map(|l| l.text.clone())
    }

    /// Text of the viewport row under the current view offset, one char
    /// per column. Wide tails become spaces so columns stay aligned for
    /// the link hit test.
    fn visible_row_text(&self, row: u16) -> Option<String> {
        let sb_len = self.screen.scrollback().len();
        let line = sb_len - self.renderer.view_offset().min(sb_len) + usize::from(row);
        let cells: Vec<emberterm_core::Cell> = if line < sb_len {
            self.screen.scrollback().line(line)?.cells.clone()
        } else {
            self.screen
                .grid()
                .row_cells((line - sb_len) as u16)?
                .to_vec()
        };
        Some(
            cells
                .iter()
                .map(|c| if c.is_wide_tail() { ' ' } else { c.content })
                .collect(),
        )
    }
}
