//! VT/ANSI escape-sequence state machine.
//!
//! The parser turns raw bytes into [`Action`] values and owns no screen
//! state; [`crate::Screen::apply`] interprets the actions. Feeding may split
//! sequences (and multi-byte UTF-8 scalars) across arbitrary chunk
//! boundaries. Malformed or unrecognized sequences drop back to ground
//! without emitting anything: hostile output degrades, it never panics.

/// Maximum number of CSI parameters retained. Further separators are
/// accepted but their values are dropped.
const MAX_CSI_PARAMS: usize = 32;

/// Interpreter actions emitted by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Print(char),
    LineFeed,
    CarriageReturn,
    Tab,
    Backspace,
    Bell,
    CursorUp(u16),
    CursorDown(u16),
    CursorForward(u16),
    CursorBack(u16),
    /// CNL: down n rows, column 0.
    CursorNextLine(u16),
    /// CPL: up n rows, column 0.
    CursorPrevLine(u16),
    /// CHA: absolute column (1-based on the wire, converted by the screen).
    CursorColumn(u16),
    /// VPA: absolute row.
    CursorRow(u16),
    /// CUP/HVP.
    CursorPosition { row: u16, col: u16 },
    /// CBT: back `n` tab stops.
    BackTab(u16),
    EraseInDisplay(u8),
    EraseInLine(u8),
    EraseChars(u16),
    InsertChars(u16),
    DeleteChars(u16),
    InsertLines(u16),
    DeleteLines(u16),
    ScrollUp(u16),
    ScrollDown(u16),
    /// DECSTBM. Zero values mean "default" (full screen).
    SetScrollRegion { top: u16, bottom: u16 },
    Sgr(Vec<u16>),
    /// SM / DECSET. `private` records a leading `?`.
    SetMode { params: Vec<u16>, private: bool },
    /// RM / DECRST.
    ResetMode { params: Vec<u16>, private: bool },
    SaveCursor,
    RestoreCursor,
    /// IND: cursor down one row, scrolling at the region bottom.
    Index,
    /// RI: cursor up one row, scrolling at the region top.
    ReverseIndex,
    /// NEL: line feed plus carriage return.
    NextLine,
    /// RIS.
    FullReset,
}

/// In-progress CSI accumulator.
///
/// `private` records a leading `?` byte. Modes arriving with and without
/// the marker are currently dispatched through the same table; the flag is
/// carried so the two spaces can be split later without reparsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsiParams {
    pub params: Vec<u16>,
    pub current: u16,
    pub has_current: bool,
    pub private: bool,
}

impl CsiParams {
    fn clear(&mut self) {
        self.params.clear();
        self.current = 0;
        self.has_current = false;
        self.private = false;
    }

    fn digit(&mut self, d: u8) {
        self.current = self
            .current
            .saturating_mul(10)
            .saturating_add(u16::from(d));
        self.has_current = true;
    }

    fn commit(&mut self) {
        if self.params.len() < MAX_CSI_PARAMS {
            self.params.push(self.current);
        }
        self.current = 0;
        self.has_current = false;
    }

    /// Finish accumulation and take the parameter list.
    fn finish(&mut self) -> Vec<u16> {
        if self.has_current || !self.params.is_empty() {
            self.commit();
        }
        std::mem::take(&mut self.params)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    Esc,
    /// After ESC `(`, `)`, `*`, or `+`: the next byte is a charset
    /// designator, consumed and discarded.
    EscIntermediate,
    Csi,
    Osc,
    /// ESC seen inside an OSC payload; `\` terminates, anything else
    /// returns to the payload.
    OscEsc,
    Utf8,
}

/// Streaming VT/ANSI parser.
#[derive(Debug, Clone)]
pub struct Parser {
    state: State,
    csi: CsiParams,
    utf8_buf: [u8; 4],
    utf8_len: usize,
    utf8_remaining: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Ground,
            csi: CsiParams::default(),
            utf8_buf: [0; 4],
            utf8_len: 0,
            utf8_remaining: 0,
        }
    }

    /// Feed a chunk of bytes, collecting all actions it completes.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Action> {
        let mut actions = Vec::new();
        for &b in bytes {
            self.advance(b, &mut actions);
        }
        actions
    }

    fn advance(&mut self, byte: u8, out: &mut Vec<Action>) {
        match self.state {
            State::Ground => self.ground(byte, out),
            State::Esc => self.esc(byte, out),
            State::EscIntermediate => {
                // Charset designator byte. Charset switching is accepted and
                // ignored.
                self.state = State::Ground;
            }
            State::Csi => self.csi(byte, out),
            State::Osc => {
                match byte {
                    0x07 => self.state = State::Ground,
                    0x1b => self.state = State::OscEsc,
                    _ => {}
                }
            }
            State::OscEsc => {
                // ESC \ (ST) ends the OSC string. Any other byte means the
                // ESC belonged to the payload; keep discarding.
                self.state = if byte == b'\\' { State::Ground } else { State::Osc };
            }
            State::Utf8 => self.utf8_continuation(byte, out),
        }
    }

    fn ground(&mut self, byte: u8, out: &mut Vec<Action>) {
        match byte {
            0x1b => self.state = State::Esc,
            b'\n' | 0x0b | 0x0c => out.push(Action::LineFeed),
            b'\r' => out.push(Action::CarriageReturn),
            b'\t' => out.push(Action::Tab),
            0x08 => out.push(Action::Backspace),
            0x07 => out.push(Action::Bell),
            0x00..=0x1f | 0x7f => {
                // Remaining C0 controls and DEL are ignored.
            }
            0x20..=0x7e => out.push(Action::Print(byte as char)),
            _ => self.utf8_start(byte),
        }
    }

    fn esc(&mut self, byte: u8, out: &mut Vec<Action>) {
        self.state = State::Ground;
        match byte {
            b'[' => {
                self.csi.clear();
                self.state = State::Csi;
            }
            b']' => self.state = State::Osc,
            b'(' | b')' | b'*' | b'+' => self.state = State::EscIntermediate,
            b'7' => out.push(Action::SaveCursor),
            b'8' => out.push(Action::RestoreCursor),
            b'D' => out.push(Action::Index),
            b'M' => out.push(Action::ReverseIndex),
            b'E' => out.push(Action::NextLine),
            b'c' => out.push(Action::FullReset),
            b'=' | b'>' => {
                // Keypad application/numeric mode: accepted, no state change.
            }
            _ => {
                // Unrecognized escape: swallow the final byte.
            }
        }
    }

    fn csi(&mut self, byte: u8, out: &mut Vec<Action>) {
        match byte {
            b'0'..=b'9' => self.csi.digit(byte - b'0'),
            b';' => self.csi.commit(),
            b'?' => self.csi.private = true,
            // Other prefix/intermediate bytes are tolerated and ignored.
            b' '..=b'/' | b':' | b'<' | b'=' | b'>' => {}
            0x40..=0x7e => {
                self.state = State::Ground;
                self.dispatch_csi(byte, out);
            }
            0x1b => {
                // A new escape aborts the sequence.
                self.state = State::Esc;
            }
            _ => {
                // C0 or stray byte inside CSI: abort, no action.
                self.state = State::Ground;
            }
        }
    }

    fn dispatch_csi(&mut self, final_byte: u8, out: &mut Vec<Action>) {
        let private = self.csi.private;
        let params = self.csi.finish();
        let n = |i: usize| one_or(&params, i);
        match final_byte {
            b'A' => out.push(Action::CursorUp(n(0))),
            b'B' => out.push(Action::CursorDown(n(0))),
            b'C' => out.push(Action::CursorForward(n(0))),
            b'D' => out.push(Action::CursorBack(n(0))),
            b'E' => out.push(Action::CursorNextLine(n(0))),
            b'F' => out.push(Action::CursorPrevLine(n(0))),
            b'G' => out.push(Action::CursorColumn(n(0))),
            b'd' => out.push(Action::CursorRow(n(0))),
            b'H' | b'f' => out.push(Action::CursorPosition {
                row: n(0),
                col: n(1),
            }),
            b'Z' => out.push(Action::BackTab(n(0))),
            b'J' => out.push(Action::EraseInDisplay(zero_or(&params, 0) as u8)),
            b'K' => out.push(Action::EraseInLine(zero_or(&params, 0) as u8)),
            b'X' => out.push(Action::EraseChars(n(0))),
            b'@' => out.push(Action::InsertChars(n(0))),
            b'P' => out.push(Action::DeleteChars(n(0))),
            b'L' => out.push(Action::InsertLines(n(0))),
            b'M' => out.push(Action::DeleteLines(n(0))),
            b'S' => out.push(Action::ScrollUp(n(0))),
            b'T' => out.push(Action::ScrollDown(n(0))),
            b'r' => out.push(Action::SetScrollRegion {
                top: zero_or(&params, 0),
                bottom: zero_or(&params, 1),
            }),
            b'm' => out.push(Action::Sgr(params)),
            b'h' => out.push(Action::SetMode { params, private }),
            b'l' => out.push(Action::ResetMode { params, private }),
            b's' => out.push(Action::SaveCursor),
            b'u' => out.push(Action::RestoreCursor),
            b'g' => {
                // TBC: tab stops are fixed every 8 columns, not programmable.
            }
            _ => {
                // Unknown final: the sequence is consumed with no mutation.
            }
        }
    }

    fn utf8_start(&mut self, byte: u8) {
        let remaining = match byte {
            0xc2..=0xdf => 1,
            0xe0..=0xef => 2,
            0xf0..=0xf4 => 3,
            _ => return, // invalid lead byte, dropped
        };
        self.utf8_buf[0] = byte;
        self.utf8_len = 1;
        self.utf8_remaining = remaining;
        self.state = State::Utf8;
    }

    fn utf8_continuation(&mut self, byte: u8, out: &mut Vec<Action>) {
        if byte & 0xc0 != 0x80 {
            // Broken sequence: drop it and reprocess this byte from ground.
            self.state = State::Ground;
            self.utf8_len = 0;
            self.utf8_remaining = 0;
            self.advance(byte, out);
            return;
        }
        self.utf8_buf[self.utf8_len] = byte;
        self.utf8_len += 1;
        self.utf8_remaining -= 1;
        if self.utf8_remaining == 0 {
            self.state = State::Ground;
            if let Ok(s) = std::str::from_utf8(&self.utf8_buf[..self.utf8_len]) {
                if let Some(ch) = s.chars().next() {
                    out.push(Action::Print(ch));
                }
            }
            self.utf8_len = 0;
        }
    }
}

/// Parameter at `i`, defaulting to 1 (and treating 0 as 1).
fn one_or(params: &[u16], i: usize) -> u16 {
    match params.get(i) {
        Some(&0) | None => 1,
        Some(&v) => v,
    }
}

/// Parameter at `i`, defaulting to 0.
fn zero_or(params: &[u16], i: usize) -> u16 {
    params.get(i).copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(bytes: &[u8]) -> Vec<Action> {
        Parser::new().feed(bytes)
    }

    #[test]
    fn printable_ascii() {
        assert_eq!(
            feed(b"hi"),
            vec![Action::Print('h'), Action::Print('i')]
        );
    }

    #[test]
    fn c0_controls() {
        assert_eq!(
            feed(b"\n\r\t\x08\x07"),
            vec![
                Action::LineFeed,
                Action::CarriageReturn,
                Action::Tab,
                Action::Backspace,
                Action::Bell,
            ]
        );
    }

    #[test]
    fn vt_and_ff_act_as_line_feed() {
        assert_eq!(feed(b"\x0b\x0c"), vec![Action::LineFeed, Action::LineFeed]);
    }

    #[test]
    fn cursor_moves_default_to_one() {
        assert_eq!(feed(b"\x1b[A"), vec![Action::CursorUp(1)]);
        assert_eq!(feed(b"\x1b[0B"), vec![Action::CursorDown(1)]);
        assert_eq!(feed(b"\x1b[5C"), vec![Action::CursorForward(5)]);
    }

    #[test]
    fn cursor_position_defaults() {
        assert_eq!(
            feed(b"\x1b[H"),
            vec![Action::CursorPosition { row: 1, col: 1 }]
        );
        assert_eq!(
            feed(b"\x1b[3;7H"),
            vec![Action::CursorPosition { row: 3, col: 7 }]
        );
        assert_eq!(
            feed(b"\x1b[;5f"),
            vec![Action::CursorPosition { row: 1, col: 5 }]
        );
    }

    #[test]
    fn erase_defaults_to_zero() {
        assert_eq!(feed(b"\x1b[J"), vec![Action::EraseInDisplay(0)]);
        assert_eq!(feed(b"\x1b[2J"), vec![Action::EraseInDisplay(2)]);
        assert_eq!(feed(b"\x1b[1K"), vec![Action::EraseInLine(1)]);
    }

    #[test]
    fn sgr_params_pass_through() {
        assert_eq!(feed(b"\x1b[m"), vec![Action::Sgr(vec![])]);
        assert_eq!(feed(b"\x1b[1;31m"), vec![Action::Sgr(vec![1, 31])]);
        assert_eq!(
            feed(b"\x1b[38;2;255;0;0m"),
            vec![Action::Sgr(vec![38, 2, 255, 0, 0])]
        );
    }

    #[test]
    fn private_modes_carry_flag() {
        assert_eq!(
            feed(b"\x1b[?1049h"),
            vec![Action::SetMode {
                params: vec![1049],
                private: true
            }]
        );
        assert_eq!(
            feed(b"\x1b[4l"),
            vec![Action::ResetMode {
                params: vec![4],
                private: false
            }]
        );
    }

    #[test]
    fn scroll_region_raw_params() {
        assert_eq!(
            feed(b"\x1b[5;10r"),
            vec![Action::SetScrollRegion { top: 5, bottom: 10 }]
        );
        assert_eq!(
            feed(b"\x1b[r"),
            vec![Action::SetScrollRegion { top: 0, bottom: 0 }]
        );
    }

    #[test]
    fn esc_singles() {
        assert_eq!(feed(b"\x1b7"), vec![Action::SaveCursor]);
        assert_eq!(feed(b"\x1b8"), vec![Action::RestoreCursor]);
        assert_eq!(feed(b"\x1bD"), vec![Action::Index]);
        assert_eq!(feed(b"\x1bM"), vec![Action::ReverseIndex]);
        assert_eq!(feed(b"\x1bE"), vec![Action::NextLine]);
        assert_eq!(feed(b"\x1bc"), vec![Action::FullReset]);
    }

    #[test]
    fn charset_designators_are_swallowed() {
        assert_eq!(feed(b"\x1b(Bx"), vec![Action::Print('x')]);
        assert_eq!(feed(b"\x1b)0y"), vec![Action::Print('y')]);
    }

    #[test]
    fn keypad_modes_are_no_ops() {
        assert_eq!(feed(b"\x1b=a\x1b>b"), vec![Action::Print('a'), Action::Print('b')]);
    }

    #[test]
    fn osc_is_discarded_bel_terminated() {
        assert_eq!(feed(b"\x1b]0;my title\x07x"), vec![Action::Print('x')]);
    }

    #[test]
    fn osc_is_discarded_st_terminated() {
        assert_eq!(feed(b"\x1b]2;t\x1b\\x"), vec![Action::Print('x')]);
    }

    #[test]
    fn esc_inside_osc_payload_continues() {
        assert_eq!(feed(b"\x1b]0;a\x1bZb\x07x"), vec![Action::Print('x')]);
    }

    #[test]
    fn unknown_csi_final_is_silent() {
        assert_eq!(feed(b"\x1b[12~x"), vec![Action::Print('x')]);
        assert_eq!(feed(b"\x1b[>0cx"), vec![Action::Print('x')]);
    }

    #[test]
    fn unknown_esc_final_is_silent() {
        assert_eq!(feed(b"\x1bQx"), vec![Action::Print('x')]);
    }

    #[test]
    fn esc_aborts_csi() {
        assert_eq!(feed(b"\x1b[12\x1b[3C"), vec![Action::CursorForward(3)]);
    }

    #[test]
    fn utf8_multibyte_print() {
        assert_eq!(feed("é".as_bytes()), vec![Action::Print('é')]);
        assert_eq!(feed("中".as_bytes()), vec![Action::Print('中')]);
        assert_eq!(feed("🦀".as_bytes()), vec![Action::Print('🦀')]);
    }

    #[test]
    fn utf8_split_across_chunks() {
        let mut p = Parser::new();
        let bytes = "中".as_bytes();
        assert!(p.feed(&bytes[..1]).is_empty());
        assert!(p.feed(&bytes[1..2]).is_empty());
        assert_eq!(p.feed(&bytes[2..]), vec![Action::Print('中')]);
    }

    #[test]
    fn broken_utf8_reprocesses_next_byte() {
        // Lead byte followed by ASCII: the scalar is dropped, ASCII kept.
        assert_eq!(feed(&[0xe4, b'x']), vec![Action::Print('x')]);
        // Stray continuation byte alone is dropped.
        assert_eq!(feed(&[0x80, b'y']), vec![Action::Print('y')]);
    }

    #[test]
    fn csi_split_across_chunks() {
        let mut p = Parser::new();
        assert!(p.feed(b"\x1b[3").is_empty());
        assert_eq!(p.feed(b"C"), vec![Action::CursorForward(3)]);
    }

    #[test]
    fn param_overflow_saturates() {
        assert_eq!(
            feed(b"\x1b[99999999999999C"),
            vec![Action::CursorForward(u16::MAX)]
        );
    }

    #[test]
    fn excess_params_are_bounded() {
        let mut seq = b"\x1b[".to_vec();
        for _ in 0..200 {
            seq.extend_from_slice(b"1;");
        }
        seq.push(b'm');
        let actions = Parser::new().feed(&seq);
        assert_eq!(actions.len(), 1);
        match &actions[0] {
            Action::Sgr(params) => assert!(params.len() <= MAX_CSI_PARAMS),
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn arbitrary_bytes_never_panic() {
        let mut p = Parser::new();
        let junk: Vec<u8> = (0..=255).cycle().take(4096).collect();
        let _ = p.feed(&junk);
    }
}
