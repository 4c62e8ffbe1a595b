//! End-to-end byte-feed scenarios exercising the parser and screen
//! together, the way a PTY-connected host drives them.

use emberterm_core::{Cell, Color, Cursor, Parser, Screen, ScrollRegion, SgrFlags};

struct Term {
    parser: Parser,
    screen: Screen,
}

impl Term {
    fn new(cols: u16, rows: u16) -> Self {
        Self {
            parser: Parser::new(),
            screen: Screen::new(cols, rows, 200),
        }
    }

    fn feed(&mut self, bytes: &[u8]) {
        for action in self.parser.feed(bytes) {
            self.screen.apply(&action);
        }
    }

    fn row_text(&self, row: u16) -> String {
        self.screen
            .grid()
            .row_cells(row)
            .unwrap()
            .iter()
            .map(|c| c.content)
            .collect::<String>()
            .trim_end()
            .to_string()
    }
}

#[test]
fn shell_prompt_with_colors() {
    let mut t = Term::new(40, 10);
    t.feed(b"\x1b[32muser@host\x1b[0m:\x1b[34m~/src\x1b[0m$ ");
    assert_eq!(t.row_text(0), "user@host:~/src$");
    assert_eq!(t.screen.grid().cell(0, 0).unwrap().attrs.fg, Color::Named(2));
    assert_eq!(t.screen.grid().cell(0, 9).unwrap().attrs.fg, Color::Default);
    assert_eq!(
        t.screen.grid().cell(0, 10).unwrap().attrs.fg,
        Color::Named(4)
    );
}

#[test]
fn red_hello_scenario() {
    let mut t = Term::new(80, 24);
    t.feed(b"\x1b[31mHELLO\x1b[0m");
    for col in 0..5 {
        let cell = t.screen.grid().cell(0, col).unwrap();
        assert_eq!(cell.attrs.fg, Color::Named(1));
    }
    assert_eq!(t.screen.grid().cell(0, 5).unwrap().attrs.fg, Color::Default);
    assert_eq!(t.row_text(0), "HELLO");
}

#[test]
fn thirty_lines_on_80x24_yield_six_scrollback_lines() {
    let mut t = Term::new(80, 24);
    let text: String = (1..=30)
        .map(|i| format!("line {i}"))
        .collect::<Vec<_>>()
        .join("\r\n");
    t.feed(text.as_bytes());
    assert_eq!(t.screen.scrollback().len(), 6);
    assert_eq!(t.screen.cursor().row, 23);
    assert_eq!(t.row_text(0), "line 7");
    assert_eq!(t.row_text(23), "line 30");
}

#[test]
fn full_screen_program_lifecycle() {
    let mut t = Term::new(20, 5);
    t.feed(b"$ vim file\r\n");
    t.feed(b"\x1b[?1049h\x1b[2J\x1b[H\x1b[7m file.txt \x1b[0m");
    assert!(t.screen.is_alternate());
    assert!(
        t.screen
            .grid()
            .cell(0, 1)
            .unwrap()
            .attrs
            .flags
            .contains(SgrFlags::INVERSE)
    );
    t.feed(b"\x1b[?1049l");
    assert!(!t.screen.is_alternate());
    assert_eq!(t.row_text(0), "$ vim file");
}

#[test]
fn scroll_region_status_line_stays_fixed() {
    let mut t = Term::new(20, 6);
    t.feed(b"\x1b[6;1H[status]");
    t.feed(b"\x1b[1;5r\x1b[5;1H");
    for i in 0..8 {
        t.feed(format!("line{i}\r\n").as_bytes());
    }
    assert_eq!(t.row_text(5), "[status]");
    assert_eq!(
        t.screen.scroll_region(),
        ScrollRegion { top: 0, bottom: 4 }
    );
    assert!(t.screen.scrollback().is_empty());
}

#[test]
fn csi_sequences_split_across_reads() {
    let mut t = Term::new(20, 5);
    t.feed(b"\x1b");
    t.feed(b"[3");
    t.feed(b";4");
    t.feed(b"Hx");
    assert_eq!(t.screen.cursor(), Cursor { row: 2, col: 4 });
    assert_eq!(t.screen.grid().cell(2, 3).unwrap().content, 'x');
}

#[test]
fn utf8_and_wide_output() {
    let mut t = Term::new(10, 3);
    t.feed("naïve 日本".as_bytes());
    assert_eq!(t.screen.grid().cell(0, 2).unwrap().content, 'ï');
    // '日' occupies columns 6-7, '本' columns 8-9.
    assert!(t.screen.grid().cell(0, 6).unwrap().is_wide());
    assert!(t.screen.grid().cell(0, 8).unwrap().is_wide());
}

#[test]
fn clear_and_repaint_is_idempotent() {
    let mut t = Term::new(30, 8);
    t.feed(b"some output\r\nmore output\r\n");
    t.feed(b"\x1b[2J\x1b[H");
    let first = t.screen.grid().clone();
    t.feed(b"\x1b[2J\x1b[H");
    assert_eq!(*t.screen.grid(), first);
}

#[test]
fn progress_bar_rewrites_one_row() {
    let mut t = Term::new(30, 5);
    t.feed(b"step 1\r\n");
    t.screen.take_dirty();
    t.feed(b"\r[=====>    ] 50%");
    let dirty = t.screen.take_dirty();
    assert!(!dirty.is_all());
    assert_eq!(dirty.iter().collect::<Vec<_>>(), vec![1]);
    assert_eq!(t.row_text(1), "[=====>    ] 50%");
}

#[test]
fn title_and_unknown_sequences_are_harmless() {
    let mut t = Term::new(20, 5);
    t.feed(b"\x1b]0;window title\x07");
    t.feed(b"\x1b]8;;http://x\x1b\\");
    t.feed(b"\x1b[>4;2m\x1b[12$p");
    t.feed(b"ok");
    assert_eq!(t.row_text(0), "ok");
}

#[test]
fn malformed_stream_then_recovery() {
    let mut t = Term::new(20, 5);
    t.feed(&[0x1b, b'[', 0xff, 0xc3]);
    t.feed(b"back");
    assert!(t.row_text(0).contains("back"));
}

#[test]
fn resize_preserves_visible_content() {
    let mut t = Term::new(10, 4);
    t.feed(b"keep\r\nthis");
    t.screen.resize(8, 3);
    assert_eq!(t.row_text(0), "keep");
    assert_eq!(t.row_text(1), "this");
    t.feed(b"!");
    assert_eq!(t.row_text(1), "this!");
}

#[test]
fn erase_variants_leave_default_cells() {
    let mut t = Term::new(10, 3);
    t.feed(b"\x1b[45mxxxxxxxxxx\x1b[1;5H\x1b[0K");
    for col in 4..10 {
        assert_eq!(*t.screen.grid().cell(0, col).unwrap(), Cell::blank());
    }
    assert_eq!(
        t.screen.grid().cell(0, 3).unwrap().attrs.bg,
        Color::Named(5)
    );
}
