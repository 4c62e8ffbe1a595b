//! Keyboard, mouse, and paste encoding to VT byte sequences.
//!
//! The encoder is a pure function of the event plus the screen's tracking
//! modes. Nothing here touches screen state; the engine forwards the bytes
//! upstream to whatever is feeding the terminal.

use bitflags::bitflags;
use emberterm_core::Mode;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Modifier keys held during an input event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const SUPER = 0b1000;
    }
}

/// Logical key identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyCode {
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    Insert,
    Delete,
    PageUp,
    PageDown,
    F(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseEventKind {
    Down(MouseButton),
    Up(MouseButton),
    Drag(MouseButton),
    Move,
    WheelUp,
    WheelDown,
}

/// A mouse event in 0-based cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub col: u16,
    pub row: u16,
    pub mods: Modifiers,
}

/// Record/replay schema for input streams. Serialized as tagged JSON so
/// captured sessions stay readable and diffable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputRecord {
    Key { code: KeyCode, mods: Modifiers },
    Mouse { event: MouseEvent },
    Paste { text: String },
    Focus { gained: bool },
}

impl InputRecord {
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Encode a key press. An empty result means the key produces no bytes
/// (for example an unsupported function key).
#[must_use]
pub fn encode_key(code: KeyCode, mods: Modifiers) -> Vec<u8> {
    match code {
        KeyCode::Char(ch) => encode_char(ch, mods),
        KeyCode::Enter => alt_prefixed(mods, b"\r"),
        KeyCode::Escape => alt_prefixed(mods, b"\x1b"),
        KeyCode::Backspace => alt_prefixed(mods, &[0x7f]),
        KeyCode::Tab => {
            if mods.contains(Modifiers::SHIFT) {
                b"\x1b[Z".to_vec()
            } else {
                alt_prefixed(mods, b"\t")
            }
        }
        KeyCode::Up => csi_with_mod_or_plain('A', mods),
        KeyCode::Down => csi_with_mod_or_plain('B', mods),
        KeyCode::Right => csi_with_mod_or_plain('C', mods),
        KeyCode::Left => csi_with_mod_or_plain('D', mods),
        KeyCode::Home => csi_with_mod_or_plain('H', mods),
        KeyCode::End => csi_with_mod_or_plain('F', mods),
        KeyCode::Insert => csi_tilde_with_mod(2, mods),
        KeyCode::Delete => csi_tilde_with_mod(3, mods),
        KeyCode::PageUp => csi_tilde_with_mod(5, mods),
        KeyCode::PageDown => csi_tilde_with_mod(6, mods),
        KeyCode::F(n) => encode_function_key(n, mods),
    }
}

fn encode_char(ch: char, mods: Modifiers) -> Vec<u8> {
    let mut out = Vec::with_capacity(8);
    if mods.contains(Modifiers::ALT) {
        out.push(0x1b);
    }
    if mods.contains(Modifiers::CTRL)
        && let Some(ctrl) = ctrl_char_to_byte(ch)
    {
        out.push(ctrl);
        return out;
    }
    let mut buf = [0u8; 4];
    out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
    out
}

fn encode_function_key(n: u8, mods: Modifiers) -> Vec<u8> {
    match n {
        1..=4 => {
            if !mods.is_empty() {
                return Vec::new();
            }
            let ss3 = match n {
                1 => b'P',
                2 => b'Q',
                3 => b'R',
                _ => b'S',
            };
            vec![0x1b, b'O', ss3]
        }
        5 => csi_tilde_with_mod(15, mods),
        6 => csi_tilde_with_mod(17, mods),
        7 => csi_tilde_with_mod(18, mods),
        8 => csi_tilde_with_mod(19, mods),
        9 => csi_tilde_with_mod(20, mods),
        10 => csi_tilde_with_mod(21, mods),
        11 => csi_tilde_with_mod(23, mods),
        12 => csi_tilde_with_mod(24, mods),
        _ => Vec::new(),
    }
}

fn alt_prefixed(mods: Modifiers, bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 1);
    if mods.contains(Modifiers::ALT) {
        out.push(0x1b);
    }
    out.extend_from_slice(bytes);
    out
}

fn csi_with_mod_or_plain(final_byte: char, mods: Modifiers) -> Vec<u8> {
    if mods.is_empty() {
        format!("\x1b[{final_byte}").into_bytes()
    } else {
        let mod_value = xterm_modifier_value(mods);
        format!("\x1b[1;{mod_value}{final_byte}").into_bytes()
    }
}

fn csi_tilde_with_mod(code: u16, mods: Modifiers) -> Vec<u8> {
    if mods.is_empty() {
        format!("\x1b[{code}~").into_bytes()
    } else {
        let mod_value = xterm_modifier_value(mods);
        format!("\x1b[{code};{mod_value}~").into_bytes()
    }
}

/// xterm encoding is `1 + bits`, with bits matching the bitflag layout.
fn xterm_modifier_value(mods: Modifiers) -> u8 {
    1 + mods.bits()
}

fn ctrl_char_to_byte(ch: char) -> Option<u8> {
    match ch {
        '@' | ' ' => Some(0x00),
        'a'..='z' => Some((u32::from(ch) as u8) - b'a' + 1),
        'A'..='Z' => Some((u32::from(ch) as u8) - b'A' + 1),
        '[' => Some(0x1b),
        '\\' => Some(0x1c),
        ']' => Some(0x1d),
        '^' => Some(0x1e),
        '_' => Some(0x1f),
        _ => None,
    }
}

/// Wrap pasted text when bracketed-paste mode is on.
#[must_use]
pub fn encode_paste(text: &str, bracketed: bool) -> Vec<u8> {
    if bracketed {
        let mut out = Vec::with_capacity(text.len() + 12);
        out.extend_from_slice(b"\x1b[200~");
        out.extend_from_slice(text.as_bytes());
        out.extend_from_slice(b"\x1b[201~");
        out
    } else {
        text.as_bytes().to_vec()
    }
}

/// Encode a focus change. Empty unless focus tracking is on.
#[must_use]
pub fn encode_focus(gained: bool, modes: Mode) -> Vec<u8> {
    if !modes.contains(Mode::FOCUS_TRACKING) {
        return Vec::new();
    }
    if gained { b"\x1b[I".to_vec() } else { b"\x1b[O".to_vec() }
}

/// Whether the active tracking modes capture this mouse event at all.
/// Events the application did not ask for stay local.
#[must_use]
pub fn mouse_captured(kind: MouseEventKind, modes: Mode) -> bool {
    let any_tracking =
        modes.intersects(Mode::MOUSE_BUTTON | Mode::MOUSE_DRAG | Mode::MOUSE_ANY);
    if !any_tracking {
        return false;
    }
    match kind {
        MouseEventKind::Move => modes.contains(Mode::MOUSE_ANY),
        MouseEventKind::Drag(_) => {
            modes.intersects(Mode::MOUSE_DRAG | Mode::MOUSE_ANY)
        }
        _ => true,
    }
}

/// Encode a mouse event for the active tracking modes. Returns empty when
/// the modes do not capture the event.
#[must_use]
pub fn encode_mouse(event: &MouseEvent, modes: Mode) -> Vec<u8> {
    if !mouse_captured(event.kind, modes) {
        return Vec::new();
    }
    let (mut code, is_release) = match event.kind {
        MouseEventKind::Down(b) => (u16::from(button_code(b)), false),
        MouseEventKind::Up(b) => (u16::from(button_code(b)), true),
        MouseEventKind::Drag(b) => (32 + u16::from(button_code(b)), false),
        MouseEventKind::Move => (32 + 3, false),
        MouseEventKind::WheelUp => (64, false),
        MouseEventKind::WheelDown => (65, false),
    };
    code |= u16::from(mod_bits(event.mods));

    if modes.contains(Mode::SGR_MOUSE) {
        let x = event.col + 1;
        let y = event.row + 1;
        let final_byte = if is_release { 'm' } else { 'M' };
        format!("\x1b[<{code};{x};{y}{final_byte}").into_bytes()
    } else {
        // Legacy X10-style encoding: value + 32, coordinates capped at 223
        // because each is a single byte.
        if is_release {
            // Releases do not carry the button; code 3 means "release".
            code = (code & !0b11) | 3;
        }
        let cb = 32 + (code.min(255 - 32)) as u8;
        let cx = 32 + 1 + event.col.min(222) as u8;
        let cy = 32 + 1 + event.row.min(222) as u8;
        vec![0x1b, b'[', b'M', cb, cx, cy]
    }
}

fn button_code(button: MouseButton) -> u8 {
    match button {
        MouseButton::Left => 0,
        MouseButton::Middle => 1,
        MouseButton::Right => 2,
    }
}

fn mod_bits(mods: Modifiers) -> u8 {
    let mut bits = 0u8;
    if mods.contains(Modifiers::SHIFT) {
        bits |= 4;
    }
    if mods.contains(Modifiers::ALT) {
        bits |= 8;
    }
    if mods.contains(Modifiers::CTRL) {
        bits |= 16;
    }
    bits
}
