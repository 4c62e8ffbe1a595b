//! Property-based checks for the host-side pure functions.

use emberterm_core::Mode;
use emberterm_host::input::{
    self, InputRecord, KeyCode, Modifiers, MouseButton, MouseEvent, MouseEventKind,
};
use emberterm_host::{SizeLimits, round_size};
use proptest::prelude::*;

fn modifiers() -> impl Strategy<Value = Modifiers> {
    (0u8..16).prop_map(Modifiers::from_bits_truncate)
}

fn key_codes() -> impl Strategy<Value = KeyCode> {
    prop_oneof![
        any::<char>().prop_map(KeyCode::Char),
        Just(KeyCode::Enter),
        Just(KeyCode::Escape),
        Just(KeyCode::Backspace),
        Just(KeyCode::Tab),
        Just(KeyCode::Up),
        Just(KeyCode::Down),
        Just(KeyCode::Left),
        Just(KeyCode::Right),
        Just(KeyCode::Home),
        Just(KeyCode::End),
        Just(KeyCode::Insert),
        Just(KeyCode::Delete),
        Just(KeyCode::PageUp),
        Just(KeyCode::PageDown),
        (0u8..20).prop_map(KeyCode::F),
    ]
}

fn mouse_kinds() -> impl Strategy<Value = MouseEventKind> {
    let button = prop_oneof![
        Just(MouseButton::Left),
        Just(MouseButton::Middle),
        Just(MouseButton::Right),
    ];
    prop_oneof![
        button.clone().prop_map(MouseEventKind::Down),
        button.clone().prop_map(MouseEventKind::Up),
        button.prop_map(MouseEventKind::Drag),
        Just(MouseEventKind::Move),
        Just(MouseEventKind::WheelUp),
        Just(MouseEventKind::WheelDown),
    ]
}

proptest! {
    #[test]
    fn rounded_sizes_are_stepped_and_clamped(cols in any::<u16>(), rows in any::<u16>()) {
        let limits = SizeLimits::default();
        let (c, r) = round_size(cols, rows, limits);
        prop_assert!(c >= limits.min_cols && c <= limits.max_cols);
        prop_assert!(r >= limits.min_rows && r <= limits.max_rows);
        prop_assert_eq!(c % 10, 0);
        prop_assert_eq!(r % 5, 0);
    }

    #[test]
    fn rounding_is_idempotent(cols in any::<u16>(), rows in any::<u16>()) {
        let limits = SizeLimits::default();
        let once = round_size(cols, rows, limits);
        prop_assert_eq!(round_size(once.0, once.1, limits), once);
    }

    #[test]
    fn key_encoding_never_panics(code in key_codes(), mods in modifiers()) {
        let _ = input::encode_key(code, mods);
    }

    #[test]
    fn legacy_mouse_bytes_are_printable_range(
        kind in mouse_kinds(),
        col in any::<u16>(),
        row in any::<u16>(),
        mods in modifiers(),
    ) {
        let modes = Mode::default() | Mode::MOUSE_BUTTON | Mode::MOUSE_ANY;
        let event = MouseEvent { kind, col, row, mods };
        let bytes = input::encode_mouse(&event, modes);
        if !bytes.is_empty() {
            prop_assert_eq!(&bytes[..3], b"\x1b[M");
            prop_assert_eq!(bytes.len(), 6);
            for &b in &bytes[3..] {
                prop_assert!(b >= 32);
            }
        }
    }

    #[test]
    fn input_records_roundtrip_through_json(
        kind in mouse_kinds(),
        col in any::<u16>(),
        row in any::<u16>(),
        mods in modifiers(),
    ) {
        let rec = InputRecord::Mouse {
            event: MouseEvent { kind, col, row, mods },
        };
        let json = rec.to_json_string().unwrap();
        prop_assert_eq!(InputRecord::from_json_str(&json).unwrap(), rec);
    }
}
