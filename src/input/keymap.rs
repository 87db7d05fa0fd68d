//! Byte → key mapping tables.
//!
//! Pure functions, no state. The decoder resolves every byte or CSI final
//! byte through these, so the tables are the single source of truth for
//! what a byte means.

use super::events::{KeyCode, KeyEvent, Modifier};

/// ESC as key text.
pub const ESCAPE_TEXT: &str = "\x1b";

/// Ctrl+C. Reserved for `Event::Quit`, never a Ctrl-letter key.
pub const QUIT_BYTE: u8 = 0x03;

// =============================================================================
// Control bytes
// =============================================================================

/// Map `0x01..=0x1A` to Ctrl+letter.
///
/// Bytes with a dedicated meaning (0x03 Quit, 0x08 Backspace, 0x09 Tab,
/// 0x0A/0x0D Enter, 0x1B Escape) return `None` so the basic-key table
/// handles them instead.
pub fn map_ctrl_letter_key(byte: u8) -> Option<KeyEvent> {
    match byte {
        QUIT_BYTE | 0x08 | 0x09 | 0x0A | 0x0D | 0x1B => None,
        0x01..=0x1A => {
            let letter = (b'a' + byte - 1) as char;
            Some(KeyEvent::char(letter).with_modifiers(Modifier::CTRL))
        }
        _ => None,
    }
}

/// Map `0x00` to Ctrl+Space and `0x1C..=0x1F` to Ctrl+4..Ctrl+7.
pub fn map_ctrl_number_key(byte: u8) -> Option<KeyEvent> {
    let key = match byte {
        0x00 => KeyEvent::new(KeyCode::Space, " "),
        0x1C..=0x1F => KeyEvent::char((b'4' + byte - 0x1C) as char),
        _ => return None,
    };
    Some(key.with_modifiers(Modifier::CTRL))
}

/// Map a single byte with no special meaning.
pub fn map_basic_key(byte: u8) -> KeyEvent {
    match byte {
        b'\r' | b'\n' => KeyEvent::new(KeyCode::Enter, (byte as char).to_string()),
        b'\t' => KeyEvent::new(KeyCode::Tab, "\t"),
        b' ' => KeyEvent::new(KeyCode::Space, " "),
        0x08 | 0x7F => KeyEvent::new(KeyCode::Backspace, (byte as char).to_string()),
        _ => KeyEvent::char(byte as char),
    }
}

// =============================================================================
// CSI final bytes
// =============================================================================

/// The key reported for anything the tables do not recognize.
pub fn escape_fallback() -> KeyEvent {
    KeyEvent::new(KeyCode::Escape, ESCAPE_TEXT)
}

/// `A`/`B`/`C`/`D` → Up/Down/Right/Left.
pub fn map_arrow_key(final_byte: u8) -> KeyEvent {
    match final_byte {
        b'A' => KeyEvent::bare(KeyCode::ArrowUp),
        b'B' => KeyEvent::bare(KeyCode::ArrowDown),
        b'C' => KeyEvent::bare(KeyCode::ArrowRight),
        b'D' => KeyEvent::bare(KeyCode::ArrowLeft),
        _ => escape_fallback(),
    }
}

/// `H`/`F`/`Z` → Home/End/BackTab.
pub fn map_navigation_key(final_byte: u8) -> KeyEvent {
    match final_byte {
        b'H' => KeyEvent::bare(KeyCode::Home),
        b'F' => KeyEvent::bare(KeyCode::End),
        b'Z' => KeyEvent::bare(KeyCode::BackTab),
        _ => escape_fallback(),
    }
}

/// The digit in `ESC [ <digit> ~`.
pub fn map_numeric_key(digit: u8) -> KeyEvent {
    match digit {
        b'1' => KeyEvent::bare(KeyCode::Home),
        b'2' => KeyEvent::bare(KeyCode::Insert),
        b'3' => KeyEvent::bare(KeyCode::Delete),
        b'4' => KeyEvent::bare(KeyCode::End),
        b'5' => KeyEvent::bare(KeyCode::PageUp),
        b'6' => KeyEvent::bare(KeyCode::PageDown),
        _ => escape_fallback(),
    }
}

/// Whether a CSI final byte is one the arrow or navigation tables know.
pub fn is_key_final(final_byte: u8) -> bool {
    matches!(final_byte, b'A' | b'B' | b'C' | b'D' | b'H' | b'F' | b'Z')
}

/// Route a CSI final byte to the arrow or navigation table.
pub fn map_csi_final(final_byte: u8) -> KeyEvent {
    match final_byte {
        b'A'..=b'D' => map_arrow_key(final_byte),
        _ => map_navigation_key(final_byte),
    }
}

// =============================================================================
// Modifiers
// =============================================================================

/// Parse the xterm modifier digit in `ESC [ <n> ; <m> <final>`.
///
/// `'1'..='8'` map to the eight subsets of {Shift, Alt, Ctrl}. Anything
/// else is not a modifier code and returns `None`.
pub fn parse_modifier_code(code: u8) -> Option<Modifier> {
    let bits = match code {
        b'1'..=b'8' => code - b'1',
        _ => return None,
    };
    let mut modifiers = Modifier::NONE;
    if bits & 1 != 0 { modifiers |= Modifier::SHIFT; }
    if bits & 2 != 0 { modifiers |= Modifier::ALT; }
    if bits & 4 != 0 { modifiers |= Modifier::CTRL; }
    Some(modifiers)
}

/// Copy of `key` with its modifiers replaced. Code and text are unchanged.
pub fn apply_modifiers(key: &KeyEvent, modifiers: Modifier) -> KeyEvent {
    key.clone().with_modifiers(modifiers)
}
