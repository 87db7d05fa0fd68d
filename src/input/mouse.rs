//! Mouse report decoding.
//!
//! Two encodings reach us:
//! - SGR (`ESC [ < b ; x ; y M` press, `... m` release), coordinates in decimal
//! - X10 (`ESC [ M cb cx cy`), each value a single byte offset by 32
//!
//! Both carry the same button byte layout, decoded by [`decode_button`].

use super::events::{Modifier, MouseButton, MouseEvent, MouseKind};

const SHIFT_BIT: u16 = 4;
const ALT_BIT: u16 = 8;
const CTRL_BIT: u16 = 16;
const MOTION_BIT: u16 = 32;
const WHEEL_BIT: u16 = 64;

/// Decode the button byte shared by both encodings.
///
/// Returns `None` for reports we do not model (horizontal wheel).
pub fn decode_button(cb: u16, release: bool) -> Option<(MouseKind, Option<MouseButton>, Modifier)> {
    let mut modifiers = Modifier::NONE;
    if cb & SHIFT_BIT != 0 { modifiers |= Modifier::SHIFT; }
    if cb & ALT_BIT != 0 { modifiers |= Modifier::ALT; }
    if cb & CTRL_BIT != 0 { modifiers |= Modifier::CTRL; }

    let base = cb & 3;
    let button = match base {
        0 => Some(MouseButton::Left),
        1 => Some(MouseButton::Middle),
        2 => Some(MouseButton::Right),
        _ => None,
    };

    let decoded = if cb & WHEEL_BIT != 0 {
        let wheel = match base {
            0 => MouseButton::WheelUp,
            1 => MouseButton::WheelDown,
            _ => return None,
        };
        (MouseKind::Press, Some(wheel))
    } else if cb & MOTION_BIT != 0 {
        match button {
            Some(held) => (MouseKind::Drag, Some(held)),
            None => (MouseKind::Move, None),
        }
    } else if release || button.is_none() {
        // X10 reports every release as base 3 without naming the button.
        (MouseKind::Release, button)
    } else {
        (MouseKind::Press, button)
    };

    Some((decoded.0, decoded.1, modifiers))
}

/// Parse the parameter bytes of an SGR report (everything between `<` and
/// the final byte), e.g. `b"0;10;20"`.
pub fn parse_sgr(params: &[u8], final_byte: u8) -> Option<MouseEvent> {
    let release = match final_byte {
        b'M' => false,
        b'm' => true,
        _ => return None,
    };

    let text = std::str::from_utf8(params).ok()?;
    let mut fields = text.split(';').map(|field| field.parse::<u16>().ok());
    let cb = fields.next()??;
    let x = fields.next()??;
    let y = fields.next()??;
    if fields.next().is_some() {
        return None;
    }

    let (kind, button, modifiers) = decode_button(cb, release)?;
    Some(MouseEvent {
        kind,
        button,
        // 1-indexed on the wire
        x: x.saturating_sub(1),
        y: y.saturating_sub(1),
        modifiers,
    })
}

/// Parse the three payload bytes of an X10 report.
pub fn parse_x10(cb: u8, cx: u8, cy: u8) -> Option<MouseEvent> {
    let cb = u16::from(cb.checked_sub(32)?);
    let (kind, button, modifiers) = decode_button(cb, false)?;
    Some(MouseEvent {
        kind,
        button,
        x: u16::from(cx.saturating_sub(33)),
        y: u16::from(cy.saturating_sub(33)),
        modifiers,
    })
}

/// Whether `byte` can appear inside SGR report parameters.
pub fn is_sgr_param_byte(byte: u8) -> bool {
    byte.is_ascii_digit() || byte == b';'
}
