//! Resumable escape sequence decoder.
//!
//! Turns raw terminal bytes into [`Event`]s. Bytes may arrive in any chunking:
//! a sequence split across two `feed` calls decodes exactly as if it had
//! arrived whole, because the partial state lives in the [`Decoder`] value.
//!
//! ```text
//!            ESC              [               final (0x40-0x7E)
//!  Normal ───────▶ Escape ───────▶ Csi ──────────────────────▶ Normal
//!    ▲               │ O            │ 200~
//!    │               ▼              ▼
//!    │              Ss3           Paste ── ESC [ 201 ~ ──▶ Normal (Paste event)
//!    │                              │
//!    └──────────────────────────────┘
//! ```
//!
//! Recovery rules:
//! - ESC while a sequence is pending discards the stale partial and starts over.
//! - A byte that cannot extend the pending sequence resets to `Normal` and is
//!   decoded again from there, so nothing is silently dropped.
//! - An unterminated sequence stays pending for the next `feed`; it is never
//!   emitted as a garbage event.
//!
//! The decoder never fails. Unrecognized sequences resolve to the Escape
//! fallback key.

use super::events::{Event, KeyEvent, Modifier};
use super::keymap::{
    QUIT_BYTE, apply_modifiers, escape_fallback, is_key_final, map_basic_key, map_csi_final,
    map_ctrl_letter_key, map_ctrl_number_key, map_numeric_key, parse_modifier_code,
};
use super::mouse;

const ESC: u8 = 0x1B;

/// Full bracketed-paste terminator as it appears inside the paste body.
const PASTE_END: &[u8] = b"\x1b[201~";

/// CSI parameters longer than this are treated as garbage.
const MAX_SEQUENCE_LEN: usize = 32;

// =============================================================================
// Paste markers
// =============================================================================

/// `2 0 0 ~`, the tail of the bracketed-paste start marker.
pub fn is_paste_start_sequence(b0: u8, b1: u8, b2: u8, b3: u8) -> bool {
    [b0, b1, b2, b3] == *b"200~"
}

/// `2 0 1 ~`, the tail of the bracketed-paste end marker.
pub fn is_paste_end_sequence(b0: u8, b1: u8, b2: u8, b3: u8) -> bool {
    [b0, b1, b2, b3] == *b"201~"
}

// =============================================================================
// Decoder
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    /// Saw ESC, waiting for the introducer.
    Escape,
    /// Inside `ESC [`, parameters accumulate in `seq`.
    Csi,
    /// Inside `ESC O`.
    Ss3,
    /// Inside `ESC [ M`, the three payload bytes accumulate in `seq`.
    X10,
    /// Inside a multi-byte UTF-8 character, bytes accumulate in `seq`.
    Utf8 { expected: usize },
    /// Between the paste markers, bytes accumulate in `paste`.
    Paste,
}

enum Step {
    Done,
    /// State was reset; decode the same byte again from `Normal`.
    Reprocess,
}

enum Resolved {
    Event(Event),
    EnterPaste,
    Ignore,
}

/// Stateful input decoder.
///
/// One decoder per input stream. Two streams sharing a decoder would
/// interleave their partial sequences.
#[derive(Debug, Clone)]
pub struct Decoder {
    state: State,
    seq: Vec<u8>,
    paste: Vec<u8>,
}

impl Decoder {
    /// A decoder in the ground state.
    pub fn new() -> Self {
        Self {
            state: State::Normal,
            seq: Vec::with_capacity(MAX_SEQUENCE_LEN),
            paste: Vec::new(),
        }
    }

    /// Decode a chunk of bytes, returning every event it completes.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Event> {
        let mut events = Vec::new();
        for &byte in data {
            self.feed_byte(byte, &mut events);
        }
        events
    }

    /// Decode one byte, appending completed events to `out`.
    pub fn feed_byte(&mut self, byte: u8, out: &mut Vec<Event>) {
        while let Step::Reprocess = self.step(byte, out) {}
    }

    /// Whether a partial sequence or paste is waiting for more bytes.
    pub fn has_pending(&self) -> bool {
        self.state != State::Normal
    }

    /// Whether a bracketed paste is being accumulated.
    pub fn in_paste(&self) -> bool {
        self.state == State::Paste
    }

    /// Whether the only pending input is a lone ESC.
    pub fn is_lone_escape(&self) -> bool {
        self.state == State::Escape
    }

    /// Bytes held in the partial-sequence and paste buffers, plus a lone ESC.
    pub fn pending_len(&self) -> usize {
        self.seq.len() + self.paste.len() + usize::from(self.state == State::Escape)
    }

    /// Resolve a lone pending ESC as the Escape key.
    ///
    /// Called by the event source once the escape timeout passes with no
    /// follow-up byte. Longer partial sequences are left untouched.
    pub fn flush_escape(&mut self) -> Option<Event> {
        if self.state != State::Escape {
            return None;
        }
        self.state = State::Normal;
        Some(Event::Key(escape_fallback()))
    }

    /// Drop all pending state.
    pub fn reset(&mut self) {
        self.state = State::Normal;
        self.seq.clear();
        self.paste.clear();
    }

    fn step(&mut self, byte: u8, out: &mut Vec<Event>) -> Step {
        match self.state {
            State::Normal => self.step_normal(byte, out),
            State::Escape => self.step_escape(byte, out),
            State::Csi => self.step_csi(byte, out),
            State::Ss3 => self.step_ss3(byte, out),
            State::X10 => self.step_x10(byte, out),
            State::Utf8 { expected } => self.step_utf8(byte, expected, out),
            State::Paste => self.step_paste(byte, out),
        }
    }

    fn step_normal(&mut self, byte: u8, out: &mut Vec<Event>) -> Step {
        let event = match byte {
            ESC => {
                self.state = State::Escape;
                return Step::Done;
            }
            QUIT_BYTE => Event::Quit,
            0x00..=0x1F => map_ctrl_number_key(byte)
                .or_else(|| map_ctrl_letter_key(byte))
                .unwrap_or_else(|| map_basic_key(byte))
                .into(),
            0x20..=0x7F => map_basic_key(byte).into(),
            _ => match utf8_len(byte) {
                Some(expected) => {
                    self.seq.clear();
                    self.seq.push(byte);
                    self.state = State::Utf8 { expected };
                    return Step::Done;
                }
                None => {
                    tracing::trace!(byte, "stray non-UTF-8 byte");
                    Event::Unknown
                }
            },
        };
        out.push(event);
        Step::Done
    }

    fn step_escape(&mut self, byte: u8, out: &mut Vec<Event>) -> Step {
        match byte {
            b'[' => {
                self.seq.clear();
                self.state = State::Csi;
            }
            b'O' => self.state = State::Ss3,
            ESC => {
                // Resync: the previous ESC is stale, this one starts fresh.
                tracing::trace!("discarding stale ESC");
            }
            0x20..=0x7E => {
                self.state = State::Normal;
                out.push(Event::Key(map_basic_key(byte).with_modifiers(Modifier::ALT)));
            }
            _ => {
                self.state = State::Normal;
                out.push(Event::Key(escape_fallback()));
                return Step::Reprocess;
            }
        }
        Step::Done
    }

    fn step_ss3(&mut self, byte: u8, out: &mut Vec<Event>) -> Step {
        match byte {
            ESC => {
                tracing::trace!("discarding stale ESC O");
                self.state = State::Escape;
                Step::Done
            }
            b'A' | b'B' | b'C' | b'D' | b'H' | b'F' => {
                self.state = State::Normal;
                out.push(Event::Key(map_csi_final(byte)));
                Step::Done
            }
            _ => {
                // Not SS3 after all: ESC O was Alt+O.
                self.state = State::Normal;
                out.push(Event::Key(KeyEvent::char('O').with_modifiers(Modifier::ALT)));
                Step::Reprocess
            }
        }
    }

    fn step_csi(&mut self, byte: u8, out: &mut Vec<Event>) -> Step {
        match byte {
            ESC => {
                tracing::trace!(stale = ?self.seq, "discarding stale CSI");
                self.seq.clear();
                self.state = State::Escape;
                Step::Done
            }
            b'M' if self.seq.is_empty() => {
                self.state = State::X10;
                Step::Done
            }
            0x20..=0x3F => {
                if self.seq.len() >= MAX_SEQUENCE_LEN {
                    tracing::trace!("CSI parameters too long, dropping sequence");
                    self.seq.clear();
                    self.state = State::Normal;
                    return Step::Reprocess;
                }
                self.seq.push(byte);
                Step::Done
            }
            0x40..=0x7E => {
                let resolved = resolve_csi(&self.seq, byte);
                self.seq.clear();
                self.state = State::Normal;
                match resolved {
                    Resolved::Event(event) => out.push(event),
                    Resolved::EnterPaste => {
                        self.paste.clear();
                        self.state = State::Paste;
                    }
                    Resolved::Ignore => {}
                }
                Step::Done
            }
            _ => {
                tracing::trace!(byte, stale = ?self.seq, "byte cannot extend CSI");
                self.seq.clear();
                self.state = State::Normal;
                Step::Reprocess
            }
        }
    }

    fn step_x10(&mut self, byte: u8, out: &mut Vec<Event>) -> Step {
        self.seq.push(byte);
        if self.seq.len() == 3 {
            let event = mouse::parse_x10(self.seq[0], self.seq[1], self.seq[2])
                .map(Event::Mouse)
                .unwrap_or(Event::Unknown);
            self.seq.clear();
            self.state = State::Normal;
            out.push(event);
        }
        Step::Done
    }

    fn step_utf8(&mut self, byte: u8, expected: usize, out: &mut Vec<Event>) -> Step {
        if byte & 0xC0 != 0x80 {
            tracing::trace!(stale = ?self.seq, "truncated UTF-8 sequence");
            self.seq.clear();
            self.state = State::Normal;
            out.push(Event::Unknown);
            return Step::Reprocess;
        }

        self.seq.push(byte);
        if self.seq.len() < expected {
            return Step::Done;
        }

        let event = match std::str::from_utf8(&self.seq).ok().and_then(|s| s.chars().next()) {
            Some(c) => Event::Key(KeyEvent::char(c)),
            None => Event::Unknown,
        };
        self.seq.clear();
        self.state = State::Normal;
        out.push(event);
        Step::Done
    }

    fn step_paste(&mut self, byte: u8, out: &mut Vec<Event>) -> Step {
        self.paste.push(byte);
        if self.paste.ends_with(PASTE_END) {
            let body_len = self.paste.len() - PASTE_END.len();
            let text = String::from_utf8_lossy(&self.paste[..body_len]).into_owned();
            self.paste.clear();
            self.state = State::Normal;
            out.push(Event::Paste(text));
        }
        Step::Done
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Expected length of a UTF-8 character from its lead byte.
fn utf8_len(lead: u8) -> Option<usize> {
    match lead {
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

/// Resolve a complete CSI sequence (`params` excludes `ESC [`).
fn resolve_csi(params: &[u8], final_byte: u8) -> Resolved {
    if let Some(sgr) = params.strip_prefix(b"<") {
        let event = mouse::parse_sgr(sgr, final_byte)
            .map(Event::Mouse)
            .unwrap_or(Event::Unknown);
        return Resolved::Event(event);
    }

    if let [b0, b1, b2] = *params {
        if is_paste_start_sequence(b0, b1, b2, final_byte) {
            return Resolved::EnterPaste;
        }
        if is_paste_end_sequence(b0, b1, b2, final_byte) {
            tracing::trace!("paste end marker outside a paste");
            return Resolved::Ignore;
        }
    }

    let mut parts = params.split(|&b| b == b';');
    let first = parts.next().unwrap_or_default();
    let modifiers = match parts.next() {
        Some(&[code]) => parse_modifier_code(code).unwrap_or(Modifier::NONE),
        _ => Modifier::NONE,
    };

    let key = match final_byte {
        b'~' => match *first {
            [digit] => map_numeric_key(digit),
            _ => escape_fallback(),
        },
        f if is_key_final(f) => map_csi_final(f),
        _ => {
            tracing::trace!(final_byte, "unrecognized CSI final byte");
            escape_fallback()
        }
    };

    if modifiers.is_empty() {
        Resolved::Event(Event::Key(key))
    } else {
        Resolved::Event(Event::Key(apply_modifiers(&key, modifiers)))
    }
}

// =============================================================================
// Tests
// =============================================================================
