//! Typed input events produced by the decoder.
//!
//! An [`Event`] carries exactly one payload. Keys and mice share the
//! [`Modifier`] set; everything else is plain data.

// =============================================================================
// Event
// =============================================================================

/// A decoded terminal input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// Terminal size after a SIGWINCH, as (columns, rows).
    Resize(u16, u16),
    /// Text received between bracketed-paste markers.
    Paste(String),
    /// Ctrl+C (byte 0x03).
    Quit,
    /// No input source, or nothing that could be decoded.
    Unknown,
}

impl Event {
    /// Whether this is a key event.
    pub fn is_key(&self) -> bool {
        matches!(self, Self::Key(_))
    }

    /// Whether this is a resize event.
    pub fn is_resize(&self) -> bool {
        matches!(self, Self::Resize(..))
    }

    /// Borrow the key payload, if this is a key event.
    pub fn as_key(&self) -> Option<&KeyEvent> {
        match self {
            Self::Key(key) => Some(key),
            _ => None,
        }
    }

    /// Events that originate from bytes on the input descriptor.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Key(_) | Self::Mouse(_) | Self::Paste(_) | Self::Quit)
    }
}

impl From<KeyEvent> for Event {
    fn from(key: KeyEvent) -> Self {
        Self::Key(key)
    }
}

impl From<MouseEvent> for Event {
    fn from(mouse: MouseEvent) -> Self {
        Self::Mouse(mouse)
    }
}

// =============================================================================
// Keys
// =============================================================================

/// Key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char,
    Enter,
    Tab,
    Space,
    Backspace,
    Escape,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    Insert,
    Delete,
    PageUp,
    PageDown,
    BackTab,
}

bitflags::bitflags! {
    /// Keyboard modifiers. A set, so order and duplicates never matter.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Modifier: u8 {
        const NONE  = 0;
        const SHIFT = 1 << 0;
        const ALT   = 1 << 1;
        const CTRL  = 1 << 2;
    }
}

/// A key event.
///
/// `text` holds the literal character text for `Char` keys and for keys
/// with a canonical byte (`"\r"` for Enter, `"\x1b"` for Escape, ...).
/// Keys without one (arrows, Home, ...) leave it empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub text: String,
    pub modifiers: Modifier,
}

impl KeyEvent {
    /// A key with text and no modifiers.
    pub fn new(code: KeyCode, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
            modifiers: Modifier::NONE,
        }
    }

    /// A key with no character text.
    pub fn bare(code: KeyCode) -> Self {
        Self::new(code, String::new())
    }

    /// A printable character key.
    pub fn char(c: char) -> Self {
        Self::new(KeyCode::Char, c.to_string())
    }

    /// Same key with the modifier set replaced.
    pub fn with_modifiers(mut self, modifiers: Modifier) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Ctrl held.
    pub fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifier::CTRL)
    }

    /// Alt held.
    pub fn alt(&self) -> bool {
        self.modifiers.contains(Modifier::ALT)
    }

    /// Shift held.
    pub fn shift(&self) -> bool {
        self.modifiers.contains(Modifier::SHIFT)
    }
}

// =============================================================================
// Mouse
// =============================================================================

/// Mouse event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseKind {
    Press,
    Release,
    /// Motion with no button held.
    Move,
    /// Motion with a button held.
    Drag,
}

/// Mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    WheelUp,
    WheelDown,
}

/// A mouse event. Coordinates are zero-based terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseEvent {
    pub kind: MouseKind,
    /// `None` for plain motion and for X10 releases, which do not say
    /// which button went up.
    pub button: Option<MouseButton>,
    pub x: u16,
    pub y: u16,
    pub modifiers: Modifier,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_set_semantics() {
        let a = Modifier::CTRL | Modifier::SHIFT;
        let b = Modifier::SHIFT | Modifier::CTRL | Modifier::CTRL;
        assert_eq!(a, b);
        assert_eq!(Modifier::default(), Modifier::NONE);
    }

    #[test]
    fn test_with_modifiers_keeps_code_and_text() {
        let key = KeyEvent::char('x').with_modifiers(Modifier::ALT);
        assert_eq!(key.code, KeyCode::Char);
        assert_eq!(key.text, "x");
        assert!(key.alt());
        assert!(!key.ctrl());
    }

    #[test]
    fn test_event_kinds() {
        assert!(Event::from(KeyEvent::bare(KeyCode::Home)).is_key());
        assert!(Event::Resize(80, 24).is_resize());
        assert!(Event::Paste(String::new()).is_input());
        assert!(!Event::Unknown.is_input());
        assert!(Event::Quit.as_key().is_none());
    }
}
