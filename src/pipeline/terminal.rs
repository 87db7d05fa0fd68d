//! Terminal setup and teardown.
//!
//! Raw mode goes through crossterm; protocol toggles (bracketed paste, mouse
//! reporting, cursor visibility) are written as escape sequences in one
//! batch.

use std::io;

use crate::io::{OutputBuffer, ansi};

/// Fallback when no terminal answers the size query.
pub const DEFAULT_SIZE: (u16, u16) = (80, 24);

/// Current terminal size as `(columns, rows)`, or [`DEFAULT_SIZE`].
pub fn terminal_size() -> (u16, u16) {
    match crossterm::terminal::size() {
        Ok((0, _)) | Ok((_, 0)) | Err(_) => DEFAULT_SIZE,
        Ok(size) => size,
    }
}

fn stdin_is_tty() -> bool {
    #[cfg(unix)]
    {
        unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}

/// Terminal setup/teardown handle. Restores everything it changed on drop.
#[derive(Debug)]
pub struct TerminalSetup {
    want_paste: bool,
    want_mouse: bool,
    want_hidden_cursor: bool,
    is_raw: bool,
    bracketed_paste: bool,
    mouse_enabled: bool,
    cursor_hidden: bool,
}

impl TerminalSetup {
    /// Raw mode plus bracketed paste.
    pub fn new() -> Self {
        Self {
            want_paste: true,
            want_mouse: false,
            want_hidden_cursor: false,
            is_raw: false,
            bracketed_paste: false,
            mouse_enabled: false,
            cursor_hidden: false,
        }
    }

    /// Bracketed paste (on by default).
    pub fn with_bracketed_paste(mut self, enabled: bool) -> Self {
        self.want_paste = enabled;
        self
    }

    /// SGR mouse reporting.
    pub fn with_mouse(mut self, enabled: bool) -> Self {
        self.want_mouse = enabled;
        self
    }

    /// Hide the cursor while active.
    pub fn with_hidden_cursor(mut self, hidden: bool) -> Self {
        self.want_hidden_cursor = hidden;
        self
    }

    /// Whether any terminal mode is currently applied.
    pub fn is_active(&self) -> bool {
        self.is_raw || self.bracketed_paste || self.mouse_enabled || self.cursor_hidden
    }

    /// Enter raw mode and enable the requested protocols.
    ///
    /// Raw mode is skipped when stdin is not a tty (piped input, tests).
    pub fn enter(&mut self) -> io::Result<()> {
        if stdin_is_tty() && !self.is_raw {
            crossterm::terminal::enable_raw_mode()?;
            self.is_raw = true;
        }

        let mut out = OutputBuffer::new();
        if self.want_paste && !self.bracketed_paste {
            out.write_str(ansi::ENABLE_BRACKETED_PASTE);
            self.bracketed_paste = true;
        }
        if self.want_mouse && !self.mouse_enabled {
            out.write_str(ansi::ENABLE_MOUSE);
            self.mouse_enabled = true;
        }
        if self.want_hidden_cursor && !self.cursor_hidden {
            out.write_str(ansi::HIDE_CURSOR);
            self.cursor_hidden = true;
        }
        out.flush_to(&mut io::stdout().lock())?;
        tracing::debug!(raw = self.is_raw, paste = self.bracketed_paste, mouse = self.mouse_enabled, "terminal set up");
        Ok(())
    }

    /// Undo everything `enter` did. Safe to call twice.
    pub fn exit(&mut self) -> io::Result<()> {
        let mut out = OutputBuffer::new();
        if self.mouse_enabled {
            out.write_str(ansi::DISABLE_MOUSE);
            self.mouse_enabled = false;
        }
        if self.bracketed_paste {
            out.write_str(ansi::DISABLE_BRACKETED_PASTE);
            self.bracketed_paste = false;
        }
        if self.cursor_hidden {
            out.write_str(ansi::SHOW_CURSOR);
            self.cursor_hidden = false;
        }
        out.flush_to(&mut io::stdout().lock())?;

        if self.is_raw {
            crossterm::terminal::disable_raw_mode()?;
            self.is_raw = false;
        }
        tracing::debug!("terminal restored");
        Ok(())
    }
}

impl Default for TerminalSetup {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TerminalSetup {
    fn drop(&mut self) {
        if self.is_active() {
            let _ = self.exit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_size_never_zero() {
        let (cols, rows) = terminal_size();
        assert!(cols > 0);
        assert!(rows > 0);
    }

    #[test]
    fn test_builder_flags() {
        let setup = TerminalSetup::new()
            .with_bracketed_paste(false)
            .with_mouse(true)
            .with_hidden_cursor(true);
        assert!(!setup.want_paste);
        assert!(setup.want_mouse);
        assert!(setup.want_hidden_cursor);
        assert!(!setup.is_active());
    }

    #[test]
    fn test_exit_without_enter_is_noop() {
        let mut setup = TerminalSetup::new();
        setup.exit().unwrap();
        setup.exit().unwrap();
        assert!(!setup.is_active());
    }
}
