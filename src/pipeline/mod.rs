//! Event pipeline
//!
//! Connects terminal bytes to application handlers.
//!
//! ```text
//! InputReader ─▶ EventSource (Decoder + pending queue + ResizeFlag) ─▶ EventStream ─▶ handler
//!                      ▲
//!                SIGWINCH
//! ```
//!
//! - **EventSource** - pull API: poll, wait, wait-with-timeout, resize first
//! - **EventStream** - push API: a background loop feeding a handler
//! - **TerminalSetup** - raw mode and protocol toggles around both

pub mod source;
pub mod stream;
pub mod terminal;

pub use source::EventSource;
pub use stream::{EventHandler, EventStream, StopHandle};
pub use terminal::{DEFAULT_SIZE, TerminalSetup, terminal_size};
