//! Input decoding: raw bytes → typed events.
//!
//! # Architecture
//!
//! ```text
//! stdin bytes → parser::Decoder → Event
//!                   │
//!        ┌──────────┼───────────┐
//!        │          │           │
//!     keymap      mouse      paste buffer
//!   (pure tables) (SGR/X10)  (200~ … 201~)
//!
//! SIGWINCH → resize::ResizeFlag (checked by the event source)
//! ```

pub mod events;
pub mod keymap;
pub mod mouse;
pub mod parser;
pub mod resize;

pub use events::{Event, KeyCode, KeyEvent, Modifier, MouseButton, MouseEvent, MouseKind};
pub use parser::{Decoder, is_paste_end_sequence, is_paste_start_sequence};
pub use resize::{ResizeFlag, ResizeSignal};
