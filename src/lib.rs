//! # spark-tui-input
//!
//! Terminal input pipeline for SparkTUI.
//!
//! Raw terminal bytes come in; typed [`Event`]s go out. Escape sequences may
//! arrive split across reads, so decoding is resumable. Everything async runs
//! on one cooperative backend picked at build time (`backend-tokio` or
//! `backend-smol`).
//!
//! ## Architecture
//!
//! ```text
//! stdin ─▶ io::InputReader ─▶ input::Decoder ─▶ pipeline::EventSource ─▶ pipeline::EventStream ─▶ handler
//!                                                       ▲
//!                                   SIGWINCH ─▶ input::ResizeFlag
//! ```
//!
//! ## Modules
//!
//! - [`input`] - Event types, byte mapping tables, decoder, resize flag
//! - [`io`] - Byte sources, buffered async reader, async writer
//! - [`runtime`] - Backend capability set (sleep, timeout, spawn, ...)
//! - [`pipeline`] - Event source, event stream, terminal setup
//! - [`config`] - Timing and buffer settings
//! - [`error`] - Error type
//!
//! ## Example
//!
//! ```no_run
//! use spark_tui_input::{Event, EventSource, EventStream, runtime};
//!
//! runtime::block_on(async {
//!     let mut stream = EventStream::with_handler(EventSource::new(), |event| {
//!         !matches!(event, Event::Quit)
//!     });
//!     stream.start_async().await?;
//!     // ...
//!     stream.stop_async().await
//! })??;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod input;
pub mod io;
pub mod pipeline;
pub mod runtime;

pub use config::InputConfig;
pub use error::{InputError, Result};

pub use input::{
    Decoder, Event, KeyCode, KeyEvent, Modifier, MouseButton, MouseEvent, MouseKind, ResizeFlag,
    ResizeSignal, is_paste_end_sequence, is_paste_start_sequence,
};

pub use io::{
    AsyncIoGuard, BufferStats, ByteSource, InputReader, PipeFeed, PipeSource, StdinSource,
    acquire_async_io, buffer_stats, cleanup_async_io, clear_screen_async, flush_stdout_async,
    has_input_async, hide_cursor_async, init_async_io, is_async_io_initialized, peek_char_async,
    read_char_async, read_stdin_async, show_cursor_async, write_escape_async, write_stdout_async,
};

pub use pipeline::{EventHandler, EventSource, EventStream, StopHandle, TerminalSetup, terminal_size};
