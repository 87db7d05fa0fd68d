//! Async terminal I/O.
//!
//! ```text
//! ByteSource (stdin / pipe)
//!       │  non-blocking read
//!       ▼
//! InputReader  ── process-wide instance behind init_async_io()/cleanup_async_io()
//!       │
//!       ▼
//! has_input_async / read_char_async / peek_char_async / read_stdin_async
//! ```
//!
//! The output side mirrors it with a process-wide [`AsyncWriter`] on stdout.

pub mod reader;
pub mod source;
pub mod writer;

pub use reader::{BufferStats, InputReader};
pub use source::{ByteSource, PipeFeed, PipeSource, StdinSource, pipe};
pub use writer::{AsyncWriter, OutputBuffer, ansi};

use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::config::InputConfig;
use crate::error::Result;

// =============================================================================
// Global reader lifecycle
// =============================================================================

static GLOBAL_READER: Mutex<Option<InputReader>> = Mutex::new(None);

fn global() -> MutexGuard<'static, Option<InputReader>> {
    GLOBAL_READER.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Install the global reader over stdin. No-op if one is installed.
pub fn init_async_io() {
    init_async_io_with(StdinSource::new());
}

/// Install the global reader over `source`. Returns `false` (and drops
/// `source`) if a reader is already installed.
pub fn init_async_io_with(source: impl ByteSource + 'static) -> bool {
    let mut slot = global();
    if slot.is_some() {
        return false;
    }
    let config = InputConfig::from_env();
    *slot = Some(InputReader::with_options(source, config.read_chunk, config.poll_interval));
    tracing::debug!("async I/O initialized");
    true
}

/// Drop the global reader. No-op if none is installed.
pub fn cleanup_async_io() {
    if global().take().is_some() {
        tracing::debug!("async I/O cleaned up");
    }
}

/// Whether a process-wide reader is installed.
pub fn is_async_io_initialized() -> bool {
    global().is_some()
}

/// Stats of the global reader; the default (uninitialized) snapshot when
/// none is installed.
pub fn buffer_stats() -> BufferStats {
    global().as_ref().map(InputReader::stats).unwrap_or_default()
}

/// The global reader, installing one over stdin first if needed.
pub fn global_reader() -> InputReader {
    let mut slot = global();
    if let Some(reader) = slot.as_ref() {
        return reader.clone();
    }
    let config = InputConfig::from_env();
    let reader = InputReader::with_options(StdinSource::new(), config.read_chunk, config.poll_interval);
    *slot = Some(reader.clone());
    tracing::debug!("async I/O initialized on first use");
    reader
}

/// Scoped ownership of the global reader.
///
/// Dropping the guard cleans up only if this guard did the initialization.
#[must_use = "dropping the guard immediately cleans up async I/O"]
#[derive(Debug)]
pub struct AsyncIoGuard {
    owns: bool,
}

impl AsyncIoGuard {
    /// Whether this guard installed the reader.
    pub fn owns_reader(&self) -> bool {
        self.owns
    }
}

impl Drop for AsyncIoGuard {
    fn drop(&mut self) {
        if self.owns {
            cleanup_async_io();
        }
    }
}

/// Acquire the global reader over stdin for the guard's lifetime.
pub fn acquire_async_io() -> AsyncIoGuard {
    acquire_async_io_with(StdinSource::new())
}

/// Acquire the global reader over `source` for the guard's lifetime.
pub fn acquire_async_io_with(source: impl ByteSource + 'static) -> AsyncIoGuard {
    AsyncIoGuard {
        owns: init_async_io_with(source),
    }
}

// =============================================================================
// Input
// =============================================================================

/// Wait up to `timeout` for input on the global reader.
pub async fn has_input_async(timeout: Duration) -> Result<bool> {
    global_reader().has_input(timeout).await
}

/// Wait for one byte and take it.
pub async fn read_char_async() -> Result<u8> {
    global_reader().read_byte().await
}

/// Wait for one byte without taking it.
pub async fn peek_char_async() -> Result<u8> {
    global_reader().peek_byte().await
}

/// Whatever arrives within `timeout`, possibly nothing.
pub async fn read_stdin_async(timeout: Duration) -> Result<Vec<u8>> {
    global_reader().read_available(timeout).await
}

// =============================================================================
// Output
// =============================================================================

static STDOUT_WRITER: LazyLock<AsyncWriter> = LazyLock::new(AsyncWriter::stdout);

/// The process-wide stdout writer.
pub fn stdout_writer() -> &'static AsyncWriter {
    &STDOUT_WRITER
}

/// Write `text` to stdout and flush. Returns the bytes written.
pub async fn write_stdout_async(text: &str) -> Result<usize> {
    STDOUT_WRITER.write(text).await
}

/// Flush anything queued on the stdout writer.
pub async fn flush_stdout_async() -> Result<()> {
    STDOUT_WRITER.flush().await
}

/// Write `ESC [ code` to stdout.
pub async fn write_escape_async(code: &str) -> Result<()> {
    STDOUT_WRITER.write_escape(code).await
}

/// Clear the screen and home the cursor.
pub async fn clear_screen_async() -> Result<()> {
    STDOUT_WRITER.clear_screen().await
}

/// Hide the cursor.
pub async fn hide_cursor_async() -> Result<()> {
    STDOUT_WRITER.hide_cursor().await
}

/// Show the cursor.
pub async fn show_cursor_async() -> Result<()> {
    STDOUT_WRITER.show_cursor().await
}
