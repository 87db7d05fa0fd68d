//! Buffered terminal output.
//!
//! Writes accumulate in an [`OutputBuffer`]; a flush hands the whole batch to
//! the sink on the backend's blocking pool, so a slow terminal never stalls
//! the scheduler.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::Result;
use crate::runtime;

// =============================================================================
// Escape sequences
// =============================================================================

pub mod ansi {
    //! Control sequences the input side needs to emit.

    pub const CSI: &str = "\x1b[";
    pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[3J\x1b[H";
    pub const HIDE_CURSOR: &str = "\x1b[?25l";
    pub const SHOW_CURSOR: &str = "\x1b[?25h";
    pub const ENABLE_BRACKETED_PASTE: &str = "\x1b[?2004h";
    pub const DISABLE_BRACKETED_PASTE: &str = "\x1b[?2004l";
    /// Button, drag and motion reporting in SGR encoding.
    pub const ENABLE_MOUSE: &str = "\x1b[?1000h\x1b[?1002h\x1b[?1003h\x1b[?1006h";
    pub const DISABLE_MOUSE: &str = "\x1b[?1006l\x1b[?1003l\x1b[?1002l\x1b[?1000l";
}

// =============================================================================
// OutputBuffer
// =============================================================================

/// Accumulates output for a single batched write.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    data: Vec<u8>,
}

impl OutputBuffer {
    /// An empty buffer with room for 1KiB.
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// An empty buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Bytes buffered.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing is buffered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append a string.
    #[inline]
    pub fn write_str(&mut self, s: &str) {
        self.data.extend_from_slice(s.as_bytes());
    }

    /// Write `ESC [` followed by `code`.
    pub fn write_csi(&mut self, code: &str) {
        self.write_str(ansi::CSI);
        self.write_str(code);
    }

    /// Move everything out, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }

    /// Flush buffer to a writer.
    pub fn flush_to<W: Write + ?Sized>(&mut self, writer: &mut W) -> io::Result<()> {
        if self.data.is_empty() {
            return Ok(());
        }
        writer.write_all(&self.data)?;
        writer.flush()?;
        self.data.clear();
        Ok(())
    }

    /// The buffered bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// =============================================================================
// AsyncWriter
// =============================================================================

struct WriterState {
    buffer: OutputBuffer,
    sink: Box<dyn Write + Send>,
}

/// Shared async writer. Clones write to the same buffer and sink.
#[derive(Clone)]
pub struct AsyncWriter {
    state: Arc<Mutex<WriterState>>,
}

impl std::fmt::Debug for AsyncWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncWriter")
            .field("buffered", &self.buffered())
            .finish()
    }
}

fn lock(state: &Mutex<WriterState>) -> MutexGuard<'_, WriterState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AsyncWriter {
    /// A writer over `sink`.
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self {
            state: Arc::new(Mutex::new(WriterState {
                buffer: OutputBuffer::new(),
                sink: Box::new(sink),
            })),
        }
    }

    /// A writer over the process stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Bytes written but not yet flushed.
    pub fn buffered(&self) -> usize {
        lock(&self.state).buffer.len()
    }

    /// Queue `text` without flushing.
    pub fn queue(&self, text: &str) {
        lock(&self.state).buffer.write_str(text);
    }

    /// Write `text` and flush. Returns the number of bytes written.
    pub async fn write(&self, text: &str) -> Result<usize> {
        if text.is_empty() {
            return Ok(0);
        }
        self.queue(text);
        self.flush().await?;
        Ok(text.len())
    }

    /// Push everything buffered to the sink.
    ///
    /// The batch is taken and written under one lock, so concurrent flushes
    /// keep byte order.
    pub async fn flush(&self) -> Result<()> {
        let state = Arc::clone(&self.state);
        runtime::unblock(move || {
            let mut guard = lock(&state);
            let WriterState { buffer, sink } = &mut *guard;
            buffer.flush_to(sink.as_mut())
        })
        .await?;
        Ok(())
    }

    /// Write `ESC [ code` and flush.
    pub async fn write_escape(&self, code: &str) -> Result<()> {
        lock(&self.state).buffer.write_csi(code);
        self.flush().await
    }

    /// Clear the screen and home the cursor.
    pub async fn clear_screen(&self) -> Result<()> {
        self.write(ansi::CLEAR_SCREEN).await.map(drop)
    }

    /// Hide the cursor.
    pub async fn hide_cursor(&self) -> Result<()> {
        self.write(ansi::HIDE_CURSOR).await.map(drop)
    }

    /// Show the cursor.
    pub async fn show_cursor(&self) -> Result<()> {
        self.write(ansi::SHOW_CURSOR).await.map(drop)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Cloneable in-memory sink for inspecting what was flushed.
    #[derive(Clone, Default)]
    pub(crate) struct SharedSink(pub Arc<Mutex<Vec<u8>>>);

    impl SharedSink {
        pub(crate) fn contents(&self) -> Vec<u8> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_output_buffer_flush_to() {
        let mut buffer = OutputBuffer::new();
        buffer.write_str("ab");
        buffer.write_csi("5A");
        assert_eq!(buffer.as_bytes(), b"ab\x1b[5A");

        let mut out = Vec::new();
        buffer.flush_to(&mut out).unwrap();
        assert_eq!(out, b"ab\x1b[5A");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_write_returns_length() {
        let sink = SharedSink::default();
        let writer = AsyncWriter::new(sink.clone());
        runtime::block_on(async {
            assert_eq!(writer.write("").await.unwrap(), 0);
            assert_eq!(writer.write("héllo").await.unwrap(), 6);
        })
        .unwrap();
        assert_eq!(sink.contents(), "héllo".as_bytes());
        assert_eq!(writer.buffered(), 0);
    }

    #[test]
    fn test_escape_helpers() {
        let sink = SharedSink::default();
        let writer = AsyncWriter::new(sink.clone());
        runtime::block_on(async {
            writer.hide_cursor().await.unwrap();
            writer.write_escape("2K").await.unwrap();
            writer.show_cursor().await.unwrap();
            writer.clear_screen().await.unwrap();
        })
        .unwrap();
        let expected = [ansi::HIDE_CURSOR, "\x1b[2K", ansi::SHOW_CURSOR, ansi::CLEAR_SCREEN].concat();
        assert_eq!(sink.contents(), expected.as_bytes());
    }

    #[test]
    fn test_queue_then_flush() {
        let sink = SharedSink::default();
        let writer = AsyncWriter::new(sink.clone());
        writer.queue("a");
        writer.queue("b");
        assert_eq!(writer.buffered(), 2);
        assert!(sink.contents().is_empty());
        runtime::block_on(writer.flush()).unwrap().unwrap();
        assert_eq!(sink.contents(), b"ab");
    }
}
