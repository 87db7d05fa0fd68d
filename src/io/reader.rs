//! Buffered async reader over a [`ByteSource`].
//!
//! Bytes move from the source into an internal queue; callers take them from
//! the queue. Every await point sits *between* synchronous queue operations,
//! so a read dropped at a suspension point (lost timeout race, cancelled
//! task) never consumes a byte.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::source::ByteSource;
use crate::error::{InputError, Result};
use crate::runtime;

/// Snapshot of reader counters.
///
/// `BufferStats::default()` is the "no reader" state reported after cleanup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferStats {
    pub initialized: bool,
    /// Bytes pulled from the source but not yet consumed.
    pub buffered: usize,
    /// Bytes pulled from the source since creation.
    pub total_read: u64,
    /// Successful non-empty source reads since creation.
    pub reads: u64,
    pub closed: bool,
}

struct ReaderState {
    source: Box<dyn ByteSource>,
    buffer: VecDeque<u8>,
    chunk: Vec<u8>,
    total_read: u64,
    reads: u64,
    closed: bool,
}

impl ReaderState {
    /// Move whatever the source has into the buffer.
    fn fill(&mut self) -> Result<usize> {
        if self.closed {
            return Ok(0);
        }
        match self.source.read(&mut self.chunk) {
            Ok(0) => {
                tracing::debug!("input source reached EOF");
                self.closed = true;
                Ok(0)
            }
            Ok(n) => {
                self.buffer.extend(&self.chunk[..n]);
                self.total_read += n as u64;
                self.reads += 1;
                Ok(n)
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => Ok(0),
            Err(e) => Err(InputError::Io(e)),
        }
    }

    /// Make sure the buffer holds a byte if the source has one.
    fn ensure_byte(&mut self) -> Result<bool> {
        if self.buffer.is_empty() {
            self.fill()?;
        }
        if self.buffer.is_empty() && self.closed {
            return Err(InputError::Closed);
        }
        Ok(!self.buffer.is_empty())
    }
}

/// Shared handle to a buffered reader. Clones read from the same buffer.
#[derive(Clone)]
pub struct InputReader {
    state: Arc<Mutex<ReaderState>>,
    poll_interval: Duration,
}

impl std::fmt::Debug for InputReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputReader")
            .field("stats", &self.stats())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl InputReader {
    /// Reader with a 256-byte read chunk and a 5ms poll interval.
    pub fn new(source: impl ByteSource + 'static) -> Self {
        Self::with_options(source, 256, Duration::from_millis(5))
    }

    /// Reader pulling up to `chunk` bytes per source read and sleeping
    /// `poll_interval` between polls.
    pub fn with_options(source: impl ByteSource + 'static, chunk: usize, poll_interval: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(ReaderState {
                source: Box::new(source),
                buffer: VecDeque::with_capacity(chunk),
                chunk: vec![0; chunk.max(1)],
                total_read: 0,
                reads: 0,
                closed: false,
            })),
            poll_interval,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ReaderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Non-blocking
    // =========================================================================

    /// Whether a byte can be taken right now. `Err(Closed)` once the source
    /// is exhausted and the buffer is empty.
    pub fn poll_ready(&self) -> Result<bool> {
        self.lock().ensure_byte()
    }

    /// Take one byte if available.
    pub fn try_read_byte(&self) -> Result<Option<u8>> {
        let mut state = self.lock();
        if !state.ensure_byte()? {
            return Ok(None);
        }
        Ok(state.buffer.pop_front())
    }

    /// Look at the next byte without taking it.
    pub fn try_peek_byte(&self) -> Result<Option<u8>> {
        let mut state = self.lock();
        if !state.ensure_byte()? {
            return Ok(None);
        }
        Ok(state.buffer.front().copied())
    }

    /// Take every byte available right now (possibly none).
    pub fn take_available(&self) -> Result<Vec<u8>> {
        let mut state = self.lock();
        state.ensure_byte()?;
        while state.fill()? > 0 {}
        Ok(state.buffer.drain(..).collect())
    }

    /// Put bytes back at the front of the buffer, in order, so the next read
    /// sees them again.
    pub fn unread(&self, bytes: &[u8]) {
        let mut state = self.lock();
        for &byte in bytes.iter().rev() {
            state.buffer.push_front(byte);
        }
    }

    /// Whether the source has reported EOF.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Current counters.
    pub fn stats(&self) -> BufferStats {
        let state = self.lock();
        BufferStats {
            initialized: true,
            buffered: state.buffer.len(),
            total_read: state.total_read,
            reads: state.reads,
            closed: state.closed,
        }
    }

    // =========================================================================
    // Async
    // =========================================================================

    /// Wait up to `timeout` for a byte to become readable. A zero timeout
    /// checks once and returns. A timeout too large to represent waits
    /// without a deadline.
    pub async fn has_input(&self, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now().checked_add(timeout);
        loop {
            if self.poll_ready()? {
                return Ok(true);
            }
            let delay = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(false);
                    }
                    self.poll_interval.min(deadline - now)
                }
                None => self.poll_interval,
            };
            runtime::sleep(delay).await;
        }
    }

    /// Wait for a byte and take it.
    pub async fn read_byte(&self) -> Result<u8> {
        loop {
            if let Some(byte) = self.try_read_byte()? {
                return Ok(byte);
            }
            runtime::sleep(self.poll_interval).await;
        }
    }

    /// Wait for a byte without taking it. Repeated peeks see the same byte.
    pub async fn peek_byte(&self) -> Result<u8> {
        loop {
            if let Some(byte) = self.try_peek_byte()? {
                return Ok(byte);
            }
            runtime::sleep(self.poll_interval).await;
        }
    }

    /// Everything that arrives within `timeout`, possibly nothing.
    pub async fn read_available(&self, timeout: Duration) -> Result<Vec<u8>> {
        if self.has_input(timeout).await? {
            self.take_available()
        } else {
            Ok(Vec::new())
        }
    }
}
