//! Async event source.
//!
//! Owns one [`Decoder`], a queue of decoded-but-undelivered events, and a
//! [`ResizeFlag`]. Bytes only ever leave the reader synchronously, straight
//! into that owned state; every await is a plain sleep. A wait that loses a
//! timeout race is therefore dropped with nothing in flight: any bytes it
//! pulled are already decoded and queued for the next call.

use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

use crate::config::InputConfig;
use crate::error::{InputError, Result};
use crate::input::{Decoder, Event, ResizeFlag, ResizeSignal, mouse};
use crate::io::{InputReader, global_reader};
use crate::runtime;

use super::terminal::terminal_size;

/// Longest SGR parameter list accepted by the mouse entry point.
const MAX_SGR_PARAMS: usize = 32;

/// Decodes input bytes into [`Event`]s, with resize taking priority.
pub struct EventSource {
    decoder: Decoder,
    pending: VecDeque<Event>,
    resize: ResizeFlag,
    /// `None` reads from the process-wide reader.
    reader: Option<InputReader>,
    config: InputConfig,
    last_byte_at: Option<Instant>,
}

impl std::fmt::Debug for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSource")
            .field("decoder", &self.decoder)
            .field("pending", &self.pending.len())
            .field("resize", &self.resize)
            .field("global_reader", &self.reader.is_none())
            .field("config", &self.config)
            .finish()
    }
}

impl Default for EventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource {
    /// Source over the process-wide reader (stdin unless initialized
    /// otherwise), with configuration from the environment.
    pub fn new() -> Self {
        Self {
            decoder: Decoder::new(),
            pending: VecDeque::new(),
            resize: ResizeFlag::new(),
            reader: None,
            config: InputConfig::from_env(),
            last_byte_at: None,
        }
    }

    /// Source over a dedicated reader.
    pub fn from_reader(reader: InputReader) -> Self {
        Self {
            reader: Some(reader),
            ..Self::new()
        }
    }

    /// Replace the timing configuration.
    pub fn with_config(mut self, config: InputConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing resize flag instead of owning a fresh one.
    pub fn with_resize_flag(mut self, flag: ResizeFlag) -> Self {
        self.resize = flag;
        self
    }

    /// Current timing configuration.
    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    /// The flag to hand to whatever observes terminal resizes.
    pub fn resize_flag(&self) -> &ResizeFlag {
        &self.resize
    }

    /// Route SIGWINCH to this source's flag until the guard drops.
    pub fn install_resize_handler(&self) -> io::Result<ResizeSignal> {
        self.resize.install_sigwinch()
    }

    /// Decoded events not yet delivered.
    pub fn pending_events(&self) -> usize {
        self.pending.len()
    }

    /// Drop any partial sequence and undelivered events.
    pub fn reset(&mut self) {
        self.decoder.reset();
        self.pending.clear();
        self.last_byte_at = None;
    }

    fn reader(&self) -> InputReader {
        match &self.reader {
            Some(reader) => reader.clone(),
            None => global_reader(),
        }
    }

    // =========================================================================
    // Synchronous core
    // =========================================================================

    /// Move available bytes through the decoder into the pending queue.
    ///
    /// Never suspends. `Err(Closed)` only once the source is exhausted and
    /// nothing is left to deliver.
    fn pump(&mut self) -> Result<()> {
        match self.reader().take_available() {
            Ok(bytes) if !bytes.is_empty() => {
                self.last_byte_at = Some(Instant::now());
                self.pending.extend(self.decoder.feed(&bytes));
            }
            Ok(_) => {}
            Err(InputError::Closed) => {
                // Nothing more can complete a lone ESC.
                if let Some(event) = self.decoder.flush_escape() {
                    self.pending.push_back(event);
                }
                if self.pending.is_empty() {
                    return Err(InputError::Closed);
                }
                return Ok(());
            }
            Err(e) => return Err(e),
        }
        self.flush_stale_escape();
        Ok(())
    }

    fn flush_stale_escape(&mut self) {
        if !self.decoder.is_lone_escape() {
            return;
        }
        let quiet = self.last_byte_at.map_or(Duration::MAX, |at| at.elapsed());
        if quiet < self.config.escape_timeout {
            return;
        }
        if let Some(event) = self.decoder.flush_escape() {
            tracing::trace!("lone ESC flushed after {:?}", quiet);
            self.pending.push_back(event);
        }
    }

    /// Next decoded event, pulling bytes if the queue is empty.
    fn try_next(&mut self) -> Result<Option<Event>> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }
        self.pump()?;
        Ok(self.pending.pop_front())
    }

    /// Remove the earliest queued key or quit, leaving everything else in
    /// order.
    fn take_first_key(&mut self) -> Option<Event> {
        let index = self
            .pending
            .iter()
            .position(|event| matches!(event, Event::Key(_) | Event::Quit))?;
        self.pending.remove(index)
    }

    /// Whether the source is at EOF with its buffer drained.
    fn is_exhausted(&self) -> bool {
        matches!(self.reader().poll_ready(), Err(InputError::Closed))
    }

    /// How long to sleep before the next poll: shorter when a lone ESC is
    /// waiting to be flushed.
    fn idle_delay(&self) -> Duration {
        let poll = self.config.poll_interval;
        match self.last_byte_at {
            Some(at) if self.decoder.is_lone_escape() => {
                let remaining = self.config.escape_timeout.saturating_sub(at.elapsed());
                poll.min(remaining).max(Duration::from_millis(1))
            }
            _ => poll,
        }
    }

    // =========================================================================
    // Async surface
    // =========================================================================

    /// Next input event, bounded by `read_timeout`. Returns
    /// [`Event::Unknown`] when nothing arrives in time or the source is gone.
    pub async fn read_key_async(&mut self) -> Result<Event> {
        let limit = self.config.read_timeout;
        match runtime::timeout(limit, self.wait_for_key_async()).await {
            Ok(Ok(event)) => Ok(event),
            Ok(Err(InputError::Closed)) | Err(InputError::Timeout(_)) => Ok(Event::Unknown),
            Ok(Err(e)) | Err(e) => Err(e),
        }
    }

    /// Next input event if one is ready right now.
    pub async fn poll_key_async(&mut self) -> Result<Option<Event>> {
        match self.try_next() {
            Err(InputError::Closed) => Ok(None),
            other => other,
        }
    }

    /// `Some(Resize)` iff the resize flag was set; clears it.
    pub async fn check_resize_async(&mut self) -> Option<Event> {
        if self.resize.take() {
            let (cols, rows) = terminal_size();
            return Some(Event::Resize(cols, rows));
        }
        None
    }

    /// Whether anything (resize or input) is ready within `timeout`.
    /// Consumes nothing.
    pub async fn poll_events_async(&mut self, timeout: Duration) -> Result<bool> {
        let reader = self.reader();
        let deadline = Instant::now().checked_add(timeout);
        loop {
            if !self.pending.is_empty() || self.resize.is_set() {
                return Ok(true);
            }
            match reader.poll_ready() {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(InputError::Closed) => return Ok(false),
                Err(e) => return Err(e),
            }
            let delay = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(false);
                    }
                    self.config.poll_interval.min(deadline - now)
                }
                None => self.config.poll_interval,
            };
            runtime::sleep(delay).await;
        }
    }

    /// Wait for the next input event (key, mouse, paste, quit).
    pub async fn wait_for_key_async(&mut self) -> Result<Event> {
        loop {
            if let Some(event) = self.try_next()? {
                return Ok(event);
            }
            runtime::sleep(self.idle_delay()).await;
        }
    }

    /// Wait for a keypress or quit. Mouse, paste and unknown input stay
    /// queued, in order, for later calls.
    ///
    /// `Err(Closed)` once the source is exhausted with no key left, even if
    /// other events are still queued.
    pub async fn wait_for_any_key_async(&mut self) -> Result<Event> {
        loop {
            self.pump()?;
            if let Some(event) = self.take_first_key() {
                return Ok(event);
            }
            if self.is_exhausted() {
                return Err(InputError::Closed);
            }
            runtime::sleep(self.idle_delay()).await;
        }
    }

    /// [`wait_for_key_async`](Self::wait_for_key_async) raced against a
    /// timer. `Err(Timeout)` on expiry, with no input lost.
    pub async fn wait_for_key_timeout_async(&mut self, timeout: Duration) -> Result<Event> {
        runtime::timeout(timeout, self.wait_for_key_async()).await?
    }

    /// Wait for a resize or an input event. A pending resize always wins;
    /// input stays queued for the next call.
    pub async fn wait_for_multiple_events_async(&mut self) -> Result<Event> {
        loop {
            if let Some(resize) = self.check_resize_async().await {
                return Ok(resize);
            }
            if let Some(event) = self.try_next()? {
                return Ok(event);
            }
            runtime::sleep(self.idle_delay()).await;
        }
    }

    // =========================================================================
    // Mouse tails
    // =========================================================================

    async fn read_tail_byte(&self, reader: &InputReader) -> Result<Option<u8>> {
        match runtime::timeout(self.config.read_timeout, reader.read_byte()).await {
            Ok(Ok(byte)) => Ok(Some(byte)),
            Ok(Err(InputError::Closed)) | Err(InputError::Timeout(_)) => Ok(None),
            Ok(Err(e)) | Err(e) => Err(e),
        }
    }

    async fn peek_tail_byte(&self, reader: &InputReader) -> Result<Option<u8>> {
        match runtime::timeout(self.config.read_timeout, reader.peek_byte()).await {
            Ok(Ok(byte)) => Ok(Some(byte)),
            Ok(Err(InputError::Closed)) | Err(InputError::Timeout(_)) => Ok(None),
            Ok(Err(e)) | Err(e) => Err(e),
        }
    }

    /// Parse the rest of an SGR mouse report (`b;x;yM` or `b;x;ym`) whose
    /// `ESC [ <` prefix the caller already consumed. [`Event::Unknown`] on
    /// malformed or truncated input.
    ///
    /// Only parameter bytes and the final `M`/`m` are consumed. A byte that
    /// cannot continue the report is left for the next read. If the report
    /// stops short (timeout or EOF) its parameter bytes are put back.
    pub async fn parse_mouse_event_sgr_async(&mut self) -> Result<Event> {
        let reader = self.reader();
        let mut params = Vec::new();
        while let Some(byte) = self.peek_tail_byte(&reader).await? {
            let is_final = matches!(byte, b'M' | b'm');
            if !is_final && !(mouse::is_sgr_param_byte(byte) && params.len() < MAX_SGR_PARAMS) {
                return Ok(Event::Unknown);
            }
            reader.try_read_byte()?;
            if is_final {
                return Ok(mouse::parse_sgr(&params, byte).map_or(Event::Unknown, Event::Mouse));
            }
            params.push(byte);
        }
        reader.unread(&params);
        Ok(Event::Unknown)
    }

    /// Parse the three bytes of an X10 mouse report whose `ESC [ M` prefix
    /// the caller already consumed. A truncated report puts its bytes back.
    pub async fn parse_mouse_event_x10_async(&mut self) -> Result<Event> {
        let reader = self.reader();
        let mut raw = Vec::with_capacity(3);
        while raw.len() < 3 {
            match self.read_tail_byte(&reader).await? {
                Some(byte) => raw.push(byte),
                None => {
                    reader.unread(&raw);
                    return Ok(Event::Unknown);
                }
            }
        }
        Ok(mouse::parse_x10(raw[0], raw[1], raw[2]).map_or(Event::Unknown, Event::Mouse))
    }
}
