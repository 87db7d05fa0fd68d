//! Error types for the input pipeline.
//!
//! Only genuine I/O and backend failures are errors. "No data yet" is an
//! empty result, and malformed escape sequences are recovered inside the
//! decoder, so neither shows up here.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors raised by the async I/O primitives and the event source.
#[derive(Debug, Error)]
pub enum InputError {
    /// The OS or the backend reported a failure on the input descriptor.
    #[error("input I/O error: {0}")]
    Io(#[from] io::Error),

    /// The byte source reached end-of-file or was closed.
    #[error("input source closed")]
    Closed,

    /// A raced wait lost against its timer.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The backend could not spawn or join a task.
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl InputError {
    /// Whether retrying the same read can never succeed.
    ///
    /// The event stream stalls (but keeps honouring stop requests) on fatal
    /// errors and retries after a backoff on everything else.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Whether this error is a lost race against a timer.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, InputError>;
