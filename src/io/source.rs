//! Byte sources the reader pulls from.
//!
//! A source is non-blocking: `read` returns `WouldBlock` when nothing is
//! available and `Ok(0)` only at end-of-file.
//!
//! - [`StdinSource`] - the terminal, via `poll(2)` / `read(2)` on fd 0
//! - [`PipeSource`] - in-memory bytes pushed through a [`PipeFeed`]

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Non-blocking source of raw input bytes.
pub trait ByteSource: Send {
    /// Whether a `read` would return without blocking (data or EOF).
    fn poll_readable(&mut self) -> io::Result<bool>;

    /// Read available bytes. `WouldBlock` if none, `Ok(0)` at EOF.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn poll_readable(&mut self) -> io::Result<bool> {
        (**self).poll_readable()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }
}

// =============================================================================
// StdinSource
// =============================================================================

/// The process's standard input.
#[derive(Debug)]
pub struct StdinSource {
    #[cfg(unix)]
    fd: std::os::unix::io::RawFd,
}

impl StdinSource {
    /// Standard input (fd 0).
    pub fn new() -> Self {
        Self {
            #[cfg(unix)]
            fd: libc::STDIN_FILENO,
        }
    }

    /// Whether stdin is attached to a terminal.
    pub fn is_tty(&self) -> bool {
        #[cfg(unix)]
        {
            unsafe { libc::isatty(self.fd) != 0 }
        }
        #[cfg(not(unix))]
        {
            false
        }
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
impl ByteSource for StdinSource {
    fn poll_readable(&mut self) -> io::Result<bool> {
        let mut pfd = libc::pollfd {
            fd: self.fd,
            events: libc::POLLIN,
            revents: 0,
        };
        let rc = unsafe { libc::poll(&mut pfd, 1, 0) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(false);
            }
            return Err(err);
        }
        if rc == 0 {
            return Ok(false);
        }
        if pfd.revents & libc::POLLNVAL != 0 {
            return Err(io::Error::from_raw_os_error(libc::EBADF));
        }
        // HUP and ERR count as readable: the next read reports EOF or the error.
        Ok(pfd.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if !self.poll_readable()? {
            return Err(io::ErrorKind::WouldBlock.into());
        }
        let n = unsafe { libc::read(self.fd, buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }
}

#[cfg(not(unix))]
impl ByteSource for StdinSource {
    fn poll_readable(&mut self) -> io::Result<bool> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "raw stdin polling is unix-only"))
    }

    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "raw stdin polling is unix-only"))
    }
}

// =============================================================================
// PipeSource
// =============================================================================

#[derive(Debug, Default)]
struct PipeState {
    bytes: VecDeque<u8>,
    closed: bool,
}

fn lock(state: &Mutex<PipeState>) -> MutexGuard<'_, PipeState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Reading end of an in-memory pipe.
#[derive(Debug)]
pub struct PipeSource {
    state: Arc<Mutex<PipeState>>,
}

/// Writing end of an in-memory pipe. Clones feed the same pipe.
#[derive(Debug, Clone)]
pub struct PipeFeed {
    state: Arc<Mutex<PipeState>>,
}

/// Create a connected feed/source pair.
pub fn pipe() -> (PipeFeed, PipeSource) {
    let state = Arc::new(Mutex::new(PipeState::default()));
    (
        PipeFeed { state: Arc::clone(&state) },
        PipeSource { state },
    )
}

impl PipeFeed {
    /// Append bytes. Ignored once the pipe is closed.
    pub fn write(&self, bytes: impl AsRef<[u8]>) {
        let mut state = lock(&self.state);
        if !state.closed {
            state.bytes.extend(bytes.as_ref());
        }
    }

    /// Signal end-of-file. Bytes already written can still be read.
    pub fn close(&self) {
        lock(&self.state).closed = true;
    }

    /// Bytes written but not yet read.
    pub fn pending(&self) -> usize {
        lock(&self.state).bytes.len()
    }
}

impl ByteSource for PipeSource {
    fn poll_readable(&mut self) -> io::Result<bool> {
        let state = lock(&self.state);
        Ok(!state.bytes.is_empty() || state.closed)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = lock(&self.state);
        if state.bytes.is_empty() {
            return if state.closed {
                Ok(0)
            } else {
                Err(io::ErrorKind::WouldBlock.into())
            };
        }
        let n = buf.len().min(state.bytes.len());
        for (slot, byte) in buf.iter_mut().zip(state.bytes.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}
