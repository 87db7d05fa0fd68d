//! Resize signal bridge.
//!
//! SIGWINCH sets a flag; exactly one reader clears it. The flag is an owned
//! value rather than module state, so independent pipelines (and tests) each
//! get their own.
//!
//! ```text
//! SIGWINCH ──▶ signal-hook handler ──store(true)──▶ ResizeFlag ──swap(false)──▶ EventSource
//! ```

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Single-consumer resize flag.
///
/// Clones share the same underlying flag. The signal side only ever sets it;
/// [`take`](Self::take) is the only operation that clears it.
#[derive(Debug, Clone, Default)]
pub struct ResizeFlag {
    flag: Arc<AtomicBool>,
}

impl ResizeFlag {
    /// A cleared flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assert the flag (what the signal handler does).
    pub fn set(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Check without consuming.
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Check and clear in one step. Returns true once per assertion.
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }

    /// Route SIGWINCH to this flag until the returned guard is dropped.
    #[cfg(unix)]
    pub fn install_sigwinch(&self) -> io::Result<ResizeSignal> {
        let id = signal_hook::flag::register(signal_hook::consts::SIGWINCH, Arc::clone(&self.flag))?;
        tracing::debug!("SIGWINCH handler installed");
        Ok(ResizeSignal { id: Some(id) })
    }

    /// Always `Unsupported` off unix.
    #[cfg(not(unix))]
    pub fn install_sigwinch(&self) -> io::Result<ResizeSignal> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "SIGWINCH is unix-only"))
    }
}

/// Registration guard for the SIGWINCH handler.
#[derive(Debug)]
pub struct ResizeSignal {
    #[cfg(unix)]
    id: Option<signal_hook::SigId>,
}

impl ResizeSignal {
    /// Remove the handler now instead of at drop.
    pub fn uninstall(&mut self) {
        #[cfg(unix)]
        {
            if let Some(id) = self.id.take() {
                signal_hook::low_level::unregister(id);
                tracing::debug!("SIGWINCH handler removed");
            }
        }
    }
}

impl Drop for ResizeSignal {
    fn drop(&mut self) {
        self.uninstall();
    }
}
