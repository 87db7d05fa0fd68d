//! Cooperative scheduling backends.
//!
//! Everything async in this crate is written against the [`Backend`]
//! capability set: sleep, yield, race-with-timeout, spawn, offload a
//! blocking call, and drive a future to completion. Exactly one backend is
//! compiled in, chosen by cargo feature:
//!
//! | feature          | backend                 |
//! |------------------|-------------------------|
//! | `backend-tokio`  | tokio (current-thread)  |
//! | `backend-smol`   | smol                    |
//!
//! Readiness of the input descriptor is a zero-timeout poll on the byte
//! source followed by a backend sleep, so no backend-specific reactor types
//! leak into the rest of the crate.

use std::future::Future;
use std::io;
use std::time::Duration;

use crate::error::{InputError, Result};

#[cfg(all(feature = "backend-tokio", feature = "backend-smol"))]
compile_error!("features `backend-tokio` and `backend-smol` are mutually exclusive");

#[cfg(not(any(feature = "backend-tokio", feature = "backend-smol")))]
compile_error!("enable exactly one of the `backend-tokio` or `backend-smol` features");

#[cfg(feature = "backend-tokio")]
mod tokio_backend;
#[cfg(feature = "backend-tokio")]
pub use tokio_backend::{Task, TokioBackend as ActiveBackend};

#[cfg(feature = "backend-smol")]
mod smol_backend;
#[cfg(feature = "backend-smol")]
pub use smol_backend::{SmolBackend as ActiveBackend, Task};

/// The capability set a scheduling backend provides.
pub trait Backend {
    /// Human-readable backend name, for logs.
    const NAME: &'static str;

    /// Suspend the current task for `duration`.
    fn sleep(duration: Duration) -> impl Future<Output = ()> + Send;

    /// Give other tasks a chance to run.
    fn yield_now() -> impl Future<Output = ()> + Send;

    /// Race `fut` against a timer. `None` means the timer won and `fut`
    /// was dropped at its last suspension point.
    fn timeout<F>(duration: Duration, fut: F) -> impl Future<Output = Option<F::Output>> + Send
    where
        F: Future + Send;

    /// Run `fut` as an independent background task.
    fn spawn<F>(fut: F) -> Task<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static;

    /// Run a blocking closure off the scheduler.
    fn unblock<T, F>(f: F) -> impl Future<Output = io::Result<T>> + Send
    where
        F: FnOnce() -> io::Result<T> + Send + 'static,
        T: Send + 'static;

    /// Drive `fut` to completion on the calling thread.
    fn block_on<F: Future>(fut: F) -> io::Result<F::Output>;
}

// =============================================================================
// Free functions over the active backend
// =============================================================================

/// Name of the compiled-in backend.
pub fn backend_name() -> &'static str {
    ActiveBackend::NAME
}

/// Suspend the current task for `duration`.
pub async fn sleep(duration: Duration) {
    ActiveBackend::sleep(duration).await;
}

/// Let other tasks run before continuing.
pub async fn yield_now() {
    ActiveBackend::yield_now().await;
}

/// Race `fut` against a timer, reporting a lost race as [`InputError::Timeout`].
pub async fn timeout<F>(duration: Duration, fut: F) -> Result<F::Output>
where
    F: Future + Send,
{
    ActiveBackend::timeout(duration, fut)
        .await
        .ok_or(InputError::Timeout(duration))
}

/// Run `fut` in the background on the active backend.
pub fn spawn<F>(fut: F) -> Task<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    ActiveBackend::spawn(fut)
}

/// Run blocking `f` off the async threads and await its result.
pub async fn unblock<T, F>(f: F) -> io::Result<T>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    ActiveBackend::unblock(f).await
}

/// Drive `fut` to completion on the calling thread.
///
/// Entry point for synchronous callers (tests, small tools). Inside an
/// already-running backend, just `.await` instead.
pub fn block_on<F: Future>(fut: F) -> io::Result<F::Output> {
    ActiveBackend::block_on(fut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_timeout_both_ways() {
        block_on(async {
            let fast = timeout(Duration::from_millis(200), async { 7 }).await;
            assert_eq!(fast.unwrap(), 7);

            let slow = timeout(Duration::from_millis(10), sleep(Duration::from_secs(5))).await;
            assert!(matches!(slow, Err(InputError::Timeout(_))));
        })
        .unwrap();
    }

    #[test]
    fn test_spawn_and_join() {
        block_on(async {
            let counter = Arc::new(AtomicU32::new(0));
            let counter_task = Arc::clone(&counter);
            let task = spawn(async move {
                for _ in 0..3 {
                    counter_task.fetch_add(1, Ordering::SeqCst);
                    yield_now().await;
                }
                "done"
            });
            assert_eq!(task.join().await.unwrap(), "done");
            assert_eq!(counter.load(Ordering::SeqCst), 3);
        })
        .unwrap();
    }

    #[test]
    fn test_unblock() {
        let value = block_on(unblock(|| Ok(21 * 2))).unwrap().unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_backend_name() {
        assert!(!backend_name().is_empty());
    }
}
