//! smol backend.

use std::future::Future;
use std::io;
use std::time::Duration;

use super::Backend;
use crate::error::Result;

pub struct SmolBackend;

impl Backend for SmolBackend {
    const NAME: &'static str = "smol";

    fn sleep(duration: Duration) -> impl Future<Output = ()> + Send {
        async move {
            smol::Timer::after(duration).await;
        }
    }

    fn yield_now() -> impl Future<Output = ()> + Send {
        smol::future::yield_now()
    }

    fn timeout<F>(duration: Duration, fut: F) -> impl Future<Output = Option<F::Output>> + Send
    where
        F: Future + Send,
    {
        smol::future::or(async move { Some(fut.await) }, async move {
            smol::Timer::after(duration).await;
            None
        })
    }

    fn spawn<F>(fut: F) -> Task<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        Task { task: smol::spawn(fut) }
    }

    fn unblock<T, F>(f: F) -> impl Future<Output = io::Result<T>> + Send
    where
        F: FnOnce() -> io::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        smol::unblock(f)
    }

    fn block_on<F: Future>(fut: F) -> io::Result<F::Output> {
        Ok(smol::block_on(fut))
    }
}

/// Handle to a spawned background task.
///
/// Dropping a smol task cancels it; `join` is the only way to let it finish.
#[derive(Debug)]
pub struct Task<T> {
    task: smol::Task<T>,
}

impl<T> Task<T> {
    /// Wait for the task to finish and take its output.
    pub async fn join(self) -> Result<T> {
        Ok(self.task.await)
    }

    /// Whether the task has completed.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
