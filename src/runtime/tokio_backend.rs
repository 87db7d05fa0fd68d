//! tokio backend.
//!
//! `block_on` builds a current-thread runtime, so a pipeline driven from it
//! is single-threaded and cooperative. Callers already inside a tokio
//! runtime use the other capabilities directly.

use std::future::Future;
use std::io;
use std::time::Duration;

use super::Backend;
use crate::error::{InputError, Result};

pub struct TokioBackend;

impl Backend for TokioBackend {
    const NAME: &'static str = "tokio";

    fn sleep(duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn yield_now() -> impl Future<Output = ()> + Send {
        tokio::task::yield_now()
    }

    fn timeout<F>(duration: Duration, fut: F) -> impl Future<Output = Option<F::Output>> + Send
    where
        F: Future + Send,
    {
        async move { tokio::time::timeout(duration, fut).await.ok() }
    }

    fn spawn<F>(fut: F) -> Task<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        Task { handle: tokio::spawn(fut) }
    }

    fn unblock<T, F>(f: F) -> impl Future<Output = io::Result<T>> + Send
    where
        F: FnOnce() -> io::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        async move {
            match tokio::task::spawn_blocking(f).await {
                Ok(result) => result,
                Err(e) => Err(io::Error::other(e)),
            }
        }
    }

    fn block_on<F: Future>(fut: F) -> io::Result<F::Output> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(runtime.block_on(fut))
    }
}

/// Handle to a spawned background task.
#[derive(Debug)]
pub struct Task<T> {
    handle: tokio::task::JoinHandle<T>,
}

impl<T> Task<T> {
    /// Wait for the task to finish and take its output.
    pub async fn join(self) -> Result<T> {
        self.handle
            .await
            .map_err(|e| InputError::Runtime(e.to_string()))
    }

    /// Whether the task has completed.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
