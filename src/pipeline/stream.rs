//! Background event stream.
//!
//! Runs an [`EventSource`] in a spawned task and hands every event to a
//! handler. Stopping is cooperative: the loop waits at most one
//! `stream_tick` for an event, then re-checks its `running` flag.
//!
//! ```text
//!          start_async                 stop_async / handler → false
//!   Idle ───────────────▶ Running ─────────────────────────────────▶ Idle
//!     ▲                                                               │
//!     └─────────── source + handler handed back by the task ──────────┘
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{InputError, Result};
use crate::input::Event;
use crate::runtime::{self, Task};

use super::source::EventSource;

/// Event callback. Return `false` to stop the stream.
pub type EventHandler = Box<dyn FnMut(Event) -> bool + Send>;

/// What the loop owns while it runs and returns when it exits.
struct Parts {
    source: EventSource,
    handler: Option<EventHandler>,
}

/// Cloneable stop request for a running stream.
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    /// Ask the loop to exit. Does not wait for it.
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

pub struct EventStream {
    running: Arc<AtomicBool>,
    parts: Option<Parts>,
    task: Option<Task<Parts>>,
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("running", &self.is_running())
            .field("has_task", &self.task.is_some())
            .finish()
    }
}

impl EventStream {
    /// A stream over `source`. With no handler, events are discarded.
    pub fn new(source: EventSource, handler: Option<EventHandler>) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            parts: Some(Parts { source, handler }),
            task: None,
        }
    }

    /// A stream delivering events to `handler`; returning false stops it.
    pub fn with_handler<F>(source: EventSource, handler: F) -> Self
    where
        F: FnMut(Event) -> bool + Send + 'static,
    {
        Self::new(source, Some(Box::new(handler)))
    }

    /// Whether the background loop is active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// A handle that can stop the loop from elsewhere.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: Arc::clone(&self.running),
        }
    }

    /// Spawn the loop. No-op while running.
    pub async fn start_async(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        // A loop stopped by its handler leaves a finished task behind.
        self.reclaim().await?;
        let parts = self
            .parts
            .take()
            .ok_or_else(|| InputError::Runtime("event stream lost its source".into()))?;

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        self.task = Some(runtime::spawn(run_loop(parts, running)));
        tracing::debug!(backend = runtime::backend_name(), "event stream started");
        Ok(())
    }

    /// Request a stop and wait for the loop to exit. No-op when stopped.
    pub async fn stop_async(&mut self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        if self.task.is_some() {
            self.reclaim().await?;
            tracing::debug!("event stream stopped");
        }
        Ok(())
    }

    /// Join the task, if any, and take back the source and handler.
    async fn reclaim(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            self.parts = Some(task.join().await?);
        }
        Ok(())
    }

    /// The source, while the stream is idle.
    pub fn source_mut(&mut self) -> Option<&mut EventSource> {
        self.parts.as_mut().map(|parts| &mut parts.source)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

async fn run_loop(mut parts: Parts, running: Arc<AtomicBool>) -> Parts {
    let tick = parts.source.config().stream_tick;
    let mut stalled = false;

    while running.load(Ordering::SeqCst) {
        match runtime::timeout(tick, parts.source.wait_for_multiple_events_async()).await {
            Ok(Ok(event)) => {
                stalled = false;
                let keep_going = match parts.handler.as_mut() {
                    Some(handler) => handler(event),
                    None => true,
                };
                if !keep_going {
                    running.store(false, Ordering::SeqCst);
                    tracing::debug!("event stream stopped by handler");
                    break;
                }
            }
            // Tick elapsed with nothing to deliver.
            Err(InputError::Timeout(_)) => {}
            Ok(Err(e)) | Err(e) => {
                if e.is_fatal() {
                    if !stalled {
                        tracing::warn!("event stream stalled: {}", e);
                        stalled = true;
                    }
                } else {
                    tracing::warn!("event stream read failed: {}", e);
                }
                runtime::sleep(tick).await;
            }
        }
        runtime::yield_now().await;
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InputConfig;
    use crate::io::{InputReader, PipeFeed, pipe};
    use std::sync::Mutex;
    use std::time::Duration;

    fn source() -> (PipeFeed, EventSource) {
        let (feed, pipe_source) = pipe();
        let config = InputConfig::new()
            .with_poll_interval(Duration::from_millis(1))
            .with_stream_tick(Duration::from_millis(5));
        let reader = InputReader::with_options(pipe_source, 64, config.poll_interval);
        (feed, EventSource::from_reader(reader).with_config(config))
    }

    #[test]
    fn test_stop_without_start() {
        let (_feed, source) = source();
        let mut stream = EventStream::new(source, None);
        runtime::block_on(async {
            stream.stop_async().await.unwrap();
            stream.stop_async().await.unwrap();
        })
        .unwrap();
        assert!(!stream.is_running());
    }

    #[test]
    fn test_double_start_is_noop() {
        let (_feed, source) = source();
        let mut stream = EventStream::new(source, None);
        runtime::block_on(async {
            stream.start_async().await.unwrap();
            stream.start_async().await.unwrap();
            assert!(stream.is_running());
            stream.stop_async().await.unwrap();
        })
        .unwrap();
        assert!(!stream.is_running());
        assert!(stream.source_mut().is_some());
    }

    #[test]
    fn test_stop_handle() {
        let (_feed, source) = source();
        let mut stream = EventStream::new(source, None);
        let handle = stream.stop_handle();
        runtime::block_on(async {
            stream.start_async().await.unwrap();
            handle.request_stop();
            stream.stop_async().await.unwrap();
        })
        .unwrap();
        assert!(!stream.is_running());
    }

    #[test]
    fn test_closed_source_keeps_honouring_stop() {
        let (feed, source) = source();
        feed.close();
        let seen = Arc::new(Mutex::new(0usize));
        let seen_handler = Arc::clone(&seen);
        let mut stream = EventStream::with_handler(source, move |_| {
            *seen_handler.lock().unwrap() += 1;
            true
        });
        runtime::block_on(async {
            stream.start_async().await.unwrap();
            runtime::sleep(Duration::from_millis(20)).await;
            assert!(stream.is_running());
            stream.stop_async().await.unwrap();
        })
        .unwrap();
        assert_eq!(*seen.lock().unwrap(), 0);
        assert!(!stream.is_running());
    }
}
