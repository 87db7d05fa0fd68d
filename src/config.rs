//! Pipeline configuration.
//!
//! Every field has a sensible default. `from_env` lets a deployment tune the
//! timing knobs without recompiling.

use std::time::Duration;

/// Tuning knobs for the event source and event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputConfig {
    /// Sleep between readiness polls while waiting for input.
    pub poll_interval: Duration,
    /// Upper bound for `read_key_async` before it reports `Unknown`.
    pub read_timeout: Duration,
    /// Quiet time after which a lone pending ESC becomes an Escape key.
    pub escape_timeout: Duration,
    /// Maximum bytes pulled from the source per read.
    pub read_chunk: usize,
    /// How long one stream iteration waits before re-checking its stop request.
    pub stream_tick: Duration,
}

impl InputConfig {
    /// Built-in defaults, ignoring the environment.
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_millis(5),
            read_timeout: Duration::from_millis(100),
            escape_timeout: Duration::from_millis(25),
            read_chunk: 256,
            stream_tick: Duration::from_millis(20),
        }
    }

    /// Defaults, overridden by `SPARK_INPUT_*_MS` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::new();
        if let Some(d) = env_millis("SPARK_INPUT_POLL_MS") {
            config.poll_interval = d;
        }
        if let Some(d) = env_millis("SPARK_INPUT_READ_TIMEOUT_MS") {
            config.read_timeout = d;
        }
        if let Some(d) = env_millis("SPARK_INPUT_ESCAPE_TIMEOUT_MS") {
            config.escape_timeout = d;
        }
        if let Some(d) = env_millis("SPARK_INPUT_STREAM_TICK_MS") {
            config.stream_tick = d;
        }
        config
    }

    /// Sleep between polls of an idle source.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Bound for bounded reads and mouse report tails.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Quiet period after which a lone ESC is the Escape key.
    pub fn with_escape_timeout(mut self, timeout: Duration) -> Self {
        self.escape_timeout = timeout;
        self
    }

    /// Bytes per source read, at least one.
    pub fn with_read_chunk(mut self, bytes: usize) -> Self {
        self.read_chunk = bytes.max(1);
        self
    }

    /// How long the stream loop waits per iteration.
    pub fn with_stream_tick(mut self, tick: Duration) -> Self {
        self.stream_tick = tick;
        self
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    let raw = std::env::var(name).ok()?;
    parse_millis(name, &raw)
}

fn parse_millis(name: &str, raw: &str) -> Option<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(_) => {
            tracing::warn!(var = name, value = raw, "ignoring unparseable duration");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = InputConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(5));
        assert_eq!(config.read_timeout, Duration::from_millis(100));
        assert_eq!(config.escape_timeout, Duration::from_millis(25));
        assert_eq!(config.read_chunk, 256);
    }

    #[test]
    fn test_builders() {
        let config = InputConfig::new()
            .with_poll_interval(Duration::from_millis(1))
            .with_read_chunk(0);
        assert_eq!(config.poll_interval, Duration::from_millis(1));
        // A zero-sized chunk would never make progress.
        assert_eq!(config.read_chunk, 1);
    }

    #[test]
    fn test_parse_millis() {
        assert_eq!(parse_millis("X", " 42 "), Some(Duration::from_millis(42)));
        assert_eq!(parse_millis("X", "fast"), None);
        assert_eq!(parse_millis("X", "-3"), None);
    }
}
