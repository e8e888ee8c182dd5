//! Backoff configuration for the PERSIST step of the worker state machine.
//! The retry loop itself lives in `worker::processor::persist_with_retry`,
//! which needs a fresh transaction per attempt and must short-circuit a
//! unique-violation as a duplicate without consuming an attempt — a shape
//! a generic `Fn() -> Future` retry helper can't express cleanly, so it is
//! hand-rolled there rather than wrapped around this config.

use std::time::Duration;

/// Configuration for retrying a fallible async operation.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Backoff before the first retry; doubles on each subsequent retry.
    pub initial_backoff: Duration,
    /// Cap on backoff growth.
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_backoff_window() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.initial_backoff, Duration::from_secs(2));
        assert_eq!(config.max_backoff, Duration::from_secs(10));
    }
}
