//! Retry and read-strategy policy for channel access.
//!
//! The four historical variants of the channel layer each hand-rolled their
//! own retry loops (some bounded, some looping forever). They are normalized
//! here into one policy object attached to every `Channel`, so the retry
//! behavior is configured once rather than reimplemented per call site.
//! Retries are always bounded: a dead channel must surface as
//! `ChannelInvalid`, never hang a control session.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Read strategy, selectable per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Lightweight one-shot network query.
    #[default]
    Fetch,
    /// Most recent asynchronously-delivered value from the subscription,
    /// falling back to a one-shot fetch when no update has arrived yet or
    /// the last update carried invalid alarm severity.
    Cached,
}

/// Bounded retry/fallback policy for channel reads and writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Attempts before a read or write gives up.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    #[serde(with = "humantime_serde")]
    pub backoff: Duration,
    /// Whether an exhausted acknowledged write falls back to one final
    /// one-shot put before raising `ChannelInvalid`.
    pub write_fallback: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
            write_fallback: true,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
            write_fallback: true,
        }
    }

    /// Policy for tests: no waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Duration::ZERO,
            write_fallback: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_bounded() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff, Duration::from_millis(500));
        assert!(policy.write_fallback);
    }
}
