//! Resource limits and retry behavior for refinement runs.
//!
//! Bounds the two external calls a pass can make and the amount of
//! accumulated text handed back to the generator as context.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Limits applied to every pass of a refinement run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineLimits {
    /// Generation call timeout in seconds (default: 45)
    #[serde(default = "default_generation_timeout")]
    pub generation_timeout_seconds: u64,

    /// Page fetch timeout in seconds (default: 10)
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_seconds: u64,

    /// Maximum bytes of accumulated text supplied as generation context.
    /// Beyond this, the oldest content is condensed rather than dropped.
    /// (default: 48KB, roughly 12k tokens)
    #[serde(default = "default_max_context_bytes")]
    pub max_context_bytes: usize,

    /// Maximum characters of a fetched excerpt handed to the generator
    /// (default: 10000)
    #[serde(default = "default_max_excerpt_chars")]
    pub max_excerpt_chars: usize,

    /// Retry policy for transient generation failures
    #[serde(default)]
    pub retry_policy: RetryPolicy,
}

fn default_generation_timeout() -> u64 {
    45
}
fn default_fetch_timeout() -> u64 {
    10
}
fn default_max_context_bytes() -> usize {
    48 * 1024
}
fn default_max_excerpt_chars() -> usize {
    10_000
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            generation_timeout_seconds: default_generation_timeout(),
            fetch_timeout_seconds: default_fetch_timeout(),
            max_context_bytes: default_max_context_bytes(),
            max_excerpt_chars: default_max_excerpt_chars(),
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl EngineLimits {
    /// Generation timeout as a Duration
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_seconds)
    }

    /// Fetch timeout as a Duration
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }
}

/// Retry policy for transient generation failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts per pass, including the first try
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay between retries in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Maximum delay between retries in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Backoff multiplier (delay *= multiplier after each retry)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_initial_delay() -> u64 {
    1000
}
fn default_max_delay() -> u64 {
    30000
}
fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryPolicy {
    /// Calculate delay for a specific attempt (1-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::from_millis(self.initial_delay_ms);
        }

        let delay =
            self.initial_delay_ms as f64 * self.backoff_multiplier.powi((attempt - 1) as i32);

        let capped = delay.min(self.max_delay_ms as f64) as u64;
        Duration::from_millis(capped)
    }

    /// Check if another attempt is allowed after `attempt` failures
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}
