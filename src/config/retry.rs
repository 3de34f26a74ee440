//! Retry and circuit-breaker configuration for resilient operations.
//!
//! Retries cover transient failures such as:
//!
//! - Timeouts and refused connections when calling external services
//! - File locks from concurrent access
//! - Rate-limited or temporarily unavailable analysis services
//!
//! # Configuration Example
//!
//! ```toml
//! [resilience.retry]
//! max_attempts = 3
//! base_delay_ms = 1000
//! max_delay_ms = 30000
//! jitter = false
//!
//! [resilience.breaker]
//! failure_threshold = 5
//! cooldown_ms = 60000
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Exponential backoff settings.
///
/// The delay before retry `n` (1-indexed) is `base * 2^(n-1)`, capped at
/// `max_delay_ms`. With jitter enabled, a random extra of up to the same
/// delay is added, so the window can at most double.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first one (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds (default: 1000)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound for a single backoff delay in milliseconds (default: 30000)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Add random jitter on top of the exponential delay (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Delay before the given retry attempt, without jitter.
    pub fn base_delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let delay_ms = self
            .base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }

    /// Delay before the given retry attempt, with jitter applied when enabled.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_delay_for_attempt(attempt);
        if !self.jitter || base.is_zero() {
            return base;
        }
        let extra_ms = rand::rng().random_range(0..=base.as_millis() as u64);
        base + Duration::from_millis(extra_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("resilience.retry.max_attempts must be at least 1".to_string());
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(format!(
                "resilience.retry.base_delay_ms ({}) exceeds max_delay_ms ({})",
                self.base_delay_ms, self.max_delay_ms
            ));
        }
        Ok(())
    }
}

/// Per-category circuit breaker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerConfig {
    /// Consecutive failures that open the breaker (default: 5)
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Time an open breaker waits before letting a probe through (default: 60000)
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            cooldown_ms: default_cooldown_ms(),
        }
    }
}

impl BreakerConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.failure_threshold == 0 {
            return Err("resilience.breaker.failure_threshold must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Resilience layer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResilienceConfig {
    /// Rolling error history size (default: 100)
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Errors in one category at which health degrades (default: 10)
    #[serde(default = "default_degraded_error_count")]
    pub degraded_error_count: usize,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub breaker: BreakerConfig,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            degraded_error_count: default_degraded_error_count(),
            retry: RetryConfig::default(),
            breaker: BreakerConfig::default(),
        }
    }
}

impl ResilienceConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.retry.validate()?;
        self.breaker.validate()?;
        if self.history_capacity == 0 {
            return Err("resilience.history_capacity must be at least 1".to_string());
        }
        Ok(())
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_cooldown_ms() -> u64 {
    60_000
}

fn default_history_capacity() -> usize {
    100
}

fn default_degraded_error_count() -> usize {
    10
}
