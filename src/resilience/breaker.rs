//! Per-category circuit breakers.
//!
//! Each breaker owns its state behind its own `parking_lot::Mutex`, so a burst
//! of filesystem failures never contends with parser bookkeeping. The `_at`
//! variants take the current instant explicitly for deterministic tests.

use super::classify::ErrorCategory;
use crate::config::BreakerConfig;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BreakerState {
    /// Calls pass through
    Closed,
    /// Calls fail fast until the cooldown elapses
    Open,
    /// A single probe call is deciding whether to close again
    HalfOpen,
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half-open",
        };
        f.write_str(label)
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    /// Start of the current half-open probe; a probe older than the cooldown is abandoned
    probe_started: Option<Instant>,
}

impl BreakerInner {
    fn closed() -> Self {
        Self {
            state: BreakerState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            probe_started: None,
        }
    }
}

/// Point-in-time view of one breaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    pub category: ErrorCategory,
    pub state: BreakerState,
    pub consecutive_failures: u32,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    category: ErrorCategory,
    config: BreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(category: ErrorCategory, config: BreakerConfig) -> Self {
        Self {
            category,
            config,
            inner: Mutex::new(BreakerInner::closed()),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    pub fn state(&self) -> BreakerState {
        self.inner.lock().state
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.inner.lock();
        BreakerSnapshot {
            category: self.category,
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
        }
    }

    /// Ask permission to run a call. `Err` carries how long to wait.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        self.try_acquire_at(Instant::now())
    }

    pub fn try_acquire_at(&self, now: Instant) -> Result<(), Duration> {
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerState::Closed => Ok(()),
            BreakerState::HalfOpen => {
                let cooldown = self.config.cooldown();
                if let Some(started) = inner.probe_started {
                    let elapsed = now.saturating_duration_since(started);
                    if elapsed < cooldown {
                        return Err(cooldown - elapsed);
                    }
                    tracing::warn!(category = %self.category, "Abandoning half-open probe that never reported back");
                }
                inner.probe_started = Some(now);
                Ok(())
            }
            BreakerState::Open => {
                let cooldown = self.config.cooldown();
                let elapsed = inner
                    .opened_at
                    .map(|opened| now.saturating_duration_since(opened))
                    .unwrap_or(cooldown);
                if elapsed < cooldown {
                    return Err(cooldown - elapsed);
                }
                inner.state = BreakerState::HalfOpen;
                inner.consecutive_failures = 0;
                inner.probe_started = Some(now);
                tracing::info!(category = %self.category, "Circuit breaker moved to half-open state");
                Ok(())
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerState::Closed => inner.consecutive_failures = 0,
            BreakerState::HalfOpen => {
                *inner = BreakerInner::closed();
                tracing::info!(category = %self.category, "Circuit breaker closed after successful probe");
            }
            BreakerState::Open => {
                tracing::warn!(category = %self.category, "Received success while circuit breaker is open");
            }
        }
    }

    pub fn record_failure(&self) {
        self.record_failure_at(Instant::now())
    }

    pub fn record_failure_at(&self, now: Instant) {
        let mut inner = self.inner.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        match inner.state {
            BreakerState::Closed => {
                if inner.consecutive_failures >= self.config.failure_threshold {
                    inner.state = BreakerState::Open;
                    inner.opened_at = Some(now);
                    tracing::warn!(
                        category = %self.category,
                        failures = inner.consecutive_failures,
                        threshold = self.config.failure_threshold,
                        "Circuit breaker opened due to failures"
                    );
                }
            }
            BreakerState::HalfOpen => {
                inner.state = BreakerState::Open;
                inner.opened_at = Some(now);
                inner.probe_started = None;
                tracing::warn!(category = %self.category, "Circuit breaker reopened after failed probe");
            }
            BreakerState::Open => {}
        }
    }

    pub fn reset(&self) {
        *self.inner.lock() = BreakerInner::closed();
    }
}

/// One breaker per error category.
#[derive(Debug)]
pub struct BreakerRegistry {
    breakers: [CircuitBreaker; 6],
}

impl BreakerRegistry {
    pub fn new(config: &BreakerConfig) -> Self {
        Self {
            breakers: ErrorCategory::ALL.map(|category| CircuitBreaker::new(category, config.clone())),
        }
    }

    pub fn get(&self, category: ErrorCategory) -> &CircuitBreaker {
        &self.breakers[category as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &CircuitBreaker> {
        self.breakers.iter()
    }

    pub fn snapshots(&self) -> Vec<BreakerSnapshot> {
        self.iter().map(CircuitBreaker::snapshot).collect()
    }

    pub fn reset(&self) {
        self.breakers.iter().for_each(CircuitBreaker::reset);
    }
}
