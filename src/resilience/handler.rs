use super::breaker::{BreakerRegistry, BreakerSnapshot, BreakerState, CircuitBreaker};
use super::classify::{ErrorCategory, ErrorRecord, Failure};
use super::strategy::{select_strategy, RecoveryStrategy};
use crate::config::ResilienceConfig;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;
use thiserror::Error;

/// How many history entries a health report carries.
const RECENT_ERROR_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum ResilienceError {
    /// The breaker for the declared category rejected the call without running it
    #[error("Circuit breaker for {category} is open; retry after {retry_after:?}")]
    CircuitOpen {
        category: ErrorCategory,
        retry_after: Duration,
    },

    #[error("{context} failed after {attempts} attempt(s): {}", .record.message)]
    Failed {
        context: String,
        record: ErrorRecord,
        strategy: RecoveryStrategy,
        attempts: u32,
    },
}

impl ResilienceError {
    /// The recovery the caller should apply.
    pub fn strategy(&self) -> RecoveryStrategy {
        match self {
            Self::CircuitOpen { .. } => RecoveryStrategy::Fallback { use_cached: true },
            Self::Failed { strategy, .. } => strategy.clone(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::CircuitOpen { category, .. } => *category,
            Self::Failed { record, .. } => record.category,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub total_errors: u64,
    pub errors_by_category: BTreeMap<ErrorCategory, u64>,
    pub breakers: Vec<BreakerSnapshot>,
    pub recent_errors: Vec<ErrorRecord>,
}

impl HealthReport {
    pub fn open_breakers(&self) -> impl Iterator<Item = ErrorCategory> + '_ {
        self.breakers
            .iter()
            .filter(|b| b.state == BreakerState::Open)
            .map(|b| b.category)
    }
}

/// Classifies failures, keeps the rolling history and drives the breakers.
#[derive(Debug)]
pub struct ErrorHandler {
    config: ResilienceConfig,
    breakers: BreakerRegistry,
    history: Mutex<VecDeque<ErrorRecord>>,
    counters: Mutex<BTreeMap<ErrorCategory, u64>>,
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new(ResilienceConfig::default())
    }
}

impl ErrorHandler {
    pub fn new(config: ResilienceConfig) -> Self {
        let breakers = BreakerRegistry::new(&config.breaker);
        Self {
            history: Mutex::new(VecDeque::with_capacity(config.history_capacity)),
            counters: Mutex::new(BTreeMap::new()),
            breakers,
            config,
        }
    }

    pub fn config(&self) -> &ResilienceConfig {
        &self.config
    }

    /// Log a failure to the history and counters without touching any breaker.
    ///
    /// Used for per-file degradations that must not change how later files are processed.
    pub fn record(&self, failure: &impl Failure, context: Option<&str>) -> ErrorRecord {
        let record = ErrorRecord::from_failure(failure, context);

        *self.counters.lock().entry(record.category).or_insert(0) += 1;

        let mut history = self.history.lock();
        if history.len() >= self.config.history_capacity {
            history.pop_front();
        }
        if self.config.history_capacity > 0 {
            history.push_back(record.clone());
        }

        record
    }

    /// Classify a failure that happened outside [`execute`](Self::execute).
    ///
    /// The failure counts against the breaker of its classified category.
    pub fn handle_error(
        &self,
        failure: &impl Failure,
        context: Option<&str>,
    ) -> (ErrorRecord, RecoveryStrategy) {
        let record = self.record(failure, context);
        self.breakers.get(record.category).record_failure();
        let strategy = select_strategy(&record, &self.config.retry);
        tracing::debug!(
            category = %record.category,
            context = context.unwrap_or(""),
            "Handled error: {}",
            record.message
        );
        (record, strategy)
    }

    /// Run `op` under the breaker of `category`, retrying transient failures.
    ///
    /// The declared category owns the breaker; the classification of each
    /// failure only decides the recovery strategy.
    pub fn execute<T, E, F>(
        &self,
        category: ErrorCategory,
        context: &str,
        op: F,
    ) -> Result<T, ResilienceError>
    where
        E: Failure,
        F: FnMut() -> Result<T, E>,
    {
        self.run(Some(self.breakers.get(category)), context, op)
    }

    /// Retry transient failures of `op` without any breaker.
    ///
    /// Failures still land in the history and counters, but never change how
    /// other calls are admitted. Used for independent per-file work.
    pub fn retry<T, E, F>(&self, context: &str, op: F) -> Result<T, ResilienceError>
    where
        E: Failure,
        F: FnMut() -> Result<T, E>,
    {
        self.run(None, context, op)
    }

    fn run<T, E, F>(
        &self,
        breaker: Option<&CircuitBreaker>,
        context: &str,
        mut op: F,
    ) -> Result<T, ResilienceError>
    where
        E: Failure,
        F: FnMut() -> Result<T, E>,
    {
        let mut attempts = 0u32;

        loop {
            if let Some(breaker) = breaker {
                if let Err(retry_after) = breaker.try_acquire() {
                    let category = breaker.category();
                    tracing::debug!(%category, context, "Rejected by open circuit breaker");
                    return Err(ResilienceError::CircuitOpen {
                        category,
                        retry_after,
                    });
                }
            }

            attempts += 1;
            let err = match op() {
                Ok(value) => {
                    if let Some(breaker) = breaker {
                        breaker.record_success();
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if let Some(breaker) = breaker {
                breaker.record_failure();
            }
            let record = self.record(&err, Some(context));
            let strategy = select_strategy(&record, &self.config.retry);

            if let Some(retry) = strategy.retry_config() {
                if attempts < retry.max_attempts {
                    let delay = retry.delay_for_attempt(attempts);
                    tracing::debug!(
                        context,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying after error: {}",
                        record.message
                    );
                    std::thread::sleep(delay);
                    continue;
                }
            }

            return Err(ResilienceError::Failed {
                context: context.to_string(),
                record,
                strategy,
                attempts,
            });
        }
    }

    /// Like [`execute`](Self::execute), but lets `fallback` supply a value when
    /// the strategy allows a substitute (fallback, skip, or an open breaker).
    pub fn execute_with_fallback<T, E, F, G>(
        &self,
        category: ErrorCategory,
        context: &str,
        op: F,
        fallback: G,
    ) -> Result<T, ResilienceError>
    where
        E: Failure,
        F: FnMut() -> Result<T, E>,
        G: FnOnce(&RecoveryStrategy) -> Option<T>,
    {
        let err = match self.execute(category, context, op) {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let strategy = err.strategy();
        if strategy.accepts_substitute() {
            if let Some(value) = fallback(&strategy) {
                tracing::warn!(context, "Using fallback after error: {}", err);
                return Ok(value);
            }
        }
        Err(err)
    }

    pub fn breaker_state(&self, category: ErrorCategory) -> BreakerState {
        self.breakers.get(category).state()
    }

    pub fn history(&self) -> Vec<ErrorRecord> {
        self.history.lock().iter().cloned().collect()
    }

    pub fn health(&self) -> HealthReport {
        let breakers = self.breakers.snapshots();
        let errors_by_category = self.counters.lock().clone();
        let total_errors = errors_by_category.values().sum();

        let history = self.history.lock();
        let mut recent_by_category: BTreeMap<ErrorCategory, usize> = BTreeMap::new();
        for record in history.iter() {
            *recent_by_category.entry(record.category).or_insert(0) += 1;
        }
        let recent_errors = history
            .iter()
            .rev()
            .take(RECENT_ERROR_LIMIT)
            .cloned()
            .collect();
        drop(history);

        let any_in = |state| breakers.iter().any(|b: &BreakerSnapshot| b.state == state);
        let status = if any_in(BreakerState::Open) {
            HealthStatus::Unhealthy
        } else if any_in(BreakerState::HalfOpen)
            || recent_by_category
                .values()
                .any(|&count| count >= self.config.degraded_error_count)
        {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        HealthReport {
            status,
            total_errors,
            errors_by_category,
            breakers,
            recent_errors,
        }
    }

    /// Clear history, counters and breaker state.
    pub fn reset(&self) {
        self.history.lock().clear();
        self.counters.lock().clear();
        self.breakers.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BreakerConfig, RetryConfig};
    use crate::resilience::classify::FailureInfo;
    use std::cell::Cell;

    fn fast_config() -> ResilienceConfig {
        ResilienceConfig {
            retry: RetryConfig {
                max_attempts: 3,
                base_delay_ms: 1,
                max_delay_ms: 2,
                jitter: false,
            },
            breaker: BreakerConfig {
                failure_threshold: 5,
                cooldown_ms: 60_000,
            },
            history_capacity: 4,
            degraded_error_count: 3,
        }
    }

    #[test]
    fn test_retries_transient_failure_then_succeeds() {
        let handler = ErrorHandler::new(fast_config());
        let calls = Cell::new(0);

        let result = handler.execute(ErrorCategory::Network, "fetch", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(FailureInfo::with_code("ETIMEDOUT", "timed out"))
            } else {
                Ok(42)
            }
        });

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 3);
        assert_eq!(handler.breaker_state(ErrorCategory::Network), BreakerState::Closed);
    }

    #[test]
    fn test_non_retryable_fails_once() {
        let handler = ErrorHandler::new(fast_config());
        let calls = Cell::new(0);

        let err = handler
            .execute(ErrorCategory::Parsing, "parse", || {
                calls.set(calls.get() + 1);
                Err::<(), _>(FailureInfo::new("SyntaxError: Unexpected token"))
            })
            .unwrap_err();

        assert_eq!(calls.get(), 1);
        assert_eq!(err.strategy(), RecoveryStrategy::Abort);
        assert!(matches!(err, ResilienceError::Failed { attempts: 1, .. }));
    }

    #[test]
    fn test_open_breaker_fails_fast() {
        let mut config = fast_config();
        config.breaker.failure_threshold = 1;
        let handler = ErrorHandler::new(config);

        let _ = handler.execute(ErrorCategory::ExternalService, "scan", || {
            Err::<(), _>(FailureInfo::new("permission denied").hinted(ErrorCategory::Filesystem))
        });
        assert_eq!(
            handler.breaker_state(ErrorCategory::ExternalService),
            BreakerState::Open
        );

        let calls = Cell::new(0);
        let err = handler
            .execute(ErrorCategory::ExternalService, "scan", || {
                calls.set(calls.get() + 1);
                Ok::<_, FailureInfo>(())
            })
            .unwrap_err();
        assert_eq!(calls.get(), 0);
        assert!(matches!(err, ResilienceError::CircuitOpen { .. }));
    }

    #[test]
    fn test_retry_leaves_breakers_alone() {
        let mut config = fast_config();
        config.breaker.failure_threshold = 1;
        let handler = ErrorHandler::new(config);

        for i in 0..3 {
            let err = handler
                .retry(&format!("file{i}.js"), || {
                    Err::<(), _>(FailureInfo::with_code("ENOENT", "no such file"))
                })
                .unwrap_err();
            assert!(matches!(err, ResilienceError::Failed { attempts: 1, .. }));
        }

        assert_eq!(handler.retry("ok.js", || Ok::<_, FailureInfo>(7)).unwrap(), 7);
        for category in ErrorCategory::ALL {
            assert_eq!(handler.breaker_state(category), BreakerState::Closed);
        }
        assert_eq!(handler.health().errors_by_category.get(&ErrorCategory::Filesystem), Some(&3));
    }

    #[test]
    fn test_fallback_substitutes_value() {
        let handler = ErrorHandler::new(fast_config());

        let value = handler
            .execute_with_fallback(
                ErrorCategory::Filesystem,
                "read",
                || Err::<String, _>(FailureInfo::with_code("ENOENT", "no such file")),
                |strategy| {
                    assert_eq!(strategy, &RecoveryStrategy::Fallback { use_cached: true });
                    Some("cached".to_string())
                },
            )
            .unwrap();

        assert_eq!(value, "cached");
    }

    #[test]
    fn test_abort_ignores_fallback() {
        let handler = ErrorHandler::new(fast_config());
        let result = handler.execute_with_fallback(
            ErrorCategory::Unknown,
            "op",
            || Err::<u8, _>(FailureInfo::new("something odd")),
            |_| Some(1),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_handle_error_uses_classified_breaker() {
        let mut config = fast_config();
        config.breaker.failure_threshold = 2;
        let handler = ErrorHandler::new(config);
        let err = FailureInfo::with_code("ENOENT", "no such file");

        handler.handle_error(&err, Some("a.js"));
        let (record, strategy) = handler.handle_error(&err, Some("b.js"));

        assert_eq!(record.category, ErrorCategory::Filesystem);
        assert_eq!(strategy, RecoveryStrategy::Fallback { use_cached: true });
        assert_eq!(handler.breaker_state(ErrorCategory::Filesystem), BreakerState::Open);
        assert_eq!(handler.health().status, HealthStatus::Unhealthy);
    }

    #[test]
    fn test_history_is_capped() {
        let handler = ErrorHandler::new(fast_config());
        for i in 0..6 {
            handler.handle_error(&FailureInfo::new(format!("odd {i}")), None);
        }
        let history = handler.history();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].message, "odd 2");
        assert_eq!(handler.health().total_errors, 6);
    }

    #[test]
    fn test_health_degrades_on_error_volume() {
        let handler = ErrorHandler::new(fast_config());
        assert_eq!(handler.health().status, HealthStatus::Healthy);

        for _ in 0..3 {
            handler.handle_error(&FailureInfo::new("invalid value"), None);
        }

        let health = handler.health();
        assert_eq!(health.status, HealthStatus::Degraded);
        assert_eq!(health.errors_by_category.get(&ErrorCategory::Validation), Some(&3));

        handler.reset();
        assert_eq!(handler.health().status, HealthStatus::Healthy);
        assert!(handler.history().is_empty());
    }
}
