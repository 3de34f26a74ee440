use super::classify::{ErrorCategory, ErrorRecord};
use crate::config::RetryConfig;
use serde::{Deserialize, Serialize};

/// What to do about a classified failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum RecoveryStrategy {
    /// Try again with exponential backoff
    Retry {
        max_attempts: u32,
        base_delay_ms: u64,
        max_delay_ms: u64,
        jitter: bool,
    },
    /// Use the last good or cached result
    Fallback { use_cached: bool },
    /// Continue with default values
    Skip { use_defaults: bool },
    Abort,
}

impl RecoveryStrategy {
    pub fn retry_from(config: &RetryConfig) -> Self {
        Self::Retry {
            max_attempts: config.max_attempts,
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
            jitter: config.jitter,
        }
    }

    /// Backoff settings carried by a `Retry` strategy.
    pub fn retry_config(&self) -> Option<RetryConfig> {
        match self {
            Self::Retry {
                max_attempts,
                base_delay_ms,
                max_delay_ms,
                jitter,
            } => Some(RetryConfig {
                max_attempts: *max_attempts,
                base_delay_ms: *base_delay_ms,
                max_delay_ms: *max_delay_ms,
                jitter: *jitter,
            }),
            _ => None,
        }
    }

    /// Whether a caller-supplied substitute value can stand in for the failed result.
    pub fn accepts_substitute(&self) -> bool {
        matches!(self, Self::Fallback { .. } | Self::Skip { .. })
    }
}

pub fn select_strategy(record: &ErrorRecord, retry: &RetryConfig) -> RecoveryStrategy {
    if record.retryable {
        RecoveryStrategy::retry_from(retry)
    } else if record.recoverable {
        RecoveryStrategy::Fallback { use_cached: true }
    } else if record.category == ErrorCategory::Validation {
        RecoveryStrategy::Skip { use_defaults: true }
    } else {
        RecoveryStrategy::Abort
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::classify::FailureInfo;

    fn strategy_for(info: FailureInfo) -> RecoveryStrategy {
        let record = ErrorRecord::from_failure(&info, None);
        select_strategy(&record, &RetryConfig::default())
    }

    #[test]
    fn test_retryable_gets_retry() {
        let strategy = strategy_for(FailureInfo::with_code("ETIMEDOUT", "timed out"));
        assert_eq!(
            strategy,
            RecoveryStrategy::Retry {
                max_attempts: 3,
                base_delay_ms: 1000,
                max_delay_ms: 30_000,
                jitter: false,
            }
        );
        assert_eq!(strategy.retry_config(), Some(RetryConfig::default()));
    }

    #[test]
    fn test_recoverable_gets_fallback() {
        let strategy = strategy_for(FailureInfo::with_code("ENOENT", "no such file"));
        assert_eq!(strategy, RecoveryStrategy::Fallback { use_cached: true });
        assert!(strategy.accepts_substitute());
    }

    #[test]
    fn test_validation_gets_skip() {
        let strategy = strategy_for(FailureInfo::new("invalid config value"));
        assert_eq!(strategy, RecoveryStrategy::Skip { use_defaults: true });
    }

    #[test]
    fn test_everything_else_aborts() {
        let strategy = strategy_for(FailureInfo::new("Unexpected token <"));
        assert_eq!(strategy, RecoveryStrategy::Abort);
        assert!(!strategy.accepts_substitute());

        let strategy = strategy_for(FailureInfo::with_code("EACCES", "permission denied"));
        assert_eq!(strategy, RecoveryStrategy::Abort);
    }
}
