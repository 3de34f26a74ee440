//! Error classification, retry with backoff and per-category circuit breakers.
//!
//! The engine routes every fallible per-file step through an [`ErrorHandler`].
//! A process-wide handler is available through [`global`]; tests and embedders
//! that need isolation construct their own.

pub mod breaker;
pub mod classify;
pub mod handler;
pub mod strategy;

use crate::config::ResilienceConfig;
use once_cell::sync::OnceCell;
use std::sync::Arc;

pub use breaker::{BreakerRegistry, BreakerSnapshot, BreakerState, CircuitBreaker};
pub use classify::{
    classify, io_error_code, is_recoverable, is_retryable, ErrorCategory, ErrorRecord, Failure,
    FailureInfo,
};
pub use handler::{ErrorHandler, HealthReport, HealthStatus, ResilienceError};
pub use strategy::{select_strategy, RecoveryStrategy};

static GLOBAL_HANDLER: OnceCell<Arc<ErrorHandler>> = OnceCell::new();

/// Install the process-wide handler. The first call wins; later calls return
/// the already installed handler and ignore `config`.
pub fn init_global(config: &ResilienceConfig) -> Arc<ErrorHandler> {
    GLOBAL_HANDLER
        .get_or_init(|| Arc::new(ErrorHandler::new(config.clone())))
        .clone()
}

/// The process-wide handler, created with default settings on first use.
pub fn global() -> Arc<ErrorHandler> {
    init_global(&ResilienceConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_is_shared() {
        let a = global();
        let b = global();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
