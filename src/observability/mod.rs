//! Logging setup and crash-report context.
//!
//! The library only emits `tracing` events; the binary decides where they go
//! by calling [`init_logging`] once at startup.

pub mod context;
pub mod panic_hook;

pub use context::{
    get_current_context, get_progress, increment_processed, set_current_file, set_phase,
    set_progress, AnalysisContext, AnalysisPhase, ContextGuard,
};
pub use panic_hook::install_panic_hook;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV_VAR: &str = "WEBAUDIT_LOG";

/// Default filter for a `-v` count: 0 → warn, 1 → info, 2+ → debug.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Install the stderr subscriber. `WEBAUDIT_LOG` overrides the verbosity flag.
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    // A second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}
