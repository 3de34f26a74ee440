//! CLI command implementations.
//!
//! - **analyze**: analyze a project and emit the JSON report
//! - **init**: write a default `.webaudit.toml`

pub mod analyze;
pub mod init;

pub use analyze::{handle_analyze, AnalyzeConfig};
pub use init::init_config;
