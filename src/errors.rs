//! Error types for the analysis engine.
//!
//! Only [`EngineError::EmptyInput`] is fatal to a run. Every other variant
//! describes a per-file or per-call failure that the pipeline absorbs:
//!
//! - `Parse`: the file degrades to regex-only extraction
//! - `Io`: the file is recorded as skipped
//! - `ExternalService`: routed through the resilience layer
//! - `Validation`: reported, and a documented default is substituted

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Source text could not be turned into a usable syntax tree
    #[error("Parse error in {path}: {message}")]
    Parse {
        path: PathBuf,
        message: String,
        line: Option<usize>,
    },

    /// File or network I/O failure
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Optional third-party analysis service failed
    #[error("External service '{service}' failed: {message}")]
    ExternalService { service: String, message: String },

    /// Bad configuration or malformed input data
    #[error("Validation error: {0}")]
    Validation(String),

    /// The input file set was empty
    #[error("No source files to analyze")]
    EmptyInput,

    #[error("{0}")]
    Unknown(String),
}

impl EngineError {
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
            line: None,
        }
    }

    pub fn parse_at(path: impl Into<PathBuf>, message: impl Into<String>, line: usize) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
            line: Some(line),
        }
    }

    pub fn external(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    /// OS-style error code when one is known (`ENOENT`, `ETIMEDOUT`, ...).
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::Io { source, .. } => crate::resilience::io_error_code(source),
            _ => None,
        }
    }

    /// Whether the whole run must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::EmptyInput)
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
