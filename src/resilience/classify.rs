//! Error categorization heuristics.
//!
//! Errors are sorted into a small set of categories by their OS-style code
//! first and by message keywords second. The category plus a couple of
//! code-level checks decide whether an error is recoverable and whether a
//! plain retry is worth attempting.

use crate::errors::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    Network,
    Filesystem,
    Parsing,
    ExternalService,
    Validation,
    Unknown,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 6] = [
        ErrorCategory::Network,
        ErrorCategory::Filesystem,
        ErrorCategory::Parsing,
        ErrorCategory::ExternalService,
        ErrorCategory::Validation,
        ErrorCategory::Unknown,
    ];
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Network => "network",
            Self::Filesystem => "filesystem",
            Self::Parsing => "parsing",
            Self::ExternalService => "external-service",
            Self::Validation => "validation",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// The parts of an error the classifier looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureInfo {
    pub code: Option<String>,
    pub message: String,
    /// Set when the producer already knows the category
    pub category_hint: Option<ErrorCategory>,
}

impl FailureInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            category_hint: None,
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
            category_hint: None,
        }
    }

    pub fn hinted(mut self, category: ErrorCategory) -> Self {
        self.category_hint = Some(category);
        self
    }
}

/// Anything the resilience layer can classify.
pub trait Failure {
    fn failure_info(&self) -> FailureInfo;
}

impl Failure for FailureInfo {
    fn failure_info(&self) -> FailureInfo {
        self.clone()
    }
}

impl Failure for io::Error {
    fn failure_info(&self) -> FailureInfo {
        FailureInfo {
            code: io_error_code(self).map(str::to_string),
            message: self.to_string(),
            category_hint: None,
        }
    }
}

impl Failure for EngineError {
    fn failure_info(&self) -> FailureInfo {
        let hint = match self {
            EngineError::Parse { .. } => Some(ErrorCategory::Parsing),
            EngineError::ExternalService { .. } => Some(ErrorCategory::ExternalService),
            EngineError::Validation(_) => Some(ErrorCategory::Validation),
            EngineError::Io { .. } | EngineError::EmptyInput | EngineError::Unknown(_) => None,
        };
        FailureInfo {
            code: self.code().map(str::to_string),
            message: self.to_string(),
            category_hint: hint,
        }
    }
}

impl Failure for anyhow::Error {
    fn failure_info(&self) -> FailureInfo {
        if let Some(io_err) = self.downcast_ref::<io::Error>() {
            return io_err.failure_info();
        }
        if let Some(engine_err) = self.downcast_ref::<EngineError>() {
            return engine_err.failure_info();
        }
        FailureInfo::new(format!("{self:#}"))
    }
}

/// Map an `io::Error` onto the POSIX-style code the heuristics use.
pub fn io_error_code(err: &io::Error) -> Option<&'static str> {
    use io::ErrorKind::*;
    let code = match err.kind() {
        NotFound => "ENOENT",
        PermissionDenied => "EACCES",
        ConnectionRefused => "ECONNREFUSED",
        ConnectionReset => "ECONNRESET",
        ConnectionAborted => "ECONNABORTED",
        TimedOut => "ETIMEDOUT",
        AlreadyExists => "EEXIST",
        WouldBlock => "EAGAIN",
        HostUnreachable => "EHOSTUNREACH",
        NetworkUnreachable => "ENETUNREACH",
        BrokenPipe => "EPIPE",
        ReadOnlyFilesystem => "EROFS",
        StorageFull => "ENOSPC",
        ResourceBusy => "EBUSY",
        IsADirectory => "EISDIR",
        NotADirectory => "ENOTDIR",
        _ => return None,
    };
    Some(code)
}

const NETWORK_CODES: &[&str] = &[
    "ENOTFOUND",
    "EAI_AGAIN",
    "ECONNREFUSED",
    "ECONNRESET",
    "ECONNABORTED",
    "ETIMEDOUT",
    "ESOCKETTIMEDOUT",
    "EHOSTUNREACH",
    "ENETUNREACH",
    "EPIPE",
];

const FILESYSTEM_CODES: &[&str] = &[
    "ENOENT", "EACCES", "EPERM", "EROFS", "EDQUOT", "ENOSPC", "EISDIR", "ENOTDIR", "EMFILE",
    "EEXIST", "EBUSY", "EAGAIN",
];

const NAME_RESOLUTION_CODES: &[&str] = &["ENOTFOUND", "EAI_AGAIN"];
const FATAL_FILESYSTEM_CODES: &[&str] = &["EACCES", "EPERM", "EROFS", "EDQUOT"];
const TIMEOUT_CODES: &[&str] = &["ETIMEDOUT", "ESOCKETTIMEDOUT"];
const LOCK_CONTENTION_CODES: &[&str] = &["EBUSY", "EAGAIN"];

fn message_has(message: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| message.contains(needle))
}

pub fn classify(info: &FailureInfo) -> ErrorCategory {
    if let Some(hint) = info.category_hint {
        return hint;
    }

    if let Some(code) = info.code.as_deref() {
        if NETWORK_CODES.contains(&code) {
            return ErrorCategory::Network;
        }
        if FILESYSTEM_CODES.contains(&code) {
            return ErrorCategory::Filesystem;
        }
    }

    let message = info.message.to_lowercase();
    if message_has(&message, &["syntaxerror", "syntax error", "unexpected token", "unterminated", "parse error", "failed to parse"]) {
        ErrorCategory::Parsing
    } else if message_has(&message, &["service", "rate limit", "api error", "status 5", "bad gateway", "503", "502"]) {
        ErrorCategory::ExternalService
    } else if message_has(&message, &["validation", "invalid", "schema", "malformed"]) {
        ErrorCategory::Validation
    } else if message_has(&message, &["network", "socket", "connection", "dns", "getaddrinfo", "lookup address", "timed out", "timeout"]) {
        ErrorCategory::Network
    } else if message_has(&message, &["no such file", "permission denied", "read-only file system", "directory", "file"]) {
        ErrorCategory::Filesystem
    } else {
        ErrorCategory::Unknown
    }
}

fn is_name_resolution_failure(info: &FailureInfo, message: &str) -> bool {
    info.code
        .as_deref()
        .is_some_and(|code| NAME_RESOLUTION_CODES.contains(&code))
        || message_has(message, &["getaddrinfo", "name resolution", "lookup address", "dns"])
}

pub fn is_recoverable(category: ErrorCategory, info: &FailureInfo) -> bool {
    let message = info.message.to_lowercase();
    match category {
        ErrorCategory::Network => !is_name_resolution_failure(info, &message),
        ErrorCategory::Filesystem => {
            let fatal_code = info
                .code
                .as_deref()
                .is_some_and(|code| FATAL_FILESYSTEM_CODES.contains(&code));
            !fatal_code && !message_has(&message, &["permission denied", "read-only", "quota"])
        }
        ErrorCategory::ExternalService => true,
        ErrorCategory::Parsing | ErrorCategory::Validation | ErrorCategory::Unknown => false,
    }
}

pub fn is_retryable(category: ErrorCategory, info: &FailureInfo) -> bool {
    let message = info.message.to_lowercase();
    let code = info.code.as_deref();
    match category {
        ErrorCategory::Network => {
            if is_name_resolution_failure(info, &message) {
                return false;
            }
            let transient_code = code.is_some_and(|c| {
                TIMEOUT_CODES.contains(&c) || c == "ECONNREFUSED" || c == "ECONNRESET"
            });
            transient_code
                || message_has(&message, &["timeout", "timed out", "connection refused", "connection reset"])
        }
        ErrorCategory::Filesystem => code.is_some_and(|c| LOCK_CONTENTION_CODES.contains(&c)),
        ErrorCategory::ExternalService => true,
        ErrorCategory::Parsing | ErrorCategory::Validation | ErrorCategory::Unknown => false,
    }
}

/// A classified failure as stored in the rolling history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub category: ErrorCategory,
    pub code: Option<String>,
    pub message: String,
    pub context: Option<String>,
    pub recoverable: bool,
    pub retryable: bool,
    pub timestamp: DateTime<Utc>,
}

impl ErrorRecord {
    pub fn from_failure(failure: &impl Failure, context: Option<&str>) -> Self {
        let info = failure.failure_info();
        let category = classify(&info);
        Self {
            category,
            recoverable: is_recoverable(category, &info),
            retryable: is_retryable(category, &info),
            code: info.code,
            message: info.message,
            context: context.map(str::to_string),
            timestamp: Utc::now(),
        }
    }
}
