//! Hardcoded secret detection.
//!
//! Line-based, so it runs on files the parser rejected as well. Minimum value
//! lengths come from `[secrets]` in the configuration; each line yields at
//! most one finding per secret category.

use crate::config::SecretThresholds;
use crate::core::{Finding, FindingKind, Severity};
use regex::Regex;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretCategory {
    ApiKey,
    SecretKey,
    Password,
    Token,
    Secret,
    PrivateKey,
    DatabaseUrl,
}

impl fmt::Display for SecretCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ApiKey => "API Key",
            Self::SecretKey => "Secret Key",
            Self::Password => "Password",
            Self::Token => "Token",
            Self::Secret => "Secret",
            Self::PrivateKey => "Private Key",
            Self::DatabaseUrl => "Database URL",
        };
        f.write_str(label)
    }
}

struct SecretPattern {
    category: SecretCategory,
    pattern: Regex,
    /// A match of this category on the same line suppresses this one
    suppressed_by: Option<SecretCategory>,
}

/// Compiled secret patterns for one set of thresholds.
pub struct SecretScanner {
    patterns: Vec<SecretPattern>,
}

impl fmt::Debug for SecretScanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretScanner")
            .field("patterns", &self.patterns.len())
            .finish()
    }
}

/// `name = "value"` / `name: 'value'` where the name matches `name_pattern`.
fn assignment_pattern(name_pattern: &str, min_len: usize) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r#"(?i){name_pattern}\w*["']?\s*[:=]\s*["'`]([^"'`\s]{{{min_len},}})["'`]"#
    ))
}

impl SecretScanner {
    pub fn new(thresholds: &SecretThresholds) -> Result<Self, regex::Error> {
        let pattern = |category, pattern, suppressed_by| SecretPattern {
            category,
            pattern,
            suppressed_by,
        };

        let patterns = vec![
            pattern(
                SecretCategory::ApiKey,
                assignment_pattern(r"\b\w*api[_-]?key", thresholds.api_key_min_len)?,
                None,
            ),
            pattern(
                SecretCategory::ApiKey,
                Regex::new(r#"["'`]sk-[A-Za-z0-9_\-]{20,}["'`]"#)?,
                None,
            ),
            pattern(
                SecretCategory::SecretKey,
                assignment_pattern(r"\b\w*secret[_-]?key", thresholds.secret_min_len)?,
                None,
            ),
            pattern(
                SecretCategory::Password,
                assignment_pattern(r"\b\w*(?:password|passwd|pwd)", thresholds.password_min_len)?,
                None,
            ),
            pattern(
                SecretCategory::Token,
                assignment_pattern(r"\b\w*token", thresholds.token_min_len)?,
                None,
            ),
            pattern(
                SecretCategory::Secret,
                assignment_pattern(r"\b\w*secret", thresholds.secret_min_len)?,
                Some(SecretCategory::SecretKey),
            ),
            pattern(
                SecretCategory::PrivateKey,
                Regex::new(r"-----BEGIN (?:RSA |EC |DSA |OPENSSH |ENCRYPTED )?PRIVATE KEY-----")?,
                None,
            ),
            pattern(
                SecretCategory::DatabaseUrl,
                Regex::new(r#"(?i)\b(?:mongodb(?:\+srv)?|postgres(?:ql)?|mysql|redis)://[^\s"'`]+"#)?,
                None,
            ),
        ];

        Ok(Self { patterns })
    }

    /// Categories matched on one line, in pattern order, without duplicates.
    pub fn categories_on_line(&self, line: &str) -> Vec<SecretCategory> {
        let mut found: Vec<SecretCategory> = Vec::new();
        for secret in &self.patterns {
            if found.contains(&secret.category) {
                continue;
            }
            if secret
                .suppressed_by
                .is_some_and(|other| found.contains(&other))
            {
                continue;
            }
            if secret.pattern.is_match(line) {
                found.push(secret.category);
            }
        }
        found
    }

    pub fn scan(&self, source: &str, file: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (index, line) in source.lines().enumerate() {
            for category in self.categories_on_line(line) {
                findings.push(Finding::new(
                    FindingKind::HardcodedSecret,
                    Severity::Critical,
                    file,
                    index + 1,
                    format!("Hardcoded {category} detected"),
                    "Move the value to an environment variable or a secrets manager",
                ));
            }
        }
        findings
    }
}
