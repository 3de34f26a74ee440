use super::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingCategory {
    Security,
    Performance,
}

/// Closed set of anti-patterns the scanners report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingKind {
    CodeInjection,
    SqlInjection,
    Xss,
    UnvalidatedEnvRead,
    HardcodedSecret,
    WeakHash,
    InsecureToken,
    NestedIteration,
    DomQueryInLoop,
    DeepClone,
    LargeArrayLiteral,
}

impl FindingKind {
    pub fn category(self) -> FindingCategory {
        match self {
            Self::NestedIteration | Self::DomQueryInLoop | Self::DeepClone | Self::LargeArrayLiteral => {
                FindingCategory::Performance
            }
            _ => FindingCategory::Security,
        }
    }

    pub fn is_injection(self) -> bool {
        matches!(self, Self::CodeInjection | Self::SqlInjection | Self::Xss)
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CodeInjection => "code injection",
            Self::SqlInjection => "SQL injection",
            Self::Xss => "cross-site scripting",
            Self::UnvalidatedEnvRead => "unvalidated environment read",
            Self::HardcodedSecret => "hardcoded secret",
            Self::WeakHash => "weak hash",
            Self::InsecureToken => "insecure token",
            Self::NestedIteration => "nested iteration",
            Self::DomQueryInLoop => "DOM query in loop",
            Self::DeepClone => "inefficient deep clone",
            Self::LargeArrayLiteral => "large array literal",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    /// Project-relative path
    pub file: String,
    pub line: usize,
    pub description: String,
    pub mitigation: String,
}

impl Finding {
    pub fn new(
        kind: FindingKind,
        severity: Severity,
        file: &str,
        line: usize,
        description: impl Into<String>,
        mitigation: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            file: file.to_string(),
            line,
            description: description.into(),
            mitigation: mitigation.into(),
        }
    }

    /// Stable ordering key for reports.
    pub fn sort_key(&self) -> (&str, usize, FindingKind, &str) {
        (&self.file, self.line, self.kind, &self.description)
    }
}
