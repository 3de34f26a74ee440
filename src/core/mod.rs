//! Core data model shared by the extractor, scanners and aggregator.

pub mod findings;
pub mod types;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use findings::{Finding, FindingCategory, FindingKind};
pub use types::{
    ClassEntity, ComponentEntity, ComponentShape, ExportEntry, ExportKind, ExtractionMode,
    FileEntities, FunctionEntity, FunctionKind, HookCall, ImportEdge, RouteEntry, RouteOrigin,
};

/// Grammar flavour of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileVariant {
    /// `.js`, `.mjs`, `.cjs`
    Plain,
    /// `.jsx`
    PlainWithMarkup,
    /// `.ts`, `.mts`, `.cts`
    Typed,
    /// `.tsx`
    TypedWithMarkup,
}

impl FileVariant {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "js" | "mjs" | "cjs" => Some(Self::Plain),
            "jsx" => Some(Self::PlainWithMarkup),
            "ts" | "mts" | "cts" => Some(Self::Typed),
            "tsx" => Some(Self::TypedWithMarkup),
            _ => None,
        }
    }

    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Finding severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        write!(f, "{label}")
    }
}

/// 1-indexed line span of a syntax node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start_line: usize,
    pub end_line: usize,
}

impl SourceSpan {
    pub fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line: end_line.max(start_line),
        }
    }

    pub fn from_node(node: &tree_sitter::Node) -> Self {
        Self::new(node.start_position().row + 1, node.end_position().row + 1)
    }

    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_variant_from_path() {
        assert_eq!(
            FileVariant::from_path(Path::new("src/app.js")),
            Some(FileVariant::Plain)
        );
        assert_eq!(
            FileVariant::from_path(Path::new("src/App.jsx")),
            Some(FileVariant::PlainWithMarkup)
        );
        assert_eq!(
            FileVariant::from_path(Path::new("lib/server.mts")),
            Some(FileVariant::Typed)
        );
        assert_eq!(
            FileVariant::from_path(Path::new("ui/Button.tsx")),
            Some(FileVariant::TypedWithMarkup)
        );
        assert_eq!(FileVariant::from_path(Path::new("README.md")), None);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert_eq!(Severity::Critical.to_string(), "critical");
    }

    #[test]
    fn test_span_line_count() {
        assert_eq!(SourceSpan::new(3, 7).line_count(), 5);
        assert_eq!(SourceSpan::new(4, 2).line_count(), 1);
    }
}
