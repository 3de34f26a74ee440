//! Per-file extraction.
//!
//! Two [`Extractor`] implementations share one contract: the syntax-tree
//! extractor produces the full entity set, the regex extractor a strict subset
//! that survives unparseable input. [`FallbackExtractor`] selects between them.

use crate::config::EngineConfig;
use crate::core::{FileEntities, FileVariant, Finding};
use crate::errors::EngineError;
use std::path::Path;

pub mod javascript;

use javascript::detectors::{scan_lines, scan_syntax, SecretScanner};

/// One file handed to an extractor.
#[derive(Debug, Clone, Copy)]
pub struct SourceInput<'a> {
    pub path: &'a Path,
    pub relative_path: &'a str,
    pub source: &'a str,
    pub variant: FileVariant,
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub entities: FileEntities,
    pub findings: Vec<Finding>,
    /// Set when the file fell back to regex-only extraction
    pub degraded_reason: Option<String>,
}

pub trait Extractor: Send + Sync {
    fn extract(&self, input: SourceInput<'_>) -> Result<Extraction, EngineError>;

    fn name(&self) -> &'static str;
}

/// Full extraction from a tree-sitter syntax tree.
#[derive(Debug)]
pub struct SyntaxExtractor {
    config: EngineConfig,
    secrets: SecretScanner,
}

impl SyntaxExtractor {
    pub fn new(config: EngineConfig, secrets: SecretScanner) -> Self {
        Self { config, secrets }
    }
}

impl Extractor for SyntaxExtractor {
    fn extract(&self, input: SourceInput<'_>) -> Result<Extraction, EngineError> {
        let tree = javascript::parse_source(input.source, input.path, input.variant)?;
        let entities = javascript::extract_entities(&tree, input.relative_path, &self.config);

        let mut findings = scan_syntax(&tree, input.relative_path, &self.config);
        findings.extend(scan_lines(input.source, input.relative_path, &self.secrets));

        Ok(Extraction {
            entities,
            findings,
            degraded_reason: None,
        })
    }

    fn name(&self) -> &'static str {
        "syntax"
    }
}

/// Regex-only extraction. Never fails.
#[derive(Debug)]
pub struct RegexExtractor {
    secrets: SecretScanner,
}

impl RegexExtractor {
    pub fn new(secrets: SecretScanner) -> Self {
        Self { secrets }
    }
}

impl Extractor for RegexExtractor {
    fn extract(&self, input: SourceInput<'_>) -> Result<Extraction, EngineError> {
        Ok(Extraction {
            entities: javascript::extract_degraded(input.source, input.relative_path),
            findings: scan_lines(input.source, input.relative_path, &self.secrets),
            degraded_reason: None,
        })
    }

    fn name(&self) -> &'static str {
        "regex"
    }
}

/// Tries the primary extractor and falls back on parse failures only.
///
/// Any other error from the primary is returned unchanged.
pub struct FallbackExtractor {
    primary: Box<dyn Extractor>,
    fallback: Box<dyn Extractor>,
}

impl std::fmt::Debug for FallbackExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackExtractor")
            .field("primary", &self.primary.name())
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

impl FallbackExtractor {
    pub fn new(primary: Box<dyn Extractor>, fallback: Box<dyn Extractor>) -> Self {
        Self { primary, fallback }
    }

    /// Syntax-tree extraction with regex fallback for the given configuration.
    pub fn for_config(config: &EngineConfig) -> Result<Self, EngineError> {
        let scanner = || {
            SecretScanner::new(&config.secrets)
                .map_err(|e| EngineError::Validation(format!("invalid secret pattern: {e}")))
        };
        Ok(Self::new(
            Box::new(SyntaxExtractor::new(config.clone(), scanner()?)),
            Box::new(RegexExtractor::new(scanner()?)),
        ))
    }
}

impl Extractor for FallbackExtractor {
    fn extract(&self, input: SourceInput<'_>) -> Result<Extraction, EngineError> {
        match self.primary.extract(input) {
            Err(err @ EngineError::Parse { .. }) => {
                tracing::warn!(
                    file = input.relative_path,
                    extractor = self.fallback.name(),
                    "Degrading extraction: {err}"
                );
                let mut extraction = self.fallback.extract(input)?;
                extraction.degraded_reason = Some(err.to_string());
                Ok(extraction)
            }
            other => other,
        }
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}
