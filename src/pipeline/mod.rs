//! Multi-file analysis run.
//!
//! Files are loaded and extracted in parallel with rayon; each file's outcome
//! is independent. Graph building, cycle detection and scoring run once, after
//! the parallel phase has collected every file.

use crate::analyzers::{Extraction, Extractor, FallbackExtractor, SourceInput};
use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::io::{FileProvider, SourceFile};
use crate::observability::{increment_processed, set_current_file, set_phase, set_progress, AnalysisPhase};
use crate::report::{aggregate, FileAnalysis, ProjectReport, SkippedFile};
use crate::resilience::{ErrorCategory, ErrorHandler, FailureInfo};
use rayon::prelude::*;
use std::sync::Arc;

enum FileOutcome {
    Analyzed(FileAnalysis),
    Skipped(SkippedFile),
}

pub struct Engine {
    config: EngineConfig,
    extractor: Box<dyn Extractor>,
    handler: Arc<ErrorHandler>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("extractor", &self.extractor.name())
            .finish()
    }
}

impl Engine {
    /// Engine with its own error handler.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let handler = Arc::new(ErrorHandler::new(config.resilience.clone()));
        Self::with_handler(config, handler)
    }

    /// Engine sharing an existing handler, e.g. the process-wide one.
    pub fn with_handler(config: EngineConfig, handler: Arc<ErrorHandler>) -> Result<Self, EngineError> {
        let extractor = Box::new(FallbackExtractor::for_config(&config)?);
        Ok(Self {
            config,
            extractor,
            handler,
        })
    }

    pub fn with_extractor(mut self, extractor: Box<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn handler(&self) -> &Arc<ErrorHandler> {
        &self.handler
    }

    /// Analyze every file the provider lists.
    ///
    /// Only an empty file list is an error; unreadable files are reported as
    /// skipped and unparseable ones are analyzed in degraded mode.
    pub fn analyze(&self, provider: &dyn FileProvider, root: &str) -> Result<ProjectReport, EngineError> {
        let files = {
            let _phase = set_phase(AnalysisPhase::FileDiscovery);
            provider.files()?
        };
        if files.is_empty() {
            return Err(EngineError::EmptyInput);
        }

        tracing::info!(root, files = files.len(), "Analyzing project");
        set_progress(0, files.len());

        let outcomes: Vec<FileOutcome> = files
            .par_iter()
            .map(|file| {
                let _phase = set_phase(AnalysisPhase::Extraction);
                let _file = set_current_file(file.relative_path.as_str());
                let outcome = self.process(file);
                increment_processed();
                outcome
            })
            .collect();

        let mut analyzed = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                FileOutcome::Analyzed(file) => analyzed.push(file),
                FileOutcome::Skipped(file) => skipped.push(file),
            }
        }

        let _phase = set_phase(AnalysisPhase::Aggregation);
        let report = aggregate(root, analyzed, skipped, &self.config, self.handler.health());
        tracing::info!(
            analyzed = report.summary.files_analyzed,
            degraded = report.summary.files_degraded,
            skipped = report.summary.files_skipped,
            findings = report.findings.len(),
            "Analysis complete"
        );
        Ok(report)
    }

    fn process(&self, file: &SourceFile) -> FileOutcome {
        let relative_path = file.relative_path.as_str();
        tracing::debug!(file = relative_path, "Processing file");

        // Reads retry without a breaker: one unreadable file never skips another
        let source = match self.handler.retry(relative_path, || file.load()) {
            Ok(source) => source,
            Err(err) => {
                tracing::warn!(file = relative_path, "Skipping file: {err}");
                return FileOutcome::Skipped(SkippedFile {
                    relative_path: relative_path.to_string(),
                    reason: err.to_string(),
                    category: err.category(),
                });
            }
        };

        let input = SourceInput {
            path: &file.path,
            relative_path,
            source: &source,
            variant: file.variant(),
        };

        let extraction = match self.extractor.extract(input) {
            Ok(extraction) => extraction,
            Err(err) => {
                // The fallback extractor absorbs parse failures; anything left is per-file
                let record = self.handler.record(&err, Some(relative_path));
                tracing::warn!(file = relative_path, "Skipping file: {err}");
                return FileOutcome::Skipped(SkippedFile {
                    relative_path: relative_path.to_string(),
                    reason: err.to_string(),
                    category: record.category,
                });
            }
        };

        if let Some(reason) = &extraction.degraded_reason {
            let failure = FailureInfo::new(reason.as_str()).hinted(ErrorCategory::Parsing);
            self.handler.record(&failure, Some(relative_path));
        }

        FileOutcome::Analyzed(self.file_analysis(file, &source, extraction))
    }

    fn file_analysis(&self, file: &SourceFile, source: &str, extraction: Extraction) -> FileAnalysis {
        let Extraction {
            entities,
            mut findings,
            degraded_reason,
        } = extraction;
        findings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        FileAnalysis {
            relative_path: file.relative_path.clone(),
            variant: file.variant(),
            line_count: source.lines().count(),
            entities,
            findings,
            degraded_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ExtractionMode;
    use crate::io::InMemoryProvider;
    use crate::resilience::HealthStatus;
    use std::io;

    #[test]
    fn test_empty_input_is_fatal() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let err = engine.analyze(&InMemoryProvider::new(), ".").unwrap_err();
        assert!(matches!(err, EngineError::EmptyInput));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_mixed_outcomes() {
        let provider = InMemoryProvider::new()
            .with_file("src/ok.js", "export const ok = () => 1;")
            .with_file("src/broken.js", "function broken( {")
            .with_source(SourceFile::with_loader("src/gone.js", "src/gone.js", || {
                Err(io::Error::new(io::ErrorKind::NotFound, "gone"))
            }));

        let engine = Engine::new(EngineConfig::default()).unwrap();
        let report = engine.analyze(&provider, ".").unwrap();

        assert_eq!(report.summary.files_analyzed, 2);
        assert_eq!(report.summary.files_degraded, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].relative_path, "src/gone.js");
        assert_eq!(report.skipped[0].category, ErrorCategory::Filesystem);
        assert_eq!(report.file("src/broken.js").unwrap().entities.mode, ExtractionMode::Degraded);

        let health = engine.handler().health();
        assert_eq!(health.errors_by_category.get(&ErrorCategory::Parsing), Some(&1));
        assert_eq!(health.status, HealthStatus::Healthy);
    }
}
