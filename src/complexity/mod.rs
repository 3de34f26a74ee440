//! Complexity metrics and project-level rating.
//!
//! The syntax walk that produces the raw counts lives in
//! `analyzers::javascript::complexity`; this module holds the result type, the
//! per-function warning rules and the project rating.
//!
//! The cognitive metric is a simplified variant: every branching or looping
//! construct costs `1 + depth` with no special handling of `else if` chains or
//! boolean operator sequences.

use crate::config::ComplexityThresholds;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityMetrics {
    pub cyclomatic: u32,
    pub cognitive: u32,
    pub max_nesting: u32,
    pub lines_of_code: usize,
    pub param_count: usize,
    pub warnings: Vec<ComplexityWarning>,
}

impl Default for ComplexityMetrics {
    fn default() -> Self {
        Self {
            cyclomatic: 1,
            cognitive: 0,
            max_nesting: 0,
            lines_of_code: 0,
            param_count: 0,
            warnings: Vec::new(),
        }
    }
}

impl ComplexityMetrics {
    /// Mean of cyclomatic and cognitive, the per-function input to the project rating.
    pub fn combined_score(&self) -> f64 {
        (self.cyclomatic as f64 + self.cognitive as f64) / 2.0
    }

    /// Recompute `warnings` against the given thresholds.
    pub fn apply_thresholds(&mut self, thresholds: &ComplexityThresholds) {
        self.warnings = warnings_for(self, thresholds);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplexityWarning {
    HighCyclomaticComplexity,
    HighCognitiveComplexity,
    DeepNesting,
}

impl fmt::Display for ComplexityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::HighCyclomaticComplexity => "high cyclomatic complexity",
            Self::HighCognitiveComplexity => "high cognitive complexity",
            Self::DeepNesting => "deep nesting",
        };
        f.write_str(text)
    }
}

pub fn warnings_for(
    metrics: &ComplexityMetrics,
    thresholds: &ComplexityThresholds,
) -> Vec<ComplexityWarning> {
    let rules = [
        (
            metrics.cyclomatic > thresholds.max_cyclomatic,
            ComplexityWarning::HighCyclomaticComplexity,
        ),
        (
            metrics.cognitive > thresholds.max_cognitive,
            ComplexityWarning::HighCognitiveComplexity,
        ),
        (
            metrics.max_nesting > thresholds.max_nesting,
            ComplexityWarning::DeepNesting,
        ),
    ];

    rules
        .into_iter()
        .filter_map(|(triggered, warning)| triggered.then_some(warning))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplexityRating {
    Excellent,
    Good,
    Moderate,
    Complex,
    VeryComplex,
}

impl fmt::Display for ComplexityRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
            Self::VeryComplex => "very-complex",
        };
        f.write_str(text)
    }
}

pub fn rating_for_score(score: f64, thresholds: &ComplexityThresholds) -> ComplexityRating {
    let [excellent, good, moderate, complex] = thresholds.rating_buckets;
    match score {
        s if s <= excellent => ComplexityRating::Excellent,
        s if s <= good => ComplexityRating::Good,
        s if s <= moderate => ComplexityRating::Moderate,
        s if s <= complex => ComplexityRating::Complex,
        _ => ComplexityRating::VeryComplex,
    }
}

/// Average combined score across all functions; zero when there are none.
pub fn average_combined_score<'a>(metrics: impl IntoIterator<Item = &'a ComplexityMetrics>) -> f64 {
    let (sum, count) = metrics
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), m| (sum + m.combined_score(), count + 1));

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
