//! Static risk and quality analysis for JavaScript and TypeScript web projects.
//!
//! The engine parses each file with tree-sitter, extracts functions, classes,
//! UI components, hooks, imports and routes, measures complexity, scans for
//! security and performance anti-patterns, and builds the inter-file
//! dependency graph. Files that fail to parse fall back to a regex-only
//! extractor; unreadable files are skipped. Per-file work runs in parallel.
//!
//! ```ignore
//! use webaudit::{Engine, EngineConfig, WalkProvider};
//!
//! let engine = Engine::new(EngineConfig::default())?;
//! let report = engine.analyze(&WalkProvider::new("./web"), "web")?;
//! println!("security score: {}", report.security.score);
//! ```

pub mod analyzers;
pub mod cli;
pub mod commands;
pub mod complexity;
pub mod config;
pub mod core;
pub mod errors;
pub mod graph;
pub mod io;
pub mod observability;
pub mod pipeline;
pub mod report;
pub mod resilience;
pub mod security;

pub use crate::analyzers::{Extraction, Extractor, FallbackExtractor, RegexExtractor, SourceInput, SyntaxExtractor};
pub use crate::complexity::{ComplexityMetrics, ComplexityRating, ComplexityWarning};
pub use crate::config::{load_config, EngineConfig};
pub use crate::core::{
    FileEntities, FileVariant, Finding, FindingCategory, FindingKind, ImportEdge, RouteEntry,
    Severity,
};
pub use crate::errors::EngineError;
pub use crate::graph::{CircularDependency, DependencyGraph};
pub use crate::io::{FileProvider, InMemoryProvider, SourceFile, WalkProvider};
pub use crate::pipeline::Engine;
pub use crate::report::{FileAnalysis, ProjectReport, SkippedFile};
pub use crate::resilience::{
    CircuitBreaker, ErrorCategory, ErrorHandler, HealthStatus, RecoveryStrategy,
};
