//! The immutable result of one analysis run.
//!
//! Everything except [`ProjectReport::health`] is a pure function of the input
//! files and configuration, and is ordered by file path and line.

use crate::analyzers::javascript::classification::looks_like_auth;
use crate::complexity::{average_combined_score, rating_for_score, ComplexityRating};
use crate::config::EngineConfig;
use crate::core::{
    ExtractionMode, FileEntities, FileVariant, Finding, FindingCategory, FindingKind, ImportEdge,
    RouteEntry,
};
use crate::graph::{CircularDependency, DependencyGraph, FileCoupling};
use crate::observability::{set_phase, AnalysisPhase};
use crate::resilience::{ErrorCategory, HealthReport};
use crate::security::{self, AccessControlFacts, SecuritySummary};
use serde::Serialize;
use std::collections::BTreeMap;

/// Number of most complex functions listed in the summary.
const HOTSPOT_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct FileAnalysis {
    pub relative_path: String,
    pub variant: FileVariant,
    pub line_count: usize,
    #[serde(flatten)]
    pub entities: FileEntities,
    pub findings: Vec<Finding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded_reason: Option<String>,
}

impl FileAnalysis {
    pub fn is_degraded(&self) -> bool {
        self.entities.mode == ExtractionMode::Degraded
    }
}

/// A file that produced no analysis because it could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub relative_path: String,
    pub reason: String,
    pub category: ErrorCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectRoute {
    pub file: String,
    #[serde(flatten)]
    pub route: RouteEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionHotspot {
    pub file: String,
    pub name: String,
    pub line: usize,
    pub cyclomatic: u32,
    pub cognitive: u32,
    pub max_nesting: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexitySummary {
    pub function_count: usize,
    pub average_score: f64,
    pub rating: ComplexityRating,
    pub max_cyclomatic: u32,
    pub max_cognitive: u32,
    pub functions_with_warnings: usize,
    pub hotspots: Vec<FunctionHotspot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencySummary {
    pub graph: BTreeMap<String, Vec<String>>,
    pub cycles: Vec<CircularDependency>,
    pub external: Vec<String>,
    pub coupling: Vec<FileCoupling>,
    pub unresolved_imports: Vec<ImportEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub total: usize,
    pub by_kind: BTreeMap<FindingKind, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub files_analyzed: usize,
    pub files_degraded: usize,
    pub files_skipped: usize,
    pub total_lines: usize,
    pub functions: usize,
    pub classes: usize,
    pub components: usize,
    pub hooks: usize,
    pub routes: usize,
    pub security_findings: usize,
    pub performance_findings: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectReport {
    pub root: String,
    pub summary: ReportSummary,
    pub complexity: ComplexitySummary,
    pub security: SecuritySummary,
    pub performance: PerformanceSummary,
    pub dependencies: DependencySummary,
    pub routes: Vec<ProjectRoute>,
    pub findings: Vec<Finding>,
    pub files: Vec<FileAnalysis>,
    pub skipped: Vec<SkippedFile>,
    /// Resilience state at the end of the run; not covered by the ordering guarantee
    pub health: HealthReport,
}

impl ProjectReport {
    pub fn file(&self, relative_path: &str) -> Option<&FileAnalysis> {
        self.files.iter().find(|f| f.relative_path == relative_path)
    }

    pub fn findings_of(&self, kind: FindingKind) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.kind == kind)
    }
}

/// Merge per-file results into the project report.
///
/// Called once, after every file has finished, so the dependency graph sees
/// the complete edge set.
pub fn aggregate(
    root: &str,
    mut files: Vec<FileAnalysis>,
    mut skipped: Vec<SkippedFile>,
    config: &EngineConfig,
    health: HealthReport,
) -> ProjectReport {
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    skipped.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    let mut findings: Vec<Finding> = files.iter().flat_map(|f| f.findings.iter().cloned()).collect();
    findings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    let routes: Vec<ProjectRoute> = files
        .iter()
        .flat_map(|f| {
            f.entities.routes.iter().map(move |route| ProjectRoute {
                file: f.relative_path.clone(),
                route: route.clone(),
            })
        })
        .collect();

    let dependencies = {
        let _phase = set_phase(AnalysisPhase::GraphBuilding);
        let graph = DependencyGraph::build(
            files.iter().map(|f| f.relative_path.as_str()),
            files.iter().flat_map(|f| &f.entities.imports),
        );
        DependencySummary {
            graph: graph.adjacency(),
            cycles: graph.detect_cycles(),
            external: graph.external_dependencies().iter().cloned().collect(),
            coupling: graph.coupling(),
            unresolved_imports: graph.unresolved_imports().to_vec(),
        }
    };

    let route_entries: Vec<RouteEntry> = routes.iter().map(|r| r.route.clone()).collect();
    let security = security::summarize(
        &findings,
        AccessControlFacts {
            routes: &route_entries,
            has_authorization: has_authorization(&files),
        },
    );

    let summary = summarize(&files, &skipped, &findings, routes.len());

    ProjectReport {
        root: root.to_string(),
        complexity: complexity_summary(&files, config),
        performance: performance_summary(&findings),
        summary,
        security,
        dependencies,
        routes,
        findings,
        files,
        skipped,
        health,
    }
}

/// Any protected route, or an import that names an auth library or module.
fn has_authorization(files: &[FileAnalysis]) -> bool {
    files.iter().any(|f| {
        f.entities.routes.iter().any(|r| r.protected)
            || f.entities.imports.iter().any(|i| looks_like_auth(&i.specifier))
    })
}

fn complexity_summary(files: &[FileAnalysis], config: &EngineConfig) -> ComplexitySummary {
    let functions: Vec<(&str, &crate::core::FunctionEntity)> = files
        .iter()
        .flat_map(|f| f.entities.functions.iter().map(move |func| (f.relative_path.as_str(), func)))
        .collect();

    let average_score = average_combined_score(functions.iter().map(|(_, f)| &f.metrics));

    let mut hotspots: Vec<FunctionHotspot> = functions
        .iter()
        .map(|(file, func)| FunctionHotspot {
            file: file.to_string(),
            name: func.display_name().to_string(),
            line: func.span.start_line,
            cyclomatic: func.metrics.cyclomatic,
            cognitive: func.metrics.cognitive,
            max_nesting: func.metrics.max_nesting,
        })
        .collect();
    // Most complex first; ties keep file and line order
    hotspots.sort_by(|a, b| {
        (b.cyclomatic + b.cognitive)
            .cmp(&(a.cyclomatic + a.cognitive))
            .then_with(|| a.file.cmp(&b.file))
            .then_with(|| a.line.cmp(&b.line))
    });
    hotspots.truncate(HOTSPOT_LIMIT);

    ComplexitySummary {
        function_count: functions.len(),
        average_score,
        rating: rating_for_score(average_score, &config.complexity),
        max_cyclomatic: functions.iter().map(|(_, f)| f.metrics.cyclomatic).max().unwrap_or(0),
        max_cognitive: functions.iter().map(|(_, f)| f.metrics.cognitive).max().unwrap_or(0),
        functions_with_warnings: functions
            .iter()
            .filter(|(_, f)| !f.metrics.warnings.is_empty())
            .count(),
        hotspots,
    }
}

fn performance_summary(findings: &[Finding]) -> PerformanceSummary {
    let mut by_kind = BTreeMap::new();
    let mut total = 0;
    for finding in findings
        .iter()
        .filter(|f| f.kind.category() == FindingCategory::Performance)
    {
        *by_kind.entry(finding.kind).or_insert(0) += 1;
        total += 1;
    }
    PerformanceSummary { total, by_kind }
}

fn summarize(
    files: &[FileAnalysis],
    skipped: &[SkippedFile],
    findings: &[Finding],
    route_count: usize,
) -> ReportSummary {
    let count = |f: fn(&FileEntities) -> usize| -> usize {
        files.iter().map(|file| f(&file.entities)).sum()
    };
    let security_findings = findings
        .iter()
        .filter(|f| f.kind.category() == FindingCategory::Security)
        .count();

    ReportSummary {
        files_analyzed: files.len(),
        files_degraded: files.iter().filter(|f| f.is_degraded()).count(),
        files_skipped: skipped.len(),
        total_lines: files.iter().map(|f| f.line_count).sum(),
        functions: count(|e| e.functions.len()),
        classes: count(|e| e.classes.len()),
        components: count(|e| e.components.len()),
        hooks: count(|e| e.hooks.len()),
        routes: route_count,
        security_findings,
        performance_findings: findings.len() - security_findings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ExtractionMode, RouteOrigin, Severity};
    use crate::resilience::ErrorHandler;

    fn file(path: &str, imports: &[&str]) -> FileAnalysis {
        let mut entities = FileEntities::empty(ExtractionMode::Full);
        entities.imports = imports.iter().map(|s| ImportEdge::new(path, s, 1)).collect();
        FileAnalysis {
            relative_path: path.to_string(),
            variant: FileVariant::Plain,
            line_count: 10,
            entities,
            findings: Vec::new(),
            degraded_reason: None,
        }
    }

    #[test]
    fn test_aggregate_sorts_and_builds_graph() {
        let mut b = file("src/b.js", &["./a", "react"]);
        b.findings.push(Finding::new(FindingKind::Xss, Severity::Medium, "src/b.js", 3, "x", "y"));
        let a = file("src/a.js", &["./b"]);

        let report = aggregate(
            "proj",
            vec![b, a],
            Vec::new(),
            &EngineConfig::default(),
            ErrorHandler::default().health(),
        );

        assert_eq!(report.files[0].relative_path, "src/a.js");
        assert_eq!(report.dependencies.cycles.len(), 1);
        assert_eq!(report.dependencies.external, vec!["react"]);
        assert_eq!(report.summary.security_findings, 1);
        assert_eq!(report.security.score, 95);
        assert_eq!(report.summary.total_lines, 20);
        assert_eq!(report.complexity.rating, ComplexityRating::Excellent);
    }

    #[test]
    fn test_authorization_from_imports_and_routes() {
        let mut api = file("src/api/users.js", &["jsonwebtoken"]);
        api.entities.routes.push(RouteEntry {
            method: "GET".into(),
            path: "/api/users".into(),
            line: 1,
            origin: RouteOrigin::FileConvention,
            middleware: Vec::new(),
            protected: false,
        });
        assert!(has_authorization(&[api.clone()]));

        api.entities.imports.clear();
        assert!(!has_authorization(&[api]));
    }
}
