use crate::config::{load_config, load_config_from_path, EngineConfig};
use crate::io::{write_file, WalkProvider};
use crate::observability::{set_phase, AnalysisPhase};
use crate::pipeline::Engine;
use crate::report::ProjectReport;
use crate::resilience;
use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AnalyzeConfig {
    pub path: PathBuf,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub pretty: bool,
}

/// Explicit config file, or the nearest `.webaudit.toml` above the analyzed path.
pub fn resolve_config(path: &std::path::Path, explicit: Option<&std::path::Path>) -> Result<EngineConfig> {
    match explicit {
        Some(file) => load_config_from_path(file),
        None => {
            let start = if path.is_file() {
                path.parent().map(|p| p.to_path_buf()).unwrap_or_default()
            } else {
                path.to_path_buf()
            };
            Ok(load_config(&start))
        }
    }
}

pub fn run_analysis(config: &AnalyzeConfig) -> Result<ProjectReport> {
    let engine_config = resolve_config(&config.path, config.config.as_deref())?;
    let handler = resilience::init_global(&engine_config.resilience);
    let engine = Engine::with_handler(engine_config, handler)?;

    let provider = WalkProvider::new(&config.path);
    let root = config.path.display().to_string();
    engine
        .analyze(&provider, &root)
        .with_context(|| format!("Failed to analyze {}", config.path.display()))
}

pub fn render_report(report: &ProjectReport, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(report)
    } else {
        serde_json::to_string(report)
    };
    json.context("Failed to serialize report")
}

pub fn handle_analyze(config: AnalyzeConfig) -> Result<()> {
    let report = run_analysis(&config)?;

    let _phase = set_phase(AnalysisPhase::OutputGeneration);
    let rendered = render_report(&report, config.pretty)?;
    match &config.output {
        Some(path) => {
            write_file(path, &rendered)?;
            tracing::info!("Report written to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
