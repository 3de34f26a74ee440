// Shared helpers for webaudit integration tests
#![allow(dead_code)]

use std::fs;
use std::path::Path;
use webaudit::{Engine, EngineConfig, InMemoryProvider, ProjectReport};

/// Analyze in-memory sources with the default configuration.
pub fn analyze_sources(files: &[(&str, &str)]) -> ProjectReport {
    analyze_sources_with(files, EngineConfig::default())
}

pub fn analyze_sources_with(files: &[(&str, &str)], config: EngineConfig) -> ProjectReport {
    let provider = files
        .iter()
        .fold(InMemoryProvider::new(), |provider, (path, text)| {
            provider.with_file(path, *text)
        });
    Engine::new(config)
        .unwrap()
        .analyze(&provider, "project")
        .unwrap()
}

/// Write a project tree under `dir`.
pub fn write_project(dir: &Path, files: &[(&str, &str)]) {
    for (relative, text) in files {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }
}

/// The report as JSON without the resilience health section.
pub fn deterministic_json(report: &ProjectReport) -> serde_json::Value {
    let mut value = serde_json::to_value(report).unwrap();
    value.as_object_mut().unwrap().remove("health");
    value
}
