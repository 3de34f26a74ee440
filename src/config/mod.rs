//! Engine configuration.
//!
//! Every heuristic constant the engine uses lives here with a serde default, so a
//! `.webaudit.toml` only needs to name the values it overrides. Invalid sections are
//! reported and replaced by their defaults rather than failing the run.

mod loader;
pub mod retry;
pub mod thresholds;

use serde::{Deserialize, Serialize};

pub use loader::{directory_ancestors, load_config, load_config_from_path, parse_and_validate_config};
pub use retry::{BreakerConfig, ResilienceConfig, RetryConfig};
pub use thresholds::{ComplexityThresholds, PerformanceThresholds, SecretThresholds};

pub const CONFIG_FILE_NAME: &str = ".webaudit.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub complexity: ComplexityThresholds,

    #[serde(default)]
    pub secrets: SecretThresholds,

    #[serde(default)]
    pub performance: PerformanceThresholds,

    #[serde(default)]
    pub routes: RouteConfig,

    #[serde(default)]
    pub resilience: ResilienceConfig,
}

impl EngineConfig {
    /// Replace every invalid section with its default, returning one message per replacement.
    pub fn sanitize(&mut self) -> Vec<String> {
        let mut problems = Vec::new();

        if let Err(e) = self.complexity.validate() {
            problems.push(e);
            self.complexity = ComplexityThresholds::default();
        }
        if let Err(e) = self.secrets.validate() {
            problems.push(e);
            self.secrets = SecretThresholds::default();
        }
        if let Err(e) = self.routes.validate() {
            problems.push(e);
            self.routes = RouteConfig::default();
        }
        if let Err(e) = self.resilience.validate() {
            problems.push(e);
            self.resilience = ResilienceConfig::default();
        }

        problems
    }
}

/// Route discovery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Path segment that marks file-convention routes (default: "api")
    #[serde(default = "default_marker_segment")]
    pub marker_segment: String,

    /// Receivers whose verb calls declare routes
    #[serde(default = "default_router_identifiers")]
    pub router_identifiers: Vec<String>,

    /// File stems treated as the directory itself (default: ["index", "route"])
    #[serde(default = "default_index_segments")]
    pub index_segments: Vec<String>,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            marker_segment: default_marker_segment(),
            router_identifiers: default_router_identifiers(),
            index_segments: default_index_segments(),
        }
    }
}

impl RouteConfig {
    /// URL prefix for file-convention routes, e.g. `/api`.
    pub fn marker_path(&self) -> String {
        format!("/{}", self.marker_segment)
    }

    pub fn is_router(&self, identifier: &str) -> bool {
        self.router_identifiers.iter().any(|r| r == identifier)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.marker_segment.is_empty() || self.marker_segment.contains('/') {
            return Err(format!(
                "routes.marker_segment '{}' must be a single non-empty path segment",
                self.marker_segment
            ));
        }
        Ok(())
    }
}

fn default_marker_segment() -> String {
    "api".to_string()
}

fn default_router_identifiers() -> Vec<String> {
    ["app", "router", "server", "api", "routes"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_index_segments() -> Vec<String> {
    vec!["index".to_string(), "route".to_string()]
}
