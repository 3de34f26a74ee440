use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use super::{EngineConfig, CONFIG_FILE_NAME};

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Parse a TOML document and replace invalid sections with defaults.
///
/// Only a syntactically broken document is an error. A section whose values
/// have the wrong type, or fail validation, is logged and defaulted on its own.
pub fn parse_and_validate_config(contents: &str) -> Result<EngineConfig> {
    let mut table = toml::from_str::<toml::Table>(contents)
        .with_context(|| format!("Failed to parse {CONFIG_FILE_NAME}"))?;
    let mut problems = Vec::new();

    let mut config = EngineConfig {
        complexity: section(&mut table, "complexity", &mut problems),
        secrets: section(&mut table, "secrets", &mut problems),
        performance: section(&mut table, "performance", &mut problems),
        routes: section(&mut table, "routes", &mut problems),
        resilience: section(&mut table, "resilience", &mut problems),
    };
    problems.extend(config.sanitize());

    for problem in problems {
        tracing::warn!("Invalid configuration: {}. Using defaults.", problem);
    }

    Ok(config)
}

fn section<T>(table: &mut toml::Table, name: &str, problems: &mut Vec<String>) -> T
where
    T: DeserializeOwned + Default,
{
    let Some(value) = table.remove(name) else {
        return T::default();
    };
    value.try_into().unwrap_or_else(|e: toml::de::Error| {
        problems.push(format!("[{name}] {}", e.message()));
        T::default()
    })
}

/// The configuration in `contents`, or the defaults when it is not valid TOML.
fn config_or_default(contents: &str, origin: &Path) -> EngineConfig {
    match parse_and_validate_config(contents) {
        Ok(config) => {
            tracing::debug!("Loaded config from {}", origin.display());
            config
        }
        Err(e) => {
            tracing::warn!("{}: {:#}. Using defaults.", origin.display(), e);
            EngineConfig::default()
        }
    }
}

/// Load configuration from an explicit file.
///
/// Only a missing or unreadable file is an error; malformed contents fall back to defaults.
pub fn load_config_from_path(path: &Path) -> Result<EngineConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    Ok(config_or_default(&contents, path))
}

/// `None` only when no config file exists at `config_path`.
fn try_load_config_from_path(config_path: &Path) -> Option<EngineConfig> {
    match fs::read_to_string(config_path) {
        Ok(contents) => Some(config_or_default(&contents, config_path)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::warn!(
                "Failed to read config file {}: {}. Using defaults.",
                config_path.display(),
                e
            );
            Some(EngineConfig::default())
        }
    }
}

/// Directory ancestors of `start`, nearest first, up to `max_depth` entries.
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Find the nearest `.webaudit.toml` at or above `start`, falling back to defaults.
///
/// The search stops at the first file found, even when it is malformed.
pub fn load_config(start: &Path) -> EngineConfig {
    directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            tracing::debug!(
                "No config found after checking {} directories. Using default config.",
                MAX_TRAVERSAL_DEPTH
            );
            EngineConfig::default()
        })
}
