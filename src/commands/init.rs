use crate::config::{EngineConfig, CONFIG_FILE_NAME};
use crate::io;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Default configuration as TOML, with a header comment.
pub fn default_config_toml() -> Result<String> {
    let body = toml::to_string_pretty(&EngineConfig::default())
        .context("Failed to serialize default configuration")?;
    Ok(format!("# webaudit configuration\n\n{body}"))
}

pub fn init_config_in(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    io::write_file(&config_path, &default_config_toml()?)?;
    Ok(config_path)
}

pub fn init_config(force: bool) -> Result<()> {
    let path = init_config_in(Path::new("."), force)?;
    println!("Created {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_and_validate_config;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_round_trips() {
        let text = default_config_toml().unwrap();
        assert_eq!(parse_and_validate_config(&text).unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        init_config_in(dir.path(), false).unwrap();
        assert!(init_config_in(dir.path(), false).is_err());
        assert!(init_config_in(dir.path(), true).is_ok());
    }
}
