pub mod provider;

pub use provider::{
    FileProvider, InMemoryProvider, SourceContent, SourceFile, WalkProvider, DEFAULT_EXCLUDES,
};

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
