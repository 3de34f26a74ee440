use crate::core::FileVariant;
use crate::errors::EngineError;
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Patterns skipped by the directory walker in addition to `.gitignore` rules.
pub const DEFAULT_EXCLUDES: &[&str] = &["node_modules/", "*.min.js", "*.bundle.js"];

type Loader = Arc<dyn Fn() -> io::Result<String> + Send + Sync>;

/// File text, either already in memory or read on demand.
#[derive(Clone)]
pub enum SourceContent {
    Loaded(String),
    Lazy(Loader),
}

impl fmt::Debug for SourceContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded(text) => f.debug_tuple("Loaded").field(&text.len()).finish(),
            Self::Lazy(_) => f.write_str("Lazy"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Forward-slash path relative to the project root
    pub relative_path: String,
    pub content: SourceContent,
}

impl SourceFile {
    pub fn loaded(path: impl Into<PathBuf>, relative_path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            relative_path: relative_path.into(),
            content: SourceContent::Loaded(text.into()),
        }
    }

    /// Read from disk when first needed.
    pub fn on_disk(path: impl Into<PathBuf>, relative_path: impl Into<String>) -> Self {
        let path = path.into();
        let read_path = path.clone();
        Self::with_loader(path, relative_path, move || std::fs::read_to_string(&read_path))
    }

    pub fn with_loader(
        path: impl Into<PathBuf>,
        relative_path: impl Into<String>,
        loader: impl Fn() -> io::Result<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            path: path.into(),
            relative_path: relative_path.into(),
            content: SourceContent::Lazy(Arc::new(loader)),
        }
    }

    pub fn variant(&self) -> FileVariant {
        FileVariant::from_path(&self.path).unwrap_or(FileVariant::Plain)
    }

    /// The file text. May be called again after a failure.
    pub fn load(&self) -> io::Result<String> {
        match &self.content {
            SourceContent::Loaded(text) => Ok(text.clone()),
            SourceContent::Lazy(loader) => loader(),
        }
    }
}

/// Supplies the ordered list of files for one run.
pub trait FileProvider {
    fn files(&self) -> Result<Vec<SourceFile>, EngineError>;
}

/// Files under a directory, honoring `.gitignore` and the exclude patterns.
#[derive(Debug, Clone)]
pub struct WalkProvider {
    root: PathBuf,
    excludes: Vec<String>,
}

impl WalkProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excludes: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_excludes(mut self, patterns: Vec<String>) -> Self {
        self.excludes = patterns;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn overrides(&self) -> Result<ignore::overrides::Override, EngineError> {
        let mut builder = OverrideBuilder::new(&self.root);
        for pattern in &self.excludes {
            builder
                .add(&format!("!{pattern}"))
                .map_err(|e| EngineError::Validation(format!("invalid exclude pattern '{pattern}': {e}")))?;
        }
        builder
            .build()
            .map_err(|e| EngineError::Validation(format!("invalid exclude patterns: {e}")))
    }
}

impl FileProvider for WalkProvider {
    fn files(&self) -> Result<Vec<SourceFile>, EngineError> {
        if self.root.is_file() {
            let name = relative_name(self.root.parent().unwrap_or(Path::new("")), &self.root);
            return Ok(vec![SourceFile::on_disk(self.root.clone(), name)]);
        }

        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .require_git(false)
            .overrides(self.overrides()?)
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable directory entry: {e}");
                    continue;
                }
            };
            let path = entry.path();
            if entry.file_type().is_some_and(|t| t.is_file()) && FileVariant::from_path(path).is_some() {
                files.push(SourceFile::on_disk(path, relative_name(&self.root, path)));
            }
        }

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        tracing::debug!(root = %self.root.display(), count = files.len(), "Discovered source files");
        Ok(files)
    }
}

/// Fixed files, for tests and callers that already hold the text.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    files: Vec<SourceFile>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a loaded file; `relative_path` doubles as its path.
    pub fn with_file(mut self, relative_path: &str, text: impl Into<String>) -> Self {
        self.files
            .push(SourceFile::loaded(relative_path, relative_path, text));
        self
    }

    pub fn with_source(mut self, file: SourceFile) -> Self {
        self.files.push(file);
        self
    }
}

impl FileProvider for InMemoryProvider {
    fn files(&self) -> Result<Vec<SourceFile>, EngineError> {
        Ok(self.files.clone())
    }
}

fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, text: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    #[test]
    fn test_walk_finds_source_files_in_order() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/b.ts", "export const b = 1;");
        write(dir.path(), "src/a.jsx", "export const A = () => <div />;");
        write(dir.path(), "README.md", "# readme");
        write(dir.path(), "node_modules/react/index.js", "module.exports = {};");
        write(dir.path(), "public/app.min.js", "var a=1;");

        let files = WalkProvider::new(dir.path()).files().unwrap();
        let names: Vec<_> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(names, vec!["src/a.jsx", "src/b.ts"]);
        assert_eq!(files[0].variant(), FileVariant::PlainWithMarkup);
        assert_eq!(files[1].load().unwrap(), "export const b = 1;");
    }

    #[test]
    fn test_walk_respects_gitignore() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".gitignore", "dist/\n");
        write(dir.path(), "dist/out.js", "x");
        write(dir.path(), "index.js", "x");

        let files = WalkProvider::new(dir.path()).files().unwrap();
        let names: Vec<_> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(names, vec!["index.js"]);
    }

    #[test]
    fn test_single_file_root() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app.js", "x");
        let files = WalkProvider::new(dir.path().join("app.js")).files().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "app.js");
    }

    #[test]
    fn test_lazy_loader_errors_surface_on_load() {
        let file = SourceFile::with_loader("gone.js", "gone.js", || {
            Err(io::Error::new(io::ErrorKind::NotFound, "gone"))
        });
        assert_eq!(file.load().unwrap_err().kind(), io::ErrorKind::NotFound);
    }
}
