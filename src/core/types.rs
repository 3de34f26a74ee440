//! Structural facts extracted from a single file.

use super::SourceSpan;
use crate::complexity::ComplexityMetrics;
use serde::{Deserialize, Serialize};

/// Syntactic form of a function-like entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionKind {
    /// `function foo() {}`
    Declaration,
    /// `const foo = () => {}`
    Arrow,
    /// `const foo = function() {}`
    Expression,
    /// `class C { foo() {} }` or `{ foo() {} }`
    Method,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionEntity {
    /// Binding name, `None` for anonymous callbacks
    pub name: Option<String>,
    pub kind: FunctionKind,
    pub is_async: bool,
    pub is_generator: bool,
    pub params: Vec<String>,
    pub span: SourceSpan,
    pub metrics: ComplexityMetrics,
}

impl FunctionEntity {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassEntity {
    pub name: String,
    pub superclass: Option<String>,
    pub methods: Vec<String>,
    pub properties: Vec<String>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentShape {
    Function,
    Class,
}

/// A function or class classified as producing UI markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentEntity {
    pub name: String,
    pub shape: ComponentShape,
    pub props: Vec<String>,
    pub hooks: Vec<String>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HookCall {
    pub name: String,
    pub line: usize,
    pub argument_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportEdge {
    pub from_file: String,
    pub specifier: String,
    pub is_relative: bool,
    pub line: usize,
}

impl ImportEdge {
    pub fn new(from_file: &str, specifier: &str, line: usize) -> Self {
        Self {
            from_file: from_file.to_string(),
            specifier: specifier.to_string(),
            is_relative: is_relative_specifier(specifier),
            line,
        }
    }
}

/// Relative specifiers point at another project file; everything else is external.
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../") || specifier == "." || specifier == ".."
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportKind {
    Named,
    Default,
    ReExport,
    NamespaceReExport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEntry {
    pub name: String,
    pub kind: ExportKind,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteOrigin {
    /// `app.get('/users', handler)`
    CallChain,
    /// `pages/api/users/[id].ts` exporting `GET`
    FileConvention,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// Upper-case HTTP verb
    pub method: String,
    pub path: String,
    pub line: usize,
    pub origin: RouteOrigin,
    pub middleware: Vec<String>,
    pub protected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Syntax-tree extraction
    Full,
    /// Regex-only fallback after a parse failure
    Degraded,
}

/// Everything one extraction pass produces for a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntities {
    pub mode: ExtractionMode,
    pub functions: Vec<FunctionEntity>,
    pub classes: Vec<ClassEntity>,
    pub components: Vec<ComponentEntity>,
    pub hooks: Vec<HookCall>,
    pub imports: Vec<ImportEdge>,
    pub exports: Vec<ExportEntry>,
    pub routes: Vec<RouteEntry>,
}

impl FileEntities {
    pub fn empty(mode: ExtractionMode) -> Self {
        Self {
            mode,
            functions: Vec::new(),
            classes: Vec::new(),
            components: Vec::new(),
            hooks: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            routes: Vec::new(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.mode == ExtractionMode::Degraded
    }
}
