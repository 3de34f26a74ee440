//! Tree-sitter parser integration for JavaScript/TypeScript
//!
//! Provides parsing using tree-sitter grammars for JS/TS/JSX/TSX.

use crate::core::FileVariant;
use crate::errors::EngineError;
use std::path::{Path, PathBuf};
use tree_sitter::{Language as TsLanguage, Node, Parser, Tree};

/// A parsed file. Owned per file and dropped once extraction is done.
pub struct SyntaxTree {
    pub tree: Tree,
    pub source: String,
    pub path: PathBuf,
    pub variant: FileVariant,
}

impl SyntaxTree {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }
}

impl std::fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("path", &self.path)
            .field("variant", &self.variant)
            .field("bytes", &self.source.len())
            .finish()
    }
}

/// Get the tree-sitter language for a file variant
fn get_language(variant: FileVariant) -> TsLanguage {
    match variant {
        FileVariant::Plain | FileVariant::PlainWithMarkup => tree_sitter_javascript::LANGUAGE.into(),
        FileVariant::Typed => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        FileVariant::TypedWithMarkup => tree_sitter_typescript::LANGUAGE_TSX.into(),
    }
}

/// Parse JavaScript/TypeScript source code into a tree-sitter AST.
///
/// A tree that contains error or missing nodes is rejected, so callers can
/// fall back to degraded extraction.
pub fn parse_source(
    content: &str,
    path: &Path,
    variant: FileVariant,
) -> Result<SyntaxTree, EngineError> {
    let mut parser = Parser::new();
    parser
        .set_language(&get_language(variant))
        .map_err(|e| EngineError::parse(path, format!("Failed to set tree-sitter language: {e}")))?;

    let tree = parser
        .parse(content, None)
        .ok_or_else(|| EngineError::parse(path, "Failed to parse source code"))?;

    if let Some(line) = first_error_line(&tree) {
        return Err(EngineError::parse_at(
            path,
            format!("syntax error near line {line}"),
            line,
        ));
    }

    Ok(SyntaxTree {
        tree,
        path: path.to_path_buf(),
        source: content.to_string(),
        variant,
    })
}

/// Line of the first error or missing node, if the tree has any
pub fn first_error_line(tree: &Tree) -> Option<usize> {
    let root = tree.root_node();
    if !root.has_error() {
        return None;
    }

    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node.start_position().row + 1);
        }
        // Only descend into subtrees that contain the error
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return Some(root.start_position().row + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_javascript() {
        let source = "function hello() { return 'world'; }";
        let tree = parse_source(source, Path::new("test.js"), FileVariant::Plain).unwrap();
        assert_eq!(tree.variant, FileVariant::Plain);
        assert_eq!(tree.root().kind(), "program");
    }

    #[test]
    fn test_parse_typescript() {
        let source = "function hello(name: string): string { return `Hello ${name}`; }";
        assert!(parse_source(source, Path::new("test.ts"), FileVariant::Typed).is_ok());
    }

    #[test]
    fn test_parse_tsx() {
        let source = "const App: React.FC = () => <div>Hello</div>;";
        assert!(parse_source(source, Path::new("test.tsx"), FileVariant::TypedWithMarkup).is_ok());
    }

    #[test]
    fn test_error_nodes_are_parse_failures() {
        let source = "function broken( {\n  return 1;\n";
        let err = parse_source(source, Path::new("broken.js"), FileVariant::Plain).unwrap_err();
        assert!(matches!(err, EngineError::Parse { line: Some(_), .. }));
    }

    #[test]
    fn test_markup_in_plain_typescript_fails() {
        let source = "const App = () => <div>Hello</div>;";
        assert!(parse_source(source, Path::new("app.ts"), FileVariant::Typed).is_err());
    }
}
