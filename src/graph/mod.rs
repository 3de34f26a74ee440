//! Inter-file dependency graph.
//!
//! Nodes are project files (relative paths), stored in an arena and addressed
//! by index. Only relative import specifiers become edges; everything else is
//! collected into the external dependency set. Specifiers are normalized
//! lexically and matched by stem: `./b` matches `b.js`, `b.tsx` or `b/index.ts`.
//! No package resolution is attempted.

mod circular;

pub use circular::{CircularDependency, CycleDetector};

use crate::core::{FileVariant, ImportEdge};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCoupling {
    pub file: String,
    pub dependencies: Vec<String>,
    pub dependents: Vec<String>,
    pub fan_in: usize,
    pub fan_out: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    files: Vec<String>,
    by_stem: HashMap<String, usize>,
    edges: Vec<Vec<usize>>,
    external: BTreeSet<String>,
    unresolved: Vec<ImportEdge>,
}

impl DependencyGraph {
    /// Build the graph for `files` from every import edge collected in the run.
    ///
    /// Files are ordered lexicographically so node indices, edge order and
    /// therefore cycle output do not depend on the order files finished in.
    pub fn build<'a>(
        files: impl IntoIterator<Item = &'a str>,
        imports: impl IntoIterator<Item = &'a ImportEdge>,
    ) -> Self {
        let mut files: Vec<String> = files.into_iter().map(str::to_string).collect();
        files.sort();
        files.dedup();

        let mut by_stem = HashMap::with_capacity(files.len());
        for (index, file) in files.iter().enumerate() {
            // First file wins when `a.js` and `a.ts` share a stem
            by_stem.entry(file_stem(file)).or_insert(index);
        }

        let mut graph = Self {
            edges: vec![Vec::new(); files.len()],
            files,
            by_stem,
            external: BTreeSet::new(),
            unresolved: Vec::new(),
        };

        for edge in imports {
            graph.add_import(edge);
        }
        for targets in &mut graph.edges {
            targets.sort_unstable();
            targets.dedup();
        }
        graph
    }

    fn add_import(&mut self, edge: &ImportEdge) {
        if !edge.is_relative {
            self.external.insert(package_name(&edge.specifier).to_string());
            return;
        }

        let from = self.files.binary_search(&edge.from_file).ok();
        let to = normalize_specifier(&edge.from_file, &edge.specifier).and_then(|target| {
            self.by_stem
                .get(&target)
                .or_else(|| self.by_stem.get(&format!("{target}/index")))
                .copied()
        });

        match (from, to) {
            (Some(from), Some(to)) => self.edges[from].push(to),
            _ => {
                tracing::debug!(
                    file = edge.from_file.as_str(),
                    specifier = edge.specifier.as_str(),
                    "Relative import does not match a project file"
                );
                self.unresolved.push(edge.clone());
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.files.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }

    pub fn file(&self, index: usize) -> &str {
        &self.files[index]
    }

    pub fn neighbors(&self, index: usize) -> &[usize] {
        &self.edges[index]
    }

    /// External package names, e.g. `react` or `@scope/pkg`.
    pub fn external_dependencies(&self) -> &BTreeSet<String> {
        &self.external
    }

    /// Relative imports whose target is not among the analyzed files.
    pub fn unresolved_imports(&self) -> &[ImportEdge] {
        &self.unresolved
    }

    /// File → files it imports.
    pub fn adjacency(&self) -> BTreeMap<String, Vec<String>> {
        self.files
            .iter()
            .zip(&self.edges)
            .map(|(file, targets)| (file.clone(), self.names(targets)))
            .collect()
    }

    pub fn detect_cycles(&self) -> Vec<CircularDependency> {
        CycleDetector::new().detect(self)
    }

    /// Dependencies and dependents of every file, in file order.
    pub fn coupling(&self) -> Vec<FileCoupling> {
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.files.len()];
        for (from, targets) in self.edges.iter().enumerate() {
            for &to in targets.iter().filter(|&&to| to != from) {
                dependents[to].push(from);
            }
        }

        self.files
            .iter()
            .enumerate()
            .map(|(index, file)| {
                let dependencies = self.names(&self.edges[index]);
                let dependents = self.names(&dependents[index]);
                FileCoupling {
                    file: file.clone(),
                    fan_in: dependents.len(),
                    fan_out: dependencies.len(),
                    dependencies,
                    dependents,
                }
            })
            .collect()
    }

    fn names(&self, indices: &[usize]) -> Vec<String> {
        indices.iter().map(|&i| self.files[i].clone()).collect()
    }
}

/// Relative path without a JavaScript-family extension.
pub fn file_stem(path: &str) -> String {
    let has_source_extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(FileVariant::from_extension)
        .is_some();
    match path.rfind('.') {
        Some(dot) if has_source_extension => path[..dot].to_string(),
        _ => path.to_string(),
    }
}

/// Resolve `specifier` against the directory of `from_file` without touching
/// the filesystem. Returns `None` when the path climbs above the project root.
pub fn normalize_specifier(from_file: &str, specifier: &str) -> Option<String> {
    let mut segments: Vec<&str> = from_file.split('/').collect();
    segments.pop();

    for part in specifier.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            part => segments.push(part),
        }
    }

    Some(file_stem(&segments.join("/")))
}

/// Package portion of a bare specifier: `lodash/fp` → `lodash`, `@a/b/c` → `@a/b`.
fn package_name(specifier: &str) -> &str {
    let mut parts = specifier.splitn(3, '/');
    let first = parts.next().unwrap_or(specifier);
    match (first.starts_with('@'), parts.next()) {
        (true, Some(second)) => &specifier[..first.len() + 1 + second.len()],
        _ => first,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn edge(from: &str, specifier: &str) -> ImportEdge {
        ImportEdge::new(from, specifier, 1)
    }

    #[test]
    fn test_normalize_specifier() {
        assert_eq!(normalize_specifier("src/a.js", "./b").as_deref(), Some("src/b"));
        assert_eq!(
            normalize_specifier("src/pages/home.tsx", "../lib/api.ts").as_deref(),
            Some("src/lib/api")
        );
        assert_eq!(normalize_specifier("a.js", "./b/../c").as_deref(), Some("c"));
        assert_eq!(normalize_specifier("a.js", "../outside"), None);
    }

    #[test]
    fn test_stem_matching_and_index_files() {
        let files = ["src/a.js", "src/b.tsx", "src/utils/index.ts"];
        let imports = [edge("src/a.js", "./b"), edge("src/a.js", "./utils"), edge("src/b.tsx", "./a.js")];
        let graph = DependencyGraph::build(files, &imports);

        let adjacency = graph.adjacency();
        assert_eq!(adjacency["src/a.js"], vec!["src/b.tsx", "src/utils/index.ts"]);
        assert_eq!(adjacency["src/b.tsx"], vec!["src/a.js"]);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_external_and_unresolved() {
        let files = ["src/a.js"];
        let imports = [
            edge("src/a.js", "react"),
            edge("src/a.js", "@tanstack/query/core"),
            edge("src/a.js", "lodash/fp"),
            edge("src/a.js", "./missing"),
            edge("src/a.js", "./styles.css"),
        ];
        let graph = DependencyGraph::build(files, &imports);

        let external: Vec<_> = graph.external_dependencies().iter().cloned().collect();
        assert_eq!(external, vec!["@tanstack/query", "lodash", "react"]);
        assert_eq!(graph.unresolved_imports().len(), 2);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_duplicate_imports_collapse() {
        let files = ["a.js", "b.js"];
        let imports = [edge("a.js", "./b"), edge("a.js", "./b.js")];
        let graph = DependencyGraph::build(files, &imports);
        assert_eq!(graph.neighbors(0), &[1]);
    }

    #[test]
    fn test_coupling() {
        let files = ["a.js", "b.js", "c.js", "d.js"];
        let imports = [
            edge("a.js", "./b"),
            edge("a.js", "./c"),
            edge("b.js", "./c"),
            edge("d.js", "./a"),
        ];
        let graph = DependencyGraph::build(files, &imports);
        let coupling = graph.coupling();

        let a = &coupling[0];
        assert_eq!(a.fan_out, 2);
        assert_eq!(a.dependents, vec!["d.js"]);
        let c = &coupling[2];
        assert_eq!(c.fan_in, 2);
        assert_eq!(c.fan_out, 0);
    }
}
