use super::DependencyGraph;
use serde::Serialize;

/// A closed import cycle: the first and last entries are the same file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CircularDependency {
    pub cycle: Vec<String>,
}

impl CircularDependency {
    /// Number of distinct files in the cycle.
    pub fn len(&self) -> usize {
        self.cycle.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Depth-first cycle search over the graph arena.
///
/// `visited` is global to a run and is never cleared on backtrack, so a cycle
/// is reported only from the root whose search first reaches it. Cycles that
/// are only reachable through already-visited nodes from a later root are not
/// reported a second time.
#[derive(Debug, Default)]
pub struct CycleDetector {
    visited: Vec<bool>,
    on_stack: Vec<bool>,
    path: Vec<usize>,
}

impl CycleDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all per-run state and size it for `node_count` nodes.
    pub fn reset(&mut self, node_count: usize) {
        self.visited.clear();
        self.visited.resize(node_count, false);
        self.on_stack.clear();
        self.on_stack.resize(node_count, false);
        self.path.clear();
    }

    pub fn detect(&mut self, graph: &DependencyGraph) -> Vec<CircularDependency> {
        self.reset(graph.node_count());
        let mut cycles = Vec::new();

        for root in 0..graph.node_count() {
            if !self.visited[root] {
                self.search_from(graph, root, &mut cycles);
            }
        }

        cycles
    }

    fn enter(&mut self, node: usize) {
        self.visited[node] = true;
        self.on_stack[node] = true;
        self.path.push(node);
    }

    fn search_from(&mut self, graph: &DependencyGraph, root: usize, cycles: &mut Vec<CircularDependency>) {
        // (node, index of the next neighbor to try)
        let mut frames = vec![(root, 0usize)];
        self.enter(root);

        while let Some(frame) = frames.last_mut() {
            let node = frame.0;
            match graph.neighbors(node).get(frame.1).copied() {
                Some(next) => {
                    frame.1 += 1;
                    if !self.visited[next] {
                        self.enter(next);
                        frames.push((next, 0));
                    } else if self.on_stack[next] {
                        cycles.push(self.close_cycle(graph, next));
                    }
                }
                None => {
                    frames.pop();
                    self.on_stack[node] = false;
                    self.path.pop();
                }
            }
        }
    }

    /// Path slice from `start` to the current node, with `start` appended.
    fn close_cycle(&self, graph: &DependencyGraph, start: usize) -> CircularDependency {
        let from = self
            .path
            .iter()
            .position(|&n| n == start)
            .unwrap_or_default();
        let cycle = self.path[from..]
            .iter()
            .chain(std::iter::once(&start))
            .map(|&n| graph.file(n).to_string())
            .collect();
        CircularDependency { cycle }
    }
}
