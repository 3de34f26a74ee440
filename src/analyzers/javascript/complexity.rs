//! Complexity walk over a function-like node.
//!
//! Nested callbacks are part of the enclosing function's body and count
//! towards its metrics as well as their own.

use super::syntax::Construct;
use crate::complexity::ComplexityMetrics;
use crate::config::ComplexityThresholds;
use crate::core::SourceSpan;
use tree_sitter::Node;

#[derive(Debug, Default)]
struct Counts {
    decisions: u32,
    cognitive: u32,
    max_nesting: u32,
}

/// Compute metrics for a function node.
pub fn measure(
    function: &Node,
    param_count: usize,
    thresholds: &ComplexityThresholds,
) -> ComplexityMetrics {
    let mut counts = Counts::default();
    let mut cursor = function.walk();
    let children: Vec<Node> = function.children(&mut cursor).collect();
    walk(children, &mut counts);

    let mut metrics = ComplexityMetrics {
        cyclomatic: 1 + counts.decisions,
        cognitive: counts.cognitive,
        max_nesting: counts.max_nesting,
        lines_of_code: SourceSpan::from_node(function).line_count(),
        param_count,
        warnings: Vec::new(),
    };
    metrics.apply_thresholds(thresholds);
    metrics
}

/// Depth-first count over `roots` with an explicit stack.
fn walk(roots: Vec<Node>, counts: &mut Counts) {
    let mut stack: Vec<(Node, u32)> = roots.into_iter().map(|node| (node, 0)).collect();

    while let Some((node, depth)) = stack.pop() {
        let mut child_depth = depth;

        if let Construct::Branch(branch) = Construct::of(&node) {
            if branch.is_decision() {
                counts.decisions += 1;
            }
            if branch.nests() {
                counts.cognitive += 1 + depth;
                child_depth = depth + 1;
                counts.max_nesting = counts.max_nesting.max(child_depth);
            }
        }

        let mut cursor = node.walk();
        stack.extend(node.children(&mut cursor).map(|child| (child, child_depth)));
    }
}
