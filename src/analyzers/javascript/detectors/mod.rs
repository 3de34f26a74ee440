// JavaScript/TypeScript detector infrastructure
// AST detectors walk the tree once; line detectors also run on degraded files.

pub mod performance;
pub mod secrets;
pub mod security;

use super::parser::SyntaxTree;
use super::syntax::{called_name, callee, Construct};
use crate::config::EngineConfig;
use crate::core::Finding;
use tree_sitter::Node;

pub use secrets::SecretScanner;

/// Calls whose callback runs once per element.
const ITERATION_METHODS: &[&str] = &["map", "forEach", "filter"];

/// Visit every node in pre-order without recursion.
pub fn for_each_node<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        visit(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// Ancestors of `node`, each paired with the child the path came through.
pub fn ancestor_pairs<'t>(node: Node<'t>) -> impl Iterator<Item = (Node<'t>, Node<'t>)> {
    std::iter::successors(node.parent().map(|parent| (parent, node)), |(parent, _)| {
        parent.parent().map(|grand| (grand, *parent))
    })
}

/// `xs.map(...)`, `xs.forEach(...)` or `xs.filter(...)`.
pub fn is_iteration_call(node: &Node, source: &str) -> bool {
    Construct::of(node) == Construct::Call
        && callee(node).is_some_and(|target| target.kind() == "member_expression")
        && called_name(node, source).is_some_and(|name| ITERATION_METHODS.contains(&name))
}

/// Whether `via` is the body of loop statement `ancestor`.
pub fn is_loop_body(ancestor: &Node, via: &Node) -> bool {
    Construct::of(ancestor).is_loop() && ancestor.child_by_field_name("body").as_ref() == Some(via)
}

/// Whether `via` is the argument list of iteration call `ancestor`.
pub fn is_iteration_callback(ancestor: &Node, via: &Node, source: &str) -> bool {
    is_iteration_call(ancestor, source)
        && ancestor.child_by_field_name("arguments").as_ref() == Some(via)
}

/// All AST findings for a parsed file.
pub fn scan_syntax(tree: &SyntaxTree, relative_path: &str, config: &EngineConfig) -> Vec<Finding> {
    let source = tree.source.as_str();
    let mut findings = Vec::new();
    for_each_node(tree.root(), |node| {
        security::inspect(&node, source, relative_path, &mut findings);
        performance::inspect(&node, source, relative_path, &config.performance, &mut findings);
    });
    findings
}

/// Line-based findings; these also run when the syntax tree is unavailable.
pub fn scan_lines(source: &str, relative_path: &str, secrets: &SecretScanner) -> Vec<Finding> {
    let mut findings = secrets.scan(source, relative_path);
    findings.extend(security::scan_insecure_tokens(source, relative_path));
    findings
}
