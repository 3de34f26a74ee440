// Performance pattern detection for JavaScript/TypeScript

use super::{ancestor_pairs, is_iteration_call, is_iteration_callback, is_loop_body};
use crate::analyzers::javascript::syntax::{
    call_arguments, called_name, callee_text, named_children, node_line, Construct,
};
use crate::config::PerformanceThresholds;
use crate::core::{Finding, FindingKind, Severity};
use tree_sitter::Node;

const DOM_QUERY_METHODS: &[&str] = &["querySelector", "querySelectorAll", "getElementById"];

fn is_dom_query(name: &str) -> bool {
    DOM_QUERY_METHODS.contains(&name) || name.starts_with("getElementsBy")
}

/// Inspect one node for performance anti-patterns.
pub fn inspect(
    node: &Node,
    source: &str,
    file: &str,
    thresholds: &PerformanceThresholds,
    findings: &mut Vec<Finding>,
) {
    let construct = Construct::of(node);

    if construct.is_loop() || is_iteration_call(node, source) {
        let nested = ancestor_pairs(*node).any(|(ancestor, via)| {
            is_loop_body(&ancestor, &via) || is_iteration_callback(&ancestor, &via, source)
        });
        if nested {
            findings.push(Finding::new(
                FindingKind::NestedIteration,
                Severity::Medium,
                file,
                node_line(node),
                "Nested iteration has O(n²) cost",
                "Index the inner collection in a Map or Set before iterating",
            ));
        }
    }

    match construct {
        Construct::Call => inspect_call(node, source, file, findings),
        Construct::Array => {
            let elements = named_children(node).len();
            if elements > thresholds.large_array_elements {
                findings.push(Finding::new(
                    FindingKind::LargeArrayLiteral,
                    Severity::Low,
                    file,
                    node_line(node),
                    format!("Array literal with {elements} elements"),
                    "Load large data sets from a separate JSON file or fetch them lazily",
                ));
            }
        }
        _ => {}
    }
}

fn inspect_call(call: &Node, source: &str, file: &str, findings: &mut Vec<Finding>) {
    if let Some(name) = called_name(call, source).filter(|name| is_dom_query(name)) {
        let in_loop = ancestor_pairs(*call).any(|(ancestor, via)| is_loop_body(&ancestor, &via));
        if in_loop {
            findings.push(Finding::new(
                FindingKind::DomQueryInLoop,
                Severity::High,
                file,
                node_line(call),
                format!("DOM query {name}() repeated on every loop iteration"),
                "Query the element once before the loop and reuse it",
            ));
        }
        return;
    }

    if callee_text(call, source) == Some("JSON.parse") {
        let clones = call_arguments(call)
            .first()
            .is_some_and(|arg| arg.kind() == "call_expression" && callee_text(arg, source) == Some("JSON.stringify"));
        if clones {
            findings.push(Finding::new(
                FindingKind::DeepClone,
                Severity::Medium,
                file,
                node_line(call),
                "JSON.parse(JSON.stringify(...)) used as a deep clone",
                "Use structuredClone() or copy only the fields that change",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::javascript::detectors::for_each_node;
    use crate::analyzers::javascript::parser::parse_source;
    use crate::core::FileVariant;
    use std::path::Path;

    fn scan_with(source: &str, thresholds: &PerformanceThresholds) -> Vec<Finding> {
        let tree = parse_source(source, Path::new("app.js"), FileVariant::Plain).unwrap();
        let mut findings = Vec::new();
        for_each_node(tree.root(), |node| {
            inspect(&node, source, "app.js", thresholds, &mut findings)
        });
        findings
    }

    fn scan(source: &str) -> Vec<Finding> {
        scan_with(source, &PerformanceThresholds::default())
    }

    #[test]
    fn test_nested_loops() {
        let findings = scan("for (const a of xs) {\n  for (const b of ys) { f(a, b); }\n}");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::NestedIteration);
        assert_eq!(findings[0].line, 2);
    }

    #[test]
    fn test_iteration_call_inside_callback() {
        let findings = scan("users.forEach(u => {\n  const match = orders.filter(o => o.user === u.id);\n});");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Medium);
        assert_eq!(findings[0].line, 2);
    }

    #[test]
    fn test_single_loop_is_fine() {
        assert!(scan("for (let i = 0; i < n; i++) { total += i; }\nxs.map(f).filter(g);").is_empty());
    }

    #[test]
    fn test_dom_query_in_loop() {
        let findings = scan("for (const id of ids) {\n  document.getElementById(id).hidden = true;\n}\ndocument.querySelector('#app');");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::DomQueryInLoop);
        assert_eq!(findings[0].severity, Severity::High);
    }

    #[test]
    fn test_deep_clone() {
        let findings = scan("const copy = JSON.parse(JSON.stringify(state));\nconst data = JSON.parse(text);");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::DeepClone);
    }

    #[test]
    fn test_large_array_threshold() {
        let thresholds = PerformanceThresholds {
            large_array_elements: 3,
        };
        let findings = scan_with("const a = [1, 2, 3];\nconst b = [1, 2, 3, 4];", &thresholds);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::LargeArrayLiteral);
        assert_eq!(findings[0].line, 2);
    }
}
