//! Regex-only extraction for files the parser rejects.
//!
//! Produces a strict subset of the syntax-tree extraction: import sources,
//! function and class names, and a heuristic component guess. Every function
//! carries the complexity floor since no control flow is available.

use super::classification::is_component_name;
use crate::complexity::ComplexityMetrics;
use crate::core::{
    ClassEntity, ComponentEntity, ComponentShape, ExtractionMode, FileEntities, FunctionEntity,
    FunctionKind, ImportEdge, SourceSpan,
};
use once_cell::sync::Lazy;
use regex::Regex;

static IMPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*(?:import|export)\b[^'"`]*?\bfrom\s*['"]([^'"]+)['"]"#)
        .expect("import-from pattern is valid")
});

static SIDE_EFFECT_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*import\s*['"]([^'"]+)['"]"#).expect("side-effect import pattern is valid")
});

static CALL_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b(?:require|import)\s*\(\s*['"]([^'"]+)['"]\s*\)"#)
        .expect("require pattern is valid")
});

static FUNCTION_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:export\s+)?(?:default\s+)?(async\s+)?function\s*(\*)?\s*([A-Za-z_$][\w$]*)")
        .expect("function pattern is valid")
});

static ARROW_BINDING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*(?::[^=]+)?=\s*(async\s+)?(?:function\b|\([^)]*\)\s*(?::[^=]+)?=>|[A-Za-z_$][\w$]*\s*=>)",
    )
    .expect("arrow pattern is valid")
});

static CLASS_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+([A-Za-z_$][\w$]*)(?:\s+extends\s+([A-Za-z_$][\w$.]*))?")
        .expect("class pattern is valid")
});

static MARKUP_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[A-Za-z][\w.]*[\s/>]|</>|<>|\b(?:React\.)?createElement\s*\(")
        .expect("markup pattern is valid")
});

/// Extract what the line patterns can see.
pub fn extract_degraded(source: &str, relative_path: &str) -> FileEntities {
    let mut entities = FileEntities::empty(ExtractionMode::Degraded);
    let has_markup = MARKUP_HINT.is_match(source);

    for (index, line) in source.lines().enumerate() {
        let line_no = index + 1;

        if let Some(caps) = IMPORT_FROM
            .captures(line)
            .or_else(|| SIDE_EFFECT_IMPORT.captures(line))
        {
            entities
                .imports
                .push(ImportEdge::new(relative_path, &caps[1], line_no));
        } else {
            for caps in CALL_IMPORT.captures_iter(line) {
                entities
                    .imports
                    .push(ImportEdge::new(relative_path, &caps[1], line_no));
            }
        }

        if let Some(caps) = FUNCTION_DECL.captures(line) {
            entities.functions.push(degraded_function(
                &caps[3],
                FunctionKind::Declaration,
                caps.get(1).is_some(),
                caps.get(2).is_some(),
                line_no,
            ));
        } else if let Some(caps) = ARROW_BINDING.captures(line) {
            let kind = if caps[0].contains("=>") {
                FunctionKind::Arrow
            } else {
                FunctionKind::Expression
            };
            entities.functions.push(degraded_function(
                &caps[1],
                kind,
                caps.get(2).is_some(),
                false,
                line_no,
            ));
        }

        if let Some(caps) = CLASS_DECL.captures(line) {
            entities.classes.push(ClassEntity {
                name: caps[1].to_string(),
                superclass: caps.get(2).map(|m| m.as_str().to_string()),
                methods: Vec::new(),
                properties: Vec::new(),
                span: SourceSpan::new(line_no, line_no),
            });
        }
    }

    if has_markup {
        let functions = entities
            .functions
            .iter()
            .filter_map(|f| f.name.as_deref().map(|n| (n, ComponentShape::Function, f.span)));
        let classes = entities
            .classes
            .iter()
            .map(|c| (c.name.as_str(), ComponentShape::Class, c.span));
        let mut components: Vec<ComponentEntity> = functions
            .chain(classes)
            .filter(|(name, _, _)| is_component_name(name))
            .map(|(name, shape, span)| ComponentEntity {
                name: name.to_string(),
                shape,
                props: Vec::new(),
                hooks: Vec::new(),
                span,
            })
            .collect();
        components.sort_by_key(|c| c.span.start_line);
        entities.components = components;
    }

    entities
}

fn degraded_function(
    name: &str,
    kind: FunctionKind,
    is_async: bool,
    is_generator: bool,
    line: usize,
) -> FunctionEntity {
    FunctionEntity {
        name: Some(name.to_string()),
        kind,
        is_async,
        is_generator,
        params: Vec::new(),
        span: SourceSpan::new(line, line),
        metrics: ComplexityMetrics {
            lines_of_code: 1,
            ..ComplexityMetrics::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const BROKEN: &str = indoc! {r#"
        import React from 'react';
        import './global.css';
        const api = require("../api");
        export async function loadUsers() {
        export const UserList = ({ users }) => <ul>{users.map(
        class Store extends BaseStore {
        const lazy = import('./Lazy');
    "#};

    #[test]
    fn test_imports() {
        let entities = extract_degraded(BROKEN, "src/UserList.jsx");
        let specifiers: Vec<_> = entities.imports.iter().map(|i| i.specifier.as_str()).collect();
        assert_eq!(specifiers, vec!["react", "./global.css", "../api", "./Lazy"]);
        assert!(entities.is_degraded());
    }

    #[test]
    fn test_function_and_class_names() {
        let entities = extract_degraded(BROKEN, "src/UserList.jsx");
        let names: Vec<_> = entities.functions.iter().map(|f| f.display_name()).collect();
        assert_eq!(names, vec!["loadUsers", "UserList"]);
        assert!(entities.functions[0].is_async);
        assert_eq!(entities.functions[1].kind, FunctionKind::Arrow);
        assert_eq!(entities.functions[1].metrics.cyclomatic, 1);

        assert_eq!(entities.classes[0].name, "Store");
        assert_eq!(entities.classes[0].superclass.as_deref(), Some("BaseStore"));
    }

    #[test]
    fn test_component_heuristic() {
        let entities = extract_degraded(BROKEN, "src/UserList.jsx");
        let names: Vec<_> = entities.components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["UserList", "Store"]);

        let plain = extract_degraded("function Widget() { return 1 +; }", "w.js");
        assert!(plain.components.is_empty());
    }
}
