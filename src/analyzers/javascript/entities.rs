//! Single-pass structural extraction.
//!
//! One pre-order walk collects functions, classes, components, hook calls,
//! imports, exports and routes. Function-like and class nodes open a frame;
//! markup and hook calls seen while frames are open are attributed to every
//! open frame, so a component's body includes its nested callbacks.

use super::classification::{
    is_component_name, is_create_element_call, is_hook_name, looks_like_auth,
};
use super::complexity;
use super::parser::SyntaxTree;
use super::routes::{call_chain_route, file_convention_routes};
use super::syntax::{
    call_arguments, callee, callee_text, field_text, has_child_kind, named_children, node_line,
    node_text, string_value, Construct,
};
use crate::config::EngineConfig;
use crate::core::{
    ClassEntity, ComponentEntity, ComponentShape, ExportEntry, ExportKind, ExtractionMode,
    FileEntities, FunctionEntity, FunctionKind, HookCall, ImportEdge, SourceSpan,
};
use std::collections::HashSet;
use tree_sitter::Node;

/// Higher-order calls whose callback takes the binding's name.
const COMPONENT_WRAPPERS: &[&str] = &["memo", "forwardRef", "observer"];

enum Step<'t> {
    Enter(Node<'t>),
    Exit,
}

enum FrameTarget {
    Function(usize),
    Class(usize),
}

struct Frame {
    target: FrameTarget,
    name: Option<String>,
    props: Vec<String>,
    has_markup: bool,
    hooks: Vec<String>,
}

struct EntityVisitor<'a> {
    source: &'a str,
    relative_path: &'a str,
    config: &'a EngineConfig,
    entities: FileEntities,
    frames: Vec<Frame>,
    seen_hooks: HashSet<(String, usize)>,
    mentions_auth: bool,
}

/// Extract every structural fact from a parsed file.
pub fn extract_entities(tree: &SyntaxTree, relative_path: &str, config: &EngineConfig) -> FileEntities {
    let mut visitor = EntityVisitor {
        source: &tree.source,
        relative_path,
        config,
        entities: FileEntities::empty(ExtractionMode::Full),
        frames: Vec::new(),
        seen_hooks: HashSet::new(),
        mentions_auth: false,
    };
    visitor.visit(tree.root());
    visitor.finish()
}

impl<'a> EntityVisitor<'a> {
    fn text(&self, node: &Node) -> &'a str {
        node_text(node, self.source)
    }

    /// Pre-order walk with an explicit stack; deeply nested expressions must
    /// not exhaust the worker thread's stack.
    fn visit<'t>(&mut self, root: Node<'t>) {
        let mut stack = vec![Step::Enter(root)];
        while let Some(step) = stack.pop() {
            let node = match step {
                Step::Enter(node) => node,
                Step::Exit => {
                    self.exit_frame();
                    continue;
                }
            };
            if self.enter(&node) {
                stack.push(Step::Exit);
            }
            let mut cursor = node.walk();
            let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev().map(Step::Enter));
        }
    }

    /// Record one node. Returns whether it opened a frame.
    fn enter(&mut self, node: &Node) -> bool {
        match Construct::of(node) {
            Construct::Function(kind) => {
                self.enter_function(node, kind);
                return true;
            }
            Construct::Class => {
                self.enter_class(node);
                return true;
            }
            Construct::Markup => self.mark_markup(),
            Construct::Call => self.on_call(node),
            Construct::Import => self.on_import(node),
            Construct::Export => self.on_export(node),
            Construct::Assignment => self.on_commonjs_export(node),
            Construct::Identifier => {
                if !self.mentions_auth && looks_like_auth(self.text(node)) {
                    self.mentions_auth = true;
                }
            }
            _ => {}
        }
        false
    }

    fn enter_function(&mut self, node: &Node, kind: FunctionKind) {
        let name = self.function_name(node, kind);
        let params = self.parameters(node);
        let props = self.props(node);
        let is_generator = node.kind().contains("generator") || has_child_kind(node, "*");

        let function = FunctionEntity {
            name: name.clone(),
            kind,
            is_async: has_child_kind(node, "async"),
            is_generator,
            metrics: complexity::measure(node, params.len(), &self.config.complexity),
            params,
            span: SourceSpan::from_node(node),
        };
        self.entities.functions.push(function);
        self.frames.push(Frame {
            target: FrameTarget::Function(self.entities.functions.len() - 1),
            name,
            props,
            has_markup: false,
            hooks: Vec::new(),
        });
    }

    fn enter_class(&mut self, node: &Node) {
        let name = field_text(node, "name", self.source)
            .map(str::to_string)
            .or_else(|| self.binding_name(node));
        let (methods, properties) = self.class_members(node);

        let class = ClassEntity {
            name: name.clone().unwrap_or_else(|| "<anonymous>".to_string()),
            superclass: self.superclass(node),
            methods,
            properties,
            span: SourceSpan::from_node(node),
        };
        self.entities.classes.push(class);
        self.frames.push(Frame {
            target: FrameTarget::Class(self.entities.classes.len() - 1),
            name,
            props: Vec::new(),
            has_markup: false,
            hooks: Vec::new(),
        });
    }

    fn exit_frame(&mut self) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        let Some(name) = frame.name else {
            return;
        };
        if !frame.has_markup || !is_component_name(&name) {
            return;
        }

        let (shape, span) = match frame.target {
            FrameTarget::Function(i) => (ComponentShape::Function, self.entities.functions[i].span),
            FrameTarget::Class(i) => (ComponentShape::Class, self.entities.classes[i].span),
        };
        self.entities.components.push(ComponentEntity {
            name,
            shape,
            props: frame.props,
            hooks: frame.hooks,
            span,
        });
    }

    fn mark_markup(&mut self) {
        for frame in &mut self.frames {
            frame.has_markup = true;
        }
    }

    fn on_call(&mut self, call: &Node) {
        let Some(target) = callee(call) else {
            return;
        };

        match target.kind() {
            "identifier" => {
                let name = self.text(&target);
                if name == "require" {
                    self.record_import_from_first_arg(call);
                } else if is_hook_name(name) {
                    self.record_hook(name, call);
                }
            }
            "import" => self.record_import_from_first_arg(call),
            _ => {}
        }

        if callee_text(call, self.source).is_some_and(is_create_element_call) {
            self.mark_markup();
        }

        if let Some(route) = call_chain_route(call, self.source, &self.config.routes) {
            self.entities.routes.push(route);
        }
    }

    fn record_hook(&mut self, name: &str, call: &Node) {
        let line = node_line(call);
        if self.seen_hooks.insert((name.to_string(), line)) {
            self.entities.hooks.push(HookCall {
                name: name.to_string(),
                line,
                argument_count: call_arguments(call).len(),
            });
        }
        for frame in &mut self.frames {
            if !frame.hooks.iter().any(|h| h == name) {
                frame.hooks.push(name.to_string());
            }
        }
    }

    fn record_import_from_first_arg(&mut self, call: &Node) {
        let args = call_arguments(call);
        if let Some(specifier) = args.first().and_then(|arg| string_value(arg, self.source)) {
            self.push_import(specifier, node_line(call));
        }
    }

    fn push_import(&mut self, specifier: &str, line: usize) {
        self.entities
            .imports
            .push(ImportEdge::new(self.relative_path, specifier, line));
    }

    fn on_import(&mut self, node: &Node) {
        if let Some(specifier) = node
            .child_by_field_name("source")
            .and_then(|source| string_value(&source, self.source))
        {
            self.push_import(specifier, node_line(node));
        }
    }

    fn on_export(&mut self, node: &Node) {
        let line = node_line(node);

        if let Some(specifier) = node
            .child_by_field_name("source")
            .and_then(|source| string_value(&source, self.source))
        {
            self.push_import(specifier, line);
            let clause = named_children(node)
                .into_iter()
                .find(|child| child.kind() == "export_clause");
            match clause {
                Some(clause) => {
                    for name in self.export_clause_names(&clause) {
                        self.push_export(name, ExportKind::ReExport, line);
                    }
                }
                None => {
                    let name = named_children(node)
                        .into_iter()
                        .find(|child| child.kind() == "namespace_export")
                        .and_then(|ns| ns.named_child(0))
                        .map(|id| self.text(&id).to_string())
                        .unwrap_or_else(|| "*".to_string());
                    self.push_export(name, ExportKind::NamespaceReExport, line);
                }
            }
            return;
        }

        if has_child_kind(node, "default") {
            let name = node
                .child_by_field_name("declaration")
                .and_then(|decl| field_text(&decl, "name", self.source))
                .or_else(|| {
                    node.child_by_field_name("value")
                        .filter(|value| value.kind() == "identifier")
                        .map(|value| self.text(&value))
                })
                .unwrap_or("default");
            self.push_export(name.to_string(), ExportKind::Default, line);
            return;
        }

        if let Some(declaration) = node.child_by_field_name("declaration") {
            for name in self.declared_names(&declaration) {
                self.push_export(name, ExportKind::Named, line);
            }
            return;
        }

        for clause in named_children(node)
            .into_iter()
            .filter(|child| child.kind() == "export_clause")
        {
            for name in self.export_clause_names(&clause) {
                self.push_export(name, ExportKind::Named, line);
            }
        }
    }

    /// `module.exports = x` and `exports.name = x`
    fn on_commonjs_export(&mut self, node: &Node) {
        let Some(left) = node.child_by_field_name("left") else {
            return;
        };
        let line = node_line(node);
        match self.text(&left) {
            "module.exports" => self.push_export("default".to_string(), ExportKind::Default, line),
            text => {
                let name = text
                    .strip_prefix("module.exports.")
                    .or_else(|| text.strip_prefix("exports."));
                if let Some(name) = name.filter(|n| !n.contains('.')) {
                    self.push_export(name.to_string(), ExportKind::Named, line);
                }
            }
        }
    }

    fn push_export(&mut self, name: String, kind: ExportKind, line: usize) {
        self.entities.exports.push(ExportEntry { name, kind, line });
    }

    fn export_clause_names(&self, clause: &Node) -> Vec<String> {
        named_children(clause)
            .into_iter()
            .filter(|spec| spec.kind() == "export_specifier")
            .filter_map(|spec| {
                spec.child_by_field_name("alias")
                    .or_else(|| spec.child_by_field_name("name"))
                    .map(|n| self.text(&n).to_string())
            })
            .collect()
    }

    fn declared_names(&self, declaration: &Node) -> Vec<String> {
        match declaration.kind() {
            "lexical_declaration" | "variable_declaration" => named_children(declaration)
                .into_iter()
                .filter(|child| child.kind() == "variable_declarator")
                .filter_map(|decl| decl.child_by_field_name("name"))
                .filter(|name| name.kind() == "identifier")
                .map(|name| self.text(&name).to_string())
                .collect(),
            _ => field_text(declaration, "name", self.source)
                .map(|name| vec![name.to_string()])
                .unwrap_or_default(),
        }
    }

    fn function_name(&self, node: &Node, kind: FunctionKind) -> Option<String> {
        let own = match kind {
            FunctionKind::Declaration | FunctionKind::Expression | FunctionKind::Method => {
                field_text(node, "name", self.source)
            }
            FunctionKind::Arrow => None,
        };
        own.map(str::to_string).or_else(|| self.binding_name(node))
    }

    /// Name a function or class expression takes from its surrounding binding.
    fn binding_name(&self, node: &Node) -> Option<String> {
        let mut current = *node;
        // memo(forwardRef(() => ...)) nests at most a couple of wrappers
        for _ in 0..4 {
            let parent = current.parent()?;
            match parent.kind() {
                "variable_declarator" => {
                    return parent
                        .child_by_field_name("name")
                        .filter(|name| name.kind() == "identifier")
                        .map(|name| self.text(&name).to_string());
                }
                "assignment_expression" => {
                    let left = parent.child_by_field_name("left")?;
                    return match left.kind() {
                        "identifier" => Some(self.text(&left).to_string()),
                        "member_expression" => {
                            field_text(&left, "property", self.source).map(str::to_string)
                        }
                        _ => None,
                    };
                }
                "pair" => {
                    let key = parent.child_by_field_name("key")?;
                    let name = string_value(&key, self.source).unwrap_or_else(|| self.text(&key));
                    return Some(name.to_string());
                }
                "field_definition" => {
                    return field_text(&parent, "property", self.source).map(str::to_string);
                }
                "public_field_definition" => {
                    return field_text(&parent, "name", self.source).map(str::to_string);
                }
                "parenthesized_expression" | "as_expression" | "satisfies_expression" => {
                    current = parent;
                }
                "arguments" => {
                    let call = parent.parent().filter(|p| p.kind() == "call_expression")?;
                    let wrapper = callee(&call).and_then(|target| match target.kind() {
                        "identifier" => Some(self.text(&target)),
                        "member_expression" => field_text(&target, "property", self.source),
                        _ => None,
                    })?;
                    if !COMPONENT_WRAPPERS.contains(&wrapper) {
                        return None;
                    }
                    current = call;
                }
                _ => return None,
            }
        }
        None
    }

    fn parameter_nodes<'t>(&self, function: &Node<'t>) -> Vec<Node<'t>> {
        if let Some(single) = function.child_by_field_name("parameter") {
            return vec![single];
        }
        function
            .child_by_field_name("parameters")
            .map(|params| named_children(&params))
            .unwrap_or_default()
    }

    fn parameters(&self, function: &Node) -> Vec<String> {
        self.parameter_nodes(function)
            .iter()
            .filter_map(|param| self.render_parameter(param))
            .collect()
    }

    fn render_parameter(&self, param: &Node) -> Option<String> {
        match param.kind() {
            "identifier" | "shorthand_property_identifier_pattern" => Some(self.text(param).to_string()),
            "object_pattern" => Some("{...}".to_string()),
            "array_pattern" => Some("[...]".to_string()),
            "rest_pattern" => {
                let inner = param
                    .named_child(0)
                    .map(|n| self.text(&n))
                    .unwrap_or("");
                Some(format!("...{inner}"))
            }
            "assignment_pattern" => param
                .child_by_field_name("left")
                .and_then(|left| self.render_parameter(&left)),
            "required_parameter" | "optional_parameter" => param
                .child_by_field_name("pattern")
                .and_then(|pattern| self.render_parameter(&pattern)),
            "this" => None,
            _ => Some(self.text(param).to_string()),
        }
    }

    /// Prop names: the fields of the first destructured parameter, or plain parameter names.
    fn props(&self, function: &Node) -> Vec<String> {
        let params = self.parameter_nodes(function);
        let patterns: Vec<Node> = params.iter().map(|p| unwrap_parameter(*p)).collect();

        if let Some(object) = patterns.iter().find(|p| p.kind() == "object_pattern") {
            return self.object_pattern_fields(object);
        }
        patterns
            .iter()
            .filter(|p| p.kind() == "identifier")
            .map(|p| self.text(p).to_string())
            .collect()
    }

    fn object_pattern_fields(&self, pattern: &Node) -> Vec<String> {
        named_children(pattern)
            .into_iter()
            .filter_map(|field| match field.kind() {
                "shorthand_property_identifier_pattern" => Some(self.text(&field).to_string()),
                "pair_pattern" => field_text(&field, "key", self.source).map(str::to_string),
                "object_assignment_pattern" => {
                    field_text(&field, "left", self.source).map(str::to_string)
                }
                "rest_pattern" => self.render_parameter(&field),
                _ => None,
            })
            .collect()
    }

    fn superclass(&self, class: &Node) -> Option<String> {
        let heritage = named_children(class)
            .into_iter()
            .find(|child| child.kind() == "class_heritage")?;

        let first = heritage.named_child(0)?;
        match first.kind() {
            "extends_clause" => field_text(&first, "value", self.source).map(str::to_string),
            "implements_clause" => None,
            _ => Some(self.text(&first).to_string()),
        }
    }

    fn class_members(&self, class: &Node) -> (Vec<String>, Vec<String>) {
        let mut methods = Vec::new();
        let mut properties = Vec::new();
        let Some(body) = class.child_by_field_name("body") else {
            return (methods, properties);
        };

        for member in named_children(&body) {
            match member.kind() {
                "method_definition" | "method_signature" | "abstract_method_signature" => {
                    if let Some(name) = field_text(&member, "name", self.source) {
                        methods.push(name.to_string());
                    }
                }
                "field_definition" => {
                    if let Some(name) = field_text(&member, "property", self.source) {
                        properties.push(name.to_string());
                    }
                }
                "public_field_definition" => {
                    if let Some(name) = field_text(&member, "name", self.source) {
                        properties.push(name.to_string());
                    }
                }
                _ => {}
            }
        }
        (methods, properties)
    }

    fn finish(mut self) -> FileEntities {
        let routes = file_convention_routes(
            self.relative_path,
            &self.entities.exports,
            self.mentions_auth,
            &self.config.routes,
        );
        self.entities.routes.extend(routes);
        self.entities
            .components
            .sort_by(|a, b| a.span.start_line.cmp(&b.span.start_line).then(a.name.cmp(&b.name)));
        self.entities
    }
}

/// Strip default values and TypeScript wrappers down to the binding pattern.
fn unwrap_parameter(param: Node) -> Node {
    match param.kind() {
        "assignment_pattern" => param
            .child_by_field_name("left")
            .map(unwrap_parameter)
            .unwrap_or(param),
        "required_parameter" | "optional_parameter" => param
            .child_by_field_name("pattern")
            .map(unwrap_parameter)
            .unwrap_or(param),
        _ => param,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::javascript::parser::parse_source;
    use crate::core::{FileVariant, RouteOrigin};
    use indoc::indoc;
    use std::path::Path;

    fn extract(source: &str, path: &str) -> FileEntities {
        let variant = FileVariant::from_path(Path::new(path)).unwrap();
        let tree = parse_source(source, Path::new(path), variant).unwrap();
        extract_entities(&tree, path, &EngineConfig::default())
    }

    #[test]
    fn test_function_forms() {
        let entities = extract(
            indoc! {"
                async function load(id, { force }, [first], ...rest) {}
                const add = (a, b = 2) => a + b;
                const double = x => x * 2;
                const gen = function* () {};
                const obj = { method() {} };
            "},
            "src/util.js",
        );

        let names: Vec<_> = entities.functions.iter().map(|f| f.display_name()).collect();
        assert_eq!(names, vec!["load", "add", "double", "gen", "method"]);

        let load = &entities.functions[0];
        assert_eq!(load.kind, FunctionKind::Declaration);
        assert!(load.is_async);
        assert_eq!(load.params, vec!["id", "{...}", "[...]", "...rest"]);

        assert_eq!(entities.functions[1].kind, FunctionKind::Arrow);
        assert_eq!(entities.functions[1].params, vec!["a", "b"]);
        assert_eq!(entities.functions[2].params, vec!["x"]);
        assert!(entities.functions[3].is_generator);
        assert_eq!(entities.functions[4].kind, FunctionKind::Method);
    }

    #[test]
    fn test_typescript_parameters() {
        let entities = extract(
            "function greet(name: string, count?: number, ...tags: string[]) {}",
            "src/greet.ts",
        );
        assert_eq!(entities.functions[0].params, vec!["name", "count", "...tags"]);
    }

    #[test]
    fn test_class_entity() {
        let entities = extract(
            indoc! {"
                class Store extends Base {
                  items = [];
                  add(item) { this.items.push(item); }
                  get size() { return this.items.length; }
                }
            "},
            "src/store.js",
        );
        let class = &entities.classes[0];
        assert_eq!(class.name, "Store");
        assert_eq!(class.superclass.as_deref(), Some("Base"));
        assert_eq!(class.methods, vec!["add", "size"]);
        assert_eq!(class.properties, vec!["items"]);
        assert!(entities.components.is_empty());
    }

    #[test]
    fn test_components_and_hooks() {
        let entities = extract(
            indoc! {"
                import React, { useState } from 'react';

                export function Counter({ initial, step = 1 }) {
                  const [count, setCount] = useState(initial);
                  useEffect(() => { document.title = count; }, [count]);
                  return <button onClick={() => setCount(count + step)}>{count}</button>;
                }

                const Label = memo((props) => React.createElement('span', null, props.text));

                function helper() { return <div />; }

                class Panel extends React.Component {
                  render() { return <section />; }
                }
            "},
            "src/Counter.jsx",
        );

        let names: Vec<_> = entities.components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Counter", "Label", "Panel"]);

        let counter = &entities.components[0];
        assert_eq!(counter.shape, ComponentShape::Function);
        assert_eq!(counter.props, vec!["initial", "step"]);
        assert_eq!(counter.hooks, vec!["useState", "useEffect"]);

        assert_eq!(entities.components[1].props, vec!["props"]);
        assert_eq!(entities.components[2].shape, ComponentShape::Class);
        assert!(entities.components[2].props.is_empty());

        let hooks: Vec<_> = entities.hooks.iter().map(|h| (h.name.as_str(), h.argument_count)).collect();
        assert_eq!(hooks, vec![("useState", 1), ("useEffect", 2)]);
    }

    #[test]
    fn test_import_forms() {
        let entities = extract(
            indoc! {"
                import a from './a';
                import './styles.css';
                const b = require('../b');
                const c = await import('./c');
                export { d } from './d';
                export * from 'lodash';
            "},
            "src/index.mjs",
        );

        let specifiers: Vec<_> = entities
            .imports
            .iter()
            .map(|i| (i.specifier.as_str(), i.is_relative, i.line))
            .collect();
        assert_eq!(
            specifiers,
            vec![
                ("./a", true, 1),
                ("./styles.css", true, 2),
                ("../b", true, 3),
                ("./c", true, 4),
                ("./d", true, 5),
                ("lodash", false, 6),
            ]
        );
        assert!(entities.imports.iter().all(|i| i.from_file == "src/index.mjs"));
    }

    #[test]
    fn test_export_forms() {
        let entities = extract(
            indoc! {"
                export const a = 1, b = 2;
                export function c() {}
                export default class Widget {}
                const x = 1;
                export { x as y };
                export * as utils from './utils';
            "},
            "src/mod.js",
        );
        let exports: Vec<_> = entities
            .exports
            .iter()
            .map(|e| (e.name.as_str(), e.kind))
            .collect();
        assert_eq!(
            exports,
            vec![
                ("a", ExportKind::Named),
                ("b", ExportKind::Named),
                ("c", ExportKind::Named),
                ("Widget", ExportKind::Default),
                ("y", ExportKind::Named),
                ("utils", ExportKind::NamespaceReExport),
            ]
        );
    }

    #[test]
    fn test_commonjs_exports() {
        let entities = extract(
            "exports.handler = () => {};\nmodule.exports = { a: 1 };",
            "lib/index.cjs",
        );
        let exports: Vec<_> = entities.exports.iter().map(|e| (e.name.as_str(), e.kind)).collect();
        assert_eq!(
            exports,
            vec![("handler", ExportKind::Named), ("default", ExportKind::Default)]
        );
        assert_eq!(entities.functions[0].display_name(), "handler");
    }

    #[test]
    fn test_file_convention_routes() {
        let entities = extract(
            indoc! {"
                import { getServerSession } from 'next-auth';

                export async function GET(request) {
                  return Response.json([]);
                }

                export const POST = async (request) => {
                  return Response.json({});
                };
            "},
            "app/api/users/[id]/route.ts",
        );

        let routes: Vec<_> = entities
            .routes
            .iter()
            .map(|r| (r.method.as_str(), r.path.as_str(), r.origin, r.protected))
            .collect();
        assert_eq!(
            routes,
            vec![
                ("GET", "/api/users/:id", RouteOrigin::FileConvention, true),
                ("POST", "/api/users/:id", RouteOrigin::FileConvention, true),
            ]
        );
    }

    #[test]
    fn test_call_chain_routes() {
        let entities = extract(
            indoc! {"
                const router = express.Router();
                router.get('/items', listItems);
                router.delete('/items/:id', verifyToken, removeItem);
            "},
            "server/routes.js",
        );
        let routes: Vec<_> = entities
            .routes
            .iter()
            .map(|r| (r.method.as_str(), r.path.as_str(), r.line, r.protected))
            .collect();
        assert_eq!(
            routes,
            vec![("GET", "/items", 2, false), ("DELETE", "/items/:id", 3, true)]
        );
    }
}
