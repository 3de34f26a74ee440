//! Node-kind classification and small tree-sitter accessors.
//!
//! Every walker in this module tree switches on [`Construct`] instead of raw
//! kind strings, so the grammar differences between the JavaScript and
//! TypeScript parsers are resolved in one place.

use crate::core::FunctionKind;
use tree_sitter::Node;

/// Control-flow constructs that count towards complexity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    If,
    Switch,
    Case,
    DefaultCase,
    While,
    Do,
    For,
    ForIn,
    Catch,
    Ternary,
    /// `&&` or `||`
    Logical,
}

impl Branch {
    /// Whether the construct adds a path to cyclomatic complexity.
    pub fn is_decision(self) -> bool {
        !matches!(self, Branch::Switch | Branch::DefaultCase)
    }

    /// Whether the construct costs `1 + depth` and opens a nesting level.
    pub fn nests(self) -> bool {
        matches!(
            self,
            Branch::If
                | Branch::Switch
                | Branch::While
                | Branch::Do
                | Branch::For
                | Branch::ForIn
                | Branch::Catch
        )
    }

    pub fn is_loop(self) -> bool {
        matches!(self, Branch::While | Branch::Do | Branch::For | Branch::ForIn)
    }
}

/// Closed classification of the node kinds the analyzers care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Construct {
    Function(FunctionKind),
    Class,
    Call,
    New,
    Member,
    Import,
    Export,
    Assignment,
    Declarator,
    Branch(Branch),
    Markup,
    MarkupAttribute,
    Str,
    Template,
    Array,
    Identifier,
    Other,
}

impl Construct {
    pub fn of(node: &Node) -> Self {
        match node.kind() {
            "function_declaration" | "generator_function_declaration" => {
                Construct::Function(FunctionKind::Declaration)
            }
            "function_expression" | "function" | "generator_function" => {
                Construct::Function(FunctionKind::Expression)
            }
            "arrow_function" => Construct::Function(FunctionKind::Arrow),
            "method_definition" => Construct::Function(FunctionKind::Method),
            "class_declaration" | "class" | "abstract_class_declaration" => Construct::Class,
            "call_expression" => Construct::Call,
            "new_expression" => Construct::New,
            "member_expression" => Construct::Member,
            "import_statement" => Construct::Import,
            "export_statement" => Construct::Export,
            "assignment_expression" => Construct::Assignment,
            "variable_declarator" => Construct::Declarator,
            "if_statement" => Construct::Branch(Branch::If),
            "switch_statement" => Construct::Branch(Branch::Switch),
            "switch_case" => Construct::Branch(Branch::Case),
            "switch_default" => Construct::Branch(Branch::DefaultCase),
            "while_statement" => Construct::Branch(Branch::While),
            "do_statement" => Construct::Branch(Branch::Do),
            "for_statement" => Construct::Branch(Branch::For),
            "for_in_statement" | "for_of_statement" => Construct::Branch(Branch::ForIn),
            "catch_clause" => Construct::Branch(Branch::Catch),
            "ternary_expression" | "conditional_expression" => Construct::Branch(Branch::Ternary),
            "binary_expression" if is_logical(node) => Construct::Branch(Branch::Logical),
            "jsx_element" | "jsx_self_closing_element" | "jsx_fragment" => Construct::Markup,
            "jsx_attribute" => Construct::MarkupAttribute,
            "string" => Construct::Str,
            "template_string" => Construct::Template,
            "array" => Construct::Array,
            "identifier" => Construct::Identifier,
            _ => Construct::Other,
        }
    }

    pub fn is_function(self) -> bool {
        matches!(self, Construct::Function(_))
    }

    pub fn is_loop(self) -> bool {
        matches!(self, Construct::Branch(b) if b.is_loop())
    }
}

/// Operator token of a binary expression; anonymous tokens carry their text as kind.
pub fn binary_operator(node: &Node) -> Option<&'static str> {
    node.child_by_field_name("operator").map(|op| op.kind())
}

fn is_logical(node: &Node) -> bool {
    matches!(binary_operator(node), Some("&&") | Some("||"))
}

/// Get text for a tree-sitter node
pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

/// Get the line number for a tree-sitter node (1-indexed)
pub fn node_line(node: &Node) -> usize {
    node.start_position().row + 1
}

pub fn field_text<'a>(node: &Node, field: &str, source: &'a str) -> Option<&'a str> {
    node.child_by_field_name(field)
        .map(|child| node_text(&child, source))
}

/// Named children, skipping comments.
pub fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

pub fn has_child_kind(node: &Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|child| child.kind() == kind);
    found
}

/// Parents of `node`, nearest first.
pub fn ancestors<'t>(node: Node<'t>) -> impl Iterator<Item = Node<'t>> {
    std::iter::successors(node.parent(), |n| n.parent())
}

/// Value of a plain string literal, without quotes.
pub fn string_value<'a>(node: &Node, source: &'a str) -> Option<&'a str> {
    if node.kind() != "string" {
        return None;
    }
    let text = node_text(node, source);
    if text.len() >= 2 {
        Some(&text[1..text.len() - 1])
    } else {
        None
    }
}

/// Value of a string literal or a template without substitutions.
pub fn static_string<'a>(node: &Node, source: &'a str) -> Option<&'a str> {
    match node.kind() {
        "string" => string_value(node, source),
        "template_string" if !has_child_kind(node, "template_substitution") => {
            let text = node_text(node, source);
            (text.len() >= 2).then(|| &text[1..text.len() - 1])
        }
        _ => None,
    }
}

/// Callee of a call expression.
pub fn callee<'t>(call: &Node<'t>) -> Option<Node<'t>> {
    call.child_by_field_name("function")
        .or_else(|| call.child_by_field_name("constructor"))
}

/// Argument nodes of a call or `new` expression.
pub fn call_arguments<'t>(call: &Node<'t>) -> Vec<Node<'t>> {
    call.child_by_field_name("arguments")
        .filter(|args| args.kind() == "arguments")
        .map(|args| named_children(&args))
        .unwrap_or_default()
}

/// `(object, property)` text of a member expression.
pub fn member_parts<'a>(member: &Node, source: &'a str) -> Option<(&'a str, &'a str)> {
    if member.kind() != "member_expression" {
        return None;
    }
    let object = field_text(member, "object", source)?;
    let property = field_text(member, "property", source)?;
    Some((object, property))
}

/// The name a call invokes: `foo` for `foo()`, `bar` for `a.b.bar()`.
pub fn called_name<'a>(call: &Node, source: &'a str) -> Option<&'a str> {
    let target = callee(call)?;
    match target.kind() {
        "identifier" => Some(node_text(&target, source)),
        "member_expression" => field_text(&target, "property", source),
        _ => None,
    }
}

/// Full dotted text of the callee, e.g. `React.createElement`.
pub fn callee_text<'a>(call: &Node, source: &'a str) -> Option<&'a str> {
    callee(call).map(|target| node_text(&target, source))
}
