// Security pattern detection for JavaScript/TypeScript

use super::ancestor_pairs;
use crate::analyzers::javascript::syntax::{
    binary_operator, call_arguments, called_name, callee, field_text, has_child_kind,
    member_parts, node_line, node_text, static_string, Construct,
};
use crate::core::{Finding, FindingKind, Severity};
use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::Node;

const TIMER_FUNCTIONS: &[&str] = &["setTimeout", "setInterval"];
const QUERY_METHODS: &[&str] = &["query", "execute"];
const MARKUP_SINKS: &[&str] = &["innerHTML", "outerHTML"];
const WEAK_ALGORITHMS: &[&str] = &["md5", "sha1"];

static VALIDATING_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)valid|parse|assert|check|ensure|schema|number|boolean")
        .expect("validating call pattern is valid")
});

static TOKEN_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)token").expect("token pattern is valid"));

static BASE64_ENCODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bbtoa\s*\(|\.toString\(\s*['"]base64['"]\s*\)"#)
        .expect("base64 pattern is valid")
});

/// Inspect one node for security sinks.
pub fn inspect(node: &Node, source: &str, file: &str, findings: &mut Vec<Finding>) {
    match Construct::of(node) {
        Construct::Call => inspect_call(node, source, file, findings),
        Construct::New => {
            let constructor = node.child_by_field_name("constructor");
            if constructor.is_some_and(|c| node_text(&c, source) == "Function") {
                findings.push(Finding::new(
                    FindingKind::CodeInjection,
                    Severity::Critical,
                    file,
                    node_line(node),
                    "Function constructor compiles a string into code",
                    "Replace dynamic code construction with a regular function",
                ));
            }
        }
        Construct::Assignment => {
            let sink = node
                .child_by_field_name("left")
                .and_then(|left| member_parts(&left, source))
                .map(|(_, property)| property)
                .filter(|property| MARKUP_SINKS.contains(property));
            if let Some(property) = sink {
                findings.push(xss_finding(file, node_line(node), property));
            }
        }
        Construct::MarkupAttribute => {
            let name = node.named_child(0).map(|n| node_text(&n, source));
            if name == Some("dangerouslySetInnerHTML") {
                findings.push(xss_finding(file, node_line(node), "dangerouslySetInnerHTML"));
            }
        }
        Construct::Member => inspect_env_read(node, source, file, findings),
        _ => {}
    }
}

fn inspect_call(call: &Node, source: &str, file: &str, findings: &mut Vec<Finding>) {
    let Some(target) = callee(call) else {
        return;
    };
    let line = node_line(call);
    let args = call_arguments(call);

    if target.kind() == "identifier" {
        let name = node_text(&target, source);
        if name == "eval" {
            findings.push(Finding::new(
                FindingKind::CodeInjection,
                Severity::Critical,
                file,
                line,
                "eval() executes arbitrary code",
                "Parse data with JSON.parse or restructure the logic to avoid eval",
            ));
            return;
        }
        if TIMER_FUNCTIONS.contains(&name)
            && args
                .first()
                .is_some_and(|first| matches!(first.kind(), "string" | "template_string" | "identifier"))
        {
            findings.push(Finding::new(
                FindingKind::CodeInjection,
                Severity::High,
                file,
                line,
                format!("{name} with a string or untyped argument may evaluate code"),
                "Pass an inline function instead of a string",
            ));
            return;
        }
        if WEAK_ALGORITHMS.contains(&name.to_ascii_lowercase().as_str()) {
            findings.push(weak_hash_finding(file, line, name));
            return;
        }
    }

    let Some(method) = called_name(call, source) else {
        return;
    };

    if target.kind() == "member_expression"
        && QUERY_METHODS.contains(&method)
        && args.iter().any(|arg| is_dynamic_string(arg))
    {
        findings.push(Finding::new(
            FindingKind::SqlInjection,
            Severity::Critical,
            file,
            line,
            format!("{method}() built from string interpolation or concatenation"),
            "Use parameterized queries or a query builder",
        ));
        return;
    }

    if method == "createHash" {
        let algorithm = args
            .first()
            .and_then(|arg| static_string(arg, source))
            .map(str::to_ascii_lowercase);
        if let Some(algorithm) = algorithm.filter(|a| WEAK_ALGORITHMS.contains(&a.as_str())) {
            findings.push(weak_hash_finding(file, line, &algorithm));
        }
    }
}

/// Template with substitutions, or a `+` concatenation.
fn is_dynamic_string(arg: &Node) -> bool {
    match arg.kind() {
        "template_string" => has_child_kind(arg, "template_substitution"),
        "binary_expression" => binary_operator(arg) == Some("+"),
        _ => false,
    }
}

fn xss_finding(file: &str, line: usize, sink: &str) -> Finding {
    Finding::new(
        FindingKind::Xss,
        Severity::Medium,
        file,
        line,
        format!("Raw HTML written through {sink}"),
        "Render text content or sanitize the HTML before inserting it",
    )
}

fn weak_hash_finding(file: &str, line: usize, algorithm: &str) -> Finding {
    Finding::new(
        FindingKind::WeakHash,
        Severity::Medium,
        file,
        line,
        format!("Weak hash algorithm {algorithm}"),
        "Use SHA-256 or stronger, and a dedicated password hash for credentials",
    )
}

/// `process.env.X` read outside a validating context.
fn inspect_env_read(member: &Node, source: &str, file: &str, findings: &mut Vec<Finding>) {
    let Some((object, variable)) = member_parts(member, source) else {
        return;
    };
    if object != "process.env" || is_validated(member, source) {
        return;
    }
    findings.push(Finding::new(
        FindingKind::UnvalidatedEnvRead,
        Severity::Low,
        file,
        node_line(member),
        format!("process.env.{variable} is used without validation or a default"),
        "Validate required environment variables at startup or provide a default",
    ));
}

fn is_validated(member: &Node, source: &str) -> bool {
    for (ancestor, via) in ancestor_pairs(*member) {
        match ancestor.kind() {
            "binary_expression" => {
                if matches!(binary_operator(&ancestor), Some("&&" | "||" | "??")) {
                    return true;
                }
            }
            "ternary_expression" | "conditional_expression" => return true,
            "unary_expression" => {
                if field_text(&ancestor, "operator", source) == Some("!") {
                    return true;
                }
            }
            "assignment_expression" => {
                // Writes are not reads
                if ancestor.child_by_field_name("left").as_ref() == Some(&via) {
                    return true;
                }
            }
            "call_expression" => {
                if called_name(&ancestor, source).is_some_and(|name| VALIDATING_CALL.is_match(name)) {
                    return true;
                }
            }
            "if_statement" | "while_statement" | "do_statement" => {
                return ancestor.child_by_field_name("condition").as_ref() == Some(&via);
            }
            kind if kind.ends_with("_statement") || kind.ends_with("declaration") => return false,
            "statement_block" | "program" | "arrow_function" => return false,
            _ => {}
        }
    }
    false
}

/// Base64-encoded token material on a line that names a token.
pub fn scan_insecure_tokens(source: &str, file: &str) -> Vec<Finding> {
    source
        .lines()
        .enumerate()
        .filter(|(_, line)| TOKEN_LINE.is_match(line) && BASE64_ENCODE.is_match(line))
        .map(|(index, _)| {
            Finding::new(
                FindingKind::InsecureToken,
                Severity::Medium,
                file,
                index + 1,
                "Custom token is only base64-encoded, not signed or encrypted",
                "Issue signed tokens (for example JWT with a strong secret) or encrypt the payload",
            )
        })
        .collect()
}
