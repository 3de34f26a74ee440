//! Route discovery: router call chains and directory-convention handlers.

use super::classification::{call_chain_verb, is_exported_verb, looks_like_auth};
use super::syntax::{call_arguments, callee, member_parts, node_line, node_text, string_value};
use crate::config::RouteConfig;
use crate::core::{ExportEntry, RouteEntry, RouteOrigin};
use tree_sitter::Node;

/// `app.get('/users', auth, handler)` style declarations.
///
/// The path is the first string literal; identifiers between it and the final
/// handler are middleware. A verb call without a handler after the path (for
/// example `app.get('env')`) is a settings lookup, not a route.
pub fn call_chain_route(call: &Node, source: &str, config: &RouteConfig) -> Option<RouteEntry> {
    let target = callee(call)?;
    let (receiver, method) = member_parts(&target, source)?;
    if !config.is_router(receiver) {
        return None;
    }
    let method = call_chain_verb(method)?;

    let args = call_arguments(call);
    let path_index = args.iter().position(|arg| arg.kind() == "string")?;
    if path_index + 1 >= args.len() {
        return None;
    }
    let path = string_value(&args[path_index], source)?.to_string();

    let middleware: Vec<String> = args[path_index + 1..args.len() - 1]
        .iter()
        .filter(|arg| matches!(arg.kind(), "identifier" | "member_expression"))
        .map(|arg| node_text(arg, source).to_string())
        .collect();
    let protected = middleware.iter().any(|name| looks_like_auth(name));

    Some(RouteEntry {
        method,
        path,
        line: node_line(call),
        origin: RouteOrigin::CallChain,
        middleware,
        protected,
    })
}

/// URL path for a file under the routing marker directory.
///
/// `pages/api/users/[id].ts` becomes `/api/users/:id`; index stems collapse
/// into their directory. Returns `None` when no segment equals the marker.
pub fn file_convention_path(relative_path: &str, config: &RouteConfig) -> Option<String> {
    let normalized = relative_path.replace('\\', "/");
    let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
    let marker = segments
        .iter()
        .position(|segment| *segment == config.marker_segment)?;

    let rest = &segments[marker + 1..];
    let mut parts: Vec<String> = Vec::with_capacity(rest.len());
    for (i, &segment) in rest.iter().enumerate() {
        let segment = if i + 1 == rest.len() {
            strip_extension(segment)
        } else {
            segment
        };
        if i + 1 == rest.len() && config.index_segments.iter().any(|s| s == segment) {
            continue;
        }
        parts.push(dynamic_segment(segment));
    }

    let mut path = config.marker_path();
    for part in parts {
        path.push('/');
        path.push_str(&part);
    }
    Some(path)
}

fn strip_extension(file_name: &str) -> &str {
    file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .filter(|stem| !stem.is_empty())
        .unwrap_or(file_name)
}

/// `[id]` → `:id`, `[...slug]` → `:slug`
fn dynamic_segment(segment: &str) -> String {
    match segment
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
    {
        Some(inner) => format!(":{}", inner.trim_start_matches('.')),
        None => segment.to_string(),
    }
}

/// One route per exported verb binding in a directory-convention file.
pub fn file_convention_routes(
    relative_path: &str,
    exports: &[ExportEntry],
    file_mentions_auth: bool,
    config: &RouteConfig,
) -> Vec<RouteEntry> {
    let Some(path) = file_convention_path(relative_path, config) else {
        return Vec::new();
    };

    exports
        .iter()
        .filter(|export| is_exported_verb(&export.name))
        .map(|export| RouteEntry {
            method: export.name.clone(),
            path: path.clone(),
            line: export.line,
            origin: RouteOrigin::FileConvention,
            middleware: Vec::new(),
            protected: file_mentions_auth,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::javascript::parser::parse_source;
    use crate::core::{ExportKind, FileVariant};
    use std::path::Path;

    fn first_call<'t>(node: Node<'t>) -> Option<Node<'t>> {
        if node.kind() == "call_expression" {
            return Some(node);
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        children.into_iter().find_map(first_call)
    }

    fn route_for(source: &str) -> Option<RouteEntry> {
        let tree = parse_source(source, Path::new("server.js"), FileVariant::Plain).unwrap();
        let call = first_call(tree.root()).unwrap();
        call_chain_route(&call, source, &RouteConfig::default())
    }

    #[test]
    fn test_call_chain_with_middleware() {
        let route = route_for("router.post('/users', requireAuth, validate, (req, res) => {});").unwrap();
        assert_eq!(route.method, "POST");
        assert_eq!(route.path, "/users");
        assert_eq!(route.middleware, vec!["requireAuth", "validate"]);
        assert!(route.protected);
        assert_eq!(route.origin, RouteOrigin::CallChain);
    }

    #[test]
    fn test_unprotected_route() {
        let route = route_for("app.get('/health', handler);").unwrap();
        assert!(route.middleware.is_empty());
        assert!(!route.protected);
    }

    #[test]
    fn test_non_route_calls_ignored() {
        assert!(route_for("app.get('env');").is_none());
        assert!(route_for("client.get('/users', cb);").is_none());
        assert!(route_for("app.listen(3000, cb);").is_none());
    }

    #[test]
    fn test_file_convention_paths() {
        let config = RouteConfig::default();
        assert_eq!(
            file_convention_path("pages/api/users/[id].ts", &config).as_deref(),
            Some("/api/users/:id")
        );
        assert_eq!(
            file_convention_path("pages/api/users/index.js", &config).as_deref(),
            Some("/api/users")
        );
        assert_eq!(
            file_convention_path("app/api/posts/[...slug]/route.ts", &config).as_deref(),
            Some("/api/posts/:slug")
        );
        assert_eq!(file_convention_path("src/lib/apiClient.ts", &config), None);
    }

    #[test]
    fn test_exported_verbs_become_routes() {
        let exports = vec![
            ExportEntry { name: "GET".into(), kind: ExportKind::Named, line: 3 },
            ExportEntry { name: "POST".into(), kind: ExportKind::Named, line: 9 },
            ExportEntry { name: "helper".into(), kind: ExportKind::Named, line: 15 },
        ];
        let routes = file_convention_routes(
            "app/api/users/route.ts",
            &exports,
            false,
            &RouteConfig::default(),
        );
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].method, "GET");
        assert_eq!(routes[1].method, "POST");
        assert!(routes.iter().all(|r| r.path == "/api/users" && !r.protected));
    }
}
