//! Name-based classification rules for components, hooks and routes.

use once_cell::sync::Lazy;
use regex::Regex;

/// Callees that build markup without the JSX syntax.
const CREATE_ELEMENT_APIS: &[&str] = &["createElement", "React.createElement", "h", "jsx", "jsxs"];

pub const HTTP_VERBS: &[&str] = &["get", "post", "put", "delete", "patch", "head", "options", "all"];

static AUTH_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)auth|session|jwt|verify|guard|protect|token")
        .expect("auth marker pattern is valid")
});

pub fn is_create_element_call(callee_text: &str) -> bool {
    CREATE_ELEMENT_APIS.contains(&callee_text)
}

/// `use` followed immediately by an upper-case letter, e.g. `useState`.
pub fn is_hook_name(name: &str) -> bool {
    name.len() > 3
        && name.starts_with("use")
        && name[3..].chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

/// Component names start with an upper-case letter.
pub fn is_component_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

/// Upper-case verb for a lower-case call-chain method, if it is one.
pub fn call_chain_verb(method: &str) -> Option<String> {
    HTTP_VERBS
        .contains(&method)
        .then(|| method.to_ascii_uppercase())
}

/// Exported binding names like `GET` that declare a file-convention route.
pub fn is_exported_verb(name: &str) -> bool {
    name != "ALL"
        && name.chars().all(|c| c.is_ascii_uppercase())
        && HTTP_VERBS.contains(&name.to_ascii_lowercase().as_str())
}

pub fn looks_like_auth(identifier: &str) -> bool {
    AUTH_MARKER.is_match(identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_names() {
        assert!(is_hook_name("useState"));
        assert!(is_hook_name("useX"));
        assert!(!is_hook_name("use"));
        assert!(!is_hook_name("user"));
        assert!(!is_hook_name("useless"));
        assert!(!is_hook_name("UseState"));
    }

    #[test]
    fn test_create_element_apis() {
        assert!(is_create_element_call("React.createElement"));
        assert!(is_create_element_call("h"));
        assert!(!is_create_element_call("document.createElement2"));
    }

    #[test]
    fn test_verbs() {
        assert_eq!(call_chain_verb("get").as_deref(), Some("GET"));
        assert_eq!(call_chain_verb("listen"), None);
        assert!(is_exported_verb("POST"));
        assert!(!is_exported_verb("post"));
        assert!(!is_exported_verb("handler"));
    }

    #[test]
    fn test_auth_marker() {
        assert!(looks_like_auth("requireAuth"));
        assert!(looks_like_auth("verifyJWT"));
        assert!(looks_like_auth("sessionGuard"));
        assert!(!looks_like_auth("rateLimit"));
    }
}
