//! HTTP method inference for dynamically routed actions.
//!
//! [`resolve`] picks a verb for an action name from multiple competing
//! signals with a strict precedence order: explicit override, direct method
//! name, custom rules, semantic keyword analysis, then the configured
//! default. It is a total function — it always returns a method and never
//! fails.

use http::Method;

/// Reserved payload key carrying an explicit method override. Stripped from
/// the payload before the body is serialized.
pub const METHOD_KEY: &str = "method";

/// Per-client method inference configuration.
///
/// Rules are consulted in insertion order; the first match wins. A pattern
/// ending in `*` matches action names by prefix, one starting with `*`
/// matches by suffix, and anything else matches exactly. All matching is
/// case-insensitive.
///
/// # Examples
///
/// ```
/// use dialpath::MethodRules;
/// use http::Method;
///
/// let rules = MethodRules::new()
///     .rule("verify*", Method::POST)
///     .rule("*Report", Method::GET)
///     .rule("ping", Method::GET);
/// ```
#[derive(Debug, Clone)]
pub struct MethodRules {
    /// Fallback verb when no other signal matches. POST by default.
    pub default_method: Method,
    rules: Vec<(String, Method)>,
}

impl MethodRules {
    /// Creates an empty rule set with the POST default.
    pub fn new() -> Self {
        Self {
            default_method: Method::POST,
            rules: Vec::new(),
        }
    }

    /// Creates an empty rule set with a custom default method.
    pub fn with_default(default_method: Method) -> Self {
        Self {
            default_method,
            rules: Vec::new(),
        }
    }

    /// Appends a pattern → method rule. Order of insertion is the order of
    /// consultation.
    pub fn rule(mut self, pattern: impl Into<String>, method: Method) -> Self {
        self.rules.push((pattern.into(), method));
        self
    }

    /// The configured rules, in consultation order.
    pub fn rules(&self) -> &[(String, Method)] {
        &self.rules
    }
}

impl Default for MethodRules {
    fn default() -> Self {
        Self::new()
    }
}

const GET_KEYWORDS: &[&str] = &[
    "get", "fetch", "load", "find", "retrieve", "read", "show", "view",
];
const POST_KEYWORDS: &[&str] = &[
    "create", "add", "save", "store", "insert", "register", "submit", "new",
];
const PUT_KEYWORDS: &[&str] = &["update", "replace", "modify", "edit", "change", "set", "put"];
const DELETE_KEYWORDS: &[&str] = &["delete", "remove", "destroy", "clear", "drop", "cancel"];
const PATCH_KEYWORDS: &[&str] = &[
    "patch",
    "partial",
    "toggle",
    "enable",
    "disable",
    "activate",
    "deactivate",
];

/// Keyword sets in their fixed consultation order. An action name could in
/// principle start with keywords from more than one set; the first listed
/// set wins, and this order is part of the contract.
const SEMANTIC_SETS: [(&[&str], Method); 5] = [
    (GET_KEYWORDS, Method::GET),
    (POST_KEYWORDS, Method::POST),
    (PUT_KEYWORDS, Method::PUT),
    (DELETE_KEYWORDS, Method::DELETE),
    (PATCH_KEYWORDS, Method::PATCH),
];

/// Resolves the HTTP method for an action name.
///
/// Precedence, first match wins:
/// 1. the explicit override, returned unconditionally;
/// 2. the action name itself, when it equals a method name;
/// 3. custom rules, in insertion order;
/// 4. semantic keyword analysis on the action-name prefix;
/// 5. the configured default.
///
/// An empty or whitespace-only action name falls straight to the default.
pub fn resolve(action: &str, rules: &MethodRules, explicit: Option<Method>) -> Method {
    if let Some(method) = explicit {
        return method;
    }

    let action = action.trim();
    if action.is_empty() {
        return rules.default_method.clone();
    }

    if let Some(method) = direct_method(action) {
        return method;
    }

    for (pattern, method) in rules.rules() {
        if pattern_matches(pattern, action) {
            return method.clone();
        }
    }

    let lowered = action.to_ascii_lowercase();
    for (keywords, method) in &SEMANTIC_SETS {
        if keywords.iter().any(|keyword| lowered.starts_with(keyword)) {
            return method.clone();
        }
    }

    rules.default_method.clone()
}

fn direct_method(action: &str) -> Option<Method> {
    match action.to_ascii_lowercase().as_str() {
        "get" => Some(Method::GET),
        "post" => Some(Method::POST),
        "put" => Some(Method::PUT),
        "delete" => Some(Method::DELETE),
        "patch" => Some(Method::PATCH),
        _ => None,
    }
}

fn pattern_matches(pattern: &str, action: &str) -> bool {
    let action = action.to_ascii_lowercase();
    if let Some(prefix) = pattern.strip_suffix('*') {
        action.starts_with(&prefix.to_ascii_lowercase())
    } else if let Some(suffix) = pattern.strip_prefix('*') {
        action.ends_with(&suffix.to_ascii_lowercase())
    } else {
        pattern.eq_ignore_ascii_case(&action)
    }
}

/// Removes the reserved [`METHOD_KEY`] from a JSON object payload and parses
/// it as an explicit method override.
///
/// The key is always stripped once present — it is reserved — but only a
/// string value that forms a valid HTTP token yields an override; anything
/// else is dropped and inference proceeds.
pub(crate) fn take_explicit_method(payload: &mut serde_json::Value) -> Option<Method> {
    let object = payload.as_object_mut()?;
    let raw = object.remove(METHOD_KEY)?;
    let name = raw.as_str()?;
    Method::from_bytes(name.to_ascii_uppercase().as_bytes()).ok()
}
