use crate::context::{Request, Response};
use http::Method;
use regex::Regex;
use std::sync::Arc;
use tracing::warn;

/// Origin validation strategy
///
/// A route policy names which origins may make cross-origin requests. A list
/// has OR semantics: the origin is allowed if any element allows it.
#[derive(Clone)]
pub enum AllowedOrigin {
    /// Exact string match, or the `*` wildcard
    Literal(String),
    /// Regex pattern tested against the `Origin` header value
    Pattern(Regex),
    /// Custom predicate evaluated against the request
    Predicate(Arc<dyn Fn(&Request) -> bool + Send + Sync>),
    /// Any element allowing the origin allows the request
    List(Vec<AllowedOrigin>),
}

impl std::fmt::Debug for AllowedOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllowedOrigin::Literal(origin) => f.debug_tuple("Literal").field(origin).finish(),
            AllowedOrigin::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            AllowedOrigin::Predicate(_) => write!(f, "Predicate(<function>)"),
            AllowedOrigin::List(list) => f.debug_tuple("List").field(list).finish(),
        }
    }
}

impl AllowedOrigin {
    /// The `*` wildcard: allow every origin.
    #[must_use]
    pub fn any() -> Self {
        AllowedOrigin::Literal("*".to_string())
    }

    /// Check whether this spec allows the request's origin.
    pub(crate) fn allows(&self, req: &Request) -> bool {
        match self {
            AllowedOrigin::Literal(origin) => {
                origin == "*" || req.origin() == Some(origin.as_str())
            }
            AllowedOrigin::Pattern(re) => req.origin().is_some_and(|o| re.is_match(o)),
            AllowedOrigin::Predicate(predicate) => predicate(req),
            AllowedOrigin::List(list) => list.iter().any(|spec| spec.allows(req)),
        }
    }
}

/// One CORS policy attached to a route.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    pub allowed_origin: AllowedOrigin,
    pub allowed_methods: Vec<Method>,
    pub allowed_headers: Vec<String>,
    pub exposed_headers: Vec<String>,
    pub allow_credentials: bool,
    /// Preflight cache duration in seconds
    pub max_age: u64,
}

impl Default for CorsPolicy {
    /// Secure default: no origins allowed, requires explicit configuration.
    fn default() -> Self {
        Self {
            allowed_origin: AllowedOrigin::List(Vec::new()),
            allowed_methods: Vec::new(),
            allowed_headers: Vec::new(),
            exposed_headers: Vec::new(),
            allow_credentials: false,
            max_age: 0,
        }
    }
}

impl CorsPolicy {
    #[must_use]
    pub fn new(allowed_origin: AllowedOrigin) -> Self {
        Self {
            allowed_origin,
            ..Self::default()
        }
    }
}

/// Computed CORS response headers for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsHeaders {
    pub allow_credentials: bool,
    pub allow_headers: String,
    pub allow_methods: String,
    /// The request's `Origin` header reflected verbatim; empty when the
    /// request carried none
    pub allow_origin: String,
    pub expose_headers: String,
    pub max_age: u64,
}

impl CorsHeaders {
    /// Write the headers onto a response. String-valued headers whose
    /// computed value is empty are omitted; booleans and the max-age number
    /// always stringify non-empty and are always emitted.
    pub fn apply(&self, res: &mut Response) {
        res.set_header(
            "access-control-allow-credentials",
            self.allow_credentials.to_string(),
        );
        if !self.allow_headers.is_empty() {
            res.set_header("access-control-allow-headers", self.allow_headers.clone());
        }
        if !self.allow_methods.is_empty() {
            res.set_header("access-control-allow-methods", self.allow_methods.clone());
        }
        if !self.allow_origin.is_empty() {
            res.set_header("access-control-allow-origin", self.allow_origin.clone());
        }
        if !self.expose_headers.is_empty() {
            res.set_header("access-control-expose-headers", self.expose_headers.clone());
        }
        res.set_header("access-control-max-age", self.max_age.to_string());
    }
}

/// Negotiate CORS for a request against a route's policies.
///
/// Returns the merged headers when at least one policy's origin check passes,
/// `None` when every policy rejects the origin (the caller maps that to a
/// 403 Forbidden).
#[must_use]
pub fn negotiate(req: &Request, policies: &[CorsPolicy]) -> Option<CorsHeaders> {
    let passing: Vec<CorsHeaders> = policies
        .iter()
        .filter(|policy| policy.allowed_origin.allows(req))
        .map(|policy| headers_for_policy(req, policy))
        .collect();

    if passing.is_empty() {
        warn!(
            origin = req.origin().unwrap_or(""),
            policy_count = policies.len(),
            "CORS: no policy accepted the request origin"
        );
        return None;
    }

    Some(merge(passing))
}

/// Compute the headers for an ordinary (non-preflight) response.
///
/// Same negotiation as [`negotiate`]; exposed separately so embedders can
/// decorate responses on requests the router already dispatched.
#[must_use]
pub fn headers_for(req: &Request, policies: &[CorsPolicy]) -> Option<CorsHeaders> {
    negotiate(req, policies)
}

fn headers_for_policy(req: &Request, policy: &CorsPolicy) -> CorsHeaders {
    CorsHeaders {
        allow_credentials: policy.allow_credentials,
        allow_headers: join_tokens(policy.allowed_headers.iter().map(String::as_str)),
        allow_methods: join_tokens(policy.allowed_methods.iter().map(Method::as_str)),
        // Reflect the request origin verbatim, never the wildcard
        allow_origin: req.origin().unwrap_or_default().to_string(),
        expose_headers: join_tokens(policy.exposed_headers.iter().map(String::as_str)),
        max_age: policy.max_age,
    }
}

/// Merge the headers of every passing policy.
///
/// # Panics
///
/// Panics when invoked with zero inputs. [`negotiate`] handles the
/// zero-passing case before calling this, so an empty input means a caller
/// broke the internal contract; failing loudly beats producing headers from
/// nothing.
#[allow(clippy::panic)]
fn merge(mut results: Vec<CorsHeaders>) -> CorsHeaders {
    assert!(
        !results.is_empty(),
        "CORS header merge invoked with zero passing policies"
    );
    if results.len() == 1 {
        return results.swap_remove(0);
    }

    CorsHeaders {
        allow_credentials: results.iter().any(|r| r.allow_credentials),
        allow_headers: merge_token_lists(results.iter().map(|r| r.allow_headers.as_str())),
        allow_methods: merge_token_lists(results.iter().map(|r| r.allow_methods.as_str())),
        allow_origin: results[0].allow_origin.clone(),
        expose_headers: merge_token_lists(results.iter().map(|r| r.expose_headers.as_str())),
        max_age: results.iter().map(|r| r.max_age).min().unwrap_or(0),
    }
}

/// Union comma-space-joined token lists, de-duplicating while preserving
/// first-occurrence order.
pub(crate) fn merge_token_lists<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for value in values {
        for token in value.split(", ") {
            if !token.is_empty() && !seen.contains(&token) {
                seen.push(token);
            }
        }
    }
    seen.join(", ")
}

fn join_tokens<'a>(tokens: impl Iterator<Item = &'a str>) -> String {
    tokens.collect::<Vec<_>>().join(", ")
}
