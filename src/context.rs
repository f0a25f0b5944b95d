//! Request/response state threaded through a handler chain.
//!
//! A [`RequestContext`] pairs the immutable request data with the mutable
//! response under construction. Handlers receive `&mut RequestContext` and a
//! continuation, mutate the response, and decide whether to run the rest of
//! the chain.

use http::Method;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;

/// Maximum number of path parameters before heap allocation.
/// Eight covers even deeply nested templates (e.g.
/// /orgs/{org}/projects/{project}/tasks/{task}) without spilling.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Maximum inline headers before heap allocation.
/// Most requests have ≤16 headers.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names use `Arc<str>` instead of `String` because names come from the
/// static route table (known at registration time) and `Arc::clone()` is an
/// O(1) atomic increment. Values remain `String` as they are per-request data
/// extracted from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Stack-allocated header storage.
///
/// Header names are often repeated (Content-Type, Origin, ...) so they share
/// the same `Arc<str>` treatment as parameter names.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Immutable request data seen by the router and every handler.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Request path, already percent-decoded by the embedding server
    pub path: String,
    /// HTTP headers (stack-allocated for ≤16 headers)
    pub headers: HeaderVec,
}

impl Request {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderVec::new(),
        }
    }

    /// Attach a header, builder style.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The `Origin` header value, if the request carries one.
    #[inline]
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        self.header("origin")
    }
}

/// Mutable response state built up by the handler chain.
///
/// The status starts out unset; a request no route ever touched leaves it
/// that way, which [`Response::status`] reports as the conventional 404
/// default of the surrounding framework.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Response {
    status: Option<u16>,
    /// HTTP response headers (stack-allocated for ≤16 headers)
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// Response body, if any handler set one
    pub body: Option<Value>,
}

impl Response {
    /// Effective status code: 404 until something sets it.
    #[inline]
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status.unwrap_or(404)
    }

    /// The status exactly as set so far. `None` means the request fell
    /// through every route untouched.
    #[inline]
    #[must_use]
    pub fn raw_status(&self) -> Option<u16> {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    /// Get a header by name (case-insensitive)
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: String) {
        // Remove existing header with same name (case-insensitive)
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// Per-request state passed to every handler in a chain.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request: Request,
    pub response: Response,
}

impl RequestContext {
    #[must_use]
    pub fn new(request: Request) -> Self {
        Self {
            request,
            response: Response::default(),
        }
    }
}
