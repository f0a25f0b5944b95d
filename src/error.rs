//! Error types: request-time HTTP errors and build-time registration errors.
//!
//! Route-level outcomes travel as [`HttpError`] *values* so the router can
//! compare severities across several matching routes before picking the one
//! error that becomes the response. Only build-time programming mistakes use
//! [`RouterError`].

use crate::context::HeaderVec;
use std::fmt;
use std::sync::Arc;

/// An HTTP error outcome with a status code, message, and optional headers
/// (e.g. `Allow` on a 405).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    /// HTTP status code (403, 404, 405, 500, ...)
    pub status: u16,
    /// Human-readable message; exposed to clients only per [`HttpError::expose_message`]
    pub message: String,
    /// Headers the error carries onto the response
    pub headers: HeaderVec,
}

impl HttpError {
    #[must_use]
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            headers: HeaderVec::new(),
        }
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::new(404, "Not Found")
    }

    #[must_use]
    pub fn forbidden() -> Self {
        Self::new(403, "Forbidden")
    }

    /// A 405 carrying the comma-joined list of methods the route declares.
    #[must_use]
    pub fn method_not_allowed(allow: &str) -> Self {
        let mut err = Self::new(405, "Method Not Allowed");
        err.set_header("allow", allow.to_string());
        err
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(500, message)
    }

    /// Get a carried header by name (case-insensitive)
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a carried header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Client errors (4xx) always expose their message; server errors only
    /// when the router's `expose` option says so.
    #[inline]
    #[must_use]
    pub fn expose_message(&self) -> bool {
        self.status < 500
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.message)
    }
}

impl std::error::Error for HttpError {}

impl From<anyhow::Error> for HttpError {
    /// Arbitrary handler failures map to a 500 with the error's message.
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string())
    }
}

/// Registration error
///
/// Returned by route/version registration when the caller violates a
/// build-phase contract. These are programming errors, never request-time
/// conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// `register` was called on a layer that already holds a route
    RouteAlreadyRegistered,
    /// A route was declared with an empty method set
    EmptyMethods,
    /// `version` was called on a router whose config has no version handler
    VersioningDisabled,
    /// A version identifier collides with an existing one under the
    /// configured case-sensitivity
    DuplicateVersion {
        /// The normalized identifier that collided
        identifier: String,
    },
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::RouteAlreadyRegistered => {
                write!(f, "route is already registered")
            }
            RouterError::EmptyMethods => {
                write!(f, "a route must declare at least one HTTP method")
            }
            RouterError::VersioningDisabled => {
                write!(
                    f,
                    "cannot register a version: version handling is disabled by router config"
                )
            }
            RouterError::DuplicateVersion { identifier } => {
                write!(
                    f,
                    "cannot register version '{identifier}': a version with the same identifier already exists"
                )
            }
        }
    }
}

impl std::error::Error for RouterError {}
