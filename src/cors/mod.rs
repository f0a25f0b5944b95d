//! # CORS Module
//!
//! Negotiates Cross-Origin Resource Sharing for routes that carry one or
//! more [`CorsPolicy`] values.
//!
//! ## Overview
//!
//! Given a request and the policies attached to a route, the negotiator
//! decides whether the request's `Origin` is allowed and, if so, computes the
//! response headers. A route may carry several policies; every policy whose
//! origin check passes contributes, and the results are merged:
//!
//! - credentials: `true` if any passing policy allows them
//! - header/method/exposed-header lists: de-duplicated union, first-occurrence
//!   order preserved
//! - origin: the first passing policy's value, in declaration order
//! - max-age: the minimum across passing policies
//!
//! `Access-Control-Allow-Origin` always reflects the request's `Origin`
//! header verbatim, never the `*` wildcard, even when the policy allowed `*`.
//!
//! ## Security
//!
//! - Origins are validated against the policy's [`AllowedOrigin`] spec
//! - A rejected origin produces no headers at all (the caller maps it to 403)
//! - Only one origin is ever returned per response

mod core;

pub use core::{headers_for, negotiate, AllowedOrigin, CorsHeaders, CorsPolicy};
pub(crate) use core::merge_token_lists;
