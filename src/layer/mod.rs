//! # Layer Module
//!
//! One registered path+methods+middleware unit (a route) and its
//! per-request dispatch.
//!
//! ## Overview
//!
//! A [`Layer`] is constructed empty and receives its immutable [`RouteSpec`]
//! through exactly one `register` call; a second registration attempt is a
//! programming error. From then on it answers two questions per request:
//!
//! 1. [`Layer::matches`] - does this layer participate in the request at
//!    all? True when the path matches and the method is declared, or the
//!    request is a candidate CORS preflight, or the layer takes part in
//!    cross-route 405 aggregation.
//! 2. [`Layer::dispatch`] - turn the matched request into either an
//!    executable handler chain or an [`HttpError`](crate::error::HttpError)
//!    value the router can weigh against other layers' outcomes.
//!
//! Templated routes use the [`pattern`](crate::pattern) matcher with the
//! layer's matching options; raw-regex routes are executed directly and
//! their named capture groups become parameters.

mod core;

pub use core::{Dispatch, Layer, RoutePath, RouteSpec};
