//! Route table aggregation and API versioning.
//!
//! A [`Router`] collects route specs, shared middleware, shared parameter
//! handlers, and version sub-routers during a build phase, then freezes
//! everything into one serving [`Handler`](crate::chain::Handler) via
//! [`Router::routes`]. Requests fan out to every matching route in
//! registration order; when nothing matches, the router either surfaces the
//! most severe per-route error or falls through to the surrounding
//! composition.
//!
//! Versioning is opt-in through
//! [`RouterConfig::version_handler`](crate::config::RouterConfig): url-based
//! (identifier as a path segment), header-based (a `version` request
//! header), or a custom resolver closure.

mod core;
mod version;


pub use core::Router;
pub use version::{VersionHandler, VersionResolver, VERSION_HEADER};
