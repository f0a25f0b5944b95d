//! # Switchyard
//!
//! **Switchyard** is a request-routing and dispatch engine: path-template
//! matching, ordered multi-route fan-out, CORS negotiation with multi-policy
//! merging, and API versioning, all composed through a single middleware
//! chain abstraction.
//!
//! ## Overview
//!
//! A [`router::Router`] collects routes during a build phase and freezes them
//! into one serving [`chain::Handler`]. Each route compiles to a
//! [`layer::Layer`] holding its regex matcher, middleware stack, parameter
//! handlers, and resolved options. At request time the router fans out to
//! every matching layer in registration order, aggregates per-layer errors
//! when nothing can serve the request, and falls through to the surrounding
//! composition when no route matches at all.
//!
//! ## Architecture
//!
//! - **[`chain`]** - The middleware chain: [`chain::Handler`],
//!   [`chain::Next`], and composition helpers
//! - **[`pattern`]** - `{param}` path templates compiled to anchored regexes
//! - **[`layer`]** - A single registered route: matching and dispatch
//! - **[`router`]** - Route table aggregation, error retention, versioning
//! - **[`cors`]** - CORS policy evaluation and multi-policy header merging
//! - **[`config`]** - Router-level defaults and per-route overrides
//! - **[`context`]** - Request and response carried through a chain
//! - **[`error`]** - HTTP outcome errors and registration errors
//!
//! ## Example
//!
//! ```
//! use switchyard::chain::{handler_fn, Next};
//! use switchyard::context::{Request, RequestContext};
//! use switchyard::router::Router;
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.get(
//!     "/items/{id}",
//!     vec![handler_fn(|ctx, _next| {
//!         ctx.response.set_status(200);
//!         Ok(())
//!     })],
//! );
//! let handler = router.routes();
//!
//! let mut ctx = RequestContext::new(Request::new(Method::GET, "/items/7"));
//! handler(&mut ctx, Next::end()).unwrap();
//! assert_eq!(ctx.response.status(), 200);
//! ```

pub mod chain;
pub mod config;
pub mod context;
pub mod cors;
pub mod error;
pub mod layer;
pub mod pattern;
pub mod router;

pub use chain::{compose, handler_fn, param_fn, Handler, HandlerResult, Next, ParamHandler};
pub use config::{LayerConfig, RouteOptions, RouterConfig};
pub use context::{Request, RequestContext, Response};
pub use cors::{AllowedOrigin, CorsHeaders, CorsPolicy};
pub use error::{HttpError, RouterError};
pub use layer::{Dispatch, Layer, RoutePath, RouteSpec};
pub use router::{Router, VersionHandler, VersionResolver, VERSION_HEADER};
