use crate::chain::{Handler, HandlerResult, Next, ParamHandler};
use crate::config::{RouteOptions, RouterConfig};
use crate::context::RequestContext;
use crate::cors::merge_token_lists;
use crate::error::{HttpError, RouterError};
use crate::layer::{Dispatch, Layer, RoutePath, RouteSpec};
use http::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::version::{VersionHandler, VERSION_HEADER};

/// Ordered route table with shared middleware, shared parameter handlers,
/// and optional version sub-routers.
///
/// A `Router` is mutable during a synchronous build phase: routes,
/// middleware, parameter handlers, and versions are registered before the
/// server accepts traffic. [`Router::routes`] then freezes the table into a
/// single serving [`Handler`]; nothing registered afterwards is visible to
/// that handler.
pub struct Router {
    config: RouterConfig,
    middleware: Vec<Handler>,
    param_handlers: HashMap<String, ParamHandler>,
    route_list: Vec<RouteSpec>,
    /// Registration order matters: url-mode version scanning walks this in
    /// order and first match wins
    versions: Vec<(String, Router)>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("config", &self.config)
            .field("middleware", &self.middleware.len())
            .field("param_handlers", &self.param_handlers.keys())
            .field("route_list", &self.route_list.len())
            .field("versions", &self.versions.iter().map(|(v, _)| v).collect::<Vec<_>>())
            .finish()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// A router with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    /// A router with explicit configuration (defaults overridden field by
    /// field by the caller).
    #[must_use]
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            config,
            middleware: Vec::new(),
            param_handlers: HashMap::new(),
            route_list: Vec::new(),
            versions: Vec::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Register a full route spec.
    ///
    /// Fails with [`RouterError::EmptyMethods`] when the spec declares no
    /// methods; every other invariant is checked at build time.
    pub fn route(&mut self, spec: RouteSpec) -> Result<&mut Self, RouterError> {
        if spec.methods.is_empty() {
            return Err(RouterError::EmptyMethods);
        }
        self.route_list.push(spec);
        Ok(self)
    }

    fn push_verb(
        &mut self,
        methods: Vec<Method>,
        path: impl Into<RoutePath>,
        middleware: Vec<Handler>,
    ) -> &mut Self {
        self.route_list.push(RouteSpec::new(path, methods, middleware));
        self
    }

    pub fn get(&mut self, path: impl Into<RoutePath>, middleware: Vec<Handler>) -> &mut Self {
        self.push_verb(vec![Method::GET], path, middleware)
    }

    pub fn post(&mut self, path: impl Into<RoutePath>, middleware: Vec<Handler>) -> &mut Self {
        self.push_verb(vec![Method::POST], path, middleware)
    }

    pub fn put(&mut self, path: impl Into<RoutePath>, middleware: Vec<Handler>) -> &mut Self {
        self.push_verb(vec![Method::PUT], path, middleware)
    }

    pub fn delete(&mut self, path: impl Into<RoutePath>, middleware: Vec<Handler>) -> &mut Self {
        self.push_verb(vec![Method::DELETE], path, middleware)
    }

    pub fn patch(&mut self, path: impl Into<RoutePath>, middleware: Vec<Handler>) -> &mut Self {
        self.push_verb(vec![Method::PATCH], path, middleware)
    }

    pub fn head(&mut self, path: impl Into<RoutePath>, middleware: Vec<Handler>) -> &mut Self {
        self.push_verb(vec![Method::HEAD], path, middleware)
    }

    pub fn options(&mut self, path: impl Into<RoutePath>, middleware: Vec<Handler>) -> &mut Self {
        self.push_verb(vec![Method::OPTIONS], path, middleware)
    }

    pub fn trace(&mut self, path: impl Into<RoutePath>, middleware: Vec<Handler>) -> &mut Self {
        self.push_verb(vec![Method::TRACE], path, middleware)
    }

    pub fn connect(&mut self, path: impl Into<RoutePath>, middleware: Vec<Handler>) -> &mut Self {
        self.push_verb(vec![Method::CONNECT], path, middleware)
    }

    /// Register a route answering every supported method.
    pub fn all(&mut self, path: impl Into<RoutePath>, middleware: Vec<Handler>) -> &mut Self {
        self.push_verb(
            vec![
                Method::CONNECT,
                Method::DELETE,
                Method::GET,
                Method::HEAD,
                Method::OPTIONS,
                Method::PATCH,
                Method::POST,
                Method::PUT,
                Method::TRACE,
            ],
            path,
            middleware,
        )
    }

    /// Add shared middleware, prepended to every route's own middleware at
    /// build time.
    pub fn use_middleware(&mut self, handler: Handler) -> &mut Self {
        self.middleware.push(handler);
        self
    }

    /// Add a shared parameter handler; a route-level handler of the same
    /// name wins.
    pub fn param(&mut self, name: &str, handler: ParamHandler) -> &mut Self {
        self.param_handlers.insert(name.to_string(), handler);
        self
    }

    /// Register a version sub-router inheriting this router's configuration.
    pub fn version(&mut self, identifier: &str) -> Result<&mut Router, RouterError> {
        self.version_with(identifier, RouteOptions::default())
    }

    /// Register a version sub-router with option overrides layered on top of
    /// the inherited configuration.
    ///
    /// The identifier is case-normalized unless the router is `sensitive`;
    /// duplicates under that normalization fail. The child's prefix follows
    /// the version mode: url-based versions extend the parent prefix with the
    /// identifier, other modes keep the parent prefix as is.
    pub fn version_with(
        &mut self,
        identifier: &str,
        overrides: RouteOptions,
    ) -> Result<&mut Router, RouterError> {
        let Some(mode) = &self.config.version_handler else {
            return Err(RouterError::VersioningDisabled);
        };

        let real = if self.config.sensitive {
            identifier.to_string()
        } else {
            identifier.to_lowercase()
        };
        if self.versions.iter().any(|(id, _)| *id == real) {
            return Err(RouterError::DuplicateVersion { identifier: real });
        }

        let url_mode = matches!(mode, VersionHandler::UrlBased);
        let prefix = match (&self.config.prefix, url_mode) {
            (Some(prefix), true) => Some(format!("{prefix}/{real}")),
            (Some(prefix), false) => Some(prefix.clone()),
            (None, true) => Some(real.clone()),
            (None, false) => None,
        };

        let mut config = self.config.clone();
        config.prefix = prefix;
        config.version_handler = None;
        overrides.apply_to(&mut config);

        info!(identifier = %real, prefix = config.prefix.as_deref().unwrap_or(""), "version registered");
        self.versions.push((real, Router::with_config(config)));
        let last = self.versions.len() - 1;
        Ok(&mut self.versions[last].1)
    }

    #[cfg(test)]
    pub(crate) fn route_methods(&self) -> Vec<Vec<Method>> {
        self.route_list.iter().map(|s| s.methods.clone()).collect()
    }

    /// Freeze the route table into a single serving handler.
    ///
    /// Builds every layer (shared middleware prepended, shared parameter
    /// handlers merged under route-level ones, options resolved) and each
    /// version sub-router's handler. The router should not be mutated after
    /// the returned handler is bound into the serving pipeline.
    #[must_use]
    pub fn routes(&self) -> Handler {
        let mut layers: Vec<Layer> = Vec::with_capacity(self.route_list.len());
        for spec in &self.route_list {
            let mut middleware = self.middleware.clone();
            middleware.extend(spec.middleware.iter().cloned());

            let mut param_handlers = self.param_handlers.clone();
            for (name, handler) in &spec.param_handlers {
                param_handlers.insert(name.clone(), Arc::clone(handler));
            }

            let layer_spec = RouteSpec {
                path: spec.path.clone(),
                methods: spec.methods.clone(),
                middleware,
                param_handlers,
                options: spec.options.clone(),
            };
            let config = self.config.resolve(&spec.options);

            let mut layer = Layer::new();
            if let Err(err) = layer.register(layer_spec, config) {
                // route() validated the spec already; a failure here means a
                // spec was corrupted between registration and build
                error!(error = %err, "skipping route that failed layer registration");
                continue;
            }
            layers.push(layer);
        }

        let versions: Vec<(String, Handler)> = self
            .versions
            .iter()
            .map(|(id, router)| (id.clone(), router.routes()))
            .collect();
        let version_ids: Vec<String> = versions.iter().map(|(id, _)| id.clone()).collect();

        info!(
            route_count = layers.len(),
            version_count = versions.len(),
            prefix = self.config.prefix.as_deref().unwrap_or(""),
            "route table built"
        );

        let state = RouterState {
            layers,
            versions,
            version_ids,
            middleware: self.middleware.clone(),
            config: self.config.clone(),
            slash_prefix: self.config.prefix.as_ref().map(|p| format!("/{p}")),
        };

        Arc::new(move |ctx, next| state.serve(ctx, next))
    }
}

/// The frozen state a serving handler closes over.
struct RouterState {
    layers: Vec<Layer>,
    versions: Vec<(String, Handler)>,
    version_ids: Vec<String>,
    middleware: Vec<Handler>,
    config: RouterConfig,
    slash_prefix: Option<String>,
}

impl RouterState {
    /// Top-level request handling: dispatch, then absorb any error escaping
    /// the composed chain. Never returns `Err`.
    fn serve(&self, ctx: &mut RequestContext, next: Next) -> HandlerResult {
        if let Some(slash_prefix) = &self.slash_prefix {
            if !ctx.request.path.starts_with(slash_prefix.as_str()) {
                // Not ours: defer entirely to the surrounding composition
                return next.run(ctx);
            }
        }

        // Keep a copy of the continuation so the error boundary can still
        // hand the request onward
        let recovery = next.clone();
        match self.dispatch(ctx, next) {
            Ok(()) => Ok(()),
            Err(err) => {
                ctx.response.set_status(err.status);
                if self.config.expose {
                    ctx.response.body = Some(Value::String(err.message.clone()));
                }
                // The application-level error channel
                error!(
                    status = err.status,
                    method = %ctx.request.method,
                    path = %ctx.request.path,
                    error = %err,
                    "handler chain failed"
                );
                if let Err(follow) = recovery.run(ctx) {
                    error!(error = %follow, "continuation failed inside error recovery");
                }
                Ok(())
            }
        }
    }

    fn dispatch(&self, ctx: &mut RequestContext, mut next: Next) -> HandlerResult {
        if let Some(child) = self.resolve_version(ctx) {
            debug!(method = %ctx.request.method, path = %ctx.request.path, "delegating to version sub-router");
            let mut stack = self.middleware.clone();
            stack.push(Arc::clone(child));
            next.prepend(&stack);
            return next.run(ctx);
        }

        let (stack, worst) = {
            let path = match &self.slash_prefix {
                Some(slash_prefix) => ctx
                    .request
                    .path
                    .strip_prefix(slash_prefix.as_str())
                    .unwrap_or(ctx.request.path.as_str()),
                None => ctx.request.path.as_str(),
            };
            debug!(
                method = %ctx.request.method,
                path = %path,
                layer_count = self.layers.len(),
                "route scan"
            );

            let mut stack: Vec<Handler> = Vec::new();
            let mut worst: Option<HttpError> = None;
            for layer in &self.layers {
                if !layer.matches(&ctx.request.method, path) {
                    continue;
                }
                match layer.dispatch(&ctx.request, path) {
                    Dispatch::Chain(handler) => stack.push(handler),
                    Dispatch::Error(err) => worst = Some(retain_worst(worst.take(), err)),
                }
            }
            (stack, worst)
        };

        if !stack.is_empty() {
            // Every matching route contributes; the chains run in
            // registration order as one unit
            info!(
                method = %ctx.request.method,
                path = %ctx.request.path,
                chain_count = stack.len(),
                "routes matched"
            );
            next.prepend(&stack);
            next.run(ctx)
        } else if let Some(err) = worst {
            warn!(
                method = %ctx.request.method,
                path = %ctx.request.path,
                status = err.status,
                "no route accepted the request"
            );
            ctx.response.set_status(err.status);
            if self.config.expose || err.expose_message() {
                ctx.response.body = Some(Value::String(err.message.clone()));
            }
            for (name, value) in &err.headers {
                ctx.response.set_header(name, value.clone());
            }
            next.run(ctx)
        } else {
            debug!(method = %ctx.request.method, path = %ctx.request.path, "no route matched, falling through");
            next.run(ctx)
        }
    }

    fn resolve_version(&self, ctx: &RequestContext) -> Option<&Handler> {
        let mode = self.config.version_handler.as_ref()?;
        match mode {
            VersionHandler::Custom(resolver) => {
                let id = resolver(ctx, &self.version_ids)?;
                self.version_handler_for(&id)
            }
            VersionHandler::HeaderBased => {
                let value = ctx.request.header(VERSION_HEADER)?;
                let requested = if self.config.sensitive {
                    value.to_string()
                } else {
                    value.to_lowercase()
                };
                self.version_handler_for(&requested)
            }
            VersionHandler::UrlBased => {
                let path = ctx.request.path.as_str();
                for (id, handler) in &self.versions {
                    let version_prefix = match &self.config.prefix {
                        Some(prefix) => format!("/{prefix}/{id}/"),
                        None => format!("/{id}/"),
                    };
                    if path.starts_with(&version_prefix) {
                        return Some(handler);
                    }
                }
                None
            }
        }
    }

    fn version_handler_for(&self, identifier: &str) -> Option<&Handler> {
        self.versions
            .iter()
            .find(|(id, _)| id == identifier)
            .map(|(_, handler)| handler)
    }
}

/// Keep the error with the highest status; `>=` means the most recently
/// evaluated layer wins ties. Two 405s union their `Allow` lists so the
/// final error names every method declared across the matching layers.
fn retain_worst(current: Option<HttpError>, candidate: HttpError) -> HttpError {
    match current {
        None => candidate,
        Some(current) => {
            if candidate.status >= current.status {
                let mut candidate = candidate;
                if candidate.status == 405 && current.status == 405 {
                    let merged = merge_token_lists(
                        [
                            current.header("allow").unwrap_or(""),
                            candidate.header("allow").unwrap_or(""),
                        ]
                        .into_iter(),
                    );
                    candidate.set_header("allow", merged);
                }
                candidate
            } else {
                current
            }
        }
    }
}
