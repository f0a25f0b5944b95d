use crate::chain::{compose, Handler, ParamHandler};
use crate::config::{LayerConfig, RouteOptions};
use crate::context::{ParamVec, Request};
use crate::cors;
use crate::error::{HttpError, RouterError};
use crate::pattern::{MatchOptions, PathMatcher};
use http::Method;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A route's path: a `{param}` template or a raw regex whose named capture
/// groups become parameters.
#[derive(Debug, Clone)]
pub enum RoutePath {
    Template(String),
    Raw(Regex),
}

impl From<&str> for RoutePath {
    fn from(template: &str) -> Self {
        RoutePath::Template(template.to_string())
    }
}

impl From<String> for RoutePath {
    fn from(template: String) -> Self {
        RoutePath::Template(template)
    }
}

impl From<Regex> for RoutePath {
    fn from(regex: Regex) -> Self {
        RoutePath::Raw(regex)
    }
}

/// Everything a route declares at registration time.
#[derive(Clone)]
pub struct RouteSpec {
    pub path: RoutePath,
    /// Non-empty set of HTTP methods this route serves
    pub methods: Vec<Method>,
    /// Ordered middleware run on a match
    pub middleware: Vec<Handler>,
    /// Captured-parameter-name → handler, run ahead of `middleware`
    pub param_handlers: HashMap<String, ParamHandler>,
    /// Per-route overrides of the router configuration
    pub options: RouteOptions,
}

impl RouteSpec {
    #[must_use]
    pub fn new(path: impl Into<RoutePath>, methods: Vec<Method>, middleware: Vec<Handler>) -> Self {
        Self {
            path: path.into(),
            methods,
            middleware,
            param_handlers: HashMap::new(),
            options: RouteOptions::default(),
        }
    }

    /// Attach a handler for a named path parameter, builder style.
    #[must_use]
    pub fn param(mut self, name: &str, handler: ParamHandler) -> Self {
        self.param_handlers.insert(name.to_string(), handler);
        self
    }

    /// Attach per-route option overrides, builder style.
    #[must_use]
    pub fn options(mut self, options: RouteOptions) -> Self {
        self.options = options;
        self
    }
}

impl std::fmt::Debug for RouteSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteSpec")
            .field("path", &self.path)
            .field("methods", &self.methods)
            .field("middleware_count", &self.middleware.len())
            .field(
                "param_handlers",
                &self.param_handlers.keys().collect::<Vec<_>>(),
            )
            .field("options", &self.options)
            .finish()
    }
}

/// A route path compiled for matching.
enum CompiledPath {
    Template(PathMatcher),
    Raw(Regex),
}

impl CompiledPath {
    fn is_match(&self, path: &str) -> bool {
        match self {
            CompiledPath::Template(matcher) => matcher.matches(path).is_some(),
            CompiledPath::Raw(regex) => regex.is_match(path),
        }
    }

    fn captures(&self, path: &str) -> Option<ParamVec> {
        match self {
            CompiledPath::Template(matcher) => matcher.matches(path).map(|m| m.params),
            CompiledPath::Raw(regex) => {
                let caps = regex.captures(path)?;
                let mut params = ParamVec::new();
                for name in regex.capture_names().flatten() {
                    if let Some(m) = caps.name(name) {
                        params.push((Arc::from(name), m.as_str().to_string()));
                    }
                }
                Some(params)
            }
        }
    }
}

struct RegisteredRoute {
    path: CompiledPath,
    methods: Vec<Method>,
    middleware: Vec<Handler>,
    param_handlers: HashMap<String, ParamHandler>,
    config: LayerConfig,
}

/// Outcome of dispatching a matched request through one layer.
pub enum Dispatch {
    /// The executable handler chain for this layer
    Chain(Handler),
    /// An error outcome, returned as a value so the router can aggregate
    Error(HttpError),
}

/// One registered route.
#[derive(Default)]
pub struct Layer {
    route: Option<RegisteredRoute>,
}

impl Layer {
    #[must_use]
    pub fn new() -> Self {
        Self { route: None }
    }

    /// Attach the immutable route spec.
    ///
    /// Fails with [`RouterError::RouteAlreadyRegistered`] when called twice;
    /// the existing registration is left untouched. An empty method set
    /// fails with [`RouterError::EmptyMethods`].
    pub fn register(&mut self, spec: RouteSpec, config: LayerConfig) -> Result<(), RouterError> {
        if self.route.is_some() {
            return Err(RouterError::RouteAlreadyRegistered);
        }
        if spec.methods.is_empty() {
            return Err(RouterError::EmptyMethods);
        }

        let path = match spec.path {
            RoutePath::Template(template) => {
                let opts = MatchOptions {
                    sensitive: config.sensitive,
                    strict: config.strict,
                    end: config.end,
                };
                CompiledPath::Template(PathMatcher::compile(&template, opts))
            }
            RoutePath::Raw(regex) => CompiledPath::Raw(regex),
        };

        self.route = Some(RegisteredRoute {
            path,
            methods: spec.methods,
            middleware: spec.middleware,
            param_handlers: spec.param_handlers,
            config,
        });
        Ok(())
    }

    /// Whether this layer participates in the request.
    ///
    /// True when the path matches and one of: the method is declared; the
    /// request is an OPTIONS probe and the layer carries a CORS policy; the
    /// layer's `allowed_methods` option makes it participate in cross-route
    /// 405 aggregation.
    #[must_use]
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        let Some(route) = &self.route else {
            return false;
        };
        if !route.path.is_match(path) {
            return false;
        }
        route.methods.contains(method)
            || (*method == Method::OPTIONS && !route.config.cors.is_empty())
            || route.config.allowed_methods
    }

    /// Turn a matched request into a handler chain or an error value.
    #[must_use]
    pub fn dispatch(&self, request: &Request, path: &str) -> Dispatch {
        let Some(route) = &self.route else {
            // Unregistered layer: nothing to serve
            return Dispatch::Error(HttpError::not_found());
        };
        let Some(params) = route.path.captures(path) else {
            return Dispatch::Error(HttpError::not_found());
        };

        if route.methods.contains(&request.method) {
            let mut stack: Vec<Handler> =
                Vec::with_capacity(params.len() + route.middleware.len());
            for (name, value) in &params {
                if let Some(handler) = route.param_handlers.get(name.as_ref()) {
                    let handler = Arc::clone(handler);
                    let value = value.clone();
                    stack.push(Arc::new(move |ctx, next| handler(ctx, next, &value)));
                }
            }
            stack.extend(route.middleware.iter().cloned());
            Dispatch::Chain(compose(stack))
        } else if request.method == Method::OPTIONS {
            if route.config.cors.is_empty() {
                // An OPTIONS probe against a route with no CORS policy is a
                // miss, not a method violation
                debug!(path = %path, "OPTIONS probe on CORS-less route");
                Dispatch::Error(HttpError::not_found())
            } else {
                match cors::negotiate(request, &route.config.cors) {
                    Some(headers) => Dispatch::Chain(Arc::new(move |ctx, _next| {
                        ctx.response.set_status(204);
                        headers.apply(&mut ctx.response);
                        Ok(())
                    })),
                    None => Dispatch::Chain(Arc::new(|ctx, _next| {
                        ctx.response.set_status(403);
                        Ok(())
                    })),
                }
            }
        } else {
            Dispatch::Error(HttpError::method_not_allowed(&join_methods(&route.methods)))
        }
    }
}

fn join_methods(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
