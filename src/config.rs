//! Router and route configuration.
//!
//! A [`RouterConfig`] holds the router-level defaults; [`RouteOptions`] holds
//! per-route overrides. The two are merged exactly once, at build time, into
//! the immutable [`LayerConfig`] a layer carries for the rest of the process
//! (route-level values win over router-level ones).

use crate::cors::CorsPolicy;
use crate::router::VersionHandler;

/// Router-level configuration.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Let routes participate in cross-route 405 aggregation even when the
    /// request method is not theirs
    pub allowed_methods: bool,
    /// Path prefix (without leading slash) this router answers under
    pub prefix: Option<String>,
    /// Case-sensitive matching for paths and version identifiers
    pub sensitive: bool,
    /// Require exact trailing slashes in path matching
    pub strict: bool,
    /// Anchor path matching at the end of the path
    pub end: bool,
    /// CORS policies applied to every route unless overridden
    pub cors: Vec<CorsPolicy>,
    /// Expose server-error messages to clients
    pub expose: bool,
    /// Version resolution strategy; `None` disables versioning
    pub version_handler: Option<VersionHandler>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            allowed_methods: true,
            prefix: None,
            sensitive: false,
            strict: false,
            end: true,
            cors: Vec::new(),
            expose: false,
            version_handler: None,
        }
    }
}

/// Per-route overrides; unset fields inherit the router's value.
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    pub allowed_methods: Option<bool>,
    pub sensitive: Option<bool>,
    pub strict: Option<bool>,
    pub end: Option<bool>,
    pub cors: Option<Vec<CorsPolicy>>,
}

/// The immutable configuration a registered layer carries.
#[derive(Debug, Clone)]
pub struct LayerConfig {
    pub allowed_methods: bool,
    pub sensitive: bool,
    pub strict: bool,
    pub end: bool,
    pub cors: Vec<CorsPolicy>,
}

impl RouterConfig {
    /// Merge per-route overrides over the router defaults.
    #[must_use]
    pub fn resolve(&self, overrides: &RouteOptions) -> LayerConfig {
        LayerConfig {
            allowed_methods: overrides.allowed_methods.unwrap_or(self.allowed_methods),
            sensitive: overrides.sensitive.unwrap_or(self.sensitive),
            strict: overrides.strict.unwrap_or(self.strict),
            end: overrides.end.unwrap_or(self.end),
            cors: overrides.cors.clone().unwrap_or_else(|| self.cors.clone()),
        }
    }
}

impl RouteOptions {
    /// Layer these overrides onto a full router config (used when a version
    /// sub-router inherits its parent's configuration).
    pub(crate) fn apply_to(&self, config: &mut RouterConfig) {
        if let Some(allowed_methods) = self.allowed_methods {
            config.allowed_methods = allowed_methods;
        }
        if let Some(sensitive) = self.sensitive {
            config.sensitive = sensitive;
        }
        if let Some(strict) = self.strict {
            config.strict = strict;
        }
        if let Some(end) = self.end {
            config.end = end;
        }
        if let Some(cors) = &self.cors {
            config.cors = cors.clone();
        }
    }
}
