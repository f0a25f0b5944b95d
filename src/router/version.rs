use crate::context::RequestContext;
use std::sync::Arc;

/// Header consulted in header-based version resolution.
pub const VERSION_HEADER: &str = "version";

/// A custom version resolver: given the request and the known version
/// identifiers, name the version to delegate to (or `None` for ordinary
/// dispatch).
pub type VersionResolver =
    Arc<dyn Fn(&RequestContext, &[String]) -> Option<String> + Send + Sync>;

/// How a router resolves which version sub-router should serve a request.
#[derive(Clone)]
pub enum VersionHandler {
    /// The version identifier is the first path segment under the router's
    /// prefix (`/v1/items`)
    UrlBased,
    /// The version identifier is carried in the `version` request header
    HeaderBased,
    /// A caller-supplied resolver inspects the request
    Custom(VersionResolver),
}

impl std::fmt::Debug for VersionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionHandler::UrlBased => write!(f, "UrlBased"),
            VersionHandler::HeaderBased => write!(f, "HeaderBased"),
            VersionHandler::Custom(_) => write!(f, "Custom(<function>)"),
        }
    }
}
