use crate::context::ParamVec;
use regex::Regex;
use std::sync::Arc;

/// Options governing how a compiled template matches paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Match path segments case-sensitively
    pub sensitive: bool,
    /// Require an exact trailing slash; when false a single trailing slash
    /// is tolerated
    pub strict: bool,
    /// Anchor the match at the end of the path
    pub end: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            sensitive: false,
            strict: false,
            end: true,
        }
    }
}

/// Result of successfully matching a path against a compiled template.
#[derive(Debug, Clone)]
pub struct PathMatch {
    /// Captured parameters in template declaration order
    /// (stack-allocated for ≤8 params)
    pub params: ParamVec,
    /// Byte offset where the match begins (always 0 for anchored templates)
    pub index: usize,
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    regex: Regex,
    param_names: Vec<Arc<str>>,
}

impl PathMatcher {
    /// Compile a `{param}` template into a matcher.
    ///
    /// Transforms templates like `/users/{id}` into regex patterns like
    /// `^/users/([^/]+)$` and records the parameter names in order. Literal
    /// segments are escaped, so compilation cannot fail for any template.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn compile(template: &str, opts: MatchOptions) -> Self {
        // Reserve space for the final regex string and parameter list
        let mut pattern = String::with_capacity(template.len() + 8);
        if !opts.sensitive {
            pattern.push_str("(?i)");
        }
        pattern.push('^');
        let mut param_names: Vec<Arc<str>> = Vec::with_capacity(template.matches('{').count());

        let mut pushed_segment = false;
        for segment in template.split('/') {
            if segment.starts_with('{') && segment.ends_with('}') {
                let name = segment.trim_start_matches('{').trim_end_matches('}');
                pattern.push_str("/([^/]+)");
                param_names.push(Arc::from(name));
                pushed_segment = true;
            } else if !segment.is_empty() {
                pattern.push('/');
                pattern.push_str(&regex::escape(segment));
                pushed_segment = true;
            }
        }
        if !pushed_segment {
            // Root template "/"
            pattern.push('/');
        }

        if !opts.strict {
            pattern.push_str("/?");
        }
        if opts.end {
            pattern.push('$');
        }

        // Escaped literals and fixed alternations only; cannot fail
        let regex = Regex::new(&pattern).expect("failed to compile path template regex");

        Self { regex, param_names }
    }

    /// Test a request path, returning captured parameters on a match.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<PathMatch> {
        let captures = self.regex.captures(path)?;
        let mut params = ParamVec::new();
        for (i, name) in self.param_names.iter().enumerate() {
            if let Some(val) = captures.get(i + 1) {
                params.push((Arc::clone(name), val.as_str().to_string()));
            }
        }
        let index = captures.get(0).map(|m| m.start()).unwrap_or(0);
        Some(PathMatch { params, index })
    }

    /// Parameter names in declaration order.
    #[must_use]
    pub fn param_names(&self) -> &[Arc<str>] {
        &self.param_names
    }
}
