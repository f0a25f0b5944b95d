//! # Pattern Module
//!
//! Compiles path templates into matchers that extract named parameters.
//!
//! Templates use `{name}` placeholders (e.g. `/users/{id}/posts/{post_id}`).
//! At registration time a template is compiled into a regex honoring the
//! route's matching options; at request time [`PathMatcher::matches`] tests a
//! path and returns the captured parameters.
//!
//! ## Example
//!
//! ```rust
//! use switchyard::pattern::{MatchOptions, PathMatcher};
//!
//! let matcher = PathMatcher::compile("/users/{id}", MatchOptions::default());
//! let m = matcher.matches("/users/123").unwrap();
//! assert_eq!(m.params[0].1, "123");
//! ```

mod core;

pub use core::{MatchOptions, PathMatch, PathMatcher};
