//! A single mount point: path prefix → upstream origin.

use crate::config::RouteConfig;

/// Strip trailing `/` from a prefix. `/debian/` and `/debian` name the same mount.
pub fn normalize_prefix(prefix: &str) -> &str {
    prefix.trim_end_matches('/')
}

/// Strip trailing `/` from an origin; the stripped request path brings its own.
pub fn normalize_origin(origin: &str) -> &str {
    origin.trim_end_matches('/')
}

/// A compiled route.
///
/// Invariant: neither `prefix` nor `origin` ends with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    prefix: String,
    origin: String,
}

impl Route {
    /// Create a route, normalizing both sides.
    pub fn new(prefix: &str, origin: &str) -> Self {
        Self {
            prefix: normalize_prefix(prefix).to_string(),
            origin: normalize_origin(origin).to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// If `path` is mounted below this route, return the remainder with its
    /// leading `/` (empty when `path` equals the prefix).
    ///
    /// `/debian` matches `/debian` and `/debian/x`, never `/debian-security`.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }

    /// Upstream target for an already stripped path.
    pub fn upstream_target(&self, rest: &str) -> String {
        format!("{}{}", self.origin, rest)
    }
}

impl From<&RouteConfig> for Route {
    fn from(config: &RouteConfig) -> Self {
        Self::new(&config.prefix, &config.origin)
    }
}
