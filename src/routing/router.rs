//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up the route a request path is mounted under
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan (acceptable for typical route counts)
//! - Longest prefix is tried first, so lookup stays deterministic even if
//!   validation was bypassed
//! - Explicit NoMatch rather than silent default

use crate::config::RouteConfig;
use crate::routing::route::Route;

/// A successful lookup: the route and the path with the prefix removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub rest: &'a str,
}

/// Immutable prefix → origin table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Compile routes from configuration.
    pub fn from_config(configs: &[RouteConfig]) -> Self {
        Self::new(configs.iter().map(Route::from).collect())
    }

    pub fn new(mut routes: Vec<Route>) -> Self {
        routes.sort_by(|a, b| b.prefix().len().cmp(&a.prefix().len()));
        Self { routes }
    }

    /// Find the route `path` is mounted under.
    pub fn lookup<'a>(&'a self, path: &'a str) -> Option<RouteMatch<'a>> {
        self.routes.iter().find_map(|route| {
            route
                .strip(path)
                .map(|rest| RouteMatch { route, rest })
        })
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mirrors() -> RouteTable {
        RouteTable::from_config(&[
            RouteConfig::new("/debian", "https://deb.debian.org/debian"),
            RouteConfig::new("/debian-security", "https://deb.debian.org/debian-security"),
            RouteConfig::new("/centos", "https://ftp.halifax.rwth-aachen.de/centos"),
            RouteConfig::new("/centos-vault", "http://vault.centos.org"),
        ])
    }

    #[test]
    fn dispatches_to_matching_prefix() {
        let table = mirrors();

        let m = table.lookup("/debian-security/dists/bookworm/Release").unwrap();
        assert_eq!(m.route.prefix(), "/debian-security");
        assert_eq!(m.rest, "/dists/bookworm/Release");

        let m = table.lookup("/centos-vault/7.9.2009/os").unwrap();
        assert_eq!(m.route.origin(), "http://vault.centos.org");
        assert_eq!(m.rest, "/7.9.2009/os");

        let m = table.lookup("/debian").unwrap();
        assert_eq!(m.route.prefix(), "/debian");
        assert_eq!(m.rest, "");
    }

    #[test]
    fn unknown_path_is_no_match() {
        let table = mirrors();
        assert!(table.lookup("/unknown/path").is_none());
        assert!(table.lookup("/").is_none());
        assert!(table.lookup("/debianx/pool").is_none());
    }

    #[test]
    fn longest_prefix_wins_for_unvalidated_tables() {
        let table = RouteTable::new(vec![
            Route::new("/a", "http://outer.example"),
            Route::new("/a/b", "http://inner.example"),
        ]);

        let m = table.lookup("/a/b/c").unwrap();
        assert_eq!(m.route.origin(), "http://inner.example");
        assert_eq!(m.rest, "/c");
    }
}
