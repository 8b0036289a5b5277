//! Route matching logic.
//!
//! # Responsibilities
//! - Match host (exact, case-sensitive, port already stripped)
//! - Match path prefix with trailing-slash normalization
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Host matching is exact string comparison as received
//! - A prefix `/api/` matches `/api` and `/api/...` but never `/apiextra`
//! - Empty condition = always matches (wildcard)
//! - No regex to guarantee O(n) matching

use crate::config::RouteFrom;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if `(host, path)` satisfies this condition.
    fn matches(&self, host: &str, path: &str) -> bool;
}

/// Matches the request host.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    expected_host: String,
}

impl HostMatcher {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            expected_host: host.into(),
        }
    }
}

impl Matcher for HostMatcher {
    fn matches(&self, host: &str, _path: &str) -> bool {
        host == self.expected_host
    }
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher. The prefix ends with `/`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, _host: &str, path: &str) -> bool {
        // `path + "/"` without allocating.
        match path.strip_prefix(self.prefix.as_str()) {
            Some(_) => true,
            None => self.prefix.strip_suffix('/') == Some(path),
        }
    }
}

/// Optional host and optional path constraint, combined with AND.
#[derive(Debug, Clone, Default)]
pub struct RuleMatcher {
    host: Option<HostMatcher>,
    path: Option<PathPrefixMatcher>,
}

impl RuleMatcher {
    pub fn new(host: Option<&str>, path: Option<&str>) -> Self {
        Self {
            host: host.filter(|h| !h.is_empty()).map(HostMatcher::new),
            path: path.filter(|p| !p.is_empty()).map(PathPrefixMatcher::new),
        }
    }

    pub fn from_config(from: &RouteFrom) -> Self {
        Self::new(from.host.as_deref(), from.path.as_deref())
    }
}

impl Matcher for RuleMatcher {
    fn matches(&self, host: &str, path: &str) -> bool {
        self.host.as_ref().map_or(true, |m| m.matches(host, path))
            && self.path.as_ref().map_or(true, |m| m.matches(host, path))
    }
}
