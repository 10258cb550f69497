//! Route matching logic.
//!
//! # Responsibilities
//! - Match HTTP method (case-insensitive)
//! - Match path exactly, ignoring any query-string suffix
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Method matching is case-insensitive
//! - Path matching is exact and case-sensitive; no wildcards or parameters
//! - No regex to guarantee O(n) matching

use crate::http::request::InboundRequest;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &InboundRequest) -> bool;
}

/// Matches the HTTP method.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    expected_method: String,
}

impl MethodMatcher {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            expected_method: method.into(),
        }
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, req: &InboundRequest) -> bool {
        req.method.eq_ignore_ascii_case(&self.expected_method)
    }
}

/// Matches the request path exactly.
#[derive(Debug, Clone)]
pub struct ExactPathMatcher {
    path: String,
}

impl ExactPathMatcher {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Matcher for ExactPathMatcher {
    fn matches(&self, req: &InboundRequest) -> bool {
        strip_query(&req.path) == self.path
    }
}

/// Everything before the first `?`.
pub fn strip_query(path: &str) -> &str {
    path.split_once('?').map_or(path, |(p, _)| p)
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, req: &InboundRequest) -> bool {
        self.matchers.iter().all(|m| m.matches(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str, path: &str) -> InboundRequest {
        InboundRequest {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_method_matcher() {
        let matcher = MethodMatcher::new("GET");
        assert!(matcher.matches(&request("GET", "/")));
        assert!(matcher.matches(&request("get", "/"))); // Case insensitive
        assert!(!matcher.matches(&request("POST", "/")));
    }

    #[test]
    fn test_path_matcher() {
        let matcher = ExactPathMatcher::new("/hello");
        assert!(matcher.matches(&request("GET", "/hello")));
        assert!(matcher.matches(&request("GET", "/hello?query=world")));
        assert!(!matcher.matches(&request("GET", "/hello/world")));
        assert!(!matcher.matches(&request("GET", "/Hello")));
        assert!(!matcher.matches(&request("GET", "/hell")));
    }

    #[test]
    fn test_and_matcher() {
        let matcher = AndMatcher::new(vec![
            Box::new(MethodMatcher::new("POST")),
            Box::new(ExactPathMatcher::new("/test")),
        ]);
        assert!(matcher.matches(&request("post", "/test")));
        assert!(!matcher.matches(&request("GET", "/test")));
        assert!(!matcher.matches(&request("POST", "/other")));
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("/a?b=c?d"), "/a");
        assert_eq!(strip_query("/a"), "/a");
        assert_eq!(strip_query("?x"), "");
    }
}
