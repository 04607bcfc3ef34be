use hyper::Method;
use std::time::Duration;

/// Methods registered by [`Router::all`](crate::Router::all).
pub(crate) const SUPPORTED_METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::OPTIONS,
    Method::HEAD,
];

// Both route and request paths drop empty segments, so the empty string can
// never collide with a real segment.
pub(crate) const BASE_SEGMENT: &str = "";

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Largest integer an `f64` represents exactly (2^53 - 1).
pub(crate) const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

pub(crate) const ENV_MODE: &str = "WAYPOST_ENV";
pub(crate) const ENV_TIMEOUT_MS: &str = "WAYPOST_TIMEOUT_MS";
