//! Header manipulation between client and upstream.
//!
//! # Responsibilities
//! - Drop `Connection` and `Host` from requests sent upstream
//! - Copy upstream response headers verbatim and append `Via`
//! - Mark boundary responses with `Server`
//!
//! # Design Decisions
//! - Pure functions: the input map is never mutated, a new one is returned
//! - Repeated values for one name keep their order

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

/// Product token used in `Server` and `Via`.
pub const SERVER_NAME: &str = "distriproxy";

/// Request headers that stay on this hop.
pub fn is_filtered_request_header(name: &HeaderName) -> bool {
    *name == header::CONNECTION || *name == header::HOST
}

/// Copy of `inbound` without the filtered request headers.
pub fn filter_request_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound {
        if is_filtered_request_header(name) {
            continue;
        }
        filtered.append(name.clone(), value.clone());
    }
    filtered
}

/// Upstream response headers plus one appended `Via: distriproxy`.
pub fn relay_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = upstream.clone();
    headers.append(header::VIA, HeaderValue::from_static(SERVER_NAME));
    headers
}
