//! Forwarding a routed request to its upstream origin.
//!
//! # Flow
//! ```text
//! RouteMatch + request parts
//!     → upstream URL = origin + stripped path      (500 if malformed)
//!     → same method, no body, filtered headers
//!     → shared client                              (502 on failure, no retry)
//!     → status + upstream headers + Via, body streamed via RelayBody
//! ```
//!
//! The upstream call lives inside the handler future. If the client
//! disconnects, the server drops that future and the call is aborted with it.

use std::error::Error as StdError;
use std::time::Instant;

use axum::body::Body;
use axum::http::{request::Parts, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use reqwest::Url;
use tracing::Instrument;

use crate::http::request::RemoteAddr;
use crate::observability::metrics;
use crate::proxy::body::RelayBody;
use crate::proxy::client::UpstreamClient;
use crate::proxy::headers::{filter_request_headers, relay_response_headers};
use crate::routing::RouteMatch;

/// Relays requests to upstream origins over a shared client.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: UpstreamClient,
}

impl Forwarder {
    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }

    /// Forward one request. Every failure becomes a status code here.
    pub async fn forward(&self, matched: RouteMatch<'_>, parts: &Parts, remote: RemoteAddr) -> Response {
        let span = tracing::info_span!(
            "forward",
            route = %matched.route.prefix(),
            remote_addr = %remote,
            method = %parts.method,
            path = %parts.uri.path(),
        );

        self.forward_inner(matched, parts, span.clone())
            .instrument(span)
            .await
    }

    async fn forward_inner(&self, matched: RouteMatch<'_>, parts: &Parts, span: tracing::Span) -> Response {
        let start = Instant::now();
        let route = matched.route.prefix();
        let target = matched.route.upstream_target(matched.rest);

        let url = match Url::parse(&target) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(target = %target, error = %e, "constructing upstream request failed");
                metrics::record_request(route, StatusCode::INTERNAL_SERVER_ERROR, start);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        let mut upstream = reqwest::Request::new(parts.method.clone(), url);
        *upstream.headers_mut() = filter_request_headers(&parts.headers);

        tracing::debug!(target = %target, "sending upstream request");

        let response = match self.client.send(upstream).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(target = %target, error = %error_chain(&e), "upstream request failed");
                metrics::record_request(route, StatusCode::BAD_GATEWAY, start);
                return StatusCode::BAD_GATEWAY.into_response();
            }
        };

        let status = response.status();
        let headers = relay_response_headers(response.headers());
        metrics::record_request(route, status, start);

        let body = if carries_body(&parts.method, status) {
            Body::from_stream(RelayBody::new(response, span))
        } else {
            drop(response);
            tracing::info!(status = %status, "---> {}", status);
            Body::empty()
        };

        let mut relayed = Response::new(body);
        *relayed.status_mut() = status;
        *relayed.headers_mut() = headers;
        relayed
    }
}

/// Whether a response to `method` with `status` has a body to relay.
fn carries_body(method: &Method, status: StatusCode) -> bool {
    *method != Method::HEAD
        && !status.is_informational()
        && status != StatusCode::NO_CONTENT
        && status != StatusCode::NOT_MODIFIED
}

/// `reqwest` hides the interesting part (DNS, refused, TLS) in the source chain.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bodies_are_skipped_where_http_forbids_them() {
        assert!(carries_body(&Method::GET, StatusCode::OK));
        assert!(carries_body(&Method::GET, StatusCode::NOT_FOUND));
        assert!(!carries_body(&Method::HEAD, StatusCode::OK));
        assert!(!carries_body(&Method::GET, StatusCode::NOT_MODIFIED));
        assert!(!carries_body(&Method::GET, StatusCode::NO_CONTENT));
    }

    #[test]
    fn error_chain_includes_sources() {
        #[derive(Debug)]
        struct Wrapper(std::io::Error);
        impl std::fmt::Display for Wrapper {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "error sending request")
            }
        }
        impl StdError for Wrapper {
            fn source(&self) -> Option<&(dyn StdError + 'static)> {
                Some(&self.0)
            }
        }

        let wrapped = Wrapper(std::io::Error::new(std::io::ErrorKind::Other, "dns error"));
        assert_eq!(error_chain(&wrapped), "error sending request: dns error");
    }
}
