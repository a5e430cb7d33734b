//! Method and open-proxy guard.
//!
//! Runs ahead of routing for every request:
//! - absolute-URI targets (`GET http://host/...`, `CONNECT host:443`) → 400
//! - methods other than GET and HEAD → 405
//!
//! Neither rejection contacts an upstream.

use axum::extract::Request;
use axum::http::header::{self, HeaderValue};
use axum::http::{Method, StatusCode, Version};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::http::request::RemoteAddr;
use crate::observability::metrics;
use crate::proxy::headers::SERVER_NAME;

/// Body of the 400 answer to proxy-style requests.
pub const NOT_A_PROXY: &str = "this is not a proxy\n";

/// Axum middleware rejecting proxy-style requests and disallowed methods.
pub async fn reject_proxy_requests(req: Request, next: Next) -> Response {
    if is_proxy_request(&req) {
        tracing::warn!(
            remote_addr = %RemoteAddr::of(&req),
            target = %req.uri(),
            "reject proxy request"
        );
        metrics::record_rejection("proxy_request");
        return boundary_response(StatusCode::BAD_REQUEST, NOT_A_PROXY);
    }

    if !is_allowed_method(req.method()) {
        tracing::warn!(
            remote_addr = %RemoteAddr::of(&req),
            method = %req.method(),
            "reject invalid method"
        );
        metrics::record_rejection("method_not_allowed");
        let mut response = boundary_response(StatusCode::METHOD_NOT_ALLOWED, "");
        response
            .headers_mut()
            .insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
        return response;
    }

    next.run(req).await
}

/// A request whose target names a host.
///
/// HTTP/2 always carries `:authority`, so only HTTP/1.x targets count.
pub fn is_proxy_request(req: &Request) -> bool {
    req.version() < Version::HTTP_2 && req.uri().authority().is_some()
}

pub fn is_allowed_method(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

/// Response generated by the proxy itself, marked with `Server: distriproxy`.
pub fn boundary_response(status: StatusCode, body: &'static str) -> Response {
    let mut response = if body.is_empty() {
        status.into_response()
    } else {
        (status, body).into_response()
    };
    response
        .headers_mut()
        .insert(header::SERVER, HeaderValue::from_static(SERVER_NAME));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(method: Method, uri: &str) -> Request {
        axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn absolute_and_authority_forms_are_proxy_requests() {
        assert!(is_proxy_request(&request(Method::GET, "http://example.com/x")));
        assert!(is_proxy_request(&request(Method::CONNECT, "example.com:443")));
        assert!(!is_proxy_request(&request(Method::GET, "/debian/pool/main/a.deb")));
        assert!(!is_proxy_request(&request(Method::OPTIONS, "*")));
    }

    #[test]
    fn http2_authority_is_not_a_proxy_request() {
        let mut req = request(Method::GET, "https://mirror.local/debian/x");
        *req.version_mut() = Version::HTTP_2;
        assert!(!is_proxy_request(&req));
    }

    #[test]
    fn only_get_and_head_pass() {
        assert!(is_allowed_method(&Method::GET));
        assert!(is_allowed_method(&Method::HEAD));
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS, Method::PATCH] {
            assert!(!is_allowed_method(&method), "{method}");
        }
    }

    #[test]
    fn boundary_responses_carry_server_header() {
        let response = boundary_response(StatusCode::NOT_FOUND, "");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::SERVER], "distriproxy");
    }
}
