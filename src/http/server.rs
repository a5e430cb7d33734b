//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the guard, dispatch and catch-all
//! - Wire up middleware (tracing)
//! - Serve on the acquired listener, plain or TLS
//! - Dispatch requests to the route table and forwarder
//! - Drain in-flight requests on shutdown, bounded by [`DRAIN_TIMEOUT`]

use std::borrow::Cow;
use std::future::IntoFuture;
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::Response,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use futures_util::future::BoxFuture;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::http::request::RemoteAddr;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::proxy::guard::{boundary_response, reject_proxy_requests};
use crate::proxy::{Forwarder, UpstreamClient};
use crate::routing::{clean_path, RouteTable};

/// How long in-flight requests may run after a shutdown request.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for the serving phase.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("building upstream client failed: {0}")]
    Client(#[from] reqwest::Error),
    #[error("preparing listener failed: {0}")]
    Listener(#[source] std::io::Error),
    #[error("serve returned error: {0}")]
    Serve(#[source] std::io::Error),
    #[error("graceful shutdown did not finish within {0:?}, connections were force-closed")]
    DrainTimeout(Duration),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub forwarder: Forwarder,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    drain_timeout: Duration,
}

impl HttpServer {
    /// Create a server over an already compiled route table and client.
    pub fn new(routes: RouteTable, client: UpstreamClient) -> Self {
        let state = AppState {
            routes: Arc::new(routes),
            forwarder: Forwarder::new(client),
        };

        Self {
            router: Self::build_router(state),
            drain_timeout: DRAIN_TIMEOUT,
        }
    }

    /// Create a server from a validated configuration.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ServerError> {
        let routes = RouteTable::from_config(&config.routes);
        let client = UpstreamClient::new(&config.upstream)?;

        for route in routes.routes() {
            tracing::info!(prefix = %route.prefix(), origin = %route.origin(), "route mounted");
        }

        Ok(Self::new(routes, client))
    }

    /// Override the drain bound.
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// The request handling stack, without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The guard is the outer layer so it sees every request before routing.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(middleware::from_fn(reject_proxy_requests))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve on `listener` until `shutdown` fires, then drain.
    ///
    /// Returns `Ok` after a clean drain, [`ServerError::DrainTimeout`] if
    /// requests were still running when the bound elapsed.
    pub async fn run(
        self,
        listener: StdTcpListener,
        tls: Option<RustlsConfig>,
        shutdown: Shutdown,
    ) -> Result<(), ServerError> {
        listener.set_nonblocking(true).map_err(ServerError::Listener)?;
        let addr = listener.local_addr().map_err(ServerError::Listener)?;
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        let mut serve: BoxFuture<'static, std::io::Result<()>> = match tls {
            None => {
                let listener = TcpListener::from_std(listener).map_err(ServerError::Listener)?;
                let signal = shutdown.clone();
                Box::pin(
                    axum::serve(listener, app)
                        .with_graceful_shutdown(async move { signal.draining().await })
                        .into_future(),
                )
            }
            Some(tls) => {
                let handle = axum_server::Handle::new();
                let signal = shutdown.clone();
                let stop = handle.clone();
                tokio::spawn(async move {
                    signal.draining().await;
                    stop.graceful_shutdown(None);
                });
                Box::pin(
                    axum_server::from_tcp_rustls(listener, tls)
                        .handle(handle)
                        .serve(app),
                )
            }
        };

        shutdown.mark_listening();
        tracing::info!(address = %addr, "HTTP server started");

        tokio::select! {
            result = &mut serve => {
                // serving loop ended on its own, without a shutdown request
                shutdown.mark_stopped();
                return result.map_err(ServerError::Serve);
            }
            _ = shutdown.draining() => {}
        }

        tracing::info!(timeout = ?self.drain_timeout, "waiting for graceful shutdown");

        let outcome = tokio::time::timeout(self.drain_timeout, serve).await;
        shutdown.mark_stopped();

        match outcome {
            Ok(Ok(())) => {
                tracing::info!("shutdown completed");
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "serve returned error during graceful shutdown");
                Ok(())
            }
            Err(_) => Err(ServerError::DrainTimeout(self.drain_timeout)),
        }
    }
}

/// Dispatch to the mounted route, or answer 404.
///
/// Paths with dot or empty segments are redirected to their clean form first.
async fn proxy_handler(State(state): State<AppState>, request: Request) -> Response {
    let remote = RemoteAddr::of(&request);
    let (parts, _body) = request.into_parts();

    if let Cow::Owned(cleaned) = clean_path(parts.uri.path()) {
        tracing::info!(
            remote_addr = %remote,
            method = %parts.method,
            path = %parts.uri.path(),
            location = %cleaned,
            "-> 301 unclean path"
        );
        metrics::record_rejection("unclean_path");
        return redirect_response(cleaned, parts.uri.query());
    }

    match state.routes.lookup(parts.uri.path()) {
        Some(matched) => state.forwarder.forward(matched, &parts, remote).await,
        None => {
            tracing::info!(
                remote_addr = %remote,
                method = %parts.method,
                path = %parts.uri.path(),
                "-> 404 not found"
            );
            metrics::record_rejection("not_found");
            boundary_response(StatusCode::NOT_FOUND, "")
        }
    }
}

/// 301 to `path`, keeping the query.
fn redirect_response(path: String, query: Option<&str>) -> Response {
    let location = match query {
        Some(query) => format!("{}?{}", path, query),
        None => path,
    };

    match HeaderValue::try_from(location) {
        Ok(location) => {
            let mut response = boundary_response(StatusCode::MOVED_PERMANENTLY, "");
            response.headers_mut().insert(header::LOCATION, location);
            response
        }
        Err(_) => boundary_response(StatusCode::NOT_FOUND, ""),
    }
}
