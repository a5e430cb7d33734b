//! Shared upstream HTTP client.
//!
//! One pooled client serves every route. It is cheap to clone and safe to
//! use from all request tasks at once; no locking is put around it.

use std::time::Duration;

use reqwest::redirect::Policy;

use crate::config::UpstreamConfig;

/// Redirect hops followed when `follow_redirects` is on.
const MAX_REDIRECTS: usize = 10;

/// Connection-pooling client for upstream origins.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    inner: reqwest::Client,
}

impl UpstreamClient {
    /// Build the client. No overall request timeout is set: a transfer of a
    /// large package may take as long as it takes.
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let redirect = if config.follow_redirects {
            Policy::limited(MAX_REDIRECTS)
        } else {
            Policy::none()
        };

        let mut builder = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .redirect(redirect);

        if !config.use_env_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            inner: builder.build()?,
        })
    }

    /// Send one request. Dropping the returned future aborts the call.
    pub async fn send(&self, request: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.inner.execute(request).await
    }
}
