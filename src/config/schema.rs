//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for distriproxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address used when no socket is inherited).
    pub listener: ListenerConfig,

    /// TLS termination toggles.
    pub tls: TlsConfig,

    /// Shared upstream client settings.
    pub upstream: UpstreamConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Mount points mapping a path prefix to an upstream origin.
    pub routes: Vec<RouteConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// TLS configuration for the listener.
///
/// Every field is optional so that command-line flags can tell "unset" apart
/// from an explicit value when overriding the file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TlsConfig {
    /// Serve HTTPS instead of plain HTTP.
    pub enable: Option<bool>,

    /// Path to certificate file (PEM).
    pub certificate_file: Option<String>,

    /// Path to private key file (PEM).
    pub key_file: Option<String>,
}

impl TlsConfig {
    /// Whether TLS is switched on. Unset means off.
    pub fn enabled(&self) -> bool {
        self.enable.unwrap_or(false)
    }
}

/// A single mount point.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RouteConfig {
    /// Path prefix on the proxy, e.g. `/debian`.
    pub prefix: String,

    /// Upstream origin URL, e.g. `https://deb.debian.org/debian`.
    pub origin: String,
}

impl RouteConfig {
    pub fn new(prefix: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            origin: origin.into(),
        }
    }
}

/// Settings for the shared upstream HTTP client.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// How long an idle pooled connection is kept, in seconds.
    pub pool_idle_timeout_secs: u64,

    /// Maximum idle connections kept per upstream host.
    pub pool_max_idle_per_host: usize,

    /// Follow upstream redirects (at most 10) instead of relaying them.
    pub follow_redirects: bool,

    /// Honour `HTTP_PROXY`/`HTTPS_PROXY`/`NO_PROXY` for upstream calls.
    pub use_env_proxy: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            pool_idle_timeout_secs: 90,
            pool_max_idle_per_host: 32,
            follow_redirects: true,
            use_env_proxy: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    pub log_level: String,

    /// Prefix log lines with a timestamp. Turn off under journald.
    pub log_timestamps: bool,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_timestamps: true,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [[routes]]
            prefix = "/debian"
            origin = "https://deb.debian.org/debian"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(!config.tls.enabled());
        assert!(config.upstream.follow_redirects);
        assert!(!config.observability.metrics_enabled);
        assert_eq!(
            config.routes,
            vec![RouteConfig::new("/debian", "https://deb.debian.org/debian")]
        );
    }

    #[test]
    fn tls_section_is_optional_per_field() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [tls]
            enable = true
            certificate_file = "/etc/cert.pem"
            "#,
        )
        .unwrap();

        assert!(config.tls.enabled());
        assert_eq!(config.tls.certificate_file.as_deref(), Some("/etc/cert.pem"));
        assert!(config.tls.key_file.is_none());
    }
}
