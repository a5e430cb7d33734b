//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate route prefixes and upstream origins
//! - Detect duplicate and overlapping mount points
//! - Check that TLS has both certificate and key when enabled
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs after command-line overrides, before any socket is opened

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;
use crate::routing::route::{normalize_origin, normalize_prefix};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no routes configured")]
    NoRoutes,

    #[error("invalid prefix {prefix:?}: {reason}")]
    InvalidPrefix { prefix: String, reason: &'static str },

    #[error("prefix {0:?} is configured more than once")]
    DuplicatePrefix(String),

    #[error("prefix {inner:?} is nested below prefix {outer:?}")]
    OverlappingPrefix { outer: String, inner: String },

    #[error("invalid origin {origin:?} for prefix {prefix:?}: {reason}")]
    InvalidOrigin {
        prefix: String,
        origin: String,
        reason: String,
    },

    #[error("invalid {field} {value:?}: {reason}")]
    InvalidAddress {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("TLS enabled but {0} not set")]
    TlsPathMissing(&'static str),
}

/// Validate a fully merged configuration (file plus command-line overrides).
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_routes(config, &mut errors);
    validate_addresses(config, &mut errors);
    validate_tls(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_routes(config: &ProxyConfig, errors: &mut Vec<ValidationError>) {
    if config.routes.is_empty() {
        errors.push(ValidationError::NoRoutes);
        return;
    }

    let mut prefixes: Vec<&str> = Vec::with_capacity(config.routes.len());

    for route in &config.routes {
        let prefix = normalize_prefix(&route.prefix);

        if !route.prefix.starts_with('/') {
            errors.push(ValidationError::InvalidPrefix {
                prefix: route.prefix.clone(),
                reason: "must start with '/'",
            });
        } else if prefix.is_empty() {
            errors.push(ValidationError::InvalidPrefix {
                prefix: route.prefix.clone(),
                reason: "must name a path below '/'",
            });
        } else if prefix.contains(['?', '#']) {
            errors.push(ValidationError::InvalidPrefix {
                prefix: route.prefix.clone(),
                reason: "must not contain a query or fragment",
            });
        } else {
            prefixes.push(prefix);
        }

        if let Err(reason) = check_origin(&route.origin) {
            errors.push(ValidationError::InvalidOrigin {
                prefix: route.prefix.clone(),
                origin: route.origin.clone(),
                reason,
            });
        }
    }

    for (i, a) in prefixes.iter().enumerate() {
        for b in &prefixes[i + 1..] {
            if a == b {
                errors.push(ValidationError::DuplicatePrefix(a.to_string()));
            } else if is_nested(a, b) {
                errors.push(ValidationError::OverlappingPrefix {
                    outer: a.to_string(),
                    inner: b.to_string(),
                });
            } else if is_nested(b, a) {
                errors.push(ValidationError::OverlappingPrefix {
                    outer: b.to_string(),
                    inner: a.to_string(),
                });
            }
        }
    }
}

/// `inner` lives below `outer` on a segment boundary.
fn is_nested(outer: &str, inner: &str) -> bool {
    inner
        .strip_prefix(outer)
        .is_some_and(|rest| rest.starts_with('/'))
}

fn check_origin(origin: &str) -> Result<(), String> {
    let url = Url::parse(normalize_origin(origin)).map_err(|e| e.to_string())?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme {:?}", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("must not carry a query or fragment".to_string());
    }
    Ok(())
}

fn validate_addresses(config: &ProxyConfig, errors: &mut Vec<ValidationError>) {
    if let Err(e) = config.listener.bind_address.parse::<SocketAddr>() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
            reason: e.to_string(),
        });
    }

    if config.observability.metrics_enabled {
        if let Err(e) = config.observability.metrics_address.parse::<SocketAddr>() {
            errors.push(ValidationError::InvalidAddress {
                field: "observability.metrics_address",
                value: config.observability.metrics_address.clone(),
                reason: e.to_string(),
            });
        }
    }
}

fn validate_tls(config: &ProxyConfig, errors: &mut Vec<ValidationError>) {
    if !config.tls.enabled() {
        return;
    }

    let is_blank = |path: &Option<String>| path.as_deref().map_or(true, str::is_empty);

    if is_blank(&config.tls.certificate_file) {
        errors.push(ValidationError::TlsPathMissing("certificate"));
    }
    if is_blank(&config.tls.key_file) {
        errors.push(ValidationError::TlsPathMissing("key"));
    }
}
