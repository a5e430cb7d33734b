//! Startup orchestration.
//!
//! # Responsibilities
//! - Load configuration and merge command-line overrides
//! - Load TLS material before any socket is opened
//! - Arm signal handling, acquire the listener, serve
//! - Map every fatal error to a distinct exit code
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::path::Path;

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;

use crate::cli::Cli;
use crate::config::{load_config, ConfigError, ProxyConfig};
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::{signals, Shutdown};
use crate::net::tls::{install_crypto_provider, load_tls_config, TlsError};
use crate::net::{acquire, ActivationEnv, ListenerError};
use crate::observability::metrics;

/// A fatal error; the process exits with [`StartupError::exit_code`].
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Tls(#[from] TlsError),
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error(transparent)]
    Server(#[from] ServerError),
    #[error("unable to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),
    #[error("unable to start metrics exporter: {0}")]
    Metrics(#[from] BuildError),
    #[error("unable to initialize logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
    #[error("unable to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl StartupError {
    pub fn exit_code(&self) -> u8 {
        match self {
            StartupError::Server(_) => 1,
            StartupError::Config(ConfigError::Io { .. } | ConfigError::Parse(_)) => 3,
            StartupError::Config(ConfigError::Validation(_)) => 4,
            StartupError::Tls(_) => 5,
            StartupError::Listener(_) => 6,
            StartupError::Signals(_)
            | StartupError::Metrics(_)
            | StartupError::Logging(_)
            | StartupError::Runtime(_) => 7,
        }
    }
}

/// Read the configuration file and apply the command-line overrides.
pub fn load(cli: &Cli) -> Result<ProxyConfig, StartupError> {
    Ok(load_config(&cli.config, |config| cli.apply(config))?)
}

/// Run the proxy until it has shut down.
pub async fn run(config: ProxyConfig, activation: ActivationEnv) -> Result<(), StartupError> {
    install_crypto_provider();

    let tls = if config.tls.enabled() {
        let cert = config.tls.certificate_file.as_deref().unwrap_or_default();
        let key = config.tls.key_file.as_deref().unwrap_or_default();
        Some(load_tls_config(Path::new(cert), Path::new(key)).await?)
    } else {
        None
    };

    if config.observability.metrics_enabled {
        // validated as a socket address
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr)?;
        }
    }

    let server = HttpServer::from_config(&config)?;

    let shutdown = Shutdown::new();
    signals::install(shutdown.clone()).map_err(StartupError::Signals)?;

    let acquired = acquire(&config.listener, &activation)?;
    let local_addr = acquired.local_addr().map_err(ServerError::Listener)?;
    tracing::info!(
        address = %local_addr,
        via = %acquired.source,
        tls = tls.is_some(),
        "listening on {} via {} (TLS {})",
        local_addr,
        acquired.source,
        tls.is_some()
    );

    server.run(acquired.listener, tls, shutdown).await?;
    Ok(())
}
