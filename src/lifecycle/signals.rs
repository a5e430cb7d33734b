//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for SIGINT and SIGTERM
//! - Translate the first one into a graceful shutdown request
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handlers are registered synchronously before serving starts
//! - Fires once; later signals are ignored
//! - No other signals are handled

use tokio::task::JoinHandle;

use crate::lifecycle::Shutdown;

/// Install SIGINT/SIGTERM handlers and spawn the task that waits on them.
///
/// Must be called from within a Tokio runtime.
#[cfg(unix)]
pub fn install(shutdown: Shutdown) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        let name = tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
        };
        tracing::info!(signal = name, "received {}, shutting down gracefully", name);
        shutdown.trigger();
    }))
}

#[cfg(not(unix))]
pub fn install(shutdown: Shutdown) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "unable to listen for ctrl-c");
            return;
        }
        tracing::info!(signal = "ctrl-c", "received ctrl-c, shutting down gracefully");
        shutdown.trigger();
    }))
}
