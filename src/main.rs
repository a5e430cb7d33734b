//! distriproxy
//!
//! A reverse proxy giving several package mirrors a single ingress point.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                     DISTRIPROXY                      │
//!                     │                                                      │
//!   GET /debian/x     │  ┌──────────┐   ┌─────────┐   ┌──────────────┐       │
//!   ──────────────────┼─▶│   net    │──▶│  guard  │──▶│   routing    │       │
//!                     │  │ listener │   │ 400/405 │   │ prefix → 404 │       │
//!                     │  └──────────┘   └─────────┘   └──────┬───────┘       │
//!                     │                                      ▼               │
//!   200 + Via         │  ┌──────────┐                 ┌──────────────┐       │
//!   ◀─────────────────┼──│  relay   │◀────────────────│  forwarder   │◀──────┼── deb.debian.org
//!                     │  │  body    │                 │ shared client│       │
//!                     │  └──────────┘                 └──────────────┘       │
//!                     │                                                      │
//!                     │  config · lifecycle (signals, drain) · observability │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

use clap::Parser;

use distriproxy::cli::Cli;
use distriproxy::config::ObservabilityConfig;
use distriproxy::lifecycle::{startup, StartupError};
use distriproxy::net::ActivationEnv;
use distriproxy::observability::logging;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // before any thread exists: this edits the process environment
    let activation = ActivationEnv::take_from_process();

    let config = match startup::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            let _ = logging::init(&ObservabilityConfig::default());
            return fail(e);
        }
    };

    if let Err(e) = logging::init(&config.observability) {
        return fail(e.into());
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "distriproxy starting");

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => return fail(StartupError::Runtime(e)),
    };

    match runtime.block_on(startup::run(config, activation)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

fn fail(e: StartupError) -> ExitCode {
    tracing::error!(error = %e, exit_code = e.exit_code(), "{}, exiting", e);
    ExitCode::from(e.exit_code())
}
