//! Listener acquisition.
//!
//! # Responsibilities
//! - Reuse a listening socket inherited from the process manager
//! - Otherwise bind the configured address
//! - Refuse to guess when more than one socket was inherited
//!
//! # Design Decisions
//! - Acquisition is synchronous and happens before the server starts
//! - Any failure here is fatal; the caller exits without serving

use std::fmt;
use std::net::{SocketAddr, TcpListener};

use thiserror::Error;

use crate::config::ListenerConfig;
use crate::net::activation::{ActivationEnv, LISTEN_FDS_START};

/// Error type for listener acquisition.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("unable to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    /// More than one socket was handed down.
    #[error("got {0} listeners, expected one")]
    Ambiguous(usize),
    /// The handed-down descriptor is not a usable listening socket.
    #[error("inherited socket {fd} is unusable: {source}")]
    Inherited {
        fd: i32,
        #[source]
        source: std::io::Error,
    },
}

/// Where the listening socket came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerSource {
    /// Bound by this process.
    Bound,
    /// Passed down by the process manager.
    Inherited,
}

impl fmt::Display for ListenerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerSource::Bound => f.write_str("bind"),
            ListenerSource::Inherited => f.write_str("socket activation"),
        }
    }
}

/// A listening socket ready to be served.
#[derive(Debug)]
pub struct AcquiredListener {
    pub listener: TcpListener,
    pub source: ListenerSource,
}

impl AcquiredListener {
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// What to do given the number of inherited sockets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    /// Nothing inherited: bind the configured address.
    Bind,
    /// Exactly one inherited descriptor: reuse it.
    Inherit(i32),
    /// More than one inherited descriptor: configuration error.
    Ambiguous(usize),
}

impl Acquisition {
    pub fn plan(inherited: usize, first_fd: i32) -> Self {
        match inherited {
            0 => Acquisition::Bind,
            1 => Acquisition::Inherit(first_fd),
            n => Acquisition::Ambiguous(n),
        }
    }
}

/// Acquire the listener for this process.
pub fn acquire(config: &ListenerConfig, env: &ActivationEnv) -> Result<AcquiredListener, ListenerError> {
    let inherited = env.inherited_count(std::process::id());
    acquire_with(config, Acquisition::plan(inherited, LISTEN_FDS_START))
}

/// Execute an acquisition plan.
pub fn acquire_with(config: &ListenerConfig, plan: Acquisition) -> Result<AcquiredListener, ListenerError> {
    match plan {
        Acquisition::Bind => {
            let listener = TcpListener::bind(config.bind_address.as_str()).map_err(|source| {
                ListenerError::Bind {
                    addr: config.bind_address.clone(),
                    source,
                }
            })?;
            Ok(AcquiredListener {
                listener,
                source: ListenerSource::Bound,
            })
        }
        Acquisition::Inherit(fd) => {
            let listener = inherit(fd)?;
            Ok(AcquiredListener {
                listener,
                source: ListenerSource::Inherited,
            })
        }
        Acquisition::Ambiguous(count) => Err(ListenerError::Ambiguous(count)),
    }
}

#[cfg(unix)]
fn inherit(fd: i32) -> Result<TcpListener, ListenerError> {
    use std::os::fd::FromRawFd;

    // SAFETY: the process manager hands this descriptor to us alone and it is
    // taken exactly once, during startup.
    let listener = unsafe { TcpListener::from_raw_fd(fd) };

    // a descriptor that is not a bound socket fails here
    listener
        .local_addr()
        .map_err(|source| ListenerError::Inherited { fd, source })?;

    Ok(listener)
}

#[cfg(not(unix))]
fn inherit(fd: i32) -> Result<TcpListener, ListenerError> {
    Err(ListenerError::Inherited {
        fd,
        source: std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "socket activation requires a unix platform",
        ),
    })
}
