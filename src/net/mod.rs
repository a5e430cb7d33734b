//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Startup
//!     → activation.rs (LISTEN_PID / LISTEN_FDS from the process manager)
//!     → listener.rs (reuse the inherited socket, or bind)
//!     → tls.rs (optional TLS termination on that socket)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - One listening socket per process, never more
//! - TLS is optional and handled transparently

pub mod activation;
pub mod listener;
pub mod tls;

pub use activation::ActivationEnv;
pub use listener::{acquire, AcquiredListener, ListenerError, ListenerSource};
