//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, serve loop, drain on shutdown)
//!     → proxy::guard (reject open-proxy requests and non GET/HEAD)
//!     → server.rs dispatch (route lookup, 404 catch-all)
//!     → proxy::forward (upstream call, streamed response)
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::RemoteAddr;
pub use server::{HttpServer, ServerError, DRAIN_TIMEOUT};
