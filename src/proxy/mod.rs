//! Request forwarding engine.
//!
//! # Data Flow
//! ```text
//! Request
//!     → guard.rs (open-proxy and method checks, runs before routing)
//!     → [routing decides the mount point]
//!     → forward.rs (build upstream request, send through client.rs)
//!     → headers.rs (filter request headers, append Via)
//!     → body.rs (stream upstream body to the client)
//! ```
//!
//! # Design Decisions
//! - Exactly one upstream call per request, never retried
//! - Bodies are streamed, never buffered
//! - Per-request failures end as a status code, they never escape the handler

pub mod body;
pub mod client;
pub mod forward;
pub mod guard;
pub mod headers;

pub use client::UpstreamClient;
pub use forward::Forwarder;
pub use headers::SERVER_NAME;
