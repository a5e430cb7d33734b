//! Request metadata used in logs.
//!
//! # Responsibilities
//! - Recover the peer address attached by the server
//!
//! # Design Decisions
//! - Requests that never went through a socket (router tests) log `-`

use std::fmt;
use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::Request;

/// Peer address of a request, if known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoteAddr(pub Option<SocketAddr>);

impl RemoteAddr {
    pub fn of<B>(req: &Request<B>) -> Self {
        Self(
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
        )
    }
}

impl fmt::Display for RemoteAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(addr) => write!(f, "{}", addr),
            None => f.write_str("-"),
        }
    }
}
