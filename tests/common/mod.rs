//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::time::Duration;

use distriproxy::config::UpstreamConfig;
use distriproxy::http::{HttpServer, ServerError};
use distriproxy::lifecycle::{LifecycleState, Shutdown};
use distriproxy::proxy::UpstreamClient;
use distriproxy::routing::{Route, RouteTable};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A request head as the mock backend saw it.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
}

impl SeenRequest {
    fn parse(head: &str) -> Self {
        let mut lines = head.split("\r\n");
        let request_line = lines.next().unwrap_or_default().to_string();
        let headers = lines
            .filter(|line| !line.is_empty())
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
            .collect();
        Self { request_line, headers }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

async fn read_head(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Some(String::from_utf8_lossy(&buf).into_owned())
}

/// Start a mock backend that answers every request with `status`, the extra
/// header lines in `headers` and `body`, and reports each request head it
/// received on the returned channel.
pub async fn start_recording_backend(
    status: &'static str,
    headers: &'static str,
    body: &'static str,
) -> (SocketAddr, mpsc::UnboundedReceiver<SeenRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let Some(head) = read_head(&mut socket).await else {
                    return;
                };
                let seen = SeenRequest::parse(&head);
                let is_head = seen.request_line.starts_with("HEAD ");
                let _ = tx.send(seen);

                let mut response = format!(
                    "HTTP/1.1 {}\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    headers,
                    body.len()
                );
                if !is_head {
                    response.push_str(body);
                }
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, rx)
}

/// Start a backend that sends its body as `chunks.len()` pieces, pausing
/// `delay` before each one.
pub async fn start_slow_backend(chunks: &'static [&'static str], delay: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let total: usize = chunks.iter().map(|c| c.len()).sum();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                if read_head(&mut socket).await.is_none() {
                    return;
                }
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    total
                );
                if socket.write_all(head.as_bytes()).await.is_err() {
                    return;
                }
                for chunk in chunks {
                    tokio::time::sleep(delay).await;
                    if socket.write_all(chunk.as_bytes()).await.is_err() {
                        return;
                    }
                }
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// What a backend that never answers observed on one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HangEvent {
    RequestReceived,
    Closed,
}

/// Start a backend that reads the request head and then never answers,
/// reporting when the request arrived and when the peer closed the socket.
pub async fn start_hanging_backend() -> (SocketAddr, mpsc::UnboundedReceiver<HangEvent>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                if read_head(&mut socket).await.is_none() {
                    return;
                }
                let _ = tx.send(HangEvent::RequestReceived);

                let mut buf = [0u8; 256];
                loop {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(_) => {}
                    }
                }
                let _ = tx.send(HangEvent::Closed);
            });
        }
    });

    (addr, rx)
}

/// An address nothing listens on.
pub fn refused_addr() -> SocketAddr {
    let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Upstream client that ignores proxy variables from the environment.
pub fn upstream_client() -> UpstreamClient {
    UpstreamClient::new(&UpstreamConfig {
        use_env_proxy: false,
        ..UpstreamConfig::default()
    })
    .unwrap()
}

/// A running proxy under test.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the proxy on an ephemeral port with the given `(prefix, origin)` routes.
pub async fn start_proxy(routes: &[(&str, String)], drain_timeout: Duration) -> TestProxy {
    let table = RouteTable::new(
        routes
            .iter()
            .map(|(prefix, origin)| Route::new(prefix, origin))
            .collect(),
    );
    let server = HttpServer::new(table, upstream_client()).with_drain_timeout(drain_timeout);

    let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, None, shutdown.clone()));

    wait_listening(&shutdown).await;
    TestProxy { addr, shutdown, handle }
}

async fn wait_listening(shutdown: &Shutdown) {
    let mut rx = shutdown.subscribe();
    let _ = tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|state| *state >= LifecycleState::Listening),
    )
    .await;
}

/// Plain client for talking to the proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Send raw bytes to `addr` and return everything read until the server closes.
pub async fn raw_request(addr: SocketAddr, request: &str) -> String {
    let mut socket = TcpStream::connect(addr).await.unwrap();
    socket.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    let _ = tokio::time::timeout(Duration::from_secs(5), socket.read_to_end(&mut response)).await;
    String::from_utf8_lossy(&response).into_owned()
}
