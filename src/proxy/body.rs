//! Streaming relay of an upstream response body.
//!
//! The body is never buffered: each chunk read from upstream is handed to the
//! server as soon as it arrives. The stream owns the upstream response, so
//! dropping it (end of stream, client disconnect, server shutdown) releases
//! the upstream connection.

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::http::StatusCode;
use bytes::Bytes;
use futures_util::stream::{BoxStream, Stream, StreamExt};

/// Body stream wrapper that logs how the relay ended.
pub struct RelayBody {
    inner: BoxStream<'static, reqwest::Result<Bytes>>,
    span: tracing::Span,
    status: StatusCode,
    expected_len: Option<u64>,
    relayed: u64,
    done: bool,
}

impl RelayBody {
    /// Wrap the body of `response`. Events are recorded inside `span`.
    pub fn new(response: reqwest::Response, span: tracing::Span) -> Self {
        let status = response.status();
        let expected_len = response.content_length();
        Self {
            inner: response.bytes_stream().boxed(),
            span,
            status,
            expected_len,
            relayed: 0,
            done: false,
        }
    }

    fn complete(&mut self) {
        self.done = true;
        let _enter = self.span.enter();
        tracing::info!(status = %self.status, bytes = self.relayed, "---> {}", self.status);
    }
}

impl Stream for RelayBody {
    type Item = reqwest::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        match this.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.relayed += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                this.done = true;
                let _enter = this.span.enter();
                tracing::warn!(error = %e, bytes = this.relayed, "passing response failed");
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.complete();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for RelayBody {
    fn drop(&mut self) {
        if self.done {
            return;
        }

        // the server may stop polling once it has written Content-Length bytes
        if self.expected_len == Some(self.relayed) {
            self.complete();
            return;
        }

        let _enter = self.span.enter();
        tracing::warn!(
            bytes = self.relayed,
            expected = ?self.expected_len,
            "passing response aborted, client went away"
        );
    }
}
