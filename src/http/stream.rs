//! Streamed relay of a downstream body.
//!
//! Owns the downstream body for the lifetime of the client response. Chunks are handed to
//! the serving layer as they arrive. The downstream body is released exactly once: at end of
//! stream, on a read error, on cancellation, or when the client response is dropped.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, BodyDataStream, Bytes};
use futures_util::{Stream, StreamExt};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

use crate::observability::metrics;

pub struct StreamRelay {
    inner: Option<BodyDataStream>,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
    service: String,
    bytes: u64,
}

impl StreamRelay {
    pub fn new(body: Body, cancel: CancellationToken, service: impl Into<String>) -> Self {
        Self {
            inner: Some(body.into_data_stream()),
            cancelled: Box::pin(cancel.cancelled_owned()),
            service: service.into(),
            bytes: 0,
        }
    }

    /// Bytes relayed so far.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    fn release(&mut self) {
        if self.inner.take().is_some() {
            metrics::record_stream_bytes(&self.service, self.bytes);
        }
    }
}

impl Stream for StreamRelay {
    type Item = Result<Bytes, io::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        if this.cancelled.as_mut().poll(cx).is_ready() {
            tracing::info!(service = %this.service, bytes = this.bytes, "Stream relay cancelled by client");
            this.release();
            return Poll::Ready(Some(Err(io::Error::new(
                io::ErrorKind::ConnectionAborted,
                "client cancelled the download",
            ))));
        }

        match inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.bytes += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                // An error item makes the serving layer abort the connection.
                tracing::warn!(service = %this.service, bytes = this.bytes, error = %e, "Stream relay failed");
                this.release();
                Poll::Ready(Some(Err(io::Error::other(e))))
            }
            Poll::Ready(None) => {
                tracing::debug!(service = %this.service, bytes = this.bytes, "Stream relay complete");
                this.release();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for StreamRelay {
    fn drop(&mut self) {
        if self.inner.is_some() {
            tracing::info!(service = %self.service, bytes = self.bytes, "Client went away during stream relay");
            self.release();
        }
    }
}
