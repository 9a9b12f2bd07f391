use std::net::Ipv6Addr;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures::Stream;

/// Bounded address queue between the scheduler (sole producer) and the
/// worker pool. The sender blocks once a full frame's worth of addresses is
/// buffered, which is the backpressure that keeps the producer honest when
/// workers fall behind.
pub struct AddrQueue {
    pub writer: tokio::sync::mpsc::Sender<Ipv6Addr>,
    inner: Mutex<tokio::sync::mpsc::Receiver<Ipv6Addr>>,
}

impl AddrQueue {
    /// Capacity should be the longest per-frame address list; a floor of 1
    /// keeps an all-transparent image from panicking the channel.
    pub fn with_capacity(capacity: usize) -> Self {
        let (writer, receiver) = tokio::sync::mpsc::channel(capacity.max(1));
        Self {
            writer,
            inner: Mutex::new(receiver),
        }
    }

    /// Returns a stream that yields addresses. Use this when you have
    /// `Arc<AddrQueue>`; every worker holds its own stream over the shared
    /// receive side.
    pub fn as_stream(this: Arc<Self>) -> AddrQueueStream {
        AddrQueueStream(this)
    }
}

/// Wrapper to use `Arc<AddrQueue>` as Stream (orphan rule workaround).
pub struct AddrQueueStream(pub Arc<AddrQueue>);

impl Stream for AddrQueueStream {
    type Item = Ipv6Addr;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut guard = self.0.inner.lock().unwrap();
        guard.poll_recv(cx)
    }
}
