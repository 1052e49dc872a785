//! Producer and consumer handles of a queue.
//!
//! [`Ingress`] is a rendezvous sender: a send completes only once the
//! coordinator is waiting for an item, so a full blocking queue holds writers
//! back exactly at its capacity. [`Egress`] is pull based: each read asks the
//! coordinator for the front item, and an abandoned read leaves the item
//! where it was.

use std::fmt;
use std::sync::Arc;

use futures::Stream;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::trace;

use super::coordinator::Query;
use super::error::QueueError;

const SEND_ON_CLOSED: &str = "send on closed ingress";

/// Write side of a queue. Cheap to clone; every clone feeds the same queue.
pub struct Ingress<T> {
    tx: flume::Sender<T>,
    close: Arc<watch::Sender<bool>>,
}

impl<T> Clone for Ingress<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            close: Arc::clone(&self.close),
        }
    }
}

impl<T> fmt::Debug for Ingress<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ingress")
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<T> Ingress<T> {
    pub(crate) fn new(tx: flume::Sender<T>, close: Arc<watch::Sender<bool>>) -> Self {
        Self { tx, close }
    }

    /// Enqueues an item, waiting while the queue applies backpressure.
    ///
    /// # Panics
    ///
    /// Panics if the ingress is closed, or gets closed while this send is
    /// still waiting. Like a send on a closed channel this is a usage error.
    /// A send racing with `close` may panic even though the item got in.
    pub async fn send(&self, item: T) {
        let mut closed = self.close.subscribe();
        if *closed.borrow_and_update() {
            panic!("{SEND_ON_CLOSED}");
        }

        tokio::select! {
            biased;
            sent = self.tx.send_async(item) => {
                if sent.is_err() {
                    panic!("{SEND_ON_CLOSED}");
                }
            }
            _ = closed.changed() => panic!("{SEND_ON_CLOSED}"),
        }
    }

    /// Blocking form of [`send`](Self::send) for use outside async code.
    ///
    /// Must not be called from within an async runtime worker.
    pub fn send_blocking(&self, item: T) {
        futures::executor::block_on(self.send(item))
    }

    /// Closes the ingress. Idempotent.
    ///
    /// Items already accepted stay readable; the egress reports end-of-stream
    /// once they are drained.
    pub fn close(&self) {
        if !self.close.send_replace(true) {
            trace!(target: "channelqueue::ingress", "ingress closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.close.borrow()
    }
}

/// Read side of a queue. Cheap to clone; clones compete for items.
pub struct Egress<T> {
    requests: mpsc::UnboundedSender<oneshot::Sender<T>>,
    queries: mpsc::UnboundedSender<Query<T>>,
}

impl<T> Clone for Egress<T> {
    fn clone(&self) -> Self {
        Self {
            requests: self.requests.clone(),
            queries: self.queries.clone(),
        }
    }
}

impl<T> fmt::Debug for Egress<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Egress")
            .field("finished", &self.requests.is_closed())
            .finish()
    }
}

impl<T> Egress<T> {
    pub(crate) fn new(
        requests: mpsc::UnboundedSender<oneshot::Sender<T>>,
        queries: mpsc::UnboundedSender<Query<T>>,
    ) -> Self {
        Self { requests, queries }
    }

    /// Waits for the next item. `None` means end-of-stream.
    ///
    /// Cancel safe: dropping the future before it completes never loses an
    /// item.
    pub async fn recv(&self) -> Option<T> {
        let (tx, rx) = oneshot::channel();
        self.requests.send(tx).ok()?;
        rx.await.ok()
    }

    /// Blocking form of [`recv`](Self::recv) for use outside async code.
    pub fn recv_blocking(&self) -> Option<T> {
        futures::executor::block_on(self.recv())
    }

    /// Takes the front item if one is buffered, without waiting for one.
    pub async fn try_recv(&self) -> Result<T, QueueError> {
        let (tx, rx) = oneshot::channel();
        self.queries
            .send(Query::TryPop(tx))
            .map_err(|_| QueueError::Closed)?;
        match rx.await {
            Ok(Some(item)) => Ok(item),
            Ok(None) => Err(QueueError::Empty),
            Err(_) => Err(QueueError::Closed),
        }
    }

    /// Current number of buffered items, or 0 once the queue has finished.
    pub(crate) async fn len(&self) -> usize {
        let (tx, rx) = oneshot::channel();
        if self.queries.send(Query::Len(tx)).is_err() {
            return 0;
        }
        rx.await.unwrap_or(0)
    }

    /// Consumes the handle into a stream ending at end-of-stream.
    pub fn into_stream(self) -> impl Stream<Item = T> {
        futures::stream::unfold(self, |egress| async move {
            let item = egress.recv().await?;
            Some((item, egress))
        })
    }
}
