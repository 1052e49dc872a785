//! The user-facing queue handle and its builder.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use super::buffer::Slot;
use super::capacity::Capacity;
use super::coordinator::{Coordinator, Endpoints};
use super::endpoint::{Egress, Ingress};
use super::policy::Policy;
use crate::config::QueueConfig;

/// Preallocation cap for bounded deques, so huge capacities stay lazy.
const MAX_PREALLOCATED: usize = 1024;

/// A dynamically buffered channel.
///
/// Items written to [`ingress`](Self::ingress) come out of
/// [`egress`](Self::egress) in order. A coordinator task, spawned when the
/// queue is built, holds everything in between.
pub struct ChannelQueue<T> {
    ingress: Ingress<T>,
    egress: Egress<T>,
    capacity: Capacity,
    policy: Policy,
    coordinator: JoinHandle<()>,
}

impl<T> fmt::Debug for ChannelQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelQueue")
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .field("closed", &self.ingress.is_closed())
            .finish()
    }
}

impl<T: Send + 'static> ChannelQueue<T> {
    /// Blocking FIFO queue. `capacity < 1` means unbounded.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(capacity: isize) -> Self {
        QueueBuilder::new().capacity(capacity).build()
    }

    /// Ring queue that evicts its oldest item instead of blocking writers.
    ///
    /// `capacity < 1` yields an unbounded FIFO, since an infinite ring never
    /// evicts.
    pub fn ring(capacity: isize) -> Self {
        QueueBuilder::new().capacity(capacity).ring(true).build()
    }

    pub fn builder() -> QueueBuilder<T> {
        QueueBuilder::new()
    }
}

impl<T> ChannelQueue<T> {
    #[inline]
    pub fn ingress(&self) -> &Ingress<T> {
        &self.ingress
    }

    #[inline]
    pub fn egress(&self) -> &Egress<T> {
        &self.egress
    }

    /// Number of buffered items as seen by the coordinator.
    ///
    /// Advisory: concurrent readers and writers may change it right after.
    pub async fn len(&self) -> usize {
        self.egress.len().await
    }

    pub fn len_blocking(&self) -> usize {
        futures::executor::block_on(self.len())
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Normalised capacity, `-1` for unbounded.
    #[inline]
    pub fn cap(&self) -> isize {
        self.capacity.as_raw()
    }

    #[inline]
    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    #[inline]
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Closes the ingress. Idempotent; see [`Ingress::close`].
    pub fn close(&self) {
        self.ingress.close();
    }

    pub fn is_closed(&self) -> bool {
        self.ingress.is_closed()
    }

    /// Closes the queue, discards whatever is still buffered and waits for
    /// the coordinator to finish.
    pub async fn shutdown(self) {
        let ChannelQueue {
            ingress,
            egress,
            coordinator,
            ..
        } = self;
        ingress.close();
        let mut discarded = 0usize;
        while egress.recv().await.is_some() {
            discarded += 1;
        }
        if let Err(e) = coordinator.await {
            if e.is_panic() {
                std::panic::resume_unwind(e.into_panic());
            }
        }
        debug!(target: "channelqueue::queue", discarded, "queue shut down");
    }
}

/// Composable construction options for [`ChannelQueue`].
pub struct QueueBuilder<T> {
    capacity: isize,
    ring: bool,
    ingress: Option<(flume::Sender<T>, flume::Receiver<T>)>,
    sink: Option<mpsc::Sender<T>>,
    runtime: Option<Handle>,
}

impl<T> Default for QueueBuilder<T> {
    fn default() -> Self {
        Self {
            capacity: -1,
            ring: false,
            ingress: None,
            sink: None,
            runtime: None,
        }
    }
}

impl<T: Send + 'static> QueueBuilder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds capacity and policy from a loaded configuration.
    pub fn from_config(config: &QueueConfig) -> Self {
        Self::new().capacity(config.capacity).ring(config.ring)
    }

    /// Buffering limit; anything below 1 means unbounded.
    pub fn capacity(mut self, capacity: isize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Evict the oldest item on overflow instead of blocking writers.
    pub fn ring(mut self, ring: bool) -> Self {
        self.ring = ring;
        self
    }

    /// Reads from an existing channel instead of a fresh rendezvous channel.
    ///
    /// [`ChannelQueue::ingress`] then sends on `tx`. Once the queue is closed,
    /// or every [`Ingress`] is dropped, the coordinator takes whatever `rx`
    /// still holds and then stops reading it, even if other clones of `tx`
    /// are still alive.
    pub fn ingress_channel(mut self, tx: flume::Sender<T>, rx: flume::Receiver<T>) -> Self {
        self.ingress = Some((tx, rx));
        self
    }

    /// Also delivers into an existing channel.
    ///
    /// Readers already waiting on [`Egress`] are served first; the sink takes
    /// the front item otherwise, and holds back the queue while it is full.
    /// It is dropped once the queue finishes.
    pub fn egress_sink(mut self, sink: mpsc::Sender<T>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Spawns the coordinator on `handle` rather than the current runtime.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Spawns the coordinator and returns the queue handle.
    ///
    /// # Panics
    ///
    /// Panics when no runtime was given and this is not called from within a
    /// tokio runtime.
    pub fn build(self) -> ChannelQueue<T> {
        let capacity = Capacity::from_requested(self.capacity);
        let policy = Policy::select(capacity, self.ring);

        let (ingress_tx, ingress_rx) = self.ingress.unwrap_or_else(|| flume::bounded(0));
        let (close, closed) = watch::channel(false);
        let (requests, requests_rx) = mpsc::unbounded_channel();
        let (queries, queries_rx) = mpsc::unbounded_channel();

        let endpoints = Endpoints {
            ingress: ingress_rx,
            closed,
            requests: requests_rx,
            queries: queries_rx,
            sink: self.sink,
        };

        let overflow = policy.overflow();
        let task = match policy {
            Policy::RingOfOne => {
                let coordinator = Coordinator::new(Slot::new(), capacity, overflow, endpoints);
                spawn(self.runtime, coordinator.run())
            }
            Policy::Fifo | Policy::Ring => {
                let reserved = capacity.limit().map_or(0, |limit| limit.min(MAX_PREALLOCATED));
                let buffer = VecDeque::with_capacity(reserved);
                let coordinator = Coordinator::new(buffer, capacity, overflow, endpoints);
                spawn(self.runtime, coordinator.run())
            }
        };

        debug!(target: "channelqueue::queue", %capacity, %policy, "queue created");

        ChannelQueue {
            ingress: Ingress::new(ingress_tx, Arc::new(close)),
            egress: Egress::new(requests, queries),
            capacity,
            policy,
            coordinator: task,
        }
    }
}

fn spawn<F>(runtime: Option<Handle>, future: F) -> JoinHandle<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    match runtime {
        Some(handle) => handle.spawn(future),
        None => tokio::spawn(future),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_normalised_capacity() {
        assert_eq!(ChannelQueue::<u8>::new(-1).cap(), -1);
        assert_eq!(ChannelQueue::<u8>::new(0).cap(), -1);
        assert_eq!(ChannelQueue::<u8>::new(3).cap(), 3);
        assert_eq!(ChannelQueue::<u8>::ring(0).policy(), Policy::Fifo);
        assert_eq!(ChannelQueue::<u8>::ring(1).policy(), Policy::RingOfOne);
        assert_eq!(ChannelQueue::<u8>::ring(5).policy(), Policy::Ring);
    }

    #[tokio::test]
    async fn builder_reads_config() {
        let config = QueueConfig {
            capacity: 4,
            ring: true,
        };
        let q: ChannelQueue<u8> = QueueBuilder::from_config(&config).build();
        assert_eq!(q.cap(), 4);
        assert_eq!(q.policy(), Policy::Ring);
        q.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_discards_and_finishes() {
        let q = ChannelQueue::new(-1);
        q.ingress().send(1).await;
        q.ingress().send(2).await;
        let egress = q.egress().clone();
        q.shutdown().await;
        assert_eq!(egress.recv().await, None);
    }

    #[tokio::test]
    async fn finishes_once_every_reader_is_gone() {
        let q = ChannelQueue::new(4);
        for i in 0..3 {
            q.ingress().send(i).await;
        }
        q.close();
        let ChannelQueue {
            ingress,
            egress,
            coordinator,
            ..
        } = q;
        drop(egress);
        drop(ingress);
        tokio::time::timeout(std::time::Duration::from_secs(1), coordinator)
            .await
            .expect("coordinator kept running without readers")
            .unwrap();
    }

    #[test]
    fn builds_on_explicit_runtime() {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .build()
            .unwrap();
        let q: ChannelQueue<u32> = ChannelQueue::builder()
            .capacity(2)
            .runtime(rt.handle().clone())
            .build();
        q.ingress().send_blocking(7);
        assert_eq!(q.len_blocking(), 1);
        assert_eq!(q.egress().recv_blocking(), Some(7));
        q.close();
        assert_eq!(q.egress().recv_blocking(), None);
    }
}
