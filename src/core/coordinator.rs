//! The task that owns a queue's buffer.
//!
//! One coordinator runs per queue. It is the only code that reads or mutates
//! the buffer; producers, consumers and length queries all reach it through
//! channels. Every loop iteration recomputes which operations are enabled and
//! waits on exactly those:
//!
//! - receive from ingress, unless ingress is closed or (for blocking queues)
//!   the buffer is full;
//! - hand the front item to the sink, while the buffer is non-empty;
//! - take read requests and queries, always.
//!
//! Read requests are parked until an item is available. Closing ingress does
//! not drop what the ingress channel already holds: the coordinator drains it,
//! still under backpressure, before it stops reading. The task exits once
//! ingress is closed and the buffer has drained, which drops the receiving
//! halves and signals end-of-stream to readers.

use std::collections::VecDeque;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, trace};

use super::buffer::Buffer;
use super::capacity::Capacity;
use super::policy::OverflowPolicy;
use crate::metrics;

/// Items taken from a closed ingress per loop iteration.
const DRAIN_BATCH: usize = 256;

/// Requests served regardless of buffer state.
#[derive(Debug)]
pub(crate) enum Query<T> {
    Len(oneshot::Sender<usize>),
    TryPop(oneshot::Sender<Option<T>>),
}

/// Receiving halves handed to a coordinator at construction.
pub(crate) struct Endpoints<T> {
    pub ingress: flume::Receiver<T>,
    pub closed: watch::Receiver<bool>,
    pub requests: mpsc::UnboundedReceiver<oneshot::Sender<T>>,
    pub queries: mpsc::UnboundedReceiver<Query<T>>,
    pub sink: Option<mpsc::Sender<T>>,
}

/// Where the coordinator stands with respect to its ingress channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intake {
    Open,
    /// Closed by the writers, but the channel may still hold items.
    Draining,
    Closed,
}

pub(crate) struct Coordinator<T, B> {
    buffer: B,
    capacity: Capacity,
    overflow: OverflowPolicy,
    ingress: flume::Receiver<T>,
    closed: watch::Receiver<bool>,
    requests: mpsc::UnboundedReceiver<oneshot::Sender<T>>,
    queries: mpsc::UnboundedReceiver<Query<T>>,
    sink: Option<mpsc::Sender<T>>,
    waiting: VecDeque<oneshot::Sender<T>>,
    intake: Intake,
    readers_open: bool,
    queries_open: bool,
    sink_open: bool,
}

impl<T, B> Coordinator<T, B>
where
    T: Send + 'static,
    B: Buffer<T>,
{
    pub(crate) fn new(
        buffer: B,
        capacity: Capacity,
        overflow: OverflowPolicy,
        endpoints: Endpoints<T>,
    ) -> Self {
        let Endpoints {
            ingress,
            mut closed,
            requests,
            queries,
            sink,
        } = endpoints;
        let intake = if *closed.borrow_and_update() {
            Intake::Draining
        } else {
            Intake::Open
        };
        Self {
            buffer,
            capacity,
            overflow,
            ingress,
            closed,
            requests,
            queries,
            sink_open: sink.is_some(),
            sink,
            waiting: VecDeque::new(),
            intake,
            readers_open: true,
            queries_open: true,
        }
    }

    pub(crate) async fn run(mut self) {
        metrics::inc_coordinators_started();
        debug!(
            target: "channelqueue::coordinator",
            capacity = %self.capacity,
            overflow = ?self.overflow,
            "coordinator started"
        );

        loop {
            if self.intake == Intake::Draining {
                self.drain_closed_ingress();
            }
            self.serve_waiting();

            let offering = !self.buffer.is_empty();
            if self.intake == Intake::Closed
                && (!offering || (!self.readers_open && !self.sink_open))
            {
                break;
            }
            let accepting = self.accepting();

            tokio::select! {
                received = self.ingress.recv_async(), if accepting => match received {
                    Ok(item) => self.accept(item),
                    Err(_) => {
                        trace!(target: "channelqueue::coordinator", "every ingress sender dropped");
                        self.intake = Intake::Closed;
                    }
                },

                _ = self.closed.changed(), if self.intake == Intake::Open => {
                    self.intake = Intake::Draining;
                    trace!(
                        target: "channelqueue::coordinator",
                        buffered = self.buffer.len(),
                        "ingress closed; draining"
                    );
                }

                request = self.requests.recv(), if self.readers_open => match request {
                    Some(reply) => self.park(reply),
                    None => {
                        trace!(target: "channelqueue::coordinator", "every egress reader dropped");
                        self.readers_open = false;
                    }
                },

                permit = reserve(self.sink.clone()), if offering && self.sink_open => match permit {
                    Ok(permit) => {
                        self.absorb_handed_over();
                        if let Some(item) = self.buffer.pop_front() {
                            drop(permit.send(item));
                            metrics::inc_delivered(1);
                        }
                    }
                    Err(_) => {
                        trace!(target: "channelqueue::coordinator", "egress sink closed");
                        self.sink_open = false;
                    }
                },

                query = self.queries.recv(), if self.queries_open => match query {
                    Some(query) => self.answer(query),
                    None => self.queries_open = false,
                },

                else => break,
            }
        }

        if !self.buffer.is_empty() {
            debug!(
                target: "channelqueue::coordinator",
                discarded = self.buffer.len(),
                "no readers left; discarding buffered items"
            );
        }
        metrics::inc_coordinators_finished();
        debug!(target: "channelqueue::coordinator", "coordinator finished");
        // Dropping self releases the receivers, the parked requests and the
        // sink, which readers observe as end-of-stream.
    }

    /// Whether ingress is serviced this iteration.
    fn accepting(&self) -> bool {
        let full =
            self.overflow == OverflowPolicy::Block && self.capacity.is_full(self.buffer.len());
        self.intake != Intake::Closed && !full
    }

    fn accept(&mut self, item: T) {
        self.buffer.push_back(item);
        metrics::inc_accepted(1);
        if self.overflow == OverflowPolicy::DropOldest {
            while self.capacity.is_exceeded(self.buffer.len()) {
                drop(self.buffer.pop_front());
                metrics::inc_evicted(1);
                trace!(target: "channelqueue::coordinator", "evicted oldest item");
            }
        }
        self.serve_waiting();
    }

    /// Takes an item whose send has already completed but which is still
    /// parked in the ingress channel.
    ///
    /// The rendezvous channel lets a send finish as soon as this task starts
    /// waiting on it, so at most one such item exists. Every event other than
    /// a receive absorbs it first, which keeps deliveries and queries ordered
    /// after every send that has returned.
    fn absorb_handed_over(&mut self) {
        if self.accepting() {
            if let Ok(item) = self.ingress.try_recv() {
                self.accept(item);
            }
        }
    }

    /// Moves what a closed ingress channel still holds into the buffer.
    ///
    /// Stops early when a blocking buffer fills up; the next iteration picks
    /// up again once readers have made room. Ingress counts as closed only
    /// after the channel reports empty or disconnected.
    fn drain_closed_ingress(&mut self) {
        for _ in 0..DRAIN_BATCH {
            if !self.accepting() {
                return;
            }
            match self.ingress.try_recv() {
                Ok(item) => self.accept(item),
                Err(_) => {
                    self.intake = Intake::Closed;
                    trace!(
                        target: "channelqueue::coordinator",
                        buffered = self.buffer.len(),
                        "ingress drained"
                    );
                    return;
                }
            }
        }
    }

    /// Queues a read request until an item is available.
    ///
    /// Requests whose reader has already gone are dropped here, so readers
    /// that give up on an idle queue never pile up.
    fn park(&mut self, reply: oneshot::Sender<T>) {
        if reply.is_closed() {
            metrics::inc_abandoned(1);
            return;
        }
        self.absorb_handed_over();
        let before = self.waiting.len();
        self.waiting.retain(|waiting| !waiting.is_closed());
        let pruned = before - self.waiting.len();
        if pruned > 0 {
            metrics::inc_abandoned(pruned as u64);
        }
        self.waiting.push_back(reply);
    }

    /// Hands buffered items to parked readers, oldest request first.
    fn serve_waiting(&mut self) {
        while !self.buffer.is_empty() {
            let Some(reply) = self.waiting.pop_front() else {
                return;
            };
            if reply.is_closed() {
                metrics::inc_abandoned(1);
                continue;
            }
            if let Some(item) = self.buffer.pop_front() {
                match reply.send(item) {
                    Ok(()) => metrics::inc_delivered(1),
                    Err(item) => {
                        // Reader gave up between the check and the send.
                        self.buffer.push_front(item);
                        metrics::inc_abandoned(1);
                    }
                }
            }
        }
    }

    fn answer(&mut self, query: Query<T>) {
        self.absorb_handed_over();
        match query {
            Query::Len(reply) => {
                let _ = reply.send(self.buffer.len());
            }
            Query::TryPop(reply) => {
                if reply.is_closed() {
                    return;
                }
                let popped = self.buffer.pop_front();
                let had_item = popped.is_some();
                match reply.send(popped) {
                    Ok(()) if had_item => metrics::inc_delivered(1),
                    Err(Some(item)) => {
                        self.buffer.push_front(item);
                        metrics::inc_abandoned(1);
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Waits for room in the sink. Never resolves without one.
async fn reserve<T>(
    sink: Option<mpsc::Sender<T>>,
) -> Result<mpsc::OwnedPermit<T>, mpsc::error::SendError<()>> {
    match sink {
        Some(sink) => sink.reserve_owned().await,
        None => std::future::pending().await,
    }
}
