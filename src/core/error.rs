use thiserror::Error;

/// Recoverable conditions reported by the queue endpoints.
///
/// Sending on a closed ingress is not part of this enum: like a send on a
/// closed channel it is a programming error and panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// No item is buffered right now.
    #[error("queue is empty")]
    Empty,
    /// Egress has reached end-of-stream.
    #[error("queue is closed")]
    Closed,
}
