//! Transfer policies and how a construction request maps onto them.

use std::fmt;

use super::capacity::Capacity;

/// What the coordinator does with a new item when the buffer is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Stop servicing ingress until a reader makes room.
    Block,
    /// Accept the item and discard the oldest buffered one.
    DropOldest,
}

/// The three transfer loops a queue can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Bounded or unbounded FIFO with backpressure on ingress.
    Fifo,
    /// Bounded ring (capacity > 1) evicting the oldest item.
    Ring,
    /// Ring of capacity one, backed by a single slot.
    RingOfOne,
}

impl Policy {
    /// Picks the policy for a normalised capacity.
    ///
    /// An unbounded ring never evicts, so it is served as an unbounded FIFO.
    pub fn select(capacity: Capacity, ring: bool) -> Self {
        match (ring, capacity.limit()) {
            (false, _) | (true, None) => Policy::Fifo,
            (true, Some(1)) => Policy::RingOfOne,
            (true, Some(_)) => Policy::Ring,
        }
    }

    #[inline]
    pub fn overflow(self) -> OverflowPolicy {
        match self {
            Policy::Fifo => OverflowPolicy::Block,
            Policy::Ring | Policy::RingOfOne => OverflowPolicy::DropOldest,
        }
    }

    #[inline]
    pub fn is_ring(self) -> bool {
        self.overflow() == OverflowPolicy::DropOldest
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Policy::Fifo => "fifo",
            Policy::Ring => "ring",
            Policy::RingOfOne => "ring-of-one",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_requests_select_by_capacity() {
        assert_eq!(Policy::select(Capacity::from_requested(0), true), Policy::Fifo);
        assert_eq!(Policy::select(Capacity::from_requested(-5), true), Policy::Fifo);
        assert_eq!(Policy::select(Capacity::from_requested(1), true), Policy::RingOfOne);
        assert_eq!(Policy::select(Capacity::from_requested(2), true), Policy::Ring);
        assert_eq!(Policy::select(Capacity::from_requested(64), true), Policy::Ring);
    }

    #[test]
    fn non_ring_requests_are_always_fifo() {
        for requested in [-1, 0, 1, 2, 1000] {
            let policy = Policy::select(Capacity::from_requested(requested), false);
            assert_eq!(policy, Policy::Fifo);
            assert_eq!(policy.overflow(), OverflowPolicy::Block);
        }
    }

    #[test]
    fn ring_policies_drop_oldest() {
        assert!(Policy::Ring.is_ring());
        assert!(Policy::RingOfOne.is_ring());
        assert!(!Policy::Fifo.is_ring());
    }
}
