//! Storage backings owned by a coordinator.
//!
//! A backing is only ever touched by the coordinator task that owns it, so
//! nothing here is synchronised.

use std::collections::VecDeque;

/// Ordered storage behind a queue.
pub trait Buffer<T>: Send {
    /// Appends an item at the back.
    fn push_back(&mut self, item: T);

    /// Removes the oldest item.
    fn pop_front(&mut self) -> Option<T>;

    /// Returns an item whose delivery was abandoned to the front.
    fn push_front(&mut self, item: T);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Send> Buffer<T> for VecDeque<T> {
    #[inline]
    fn push_back(&mut self, item: T) {
        VecDeque::push_back(self, item);
    }

    #[inline]
    fn pop_front(&mut self) -> Option<T> {
        VecDeque::pop_front(self)
    }

    #[inline]
    fn push_front(&mut self, item: T) {
        VecDeque::push_front(self, item);
    }

    #[inline]
    fn len(&self) -> usize {
        VecDeque::len(self)
    }
}

/// Single-item backing used by ring queues of capacity one.
///
/// Pushing into an occupied slot replaces the held item.
#[derive(Debug)]
pub struct Slot<T> {
    item: Option<T>,
}

impl<T> Slot<T> {
    pub fn new() -> Self {
        Self { item: None }
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> Buffer<T> for Slot<T> {
    #[inline]
    fn push_back(&mut self, item: T) {
        self.item = Some(item);
    }

    #[inline]
    fn pop_front(&mut self) -> Option<T> {
        self.item.take()
    }

    #[inline]
    fn push_front(&mut self, item: T) {
        // An abandoned delivery loses to anything written since.
        if self.item.is_none() {
            self.item = Some(item);
        }
    }

    #[inline]
    fn len(&self) -> usize {
        usize::from(self.item.is_some())
    }
}
