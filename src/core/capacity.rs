//! Buffering limit of a queue.

use std::fmt;
use std::num::NonZeroUsize;

/// How many items a queue may hold before its overflow policy applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capacity {
    Bounded(NonZeroUsize),
    Unbounded,
}

impl Capacity {
    /// Normalises a requested capacity. Anything below 1 means unbounded.
    pub fn from_requested(requested: isize) -> Self {
        usize::try_from(requested)
            .ok()
            .and_then(NonZeroUsize::new)
            .map_or(Capacity::Unbounded, Capacity::Bounded)
    }

    /// Raw value with `-1` standing for unbounded.
    #[inline]
    pub fn as_raw(self) -> isize {
        match self {
            Capacity::Bounded(n) => isize::try_from(n.get()).unwrap_or(isize::MAX),
            Capacity::Unbounded => -1,
        }
    }

    #[inline]
    pub fn limit(self) -> Option<usize> {
        match self {
            Capacity::Bounded(n) => Some(n.get()),
            Capacity::Unbounded => None,
        }
    }

    #[inline]
    pub fn is_unbounded(self) -> bool {
        matches!(self, Capacity::Unbounded)
    }

    /// True once `len` items leave no room for another.
    #[inline]
    pub(crate) fn is_full(self, len: usize) -> bool {
        self.limit().is_some_and(|limit| len >= limit)
    }

    /// True while `len` is past the limit.
    #[inline]
    pub(crate) fn is_exceeded(self, len: usize) -> bool {
        self.limit().is_some_and(|limit| len > limit)
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Capacity::Unbounded
    }
}

impl From<isize> for Capacity {
    fn from(requested: isize) -> Self {
        Capacity::from_requested(requested)
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capacity::Bounded(n) => write!(f, "{n}"),
            Capacity::Unbounded => f.write_str("unbounded"),
        }
    }
}
