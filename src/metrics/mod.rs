use std::sync::atomic::{AtomicU64, Ordering};

// Global counters (low overhead). These are coarse-grained and process-wide,
// summed over every queue in the process.
static ACCEPTED: AtomicU64 = AtomicU64::new(0);
static DELIVERED: AtomicU64 = AtomicU64::new(0);
static EVICTED: AtomicU64 = AtomicU64::new(0);
static ABANDONED: AtomicU64 = AtomicU64::new(0);
static COORDINATORS_STARTED: AtomicU64 = AtomicU64::new(0);
static COORDINATORS_FINISHED: AtomicU64 = AtomicU64::new(0);

#[inline]
pub fn inc_accepted(n: u64) {
    ACCEPTED.fetch_add(n, Ordering::Relaxed);
}
#[inline]
pub fn inc_delivered(n: u64) {
    DELIVERED.fetch_add(n, Ordering::Relaxed);
}
#[inline]
pub fn inc_evicted(n: u64) {
    EVICTED.fetch_add(n, Ordering::Relaxed);
}
#[inline]
pub fn inc_abandoned(n: u64) {
    ABANDONED.fetch_add(n, Ordering::Relaxed);
}
#[inline]
pub fn inc_coordinators_started() {
    COORDINATORS_STARTED.fetch_add(1, Ordering::Relaxed);
}
#[inline]
pub fn inc_coordinators_finished() {
    COORDINATORS_FINISHED.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn accepted() -> u64 {
    ACCEPTED.load(Ordering::Relaxed)
}
#[inline]
pub fn delivered() -> u64 {
    DELIVERED.load(Ordering::Relaxed)
}
#[inline]
pub fn evicted() -> u64 {
    EVICTED.load(Ordering::Relaxed)
}

/// Coordinators spawned but not yet finished.
pub fn live_coordinators() -> u64 {
    COORDINATORS_STARTED
        .load(Ordering::Relaxed)
        .saturating_sub(COORDINATORS_FINISHED.load(Ordering::Relaxed))
}

pub fn snapshot() -> String {
    // Simple text format (Prometheus-style without HELP/TYPE lines for brevity)
    format!(
        "channelqueue_accepted {}\nchannelqueue_delivered {}\nchannelqueue_evicted {}\nchannelqueue_abandoned {}\nchannelqueue_coordinators_started {}\nchannelqueue_coordinators_finished {}\n",
        ACCEPTED.load(Ordering::Relaxed),
        DELIVERED.load(Ordering::Relaxed),
        EVICTED.load(Ordering::Relaxed),
        ABANDONED.load(Ordering::Relaxed),
        COORDINATORS_STARTED.load(Ordering::Relaxed),
        COORDINATORS_FINISHED.load(Ordering::Relaxed),
    )
}
