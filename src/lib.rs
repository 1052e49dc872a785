//! channelqueue – a dynamically buffered channel.
//!
//! A [`ChannelQueue`] behaves like a blocking channel whose buffer can be any
//! size, unbounded, or a ring that evicts its oldest item instead of blocking
//! writers. Items go in through an [`Ingress`] and come out of an [`Egress`];
//! a coordinator task owns the buffer in between.
//!
//! This crate exports
//!  * `core`    – queue handle, endpoints, coordinator and buffer backings
//!  * `config`  – TOML-driven queue configuration
//!  * `logging` – tracing subscriber setup
//!  * `metrics` – process-wide counters
//!
//! ```no_run
//! # async fn demo() {
//! use channelqueue::ChannelQueue;
//!
//! let q = ChannelQueue::new(-1);
//! q.ingress().send("hello").await;
//! q.close();
//! assert_eq!(q.egress().recv().await, Some("hello"));
//! assert_eq!(q.egress().recv().await, None);
//! # }
//! ```

// ───────────────────────────────────────────────────────────
// Public modules
// ───────────────────────────────────────────────────────────
pub mod config;
pub mod core;
pub mod logging;
pub mod metrics;

// ───────────────────────────────────────────────────────────
// Re-exports
// ───────────────────────────────────────────────────────────
pub use crate::config::{load_config, Config, QueueConfig};
pub use crate::core::capacity::Capacity;
pub use crate::core::endpoint::{Egress, Ingress};
pub use crate::core::error::QueueError;
pub use crate::core::policy::{OverflowPolicy, Policy};
pub use crate::core::queue::{ChannelQueue, QueueBuilder};
