pub mod buffer;
pub mod capacity;
mod coordinator;
pub mod endpoint;
pub mod error;
pub mod policy;
pub mod queue;
