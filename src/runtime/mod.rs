//! Runtime orchestration: scheduling, registries, the region directory and queues.

pub mod directory;
pub mod queue;
pub mod registry;
pub mod scheduler;
