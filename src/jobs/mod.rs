pub mod locks;
pub mod queue;
pub mod service;

pub use locks::JobLocks;
pub use queue::{WorkQueue, WorkerPool, spawn_sweeper, spawn_workers};
pub use service::JobService;
