//! shard-forge: synthetic record generator with a sharded worker pool.
//!
//! This library generates synthetic records on a pool of concurrent
//! workers and persists them into a fixed set of shard files, racing the
//! run against cancellation and a deadline.

pub mod cli;
pub mod error;
pub mod generator;
pub mod pipeline;
pub mod scheduler;
pub mod storage;

// Re-export commonly used types
pub use error::{ConfigError, ProcessError, StoreError, TaskError};
pub use pipeline::{GenerationConfig, Orchestrator, Outcome, ProcessReport};
