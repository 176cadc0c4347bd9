//! Fan-out/fan-in scheduling of generation tasks.
//!
//! This module provides the concurrent machinery of a run:
//!
//! - **TaskGenerator**: pushes task ids `0..iterations*max_files` in order
//! - **TaskQueue**: bounded queue shared by all workers
//! - **WorkerPool**: fixed set of workers that synthesize and write records
//! - **ErrorCollector**: drains per-task errors while the pool runs
//!
//! # Architecture
//!
//! ```text
//!                      ┌──────────────┐
//!                      │TaskGenerator │
//!                      └──────┬───────┘
//!                             │ bounded (min(10000, total))
//!                      ┌──────▼───────┐
//!                      │  TaskQueue   │
//!                      └──────┬───────┘
//!         ┌───────────────────┼───────────────────┐
//!         ▼                   ▼                   ▼
//!    ┌─────────┐         ┌─────────┐         ┌─────────┐
//!    │ Worker 1│         │ Worker 2│         │ Worker N│──► shard files
//!    └────┬────┘         └────┬────┘         └────┬────┘
//!         └───────────────────┼───────────────────┘
//!                      ┌──────▼───────┐
//!                      │ErrorCollector│
//!                      └──────────────┘
//! ```

pub mod collector;
pub mod queue;
pub mod task;
pub mod worker_pool;

pub use collector::{error_channel, ErrorCollector, ErrorSink};
pub use queue::{task_queue, TaskGenerator, TaskQueue, TaskSender, MAX_QUEUE_CAPACITY};
pub use task::{ShardIndex, TaskId};
pub use worker_pool::{PoolStats, WorkerPool};
