//! Worker pool that turns queued task ids into shard writes.
//!
//! Each worker runs as an independent tokio task pulling from the shared
//! [`TaskQueue`]. For every id it synthesizes a record and hands it to the
//! [`ShardWriter`].
//!
//! # Features
//!
//! - Fixed number of workers, all started up front
//! - Fail-open: a failed task is reported on the error stream and the worker
//!   moves on to the next id
//! - Cooperative shutdown through a shared [`CancellationToken`], checked
//!   before every pull and while waiting on a shard lock
//! - Pool statistics tracking

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::collector::ErrorSink;
use super::queue::TaskQueue;
use super::task::TaskId;
use crate::generator::RecordSource;
use crate::storage::{ShardTable, ShardWriter, WriteStatus};

/// Statistics about a pool run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolStats {
    /// Number of workers in the pool.
    pub num_workers: usize,
    /// Tasks whose record reached its shard.
    pub tasks_completed: u64,
    /// Tasks that reported an error.
    pub tasks_failed: u64,
    /// Tasks abandoned because shutdown fired mid-write.
    pub tasks_interrupted: u64,
    /// Average time from synthesis to finished write.
    pub average_task_duration: Duration,
}

impl PoolStats {
    /// Returns the number of tasks that ran to a result (completed + failed).
    pub fn total_processed(&self) -> u64 {
        self.tasks_completed + self.tasks_failed
    }

    /// Returns the success rate as a percentage.
    pub fn success_rate(&self) -> f64 {
        let total = self.total_processed();
        if total == 0 {
            return 0.0;
        }
        (self.tasks_completed as f64 / total as f64) * 100.0
    }
}

/// Shared state for tracking pool statistics.
struct SharedPoolStats {
    tasks_completed: AtomicU64,
    tasks_failed: AtomicU64,
    tasks_interrupted: AtomicU64,
    total_duration_us: AtomicU64,
}

impl SharedPoolStats {
    fn new() -> Self {
        Self {
            tasks_completed: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
            tasks_interrupted: AtomicU64::new(0),
            total_duration_us: AtomicU64::new(0),
        }
    }

    fn record_completion(&self, duration: Duration) {
        self.tasks_completed.fetch_add(1, Ordering::SeqCst);
        self.total_duration_us
            .fetch_add(duration.as_micros() as u64, Ordering::SeqCst);
    }

    fn record_failure(&self, duration: Duration) {
        self.tasks_failed.fetch_add(1, Ordering::SeqCst);
        self.total_duration_us
            .fetch_add(duration.as_micros() as u64, Ordering::SeqCst);
    }

    fn record_interrupted(&self) {
        self.tasks_interrupted.fetch_add(1, Ordering::SeqCst);
    }

    fn to_pool_stats(&self, num_workers: usize) -> PoolStats {
        let completed = self.tasks_completed.load(Ordering::SeqCst);
        let failed = self.tasks_failed.load(Ordering::SeqCst);
        let interrupted = self.tasks_interrupted.load(Ordering::SeqCst);
        let total_duration_us = self.total_duration_us.load(Ordering::SeqCst);

        let total_tasks = completed + failed;
        let average_duration = if total_tasks > 0 {
            Duration::from_micros(total_duration_us / total_tasks)
        } else {
            Duration::ZERO
        };

        PoolStats {
            num_workers,
            tasks_completed: completed,
            tasks_failed: failed,
            tasks_interrupted: interrupted,
            average_task_duration: average_duration,
        }
    }
}

/// Pool of workers sharing one task queue and one shard table.
///
/// The pool owns the shard table for its whole life. The table is complete
/// before [`WorkerPool::run`] starts the first worker.
pub struct WorkerPool {
    num_workers: usize,
    writer: Arc<ShardWriter>,
    source: Arc<dyn RecordSource>,
    stats: Arc<SharedPoolStats>,
}

impl WorkerPool {
    /// Creates a pool of `num_workers` workers writing into `table`.
    pub fn new(num_workers: usize, table: ShardTable, source: Arc<dyn RecordSource>) -> Self {
        Self {
            num_workers,
            writer: Arc::new(ShardWriter::new(table)),
            source,
            stats: Arc::new(SharedPoolStats::new()),
        }
    }

    /// Returns the number of workers in the pool.
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Returns the number of shards the pool writes to.
    pub fn num_shards(&self) -> usize {
        self.writer.table().len()
    }

    /// Returns current pool statistics.
    pub fn stats(&self) -> PoolStats {
        self.stats.to_pool_stats(self.num_workers)
    }

    /// Runs every worker until the queue is closed and drained, or until
    /// `shutdown` fires.
    ///
    /// Returns only after all workers have exited. `errors` is held until
    /// then, so the error stream cannot close while a worker is mid-task.
    pub async fn run(
        self,
        queue: TaskQueue,
        errors: ErrorSink,
        shutdown: CancellationToken,
    ) -> PoolStats {
        let mut workers = JoinSet::new();

        for i in 0..self.num_workers {
            let worker = Worker {
                id: format!("worker-{}", i),
                queue: queue.clone(),
                writer: Arc::clone(&self.writer),
                source: Arc::clone(&self.source),
                errors: errors.clone(),
                shutdown: shutdown.clone(),
                stats: Arc::clone(&self.stats),
            };
            workers.spawn(worker.run());
        }
        drop(queue);

        info!(
            num_workers = self.num_workers,
            num_shards = self.num_shards(),
            "Worker pool started"
        );

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Worker task panicked");
            }
        }
        drop(errors);

        let stats = self.stats();
        info!(
            completed = stats.tasks_completed,
            failed = stats.tasks_failed,
            interrupted = stats.tasks_interrupted,
            "All workers exited"
        );
        stats
    }
}

/// A single worker pulling task ids from the shared queue.
struct Worker {
    id: String,
    queue: TaskQueue,
    writer: Arc<ShardWriter>,
    source: Arc<dyn RecordSource>,
    errors: ErrorSink,
    shutdown: CancellationToken,
    stats: Arc<SharedPoolStats>,
}

impl Worker {
    /// Main worker loop.
    async fn run(self) {
        debug!(worker_id = %self.id, "Worker started");

        loop {
            let task_id = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    debug!(worker_id = %self.id, "Worker received shutdown signal");
                    break;
                }
                next = self.queue.next() => match next {
                    Some(task_id) => task_id,
                    None => break,
                },
            };

            self.process_task(task_id).await;
        }

        debug!(worker_id = %self.id, "Worker stopped");
    }

    async fn process_task(&self, task_id: TaskId) {
        let start_time = Instant::now();
        let record = self.source.synthesize(task_id);

        match self.writer.write(task_id, &record, &self.shutdown).await {
            Ok(WriteStatus::Written) => {
                self.stats.record_completion(start_time.elapsed());
            }
            Ok(WriteStatus::Interrupted) => {
                self.stats.record_interrupted();
            }
            Err(e) => {
                self.stats.record_failure(start_time.elapsed());
                if self.errors.send(e).is_err() {
                    warn!(worker_id = %self.id, task_id = %task_id, "Error stream closed, dropping task error");
                }
            }
        }
    }
}
