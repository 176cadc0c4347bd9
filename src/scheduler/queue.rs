//! Bounded task queue and the generator that feeds it.
//!
//! The queue is a tokio MPSC channel whose receiving half is shared by every
//! worker, which turns it into a single work-sharing queue:
//!
//! - The generator pushes task ids in ascending order and blocks while the
//!   queue is full, so generation runs at consumer pace
//! - Workers pull whichever id is next; no worker owns a sub-queue
//! - Dropping the sender closes the queue, and workers see `None` once the
//!   remaining ids are drained

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::task::TaskId;

/// Upper bound on the number of queued, not yet consumed task ids.
pub const MAX_QUEUE_CAPACITY: usize = 10_000;

/// Creates a bounded task queue with the given capacity.
pub fn task_queue(capacity: usize) -> (TaskSender, TaskQueue) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        TaskSender { tx },
        TaskQueue {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Producing half of the task queue. Dropping it closes the queue.
#[derive(Debug)]
pub struct TaskSender {
    tx: mpsc::Sender<TaskId>,
}

/// Consuming half of the task queue, shared by all workers.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    rx: Arc<Mutex<mpsc::Receiver<TaskId>>>,
}

impl TaskQueue {
    /// Pulls the next task id.
    ///
    /// Waits while the queue is empty but open. Returns `None` once the
    /// queue is closed and drained. Cancel-safe: a pull abandoned mid-wait
    /// loses no task id.
    pub async fn next(&self) -> Option<TaskId> {
        self.rx.lock().await.recv().await
    }
}

/// Produces the ordered task ids of one run.
#[derive(Debug, Clone, Copy)]
pub struct TaskGenerator {
    iterations: usize,
    max_files: usize,
}

impl TaskGenerator {
    pub fn new(iterations: usize, max_files: usize) -> Self {
        Self {
            iterations,
            max_files,
        }
    }

    /// Total number of tasks this generator emits.
    pub fn total(&self) -> u64 {
        self.iterations as u64 * self.max_files as u64
    }

    /// Returns a fresh ascending sequence `0..total`. Each call restarts.
    pub fn ids(&self) -> impl Iterator<Item = TaskId> {
        (0..self.total()).map(TaskId::new)
    }

    /// Pushes every task id into the queue, then closes it.
    ///
    /// Stops early if `shutdown` fires while waiting for queue space, or if
    /// every consumer has gone away. Returns the number of ids pushed.
    pub async fn run(&self, sender: TaskSender, shutdown: &CancellationToken) -> u64 {
        let total = self.total();
        let mut pushed = 0u64;

        info!(total, "Starting task generation");

        for id in self.ids() {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!(pushed, total, "Task generation interrupted");
                    return pushed;
                }
                sent = sender.tx.send(id) => {
                    if sent.is_err() {
                        warn!(pushed, total, "Task queue closed before generation finished");
                        return pushed;
                    }
                }
            }
            pushed += 1;
        }

        info!(pushed, "Task generation finished");
        pushed
    }
}
