//! Aggregation of per-task errors.
//!
//! Workers push errors into an unbounded stream so reporting a failure never
//! blocks a worker. The collector drains that stream while the pool runs and
//! finishes only after every sender is gone, i.e. after every worker exited.

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, Instrument};

use crate::error::TaskError;

/// Sending side of the error stream, one clone per worker.
pub type ErrorSink = mpsc::UnboundedSender<TaskError>;

/// Creates the error stream shared by the pool's workers.
pub fn error_channel() -> (ErrorSink, mpsc::UnboundedReceiver<TaskError>) {
    mpsc::unbounded_channel()
}

/// Background task draining the error stream into a list.
pub struct ErrorCollector {
    handle: JoinHandle<Vec<TaskError>>,
}

impl ErrorCollector {
    /// Starts draining `errors` concurrently with the pool.
    pub fn spawn(mut errors: mpsc::UnboundedReceiver<TaskError>) -> Self {
        let handle = tokio::spawn(async move {
            let mut collected = Vec::new();
            while let Some(err) = errors.recv().await {
                error!(
                    task_id = %err.task_id(),
                    shard = %err.shard(),
                    error = %err,
                    "Worker error"
                );
                collected.push(err);
            }
            info!(count = collected.len(), "Error stream closed");
            collected
        }
        .in_current_span());

        Self { handle }
    }

    /// Waits for the stream to close and returns every error it carried.
    ///
    /// Order reflects arrival, which is not meaningful across workers.
    pub async fn finish(self) -> Result<Vec<TaskError>, JoinError> {
        self.handle.await
    }
}
