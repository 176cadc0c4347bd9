//! Orchestrator for a generation run.
//!
//! A call to [`Orchestrator::process`] moves through
//! `Idle -> Running -> {Completed, TimedOut, Cancelled}`. While running it
//! waits on whichever of three signals resolves first:
//!
//! - the caller's cancellation token, which ends the call with
//!   `ProcessError::Cancelled` and discards anything collected
//! - the run deadline, which ends the call with an empty, error-free report
//!   marked [`Outcome::TimedOut`]
//! - natural completion: generation done, every worker exited, and the error
//!   stream drained
//!
//! Leaving `Running` by cancellation or deadline cancels the run's shutdown
//! token, so the generator and workers still in flight stop at their next
//! check instead of running on detached.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::config::GenerationConfig;
use crate::error::{ProcessError, TaskError};
use crate::generator::{RecordSource, RecordSynthesizer};
use crate::scheduler::{
    error_channel, task_queue, ErrorCollector, PoolStats, TaskGenerator, WorkerPool,
};
use crate::storage::ShardTable;

/// Terminal state of a run that returned without a top-level error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every task was attempted.
    Completed,
    /// The deadline fired first. Nothing was collected and the outcome of
    /// the tasks is unknown.
    TimedOut,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Completed => write!(f, "completed"),
            Outcome::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// Result of a `process` call.
#[derive(Debug)]
pub struct ProcessReport {
    /// Identifier of the run, also recorded on its tracing span.
    pub run_id: Uuid,
    pub outcome: Outcome,
    /// Per-task errors, in no meaningful order. Always empty on timeout.
    pub errors: Vec<TaskError>,
    /// Pool statistics. Default on timeout.
    pub stats: PoolStats,
    pub elapsed: Duration,
}

impl ProcessReport {
    fn timed_out(run_id: Uuid, elapsed: Duration) -> Self {
        Self {
            run_id,
            outcome: Outcome::TimedOut,
            errors: Vec::new(),
            stats: PoolStats::default(),
            elapsed,
        }
    }

    /// Every task completed and none failed.
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Completed && self.errors.is_empty()
    }

    /// Every task was attempted but some failed.
    pub fn is_partial_success(&self) -> bool {
        self.outcome == Outcome::Completed && !self.errors.is_empty()
    }

    pub fn timed_out_before_completion(&self) -> bool {
        self.outcome == Outcome::TimedOut
    }
}

/// Wires the generator, worker pool and error collector together for each
/// run and races them against cancellation and the deadline.
pub struct Orchestrator {
    source: Arc<dyn RecordSource>,
}

impl Orchestrator {
    /// Creates an orchestrator producing random records.
    pub fn new() -> Self {
        Self::with_source(Arc::new(RecordSynthesizer::new()))
    }

    /// Creates an orchestrator using a custom record source.
    pub fn with_source(source: Arc<dyn RecordSource>) -> Self {
        Self { source }
    }

    /// Runs one generation.
    ///
    /// # Returns
    ///
    /// - `Ok(report)` with [`Outcome::Completed`] and zero or more per-task
    ///   errors on natural completion
    /// - `Ok(report)` with [`Outcome::TimedOut`] and no errors if the
    ///   deadline fired first
    ///
    /// # Errors
    ///
    /// - `ProcessError::Cancelled` if `cancel` fired first
    /// - `ProcessError::Config` if `config` fails validation
    /// - `ProcessError::OutputDirectory` if the output directory cannot be
    ///   created
    /// - `ProcessError::Join` if a background task panicked
    pub async fn process(
        &self,
        cancel: &CancellationToken,
        config: &GenerationConfig,
    ) -> Result<ProcessReport, ProcessError> {
        config.validate()?;
        if cancel.is_cancelled() {
            warn!("Cancelled before start");
            return Err(ProcessError::Cancelled);
        }

        let run_id = Uuid::new_v4();
        let span = info_span!("process", run_id = %run_id);
        self.run(run_id, cancel, config).instrument(span).await
    }

    async fn run(
        &self,
        run_id: Uuid,
        cancel: &CancellationToken,
        config: &GenerationConfig,
    ) -> Result<ProcessReport, ProcessError> {
        fs::create_dir_all(&config.output_dir)
            .await
            .map_err(|source| ProcessError::OutputDirectory {
                path: config.output_dir.clone(),
                source,
            })?;

        let start_time = Instant::now();
        let shutdown = cancel.child_token();

        // The shard table is complete before the queue exists.
        let table = ShardTable::new(&config.output_dir, config.max_files);
        let pool = WorkerPool::new(config.max_workers, table, Arc::clone(&self.source));
        let generator = TaskGenerator::new(config.iterations, config.max_files);

        info!(
            output_dir = ?config.output_dir,
            max_files = config.max_files,
            max_workers = config.max_workers,
            iterations = config.iterations,
            total_tasks = config.total_tasks(),
            queue_capacity = config.queue_capacity(),
            timeout_secs = config.timeout.as_secs_f64(),
            "Worker pool initialized"
        );

        let (sender, queue) = task_queue(config.queue_capacity());
        let (sink, stream) = error_channel();
        let collector = ErrorCollector::spawn(stream);

        let generation = {
            let shutdown = shutdown.clone();
            tokio::spawn(
                async move { generator.run(sender, &shutdown).await }.in_current_span(),
            )
        };
        let processing = tokio::spawn(pool.run(queue, sink, shutdown.clone()).in_current_span());

        let completion = async move {
            let generated = generation.await?;
            let stats = processing.await?;
            let errors = collector.finish().await?;
            Ok::<_, ProcessError>((generated, stats, errors))
        };

        tokio::select! {
            _ = cancel.cancelled() => {
                shutdown.cancel();
                error!("Operation cancelled");
                Err(ProcessError::Cancelled)
            }
            _ = tokio::time::sleep(config.timeout) => {
                shutdown.cancel();
                error!(timeout_secs = config.timeout.as_secs_f64(), "Operation timed out");
                Ok(ProcessReport::timed_out(run_id, start_time.elapsed()))
            }
            finished = completion => {
                let (generated, stats, errors) = finished?;
                if generated < config.total_tasks() {
                    warn!(generated, total = config.total_tasks(), "Generation stopped early");
                }

                if errors.is_empty() {
                    info!("No errors during processing");
                } else {
                    error!(count = errors.len(), "Errors occurred during processing");
                }
                info!(elapsed_ms = start_time.elapsed().as_millis() as u64, "Operation completed");

                Ok(ProcessReport {
                    run_id,
                    outcome: Outcome::Completed,
                    errors,
                    stats,
                    elapsed: start_time.elapsed(),
                })
            }
        }
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_outcome_display() {
        assert_eq!(Outcome::Completed.to_string(), "completed");
        assert_eq!(Outcome::TimedOut.to_string(), "timed_out");
    }

    #[test]
    fn test_timed_out_report_is_empty() {
        let report = ProcessReport::timed_out(Uuid::new_v4(), Duration::from_millis(5));

        assert!(report.timed_out_before_completion());
        assert!(report.errors.is_empty());
        assert!(!report.is_success());
        assert!(!report.is_partial_success());
        assert_eq!(report.stats, PoolStats::default());
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let dir = TempDir::new().unwrap();
        let config = GenerationConfig::new()
            .with_output_dir(dir.path())
            .with_max_workers(0);

        let result = Orchestrator::new()
            .process(&CancellationToken::new(), &config)
            .await;
        assert!(matches!(result, Err(ProcessError::Config(_))));
    }

    #[tokio::test]
    async fn test_output_dir_failure() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();

        let config = GenerationConfig::new().with_output_dir(blocker.join("nested"));
        let result = Orchestrator::new()
            .process(&CancellationToken::new(), &config)
            .await;
        assert!(matches!(result, Err(ProcessError::OutputDirectory { .. })));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_small_run_completes() {
        let dir = TempDir::new().unwrap();
        let config = GenerationConfig::new()
            .with_iterations(2)
            .with_max_files(3)
            .with_max_workers(2)
            .with_timeout(Duration::from_secs(30))
            .with_output_dir(dir.path().join("out"));

        let report = Orchestrator::new()
            .process(&CancellationToken::new(), &config)
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.stats.tasks_completed, 6);
        assert_eq!(report.stats.num_workers, 2);
    }
}
