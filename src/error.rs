//! Error types for shard-forge operations.
//!
//! Defines error types for every layer of a generation run:
//! - Per-task failures, which are collected and never abort the run
//! - Run-level failures returned from the orchestrator
//! - Configuration rejection
//! - Read-side lookups of persisted shard outputs

use std::path::PathBuf;

use thiserror::Error;

use crate::scheduler::{ShardIndex, TaskId};

/// A failure local to a single task.
///
/// Every variant is tagged with the task and shard that produced it, since
/// errors arrive from many workers in no particular order.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task {task_id} (shard {shard}): failed to encode record: {source}")]
    Serialization {
        task_id: TaskId,
        shard: ShardIndex,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("task {task_id} (shard {shard}): failed to write {path:?}: {source}")]
    Io {
        task_id: TaskId,
        shard: ShardIndex,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TaskError {
    /// Returns the task that produced this error.
    pub fn task_id(&self) -> TaskId {
        match self {
            TaskError::Serialization { task_id, .. } | TaskError::Io { task_id, .. } => *task_id,
        }
    }

    /// Returns the shard the failing task was targeting.
    pub fn shard(&self) -> ShardIndex {
        match self {
            TaskError::Serialization { shard, .. } | TaskError::Io { shard, .. } => *shard,
        }
    }
}

/// Errors that end a whole `process` call.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to prepare output directory {path:?}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Errors raised by the read side of the output store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Output {id} not found")]
    NotFound { id: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse output {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_error_tags() {
        let err = TaskError::Io {
            task_id: TaskId::new(7),
            shard: ShardIndex::new(2),
            path: PathBuf::from("/tmp/output_2.yml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };

        assert_eq!(err.task_id(), TaskId::new(7));
        assert_eq!(err.shard(), ShardIndex::new(2));

        let msg = err.to_string();
        assert!(msg.contains("task 7"));
        assert!(msg.contains("shard 2"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_process_error_display() {
        assert_eq!(ProcessError::Cancelled.to_string(), "Operation cancelled");

        let err = ProcessError::from(ConfigError::ValidationFailed("max_files".to_string()));
        assert!(err.to_string().contains("max_files"));
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::NotFound { id: 3 };
        assert_eq!(err.to_string(), "Output 3 not found");
    }
}
