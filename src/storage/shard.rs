//! Shard files and the locks that guard them.
//!
//! A run writes to exactly `max_files` files. Each one has a lock in a
//! fixed-size table built before any task is dispatched; the table never
//! grows or shrinks afterwards, so only the locks inside it need
//! synchronization.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::TaskError;
use crate::generator::Record;
use crate::scheduler::{ShardIndex, TaskId};

/// Extension used for shard documents.
pub const SHARD_EXTENSION: &str = "yml";

/// Returns the file name of a shard, e.g. `output_3.yml`.
pub fn shard_file_name(id: u64) -> String {
    format!("output_{}.{}", id, SHARD_EXTENSION)
}

struct ShardSlot {
    path: PathBuf,
    lock: Mutex<()>,
}

/// Fixed table of shard paths and locks, indexed by shard number.
pub struct ShardTable {
    dir: PathBuf,
    slots: Box<[ShardSlot]>,
}

impl ShardTable {
    /// Builds the table for `max_files` shards under `dir`.
    ///
    /// # Panics
    ///
    /// Panics if `max_files` is zero, since no task could be assigned a
    /// shard. `GenerationConfig::validate` rejects that case first.
    pub fn new(dir: impl Into<PathBuf>, max_files: usize) -> Self {
        assert!(max_files > 0, "a shard table needs at least one shard");
        let dir = dir.into();
        let slots = (0..max_files)
            .map(|i| ShardSlot {
                path: dir.join(shard_file_name(i as u64)),
                lock: Mutex::new(()),
            })
            .collect();

        Self { dir, slots }
    }

    /// Number of shards.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the given shard's document.
    pub fn path(&self, shard: ShardIndex) -> &Path {
        &self.slots[shard.get()].path
    }

    /// Waits for the shard's lock, giving up if `shutdown` fires first.
    async fn acquire(
        &self,
        shard: ShardIndex,
        shutdown: &CancellationToken,
    ) -> Option<MutexGuard<'_, ()>> {
        let lock = &self.slots[shard.get()].lock;
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => None,
            guard = lock.lock() => Some(guard),
        }
    }
}

/// Whether a write reached storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    Written,
    /// Shutdown fired while waiting for the shard lock; nothing was written.
    Interrupted,
}

/// Serializes records into their shard under the shard's lock.
///
/// Owns the [`ShardTable`], so it is the only thing that ever takes a shard
/// lock. A write fully replaces whatever the shard held before.
pub struct ShardWriter {
    table: ShardTable,
}

impl ShardWriter {
    pub fn new(table: ShardTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &ShardTable {
        &self.table
    }

    /// Writes `record` for `task_id` into shard `task_id mod max_files`.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::Serialization` if encoding fails and
    /// `TaskError::Io` if the file cannot be written. The shard lock is
    /// released before returning in every case.
    pub async fn write(
        &self,
        task_id: TaskId,
        record: &Record,
        shutdown: &CancellationToken,
    ) -> Result<WriteStatus, TaskError> {
        let shard = task_id.shard(self.table.len());
        let path = self.table.path(shard);

        let Some(_guard) = self.table.acquire(shard, shutdown).await else {
            debug!(task_id = %task_id, shard = %shard, "Shard write interrupted");
            return Ok(WriteStatus::Interrupted);
        };

        let yaml = serde_yaml::to_string(record).map_err(|source| {
            error!(task_id = %task_id, file = ?path, error = %source, "Failed to encode record");
            TaskError::Serialization {
                task_id,
                shard,
                source,
            }
        })?;

        fs::write(path, yaml).await.map_err(|source| {
            error!(task_id = %task_id, file = ?path, error = %source, "Failed to write shard");
            TaskError::Io {
                task_id,
                shard,
                path: path.to_path_buf(),
                source,
            }
        })?;

        Ok(WriteStatus::Written)
    }
}
