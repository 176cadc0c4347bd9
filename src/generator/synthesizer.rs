//! Per-task record synthesis.
//!
//! Every task gets its own ChaCha8 generator. The 32-byte seed holds a
//! process-level entropy value in its first 8 bytes and the task id in the
//! next 8, so two tasks in the same run can never share a seed and no worker
//! ever touches another task's random state.

use chrono::Utc;
use rand::{RngExt, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::record::{Record, METADATA_KEYS};
use crate::scheduler::TaskId;

/// Something that can produce the record for a task.
///
/// Implementations must be safe to call from many workers at once and must
/// not fail.
pub trait RecordSource: Send + Sync {
    fn synthesize(&self, task_id: TaskId) -> Record;
}

/// Default [`RecordSource`] producing random records.
#[derive(Debug, Clone)]
pub struct RecordSynthesizer {
    entropy: u64,
}

impl RecordSynthesizer {
    /// Creates a synthesizer seeded from the thread-local entropy source.
    pub fn new() -> Self {
        Self::with_entropy(rand::rng().random())
    }

    /// Creates a synthesizer with a fixed entropy value.
    ///
    /// Useful for reproducing the values and names of a run.
    pub fn with_entropy(entropy: u64) -> Self {
        Self { entropy }
    }

    fn rng_for(&self, task_id: TaskId) -> ChaCha8Rng {
        let mut seed = [0u8; 32];
        seed[..8].copy_from_slice(&self.entropy.to_le_bytes());
        seed[8..16].copy_from_slice(&task_id.get().to_le_bytes());
        ChaCha8Rng::from_seed(seed)
    }
}

impl Default for RecordSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordSource for RecordSynthesizer {
    fn synthesize(&self, task_id: TaskId) -> Record {
        let mut rng = self.rng_for(task_id);
        let id = task_id.get();

        let name = format!("Item-{}-{}", id, rng.random_range(0..10_000u32));

        let len = rng.random_range(1..=10usize);
        let values = (0..len).map(|_| rng.random_range(0.0..100.0)).collect();

        let metadata = METADATA_KEYS
            .iter()
            .map(|key| (key.to_string(), rng.random_range(0..1000u32)))
            .collect();

        Record {
            id,
            name,
            timestamp: Utc::now(),
            values,
            metadata,
        }
    }
}
