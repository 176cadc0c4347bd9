//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use shard_forge::generator::{Record, RecordSource, RecordSynthesizer};
use shard_forge::scheduler::TaskId;

/// Record source that counts how often each task id is synthesized and can
/// optionally slow every call down.
#[derive(Default)]
pub struct CountingSource {
    inner: RecordSynthesizer,
    delay: Duration,
    calls: Mutex<HashMap<u64, usize>>,
}

impl CountingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Per-task call counts.
    pub fn calls(&self) -> HashMap<u64, usize> {
        self.calls.lock().unwrap().clone()
    }

    /// Total number of synthesize calls.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

impl RecordSource for CountingSource {
    fn synthesize(&self, task_id: TaskId) -> Record {
        *self.calls.lock().unwrap().entry(task_id.get()).or_default() += 1;
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.inner.synthesize(task_id)
    }
}
