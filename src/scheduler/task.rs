//! Task and shard identifiers.
//!
//! A run of `iterations * max_files` tasks is numbered `0..total`. Every task
//! maps onto one of `max_files` shards by `task_id mod max_files`, so several
//! tasks share a shard and the later writer replaces the earlier one.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a single unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the shard this task writes to.
    ///
    /// # Panics
    ///
    /// Panics if `max_files` is zero. Configuration validation rejects that
    /// before any task exists.
    pub fn shard(self, max_files: usize) -> ShardIndex {
        ShardIndex((self.0 % max_files as u64) as usize)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of one output slot, in `0..max_files`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShardIndex(usize);

impl ShardIndex {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for ShardIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_assignment_cycles() {
        let shards: Vec<usize> = (0..6).map(|i| TaskId::new(i).shard(3).get()).collect();
        assert_eq!(shards, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_single_shard() {
        for i in 0..10 {
            assert_eq!(TaskId::new(i).shard(1), ShardIndex::new(0));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(TaskId::new(42).to_string(), "42");
        assert_eq!(ShardIndex::new(3).to_string(), "3");
    }
}
