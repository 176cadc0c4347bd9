//! Filesystem storage for shard outputs.
//!
//! # Overview
//!
//! - **ShardTable**: fixed array of shard paths and locks, built once per run
//! - **ShardWriter**: encodes a record as YAML and replaces its shard file
//!   while holding that shard's lock
//! - **OutputStore**: lists and parses the shard files written by a run
//!
//! Shard `n` lives at `<output_dir>/output_<n>.yml`.

pub mod reader;
pub mod shard;

pub use reader::OutputStore;
pub use shard::{shard_file_name, ShardTable, ShardWriter, WriteStatus};
