//! Synthetic record generation.
//!
//! - **Record**: the structured document stored in each shard
//! - **RecordSynthesizer**: produces one record per task from an
//!   independent, per-task random generator
//!
//! # Example
//!
//! ```ignore
//! use shard_forge::generator::{RecordSource, RecordSynthesizer};
//! use shard_forge::scheduler::TaskId;
//!
//! let synth = RecordSynthesizer::new();
//! let record = synth.synthesize(TaskId::new(42));
//! assert_eq!(record.id, 42);
//! ```

pub mod record;
pub mod synthesizer;

pub use record::{Record, METADATA_KEYS};
pub use synthesizer::{RecordSource, RecordSynthesizer};
