//! Orchestration of generation runs.
//!
//! - **Config**: sizing, deadline and output location of a run
//! - **Orchestrator**: starts the generator, pool and collector, then races
//!   completion against cancellation and the deadline
//!
//! # Example
//!
//! ```rust,ignore
//! use shard_forge::pipeline::{GenerationConfig, Orchestrator, Outcome};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = GenerationConfig::new()
//!     .with_iterations(100)
//!     .with_max_files(10)
//!     .with_max_workers(8)
//!     .with_timeout(Duration::from_secs(60));
//!
//! let cancel = CancellationToken::new();
//! let report = Orchestrator::new().process(&cancel, &config).await?;
//!
//! match report.outcome {
//!     Outcome::Completed => println!("{} task errors", report.errors.len()),
//!     Outcome::TimedOut => println!("deadline elapsed"),
//! }
//! ```

pub mod config;
pub mod orchestrator;

pub use config::{GenerationConfig, DEFAULT_OUTPUT_DIR};
pub use orchestrator::{Orchestrator, Outcome, ProcessReport};
