//! Command-line interface for shard-forge.
//!
//! Provides commands for running a generation and inspecting its outputs.

mod commands;

pub use commands::{parse_cli, run_with_cli, Cli, Commands};
