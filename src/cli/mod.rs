//! Command-line interface for gd-sim.
//!
//! Provides the interactive discussion loop and small inspection commands.

mod commands;

pub use commands::{parse_cli, run, run_with_cli};
