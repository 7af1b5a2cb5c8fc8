//! CLI argument models and validation utilities for the `brief` binary.
//!
//! Exposes the clap-backed flag and subcommand types plus the parsers that
//! keep numeric settings in range.

pub mod cli_args;
pub mod cli_types;
pub mod validation;

pub use cli_args::{Cli, CliCommand};
pub use cli_types::*;
pub use validation::*;
