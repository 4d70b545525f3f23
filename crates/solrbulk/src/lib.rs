//! solrbulk library exports.
//!
//! - `cli`: command-line argument parsing with clap
//! - `commands`: configuration, logging and pipeline wiring
//! - `input`: plain or gzip input from a file or standard input

pub mod cli;
pub mod commands;
pub mod input;

pub use cli::Cli;
pub use commands::{resolve, run};
pub use input::{open_input, Input};
