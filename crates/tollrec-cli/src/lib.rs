//! Trip and toll-crossing reconciliation CLI library.
//!
//! This crate loads the vendor logs, runs the core correlation and writes
//! the annotated report.

mod cli;
pub mod commands;
mod config;
pub mod export;
pub mod normalize;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
