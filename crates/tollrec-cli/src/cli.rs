//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Trip and toll-crossing reconciliation.
///
/// Attributes every toll charge of the crossing log to a trip of the same
/// vehicle in the trip log.
#[derive(Debug, Parser)]
#[command(name = "tollrec", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Attribute crossings to trips and write the report.
    Reconcile {
        /// Trip log CSV export.
        #[arg(long)]
        trips: PathBuf,

        /// Crossing log CSV export.
        #[arg(long)]
        crossings: PathBuf,

        /// Report path (default: `gmt_pase_<timestamp>` in the output directory).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },

    /// Load both logs and summarize what they contain.
    Check {
        /// Trip log CSV export.
        #[arg(long)]
        trips: PathBuf,

        /// Crossing log CSV export.
        #[arg(long)]
        crossings: PathBuf,
    },
}

/// Report file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}
