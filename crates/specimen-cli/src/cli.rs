//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use specimen_model::{ConstraintMode, GraphOptions};

#[derive(Parser)]
#[command(
    name = "specimen",
    version,
    about = "Inspect and normalize specimen provenance record sets",
    long_about = "Inspect and normalize specimen provenance record sets.\n\n\
                  Reads flat JSON specimen records, rebuilds the provenance graph and\n\
                  reports structural problems such as cycles or dangling references."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format.
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Include specimen identifiers in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Rebuild the graph and report what it contains.
    Validate(InputArgs),

    /// Print every terminal specimen with its ancestry.
    Tree(InputArgs),

    /// Print the preparation history of one specimen.
    History(HistoryArgs),

    /// Rebuild and re-emit the records in identifier order.
    Normalize(NormalizeArgs),
}

#[derive(Args)]
pub struct InputArgs {
    /// JSON file holding one record or an array of records.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Accept chain constraints that point outside the sampling lineage.
    #[arg(long = "lenient-constraints")]
    pub lenient_constraints: bool,
}

impl InputArgs {
    pub fn graph_options(&self) -> GraphOptions {
        let mode = if self.lenient_constraints {
            ConstraintMode::Lenient
        } else {
            ConstraintMode::Strict
        };
        GraphOptions::new().with_constraint_mode(mode)
    }
}

#[derive(Args)]
pub struct HistoryArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Identifier of the specimen to trace.
    #[arg(value_name = "IDENTIFIER")]
    pub identifier: String,

    /// Issuer of the identifier, when several issuers share its value.
    #[arg(long = "issuer", value_name = "ISSUER")]
    pub issuer: Option<String>,
}

#[derive(Args)]
pub struct NormalizeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Write to this file instead of stdout.
    #[arg(short = 'o', long = "output", value_name = "OUT")]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
