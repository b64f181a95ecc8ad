//! CLI argument definitions for the randomization tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use rtsm_output::SchemaPreset;

#[derive(Parser)]
#[command(
    name = "rtsm",
    version,
    about = "Stratified block randomization with per-site label pools",
    long_about = "Generate a reproducible randomization list for a two-arm trial.\n\n\
                  Participants are stratified by site and sex, allocated in permuted\n\
                  blocks, and assigned dispensing labels from per-site, per-arm pools."
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

    /// Log output format (pretty for human, json for machine parsing).
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
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate the allocation and dispensing lists for a study.
    Randomize(RandomizeArgs),

    /// Validate a study file and print its label-pool plan.
    Check(CheckArgs),
}

#[derive(Parser)]
pub struct RandomizeArgs {
    /// Path to the study file (TOML).
    #[arg(value_name = "STUDY_FILE")]
    pub study_file: PathBuf,

    /// Output directory for generated files (default: next to the study file, in `output/`).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Randomization seed (overrides the seed in the study file).
    #[arg(long = "seed", value_name = "N")]
    pub seed: Option<u64>,

    /// Export column schema (overrides the `[export]` table).
    #[arg(long = "schema", value_enum)]
    pub schema: Option<SchemaArg>,

    /// Prefix the CSV files with a UTF-8 byte-order mark.
    #[arg(long = "bom")]
    pub bom: bool,

    /// Also write combined.csv, with one column per ampoule label.
    #[arg(long = "combined")]
    pub combined: bool,

    /// Randomize and report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct CheckArgs {
    /// Path to the study file (TOML).
    #[arg(value_name = "STUDY_FILE")]
    pub study_file: PathBuf,

    /// Seed to record in the check (overrides the seed in the study file).
    #[arg(long = "seed", value_name = "N")]
    pub seed: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SchemaArg {
    Default,
    Redcap,
}

impl From<SchemaArg> for SchemaPreset {
    fn from(value: SchemaArg) -> Self {
        match value {
            SchemaArg::Default => SchemaPreset::Default,
            SchemaArg::Redcap => SchemaPreset::Redcap,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
