//! CLI argument definitions for catalog reconciliation.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use recon_map::DEFAULT_RULE_THRESHOLD;
use recon_model::MatchStrategyKind;

#[derive(Parser)]
#[command(
    name = "catalog-recon",
    version,
    about = "Match records across two catalogs and infer which columns correspond",
    long_about = "Match records across two independently maintained catalogs.\n\n\
                  Records are paired by name (key-field strategy) or by comparing\n\
                  every column (brute-force strategy); column mappings are then\n\
                  learned from the confirmed pairs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
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

    /// Allow record values in log output (redacted by default).
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Match two catalog files and learn their column mappings.
    Reconcile(ReconcileArgs),

    /// Show how the columns of two catalog files are classified.
    Classify(ClassifyArgs),
}

#[derive(Args)]
pub struct InputArgs {
    /// Catalog A (CSV).
    #[arg(value_name = "FILE_A")]
    pub file_a: PathBuf,

    /// Catalog B (CSV).
    #[arg(value_name = "FILE_B")]
    pub file_b: PathBuf,

    /// Read at most this many data rows from each file.
    #[arg(long = "max-rows", value_name = "N")]
    pub max_rows: Option<usize>,
}

#[derive(Args)]
pub struct ReconcileArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// TOML configuration file; flags below override its values.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Candidate generation strategy.
    #[arg(long = "strategy", value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Minimum key-field score (name match 1.0, date bonus 0.1).
    #[arg(long = "key-threshold", value_name = "SCORE")]
    pub key_field_match_threshold: Option<f64>,

    /// Brute-force row scores must exceed this value.
    #[arg(long = "row-threshold", value_name = "SCORE")]
    pub brute_force_row_threshold: Option<f64>,

    /// Minimum exact-agreement confidence for a field mapping.
    #[arg(long = "min-confidence", value_name = "CONFIDENCE")]
    pub field_mapping_min_confidence: Option<f64>,

    /// Co-occurrence mappings must exceed this confidence.
    #[arg(long = "cooccurrence-min", value_name = "CONFIDENCE")]
    pub cooccurrence_min_confidence: Option<f64>,

    /// Retry with brute force when key-field matching finds nothing.
    #[arg(long = "fallback")]
    pub fallback: bool,

    /// Write the full result as JSON.
    #[arg(long = "json", value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Export mappings as a JSON rule set.
    #[arg(long = "rules", value_name = "PATH")]
    pub rules: Option<PathBuf>,

    /// Minimum confidence for exported rules.
    #[arg(long = "rule-threshold", value_name = "CONFIDENCE", default_value_t = DEFAULT_RULE_THRESHOLD)]
    pub rule_threshold: f64,
}

#[derive(Args)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    KeyField,
    BruteForce,
}

impl From<StrategyArg> for MatchStrategyKind {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::KeyField => Self::KeyField,
            StrategyArg::BruteForce => Self::BruteForce,
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
