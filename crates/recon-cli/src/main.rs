//! Catalog reconciliation CLI.

use clap::{ColorChoice, Parser};
use recon_cli::commands::{run_classify, run_reconcile};
use recon_cli::logging::{LogConfig, LogFormat, init_logging};
use recon_cli::types::{ConfigOverrides, InputFiles, ReconcileRequest};
use std::io::{self, IsTerminal};
use tracing::level_filters::LevelFilter;

mod cli;
mod summary;

use crate::cli::{Cli, Command, InputArgs, LogFormatArg, LogLevelArg, ReconcileArgs};
use crate::summary::{print_classify, print_reconcile};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match cli.command {
        Command::Reconcile(args) => match run_reconcile(&reconcile_request(args)) {
            Ok(report) => {
                print_reconcile(&report);
                0
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
        Command::Classify(args) => match run_classify(&input_files(args.input)) {
            Ok(report) => {
                print_classify(&report);
                0
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
    };
    std::process::exit(exit_code);
}

fn input_files(args: InputArgs) -> InputFiles {
    InputFiles {
        file_a: args.file_a,
        file_b: args.file_b,
        max_rows: args.max_rows,
    }
}

fn reconcile_request(args: ReconcileArgs) -> ReconcileRequest {
    ReconcileRequest {
        input: input_files(args.input),
        overrides: ConfigOverrides {
            config_file: args.config,
            strategy: args.strategy.map(Into::into),
            key_field_match_threshold: args.key_field_match_threshold,
            brute_force_row_threshold: args.brute_force_row_threshold,
            field_mapping_min_confidence: args.field_mapping_min_confidence,
            cooccurrence_min_confidence: args.cooccurrence_min_confidence,
            fallback: args.fallback,
        },
        json_out: args.json,
        rules_out: args.rules,
        rule_threshold: args.rule_threshold,
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.log_data = cli.log_data;
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
