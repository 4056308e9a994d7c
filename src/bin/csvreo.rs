//! CLI tool to reorder the columns of a delimited file.
//!
//! Usage:
//!   csvreo -k 3 -k 1 < input.txt
//!   csvreo -d , -f first.csv -k 2 -f reversed.csv -r < input.csv
//!
//! Data goes to the configured outputs; progress, the final summary and
//! errors go to stderr.

use std::io::{self, IsTerminal};
use std::process;

use csvreo::cli::{Cli, Invocation};
use csvreo::{ConfigError, ErrorCategory, ReoError, execute};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    let invocation = Invocation::parse();
    init_logging(&invocation.cli);

    let config = match invocation.config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {e}");
            process::exit(config_exit_code(&e));
        }
    };

    match execute(&config, io::stdin().lock()) {
        Ok(summary) => {
            info!("Job complete, {} total records processed.", summary.records);
            info!("Time taken: {:.3} s", summary.elapsed.as_secs_f64());
        }
        Err(e) => {
            eprintln!("ERROR: {e}");
            process::exit(exit_code(&e));
        }
    }
}

fn init_logging(cli: &Cli) {
    let default = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
}

fn config_exit_code(err: &ConfigError) -> i32 {
    match err {
        ConfigError::NoKeys { .. } | ConfigError::NoOutputs => 3,
        ConfigError::KeyOutOfRange(_) => 4,
        ConfigError::InvalidQuote(_) => 5,
        ConfigError::InvalidDelimiter(_) => 6,
        ConfigError::ZeroBufferSize => 2,
        ConfigError::DelimiterEqualsQuote(_) => 7,
    }
}

fn exit_code(err: &ReoError) -> i32 {
    match (err.category(), err) {
        (ErrorCategory::Config, ReoError::Config(config)) => config_exit_code(config),
        (ErrorCategory::Parse, _) => 1,
        (ErrorCategory::Resource, ReoError::Thread(_)) => 10,
        (ErrorCategory::Resource, _) => 8,
        (ErrorCategory::Sink, _) => 9,
        _ => 2,
    }
}
