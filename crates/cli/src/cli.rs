//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use contracts::TriggerKind;

use crate::error::CliError;

/// Snippet Loader - defers third-party snippets until the first interaction
#[derive(Parser, Debug)]
#[command(
    name = "snippet-loader",
    author,
    version,
    about = "Deferred third-party snippet loader",
    long_about = "Loads analytics, chat and accessibility snippets only after the first \n\
                  user interaction or a fallback timeout.\n\n\
                  Validates loader configuration, shows the vendor roster, and simulates \n\
                  a page on virtual time to show what would be injected and when."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "SNIPPET_LOADER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "SNIPPET_LOADER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration file
    Validate(ValidateArgs),

    /// Display configuration and roster information
    Info(InfoArgs),

    /// Run the loader against a simulated page on virtual time
    Simulate(SimulateArgs),
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "loader.toml", env = "SNIPPET_LOADER_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "loader.toml", env = "SNIPPET_LOADER_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `simulate` command
#[derive(Parser, Debug, Clone)]
pub struct SimulateArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "loader.toml", env = "SNIPPET_LOADER_CONFIG")]
    pub config: PathBuf,

    /// Interaction to deliver, as `event@millis` (repeatable), e.g. `scroll@1200`
    #[arg(long = "interact", value_name = "EVENT@MS")]
    pub interactions: Vec<Interaction>,

    /// Simulate a host without idle-callback support
    #[arg(long)]
    pub no_idle: bool,

    /// Virtual milliseconds before the page reports idle
    #[arg(long, default_value = "0")]
    pub idle_latency_ms: u64,

    /// Script sources containing this substring fail to load (repeatable)
    #[arg(long = "fail-source", value_name = "SUBSTR")]
    pub fail_sources: Vec<String>,

    /// Output the simulation report as JSON
    #[arg(long)]
    pub json: bool,

    /// Print Prometheus metrics recorded during the run
    #[arg(long)]
    pub metrics: bool,
}

/// A user interaction scheduled at a virtual time offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interaction {
    pub kind: TriggerKind,
    pub at: Duration,
}

impl FromStr for Interaction {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (event, at) = match s.split_once('@') {
            Some((event, millis)) => {
                let millis: u64 = millis
                    .trim()
                    .parse()
                    .map_err(|_| CliError::invalid_interaction(s, "offset must be milliseconds"))?;
                (event, Duration::from_millis(millis))
            }
            None => (s, Duration::ZERO),
        };
        let kind = event
            .trim()
            .parse::<TriggerKind>()
            .map_err(|e| CliError::invalid_interaction(s, e.to_string()))?;
        Ok(Self { kind, at })
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
