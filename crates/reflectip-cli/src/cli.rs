//! CLI argument definitions for reflectip.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `resolve` | Determine the public IP address |
//! | `providers` | List registered reflection services |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `text` | Output format (text, json) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--source` | `auto` | `auto`, `race` or a provider name |
//! | `--prefer` | | Comma-separated provider priority order |
//! | `--timeout-ms` | `3000` | Per-attempt timeout in ms |
//! | `--retries` | `0` | Retries per provider on transport faults |
//! | `--mock` | `false` | Answer from built-in sample bodies, offline |
//! | `-v` | | Log verbosity on stderr (repeatable) |
//!
//! # Examples
//!
//! ```bash
//! reflectip resolve
//! reflectip resolve --source race --format json --pretty
//! reflectip resolve --prefer cloudflare,ipify --retries 2
//! reflectip providers
//! ```

use std::str::FromStr;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use reflectip_core::{ProviderId, ValidationError};

/// Public IP address discovery through HTTPS reflection services.
#[derive(Debug, Parser)]
#[command(
    name = "reflectip",
    author,
    version,
    about = "Discover your public IP address",
    long_about = "reflectip asks third-party reflection services which address your \
requests come from. Services are tried in order until one answers with a valid \
IPv4 or IPv6 address, or raced concurrently with --source race.\n\
\n\
Environment: REFLECTIP_PROVIDERS, REFLECTIP_TIMEOUT_MS, REFLECTIP_RETRIES, \
REFLECTIP_USER_AGENT. Command-line options take precedence."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Provider selection: `auto`, `race`, or a single provider name.
    #[arg(long, global = true, default_value = "auto")]
    pub source: SourceSelector,

    /// Try these providers in this order instead of the registration order.
    #[arg(long, global = true, value_delimiter = ',', conflicts_with = "source")]
    pub prefer: Vec<ProviderId>,

    /// Per-attempt timeout in milliseconds [default: 3000].
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: Option<u64>,

    /// Retries per provider on transport faults [default: 0].
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Answer every provider from a built-in sample body without network access.
    #[arg(long, global = true, default_value_t = false)]
    pub mock: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The bare address on stdout.
    Text,
    /// A JSON report with provenance and attempt details.
    Json,
}

/// Value of `--source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelector {
    Auto,
    Race,
    Provider(ProviderId),
}

impl FromStr for SourceSelector {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "race" => Ok(Self::Race),
            _ => value.parse().map(Self::Provider),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Resolve the public IP address.
    ///
    /// Examples:
    ///
    ///   reflectip resolve
    ///   reflectip resolve --source ip6me
    ///   reflectip resolve --format json --pretty
    Resolve,

    /// List registered reflection services and their endpoints.
    Providers,
}
