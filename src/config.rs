//! Command-line arguments and the run configuration derived from them.
//!
//! Every knob can also come from a `KEYPROBE_*` environment variable.

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::probe::ProbeMode;

#[derive(Parser, Debug)]
#[command(author, version, about = "Validate AI provider API keys", long_about = None)]
pub struct Cli {
    /// Emit logs as JSON lines (stderr).
    #[arg(long, global = true, env = "KEYPROBE_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify a batch of keys. Reads stdin when no key source is given.
    Test(TestArgs),
    /// List the built-in provider catalog.
    Providers,
    /// Send one chat message using a key.
    Chat(ChatArgs),
    /// Re-display a CSV report written by `test --output`.
    Show(ShowArgs),
}

#[derive(Args, Debug)]
pub struct TestArgs {
    /// A key to test (repeatable).
    #[arg(long = "key", short = 'k')]
    pub keys: Vec<String>,

    /// File with one key per line.
    #[arg(long, short = 'f')]
    pub keys_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ProbeMode::Exhaustive, env = "KEYPROBE_MODE")]
    pub mode: ProbeMode,

    /// Per-probe timeout in seconds.
    #[arg(long, default_value_t = 10, env = "KEYPROBE_TIMEOUT_SECS")]
    pub timeout_secs: u64,

    /// Keys probed at once; 0 = no bound.
    #[arg(long, default_value_t = 32, env = "KEYPROBE_CONCURRENCY")]
    pub concurrency: usize,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Also write the results as CSV to this path.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Show full keys in the table instead of masking them.
    #[arg(long)]
    pub reveal: bool,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    #[arg(long, short = 'k')]
    pub key: String,

    /// Provider id or name; probed from the key when omitted.
    #[arg(long, short = 'p')]
    pub provider: Option<String>,

    #[arg(long, short = 'm')]
    pub message: String,

    /// Model override; each provider has a default.
    #[arg(long)]
    pub model: Option<String>,

    #[arg(long, default_value_t = 60, env = "KEYPROBE_CHAT_TIMEOUT_SECS")]
    pub timeout_secs: u64,

    /// Per-probe timeout used when the provider has to be detected first.
    #[arg(long, default_value_t = 10, env = "KEYPROBE_TIMEOUT_SECS")]
    pub probe_timeout_secs: u64,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    pub path: PathBuf,

    #[arg(long)]
    pub reveal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

/// Validated settings for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub timeout: Duration,
    pub concurrency: usize,
    pub mode: ProbeMode,
}

impl ProbeConfig {
    pub fn new(timeout_secs: u64, concurrency: usize, mode: ProbeMode) -> Result<Self> {
        if timeout_secs == 0 {
            bail!("timeout must be at least 1 second");
        }
        Ok(Self {
            timeout: Duration::from_secs(timeout_secs),
            concurrency,
            mode,
        })
    }

    pub fn from_test_args(args: &TestArgs) -> Result<Self> {
        Self::new(args.timeout_secs, args.concurrency, args.mode)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            concurrency: 32,
            mode: ProbeMode::Exhaustive,
        }
    }
}
