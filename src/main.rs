//! keyprobe — validate AI provider API keys.
//!
//! Sends a minimal probe per provider for each submitted key and
//! classifies the answers:
//! - 2xx → VALID, 429 → RATE LIMITED (the key is recognised)
//! - 401/403 (or a provider's own rejection code) → try the next provider
//! - anything else → ERROR <status>
//!
//! Keys are tested concurrently; providers for one key are tried in order.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

mod adapters;
mod batch;
mod chat;
mod config;
mod error;
mod logging;
mod probe;
mod report;
mod transport;

use adapters::Catalog;
use config::{ChatArgs, Cli, Command, OutputFormat, ProbeConfig, TestArgs};
use probe::{KeyRecord, ProbeMode, Prober};
use transport::{ReqwestTransport, Transport};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_json);

    match cli.command {
        Command::Test(args) => run_test(args).await,
        Command::Providers => {
            print!("{}", render_catalog(&adapters::catalog()));
            Ok(())
        }
        Command::Chat(args) => run_chat(args).await,
        Command::Show(args) => {
            let rows = report::read_csv(&args.path)
                .with_context(|| format!("Failed to read report {}", args.path.display()))?;
            print!("{}", report::render_table(&rows, args.reveal));
            Ok(())
        }
    }
}

/// Gather keys from `--key`, `--keys-file`, or stdin, in that order.
fn collect_keys(args: &TestArgs) -> Result<Vec<KeyRecord>> {
    let mut text = args.keys.join("\n");

    if let Some(path) = &args.keys_file {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read keys file {}", path.display()))?;
        text.push('\n');
        text.push_str(&contents);
    }

    if args.keys.is_empty() && args.keys_file.is_none() {
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read keys from stdin")?;
    }

    Ok(batch::parse_keys(&text))
}

async fn run_test(args: TestArgs) -> Result<()> {
    let config = ProbeConfig::from_test_args(&args)?;
    let keys = collect_keys(&args)?;
    if keys.is_empty() {
        bail!("No keys to test — pass --key, --keys-file, or pipe keys on stdin");
    }

    let transport: Arc<dyn Transport> =
        Arc::new(ReqwestTransport::new().context("Failed to build HTTP client")?);
    let prober = Prober::new(
        transport,
        Arc::new(adapters::catalog()),
        config.timeout,
        config.mode,
    );

    info!("🔑 Testing {} key(s)", keys.len());
    let results = batch::run_batch(&prober, keys, config.concurrency).await;

    match args.format {
        OutputFormat::Table => {
            let rows: Vec<report::ResultRow> = results.iter().map(report::ResultRow::from).collect();
            print!("{}", report::render_table(&rows, args.reveal));
        }
        OutputFormat::Csv => print!("{}", report::to_csv(&results)),
        OutputFormat::Json => println!("{}", report::to_json(&results)?),
    }

    if let Some(path) = &args.output {
        report::write_csv(path, &results)
            .with_context(|| format!("Failed to write CSV to {}", path.display()))?;
        info!(path = %path.display(), "Results written");
    }

    Ok(())
}

async fn run_chat(args: ChatArgs) -> Result<()> {
    if args.timeout_secs == 0 {
        bail!("timeout must be at least 1 second");
    }
    let catalog = Arc::new(adapters::catalog());
    let transport: Arc<dyn Transport> =
        Arc::new(ReqwestTransport::new().context("Failed to build HTTP client")?);

    let target = match args.provider {
        Some(provider) => chat::ChatTarget::new(args.key.clone(), provider),
        None => {
            let probe_config = ProbeConfig::new(args.probe_timeout_secs, 1, ProbeMode::Exhaustive)?;
            let prober = Prober::new(
                Arc::clone(&transport),
                Arc::clone(&catalog),
                probe_config.timeout,
                probe_config.mode,
            );
            let result = prober.probe_key(&KeyRecord::new(args.key.clone())).await;
            if result.verdict != probe::Verdict::Valid {
                warn!(provider = %result.provider, status = %result.verdict, "Key not usable for chat");
            }
            chat::ChatTarget::from_probe(&result)?
        }
    };

    let reply = chat::send_chat(
        transport.as_ref(),
        &catalog,
        &target,
        &args.message,
        args.model.as_deref(),
        Duration::from_secs(args.timeout_secs),
    )
    .await?;

    println!("[{} · {}] {}", reply.provider, reply.model, reply.text);
    Ok(())
}

fn render_catalog(catalog: &Catalog) -> String {
    let mut out = String::new();
    for (i, p) in catalog.entries().iter().enumerate() {
        out.push_str(&format!(
            "{:>2}. {:<11} {:<14} {:<5} {}\n",
            i + 1,
            p.id,
            p.name,
            p.method.as_str(),
            p.url
        ));
    }
    out
}
