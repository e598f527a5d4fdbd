mod config;
mod error;
mod fetch;
mod parser;
mod store;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Map, Value};
use tracing::{info, warn};

use config::Config;
use error::FundError;
use fetch::Fetcher;
use store::FundStore;

#[derive(Parser)]
#[command(name = "fund_scraper", about = "Fund report scraper: HTML tables to fund documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape all funds listed in the input file and persist them
    Run {
        /// Newline-delimited fund codes, one per line
        #[arg(short, long, default_value = "funds.txt")]
        file: PathBuf,
        /// Max funds to process (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Fetch and extract a single fund, print the document as JSON
    Fetch {
        /// Fund code to resolve
        code: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!("{}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), FundError> {
    match cli.command {
        Commands::Run { file, limit } => {
            let config = Config::from_env()?;
            let fetcher = Fetcher::new(config.fetch_attempts);
            let store = FundStore::new(&config);
            store.ensure_database().await?;

            let mut codes = read_codes(&file)?;
            if let Some(n) = limit {
                codes.truncate(n);
            }
            if codes.is_empty() {
                println!("No fund codes in {}", file.display());
                return Ok(());
            }

            println!("Scraping {} funds...", codes.len());
            let t0 = Instant::now();
            let pb = ProgressBar::new(codes.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
                    .map_err(|e| FundError::Config(e.to_string()))?
                    .progress_chars("=> "),
            );

            let mut ok = 0usize;
            let mut failed = 0usize;
            for code in &codes {
                // Each fund fails on its own; the batch keeps going.
                match process_fund(&fetcher, &store, code).await {
                    Ok(id) => {
                        info!("inserted {} for code {}", id, code);
                        ok += 1;
                    }
                    Err(e) => {
                        warn!("skipping {}: {}", code, e);
                        failed += 1;
                    }
                }
                pb.inc(1);
                // Fixed pacing to stay inside the service's request quota
                tokio::time::sleep(Duration::from_millis(config.pause_ms)).await;
            }
            pb.finish_and_clear();

            println!(
                "Done: {} inserted, {} failed of {} in {:.1}s",
                ok,
                failed,
                codes.len(),
                t0.elapsed().as_secs_f64()
            );
            Ok(())
        }
        Commands::Fetch { code } => {
            let attempts = config::fetch_attempts_from_env()?;
            let fetcher = Fetcher::new(attempts);
            let document = fetch_document(&fetcher, &code).await?;
            let pretty = serde_json::to_string_pretty(&document)
                .map_err(|e| FundError::Parse(e.to_string()))?;
            println!("{}", pretty);
            Ok(())
        }
    }
}

/// Resolve a code to its symbol, fetch the report page, assemble the
/// document.
async fn fetch_document(
    fetcher: &Fetcher,
    code: &str,
) -> Result<Map<String, Value>, FundError> {
    let symbol = fetcher.lookup_symbol(code).await?;
    let url = Fetcher::report_url(&symbol);
    let html = fetcher.fetch_report(&symbol).await?;
    parser::assemble_document(&html, &symbol, &url)
}

async fn process_fund(
    fetcher: &Fetcher,
    store: &FundStore,
    code: &str,
) -> Result<String, FundError> {
    let document = fetch_document(fetcher, code).await?;
    store.insert(&document).await
}

/// Read the whole input file up front; blank lines are dropped.
fn read_codes(path: &Path) -> Result<Vec<String>, FundError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| FundError::Config(format!("cannot read {}: {}", path.display(), e)))?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}
