// src/main.rs
mod config;
mod edgar;
mod extractors;
mod pipeline;
mod storage;
mod utils;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Datelike;
use clap::{Args, Parser, Subcommand};

use config::{PipelineConfig, YearRange, DEFAULT_USER_AGENT};
use edgar::transport::ReqwestTransport;
use edgar::{CikResolver, EdgarClient, RateGate};
use extractors::ItemMap;
use pipeline::PipelineContext;
use storage::StorageManager;
use utils::AppError;

/// Command Line Interface for the SEC 10-K ingestion pipeline
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, segment and chunk 10-K filings for one or more tickers
    Fetch(FetchArgs),
    /// Rebuild the local ticker -> CIK map from the SEC ticker list
    RefreshCiks(RefreshArgs),
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Ticker symbol(s) of the companies
    #[arg(short, long, required = true, num_args = 1..)]
    ticker: Vec<String>,

    /// First acceptance year to include
    #[arg(long)]
    from_year: i32,

    /// Last acceptance year to include (defaults to the current year)
    #[arg(long)]
    to_year: Option<i32>,

    /// Output directory for filing records
    #[arg(short, long, default_value = "./output")]
    output_dir: PathBuf,

    /// Ticker -> CIK map (JSON object)
    #[arg(long, default_value = "data/company_tickers.json")]
    cik_map: PathBuf,

    /// Ordered item key -> description map (JSON object)
    #[arg(long, default_value = "data/form-10k-items.json")]
    items: PathBuf,

    /// Target words per chunk
    #[arg(long, default_value_t = extractors::chunker::DEFAULT_TARGET_WORDS)]
    chunk_words: usize,

    /// Skip archived submission pages
    #[arg(long)]
    no_archives: bool,

    /// Debug mode - save normalized text with section markers
    #[arg(short, long)]
    debug: bool,

    #[command(flatten)]
    http: HttpArgs,
}

#[derive(Args, Debug)]
struct RefreshArgs {
    /// Where to write the ticker -> CIK map
    #[arg(long, default_value = "data/company_tickers.json")]
    cik_map: PathBuf,

    #[command(flatten)]
    http: HttpArgs,
}

#[derive(Args, Debug)]
struct HttpArgs {
    /// Identifying User-Agent sent to EDGAR ("Name email@domain")
    #[arg(long, env = "SEC_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Minimum spacing between requests, in milliseconds
    #[arg(long, default_value_t = 111)]
    spacing_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

impl HttpArgs {
    fn apply(&self, config: &mut PipelineConfig) {
        config.user_agent = self.user_agent.clone();
        config.request_spacing = Duration::from_millis(self.spacing_ms);
        config.request_timeout = Duration::from_secs(self.timeout_secs);
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging(cli.verbose);
    tracing::info!("Starting with args: {:?}", cli.command);

    match cli.command {
        Command::Fetch(args) => fetch(args).await,
        Command::RefreshCiks(args) => refresh_ciks(args).await,
    }
}

async fn fetch(args: FetchArgs) -> Result<(), AppError> {
    let to_year = args.to_year.unwrap_or_else(|| chrono::Utc::now().year());
    let range = YearRange::new(args.from_year, to_year)?;

    let mut config = PipelineConfig {
        chunk_words: args.chunk_words,
        follow_archives: !args.no_archives,
        output_dir: args.output_dir.clone(),
        debug_dir: args.debug.then(|| args.output_dir.join("debug")),
        ..PipelineConfig::default()
    };
    args.http.apply(&mut config);
    config.validate()?;

    // Shared read-only state; failing to load either aborts the run.
    let resolver = CikResolver::load(&args.cik_map)?;
    let items = ItemMap::load(&args.items)?;
    let store = Arc::new(StorageManager::new(&config.output_dir)?);
    let transport = Arc::new(ReqwestTransport::new(&config.user_agent)?);

    let context = Arc::new(PipelineContext::new(config, resolver, items, transport, store));

    {
        let context = context.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted; letting in-flight requests finish");
                context.cancel();
            }
        });
    }

    let mut reports = Vec::with_capacity(args.ticker.len());
    for ticker in &args.ticker {
        reports.push(context.run(ticker, range).await);
    }

    tracing::info!("Processing finished for {} tickers", reports.len());
    for report in &reports {
        report.log_summary();
    }

    let written: usize = reports.iter().map(|r| r.records_written()).sum();
    if written == 0 {
        return Err(AppError::Processing(format!(
            "No 10-K records written for {} between {} and {}",
            args.ticker.join(", "),
            range.from,
            range.to
        )));
    }
    tracing::info!("Wrote {} filing records to {}", written, args.output_dir.display());
    Ok(())
}

async fn refresh_ciks(args: RefreshArgs) -> Result<(), AppError> {
    let mut config = PipelineConfig::default();
    args.http.apply(&mut config);
    config.validate()?;

    let transport = Arc::new(ReqwestTransport::new(&config.user_agent)?);
    let gate = Arc::new(RateGate::new(config.request_spacing));
    let client = EdgarClient::new(transport, gate, Arc::new(config));

    let ciks = client.fetch_company_tickers().await?;
    edgar::resolver::save_cik_map(&args.cik_map, &ciks)?;
    Ok(())
}
