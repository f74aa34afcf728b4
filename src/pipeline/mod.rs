// src/pipeline/mod.rs
pub mod assembler;
pub mod scheduler;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{PipelineConfig, YearRange};
use crate::edgar::transport::Transport;
use crate::edgar::{CikResolver, EdgarClient, RateGate};
use crate::extractors::ItemMap;
use crate::storage::RecordStore;

pub use assembler::YearStatus;
pub use scheduler::FetchScheduler;

/// Result of running the pipeline for one ticker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickerOutcome {
    /// The ticker is not in the identifier map; no request was made.
    Unresolved,
    /// The index was unreachable or listed no 10-K filings.
    NoFilings { cik: String },
    Processed {
        cik: String,
        years: BTreeMap<i32, YearStatus>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerReport {
    pub ticker: String,
    pub outcome: TickerOutcome,
}

impl TickerReport {
    pub fn records_written(&self) -> usize {
        match &self.outcome {
            TickerOutcome::Processed { years, .. } => years.values().filter(|s| s.is_written()).count(),
            _ => 0,
        }
    }

    pub fn log_summary(&self) {
        match &self.outcome {
            TickerOutcome::Unresolved => tracing::error!("{}: ticker not found in CIK map", self.ticker),
            TickerOutcome::NoFilings { cik } => {
                tracing::warn!("{} (CIK {}): no 10-K filings found or index unreachable", self.ticker, cik)
            }
            TickerOutcome::Processed { cik, years } => {
                for (year, status) in years {
                    match status {
                        YearStatus::Complete { path, sections } => {
                            tracing::info!("{} {} (CIK {}): complete, {} sections -> {}", self.ticker, year, cik, sections, path.display())
                        }
                        YearStatus::Partial { path, sections, missing } => tracing::warn!(
                            "{} {}: partial, {} sections, missing [{}] -> {}",
                            self.ticker,
                            year,
                            sections,
                            missing.join(", "),
                            path.display()
                        ),
                        YearStatus::Failed { reason } => tracing::error!("{} {}: failed: {}", self.ticker, year, reason),
                        YearStatus::NoFiling => tracing::info!("{} {}: no filing", self.ticker, year),
                    }
                }
            }
        }
    }
}

/// Everything one run shares: read-only maps, the rate-gated client and the
/// record store. Built once and passed explicitly.
pub struct PipelineContext {
    config: Arc<PipelineConfig>,
    resolver: CikResolver,
    client: EdgarClient,
    scheduler: FetchScheduler,
    store: Arc<dyn RecordStore>,
}

impl PipelineContext {
    pub fn new(
        config: PipelineConfig,
        resolver: CikResolver,
        items: ItemMap,
        transport: Arc<dyn Transport>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        let config = Arc::new(config);
        let gate = Arc::new(RateGate::new(config.request_spacing));
        let client = EdgarClient::new(transport, gate, config.clone());
        let scheduler = FetchScheduler::new(
            client.clone(),
            Arc::new(items),
            config.chunk_words,
            config.debug_dir.clone(),
        );
        Self {
            config,
            resolver,
            client,
            scheduler,
            store,
        }
    }

    /// Stops new requests; fetches already on the wire finish.
    pub fn cancel(&self) {
        self.client.gate().close();
    }

    /// Resolve -> list filings -> fetch and segment in parallel -> persist per year.
    pub async fn run(&self, ticker: &str, range: YearRange) -> TickerReport {
        let ticker = crate::edgar::resolver::normalize_ticker(ticker);

        let Some(cik) = self.resolver.resolve(&ticker).map(str::to_string) else {
            tracing::error!("Could not find CIK for ticker {}", ticker);
            return TickerReport {
                ticker,
                outcome: TickerOutcome::Unresolved,
            };
        };
        tracing::info!("Processing {} (CIK {}) for {}..={}", ticker, cik, range.from, range.to);

        let archive_window = self.config.follow_archives.then_some(range);
        let references = self.client.find_10k_filings(&cik, archive_window).await;
        if references.is_empty() {
            return TickerReport {
                ticker,
                outcome: TickerOutcome::NoFilings { cik },
            };
        }

        let outcomes = self.scheduler.fetch_all(&ticker, &references, range).await;
        let years = assembler::assemble(&ticker, range, outcomes, self.store.as_ref());

        TickerReport {
            ticker,
            outcome: TickerOutcome::Processed { cik, years },
        }
    }
}
