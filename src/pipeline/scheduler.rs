// src/pipeline/scheduler.rs
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::YearRange;
use crate::edgar::models::FilingReference;
use crate::edgar::EdgarClient;
use crate::extractors::normalize::normalize_markup;
use crate::extractors::{ItemMap, ItemSegmenter, SegmentedDocument};
use crate::utils::debug_dump;
use crate::utils::error::FilingError;

/// A successfully fetched and segmented filing.
#[derive(Debug, Clone)]
pub struct FilingContribution {
    pub reference: FilingReference,
    pub document: SegmentedDocument,
}

impl FilingContribution {
    pub fn year(&self) -> i32 {
        self.reference.year()
    }
}

/// A filing whose fetch or processing failed.
#[derive(Debug)]
pub struct FetchFailure {
    pub reference: FilingReference,
    pub error: FilingError,
}

pub type FetchOutcome = Result<FilingContribution, FetchFailure>;

/// Fetches and processes filings concurrently, one task per filing.
///
/// Only the network call is rate limited (by the client's gate); normalizing,
/// segmenting and chunking run in parallel on the blocking pool.
#[derive(Clone)]
pub struct FetchScheduler {
    client: EdgarClient,
    items: Arc<ItemMap>,
    chunk_words: usize,
    debug_dir: Option<PathBuf>,
}

impl FetchScheduler {
    pub fn new(client: EdgarClient, items: Arc<ItemMap>, chunk_words: usize, debug_dir: Option<PathBuf>) -> Self {
        Self {
            client,
            items,
            chunk_words,
            debug_dir,
        }
    }

    /// Processes every reference accepted within `range` and waits for all of
    /// them to settle. Outcomes come back in acceptance order; one failure
    /// never cancels its siblings.
    pub async fn fetch_all(&self, ticker: &str, references: &[FilingReference], range: YearRange) -> Vec<FetchOutcome> {
        let mut selected: Vec<FilingReference> = references
            .iter()
            .filter(|r| range.contains(r.year()))
            .cloned()
            .collect();
        selected.sort_by_key(|r| r.acceptance);

        if selected.is_empty() {
            tracing::info!("No filings for {} between {} and {}", ticker, range.from, range.to);
            return Vec::new();
        }
        tracing::info!("Fetching {} filings for {} between {} and {}", selected.len(), ticker, range.from, range.to);

        let total = selected.len();
        let handles: Vec<_> = selected
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, reference)| {
                let scheduler = self.clone();
                let ticker = ticker.to_string();
                tokio::spawn(async move { scheduler.process_filing(&ticker, reference, i, total).await })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(total);
        for (handle, reference) in handles.into_iter().zip(selected) {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(join_err) => Err(FetchFailure {
                    reference,
                    error: FilingError::Processing(join_err.to_string()),
                }),
            };
            outcomes.push(outcome);
        }

        let failures = outcomes.iter().filter(|o| o.is_err()).count();
        if failures > 0 {
            tracing::warn!("{} of {} filings failed for {}", failures, total, ticker);
        } else {
            tracing::info!("Processed all {} filings for {}", total, ticker);
        }
        outcomes
    }

    async fn process_filing(&self, ticker: &str, reference: FilingReference, i: usize, total: usize) -> FetchOutcome {
        let year = reference.year();
        tracing::info!("Downloading filing {}/{} for {} ({}): {}", i + 1, total, ticker, year, reference.document_url);

        let content = match self.client.download_filing_doc(&reference.document_url).await {
            Ok(content) => content,
            Err(e) => {
                tracing::error!("Failed to fetch filing {}/{} for {}: {}", i + 1, total, ticker, e);
                return Err(FetchFailure {
                    reference,
                    error: e.into(),
                });
            }
        };
        tracing::debug!("Downloaded {} bytes for {} ({})", content.len(), ticker, year);

        let items = self.items.clone();
        let chunk_words = self.chunk_words;
        let debug_path = self
            .debug_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}-{}-{}.txt", ticker.to_uppercase(), year, reference.accession_number)));

        let processed = tokio::task::spawn_blocking(move || {
            let text = normalize_markup(&content);
            let document = ItemSegmenter::new(&items, chunk_words).segment(&text);
            if let Some(path) = debug_path {
                let annotated = debug_dump::annotate_boundaries(&text, &document.boundaries);
                if let Err(e) = debug_dump::save_debug_text(&path, &annotated) {
                    tracing::warn!("Failed to write debug dump {}: {}", path.display(), e);
                }
            }
            document
        })
        .await;

        match processed {
            Ok(document) => {
                tracing::info!(
                    "Parsed {} sections for {} {} ({} keys missing)",
                    document.sections.len(),
                    ticker,
                    year,
                    document.missing_keys.len()
                );
                Ok(FilingContribution { reference, document })
            }
            Err(join_err) => {
                tracing::error!("Processing filing for {} {} failed: {}", ticker, year, join_err);
                Err(FetchFailure {
                    reference,
                    error: FilingError::Processing(join_err.to_string()),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use tokio::time::Instant;

    use super::*;
    use crate::config::PipelineConfig;
    use crate::edgar::transport::mock::MockTransport;
    use crate::edgar::RateGate;

    const SPACING: Duration = Duration::from_millis(111);

    fn items() -> Arc<ItemMap> {
        Arc::new(ItemMap::from_pairs(&[("Item 1.", "Business"), ("Item 2.", "Properties")]).unwrap())
    }

    fn reference(n: usize, year: i32) -> FilingReference {
        FilingReference {
            document_url: format!("https://www.sec.gov/doc-{n}.htm"),
            accession_number: format!("0000000000-{:02}-{:06}", year % 100, n),
            acceptance: Utc.with_ymd_and_hms(year, 1 + (n % 12) as u32, 1, 12, 0, 0).unwrap(),
        }
    }

    fn scheduler(transport: Arc<MockTransport>) -> FetchScheduler {
        let config = Arc::new(PipelineConfig::default());
        let client = EdgarClient::new(transport, Arc::new(RateGate::new(SPACING)), config);
        FetchScheduler::new(client, items(), 32, None)
    }

    const DOC: &str = "<html><body><p>Item 1. Item 2.</p><p>Item 1. We make things.</p><p>Item 2. We own a campus.</p></body></html>";

    #[tokio::test(start_paused = true)]
    async fn twenty_fetches_are_spaced_at_the_network_boundary() {
        let references: Vec<_> = (0..20).map(|n| reference(n, 2015 + (n % 5) as i32)).collect();
        let mut transport = MockTransport::new();
        for r in &references {
            transport = transport.with_response(&r.document_url, 200, DOC);
        }
        let transport = Arc::new(transport);

        let outcomes = scheduler(transport.clone())
            .fetch_all("TEST", &references, YearRange::new(2000, 2030).unwrap())
            .await;

        assert_eq!(outcomes.len(), 20);
        assert!(outcomes.iter().all(|o| o.is_ok()));
        let mut times: Vec<Instant> = transport.calls().into_iter().map(|(t, _)| t).collect();
        assert_eq!(times.len(), 20);
        times.sort();
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= SPACING, "requests only {:?} apart", pair[1] - pair[0]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failures_do_not_cancel_siblings() {
        let references = vec![reference(1, 2021), reference(2, 2022), reference(3, 2023)];
        let transport = Arc::new(
            MockTransport::new()
                .with_response(&references[0].document_url, 200, DOC)
                .with_response(&references[1].document_url, 500, "")
                .with_timeout(&references[2].document_url),
        );

        let outcomes = scheduler(transport.clone())
            .fetch_all("TEST", &references, YearRange::new(2021, 2023).unwrap())
            .await;

        assert_eq!(outcomes.len(), 3);
        let ok = outcomes[0].as_ref().unwrap();
        assert_eq!(ok.year(), 2021);
        assert_eq!(ok.document.sections.len(), 2);
        assert!(matches!(outcomes[1], Err(FetchFailure { error: FilingError::Edgar(_), .. })));
        assert!(matches!(outcomes[2], Err(FetchFailure { error: FilingError::Edgar(_), .. })));
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn only_references_in_range_are_fetched() {
        let references = vec![reference(1, 2019), reference(2, 2021), reference(3, 2024)];
        let transport = Arc::new(MockTransport::new().with_response(&references[1].document_url, 200, DOC));

        let outcomes = scheduler(transport.clone())
            .fetch_all("TEST", &references, YearRange::new(2020, 2022).unwrap())
            .await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(transport.calls()[0].1, references[1].document_url);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_selection_is_a_no_op() {
        let transport = Arc::new(MockTransport::new());
        let outcomes = scheduler(transport.clone())
            .fetch_all("TEST", &[reference(1, 2010)], YearRange::new(2020, 2022).unwrap())
            .await;
        assert!(outcomes.is_empty());
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_gate_stops_new_requests() {
        let references = vec![reference(1, 2021), reference(2, 2022)];
        let transport = Arc::new(MockTransport::new());
        let scheduler = scheduler(transport.clone());
        scheduler.client.gate().close();

        let outcomes = scheduler.fetch_all("TEST", &references, YearRange::new(2021, 2022).unwrap()).await;

        assert!(outcomes.iter().all(|o| o.is_err()));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn debug_dump_is_written_per_filing() {
        let dir = tempfile::tempdir().unwrap();
        let r = reference(1, 2022);
        let transport = Arc::new(MockTransport::new().with_response(&r.document_url, 200, DOC));
        let config = Arc::new(PipelineConfig::default());
        let client = EdgarClient::new(transport, Arc::new(RateGate::new(SPACING)), config);
        let scheduler = FetchScheduler::new(client, items(), 32, Some(dir.path().to_path_buf()));

        let outcomes = scheduler
            .fetch_all("aapl", std::slice::from_ref(&r), YearRange::new(2022, 2022).unwrap())
            .await;

        assert!(outcomes[0].is_ok());
        let dump = std::fs::read_to_string(dir.path().join(format!("AAPL-2022-{}.txt", r.accession_number))).unwrap();
        assert!(dump.contains("<<<Item 1. @"));
        assert!(dump.contains("<<<Item 2. @"));
    }
}
