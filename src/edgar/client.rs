// src/edgar/client.rs
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{PipelineConfig, YearRange};
use crate::edgar::models::{
    parse_acceptance, primary_doc_url, CompanySubmission, FilingReference, FilingsList, TARGET_FORM,
};
use crate::edgar::rate_gate::RateGate;
use crate::edgar::resolver::ciks_from_company_tickers;
use crate::edgar::transport::Transport;
use crate::utils::error::EdgarError;

/// EDGAR access. Every outbound request passes through the shared rate gate
/// immediately before it is issued and carries its own timeout.
#[derive(Clone)]
pub struct EdgarClient {
    transport: Arc<dyn Transport>,
    gate: Arc<RateGate>,
    config: Arc<PipelineConfig>,
}

impl EdgarClient {
    pub fn new(transport: Arc<dyn Transport>, gate: Arc<RateGate>, config: Arc<PipelineConfig>) -> Self {
        Self { transport, gate, config }
    }

    pub fn gate(&self) -> &Arc<RateGate> {
        &self.gate
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>, EdgarError> {
        self.gate.acquire().await?;
        tracing::debug!("GET {}", url);

        let timeout: Duration = self.config.request_timeout;
        let response = self.transport.get(url, timeout).await?;

        // Check if the request was successful (status code 2xx)
        if !response.status.is_success() {
            tracing::error!("HTTP error status: {} for URL: {}", response.status, url);
            if response.status == reqwest::StatusCode::FORBIDDEN {
                tracing::warn!("Received 403 Forbidden - check User-Agent and rate limits.");
            }
            return Err(EdgarError::from_status(response.status, url));
        }

        tracing::debug!("Received {} bytes from {}", response.body.len(), url);
        Ok(response.body)
    }

    /// Downloads a filing document. Invalid UTF-8 is replaced, not rejected.
    pub async fn download_filing_doc(&self, url: &str) -> Result<String, EdgarError> {
        let body = self.get(url).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Fetches the submission index for a padded CIK.
    pub async fn get_company_submissions(&self, cik: &str) -> Result<CompanySubmission, EdgarError> {
        let body = self.get(&self.config.submissions_url(cik)).await?;
        serde_json::from_slice(&body)
            .map_err(|e| EdgarError::Parse(format!("submission index for CIK {cik}: {e}")))
    }

    async fn get_archive_page(&self, name: &str) -> Result<FilingsList, EdgarError> {
        let body = self.get(&self.config.archive_page_url(name)).await?;
        serde_json::from_slice(&body).map_err(|e| EdgarError::Parse(format!("archive page {name}: {e}")))
    }

    /// Lists the filer's 10-K filings.
    ///
    /// Failures to fetch or decode the index are logged and yield an empty list.
    /// When `archive_window` is set, archive pages whose date window overlaps it
    /// are fetched too; a failing page is skipped.
    pub async fn find_10k_filings(&self, cik: &str, archive_window: Option<YearRange>) -> Vec<FilingReference> {
        let submissions = match self.get_company_submissions(cik).await {
            Ok(submissions) => submissions,
            Err(e) => {
                tracing::error!("Failed to fetch submission index for CIK {}: {}", cik, e);
                return Vec::new();
            }
        };
        tracing::info!("Fetched submission index for {} (CIK {})", submissions.name, cik);

        let mut filings = self.qualifying_references(cik, &submissions.filings.recent);

        if let Some(window) = archive_window {
            for page in &submissions.filings.files {
                if !page.overlaps(window.from, window.to) {
                    tracing::debug!("Skipping archive page {} ({}..{})", page.name, page.filingFrom, page.filingTo);
                    continue;
                }
                tracing::info!("Fetching archive page {} ({} filings)", page.name, page.filingCount);
                match self.get_archive_page(&page.name).await {
                    Ok(list) => filings.extend(self.qualifying_references(cik, &list)),
                    Err(e) => tracing::warn!("Skipping archive page {}: {}", page.name, e),
                }
            }
        }

        tracing::info!("Found {} {} filings for CIK {}", filings.len(), TARGET_FORM, cik);
        filings
    }

    /// Applies the form-type mask and turns retained rows into references.
    fn qualifying_references(&self, cik: &str, list: &FilingsList) -> Vec<FilingReference> {
        let mask = list.form_mask(TARGET_FORM);
        let mut references = Vec::new();

        for (i, _) in mask.iter().enumerate().filter(|(_, keep)| **keep) {
            let (Some(accession), Some(primary_doc)) = (list.accessionNumber.get(i), list.primaryDocument.get(i))
            else {
                tracing::warn!("Dropping {} row {}: missing accession number or primary document", TARGET_FORM, i);
                continue;
            };
            let raw_timestamp = list.acceptanceDateTime.get(i).map(String::as_str).unwrap_or_default();
            let Some(acceptance) = parse_acceptance(raw_timestamp) else {
                let filed = list.filingDate.get(i).map(String::as_str).unwrap_or("unknown date");
                tracing::warn!(
                    "Dropping filing {} (filed {}): unparseable acceptance time {:?}",
                    accession,
                    filed,
                    raw_timestamp
                );
                continue;
            };
            references.push(FilingReference {
                document_url: primary_doc_url(&self.config.archives_base, cik, accession, primary_doc),
                accession_number: accession.clone(),
                acceptance,
            });
        }

        references
    }

    /// Downloads the public ticker list and converts it to a ticker -> CIK map.
    pub async fn fetch_company_tickers(&self) -> Result<BTreeMap<String, String>, EdgarError> {
        let body = self.get(&self.config.company_tickers_url()).await?;
        let raw = String::from_utf8_lossy(&body);
        ciks_from_company_tickers(&raw).map_err(|e| EdgarError::Parse(format!("company tickers: {e}")))
    }
}
