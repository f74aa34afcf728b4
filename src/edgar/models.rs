// src/edgar/models.rs
#![allow(non_snake_case)]
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use serde::Deserialize;

/// The only form type this pipeline processes.
pub const TARGET_FORM: &str = "10-K";

/// Structure representing the EDGAR company submission index.
/// Example: https://data.sec.gov/submissions/CIK0000320193.json
///
/// Only the fields the pipeline reads are modelled; everything else is ignored.
#[derive(Debug, Deserialize)]
pub struct CompanySubmission {
    #[serde(default)]
    pub name: String,
    pub filings: Filings,
}

#[derive(Debug, Deserialize)]
pub struct Filings {
    pub recent: FilingsList,
    #[serde(default)]
    pub files: Vec<FilingFile>,
}

/// Pointer to an older archive page, e.g. `CIK0000320193-submissions-001.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct FilingFile {
    pub name: String,
    #[serde(default)]
    pub filingCount: u32,
    #[serde(default)]
    pub filingFrom: String,
    #[serde(default)]
    pub filingTo: String,
}

impl FilingFile {
    /// Whether the page's filing-date window can hold filings accepted within
    /// `[from_year, to_year]`. Pages with unreadable bounds are kept.
    pub fn overlaps(&self, from_year: i32, to_year: i32) -> bool {
        let year_of = |date: &str| date.get(0..4).and_then(|y| y.parse::<i32>().ok());
        match (year_of(&self.filingFrom), year_of(&self.filingTo)) {
            // Filings accepted late in December can carry a January filing date.
            (Some(first), Some(last)) => first <= to_year + 1 && last >= from_year,
            _ => true,
        }
    }
}

/// Parallel arrays describing filings. Used both by the `recent` block and by
/// archive pages.
#[derive(Debug, Default, Deserialize)]
pub struct FilingsList {
    #[serde(default)]
    pub accessionNumber: Vec<String>,
    #[serde(default)]
    pub filingDate: Vec<String>,
    #[serde(default)]
    pub acceptanceDateTime: Vec<String>,
    #[serde(default)]
    pub form: Vec<String>,
    #[serde(default)]
    pub primaryDocument: Vec<String>,
}

impl FilingsList {
    /// Boolean mask over the entries, true where the form column equals `form`.
    pub fn form_mask(&self, form: &str) -> Vec<bool> {
        self.form.iter().map(|f| f == form).collect()
    }
}

/// A qualifying filing: where its primary document lives and when it was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingReference {
    pub document_url: String,
    pub accession_number: String,
    pub acceptance: DateTime<Utc>,
}

impl FilingReference {
    pub fn year(&self) -> i32 {
        self.acceptance.year()
    }
}

/// Builds the canonical primary document URL for a filing.
pub fn primary_doc_url(archives_base: &str, cik: &str, accession_number: &str, primary_doc: &str) -> String {
    let acc_no_dashes = accession_number.replace('-', "");
    format!(
        "{}/Archives/edgar/data/{}/{}/{}",
        archives_base.trim_end_matches('/'),
        cik,
        acc_no_dashes,
        primary_doc
    )
}

/// Parses EDGAR acceptance timestamps such as `2022-10-27T18:01:14.000Z`.
pub fn parse_acceptance(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Entry of the regulator's public ticker list (`company_tickers.json`).
#[derive(Debug, Deserialize)]
pub struct CompanyTickerEntry {
    pub cik_str: u64,
    pub ticker: String,
}
