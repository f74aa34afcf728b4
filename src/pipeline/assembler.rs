// src/pipeline/assembler.rs
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::YearRange;
use crate::pipeline::scheduler::{FetchOutcome, FilingContribution};
use crate::storage::{FilingRecord, RecordStore};

/// How one requested year ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearStatus {
    /// Every item key produced a section.
    Complete { path: PathBuf, sections: usize },
    /// A record was written but some item keys were not found.
    Partial {
        path: PathBuf,
        sections: usize,
        missing: Vec<String>,
    },
    /// The filing could not be fetched, processed or persisted.
    Failed { reason: String },
    /// No 10-K was accepted in this year.
    NoFiling,
}

impl YearStatus {
    pub fn is_written(&self) -> bool {
        matches!(self, YearStatus::Complete { .. } | YearStatus::Partial { .. })
    }
}

/// Groups outcomes by acceptance year, persists one record per year and
/// classifies every year of `range`.
///
/// When several filings share a year, the latest acceptance wins; on equal
/// timestamps the one processed last wins. A failed sibling does not shadow
/// a successful one.
pub fn assemble(
    ticker: &str,
    range: YearRange,
    outcomes: Vec<FetchOutcome>,
    store: &dyn RecordStore,
) -> BTreeMap<i32, YearStatus> {
    let mut winners: BTreeMap<i32, FilingContribution> = BTreeMap::new();
    let mut failures: BTreeMap<i32, Vec<String>> = BTreeMap::new();

    for outcome in outcomes {
        match outcome {
            Ok(contribution) => {
                let year = contribution.year();
                let later = winners
                    .get(&year)
                    .filter(|current| current.reference.acceptance > contribution.reference.acceptance);
                if let Some(current) = later {
                    tracing::info!(
                        "Keeping later filing {} for {} {}; ignoring {}",
                        current.reference.accession_number,
                        ticker,
                        year,
                        contribution.reference.accession_number
                    );
                    continue;
                }
                winners.insert(year, contribution);
            }
            Err(failure) => {
                failures
                    .entry(failure.reference.year())
                    .or_default()
                    .push(format!("{}: {}", failure.reference.accession_number, failure.error));
            }
        }
    }

    let mut report: BTreeMap<i32, YearStatus> = range.years().map(|year| (year, YearStatus::NoFiling)).collect();

    for (year, reasons) in failures {
        if !winners.contains_key(&year) {
            report.insert(year, YearStatus::Failed { reason: reasons.join("; ") });
        }
    }

    for (year, contribution) in winners {
        let missing = contribution.document.missing_keys;
        let record = FilingRecord {
            ticker: ticker.to_uppercase(),
            year,
            sections: contribution.document.sections,
        };
        let sections = record.sections.len();

        let status = match store.save(&record) {
            Ok(path) if missing.is_empty() => YearStatus::Complete { path, sections },
            Ok(path) => YearStatus::Partial { path, sections, missing },
            Err(e) => {
                tracing::error!("Failed to save record for {} {}: {}", ticker, year, e);
                YearStatus::Failed {
                    reason: format!("persisting record: {e}"),
                }
            }
        };
        report.insert(year, status);
    }

    report
}
