// src/config.rs
use std::path::PathBuf;
use std::time::Duration;

use crate::edgar::rate_gate::DEFAULT_SPACING;
use crate::extractors::chunker::DEFAULT_TARGET_WORDS;
use crate::utils::error::ConfigError;

// EDGAR rejects anonymous clients; override with --user-agent or SEC_USER_AGENT.
pub const DEFAULT_USER_AGENT: &str = "sec-10k-pipeline admin@example.com";
pub const DEFAULT_INDEX_BASE: &str = "https://data.sec.gov";
pub const DEFAULT_ARCHIVES_BASE: &str = "https://www.sec.gov";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for one pipeline run, built once from the CLI and passed explicitly.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub user_agent: String,
    /// Host serving `submissions/CIK##########.json`.
    pub index_base: String,
    /// Host serving `Archives/edgar/data/...` documents and the ticker list.
    pub archives_base: String,
    pub request_spacing: Duration,
    pub request_timeout: Duration,
    pub chunk_words: usize,
    pub follow_archives: bool,
    pub output_dir: PathBuf,
    pub debug_dir: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("user agent must not be empty".into()));
        }
        if self.chunk_words == 0 {
            return Err(ConfigError::Invalid("chunk word target must be positive".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid("request timeout must be positive".into()));
        }
        Ok(())
    }

    pub fn submissions_url(&self, cik: &str) -> String {
        format!("{}/submissions/CIK{}.json", self.index_base.trim_end_matches('/'), cik)
    }

    pub fn archive_page_url(&self, name: &str) -> String {
        format!("{}/submissions/{}", self.index_base.trim_end_matches('/'), name)
    }

    pub fn company_tickers_url(&self) -> String {
        format!("{}/files/company_tickers.json", self.archives_base.trim_end_matches('/'))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            index_base: DEFAULT_INDEX_BASE.to_string(),
            archives_base: DEFAULT_ARCHIVES_BASE.to_string(),
            request_spacing: DEFAULT_SPACING,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            chunk_words: DEFAULT_TARGET_WORDS,
            follow_archives: true,
            output_dir: PathBuf::from("./output"),
            debug_dir: None,
        }
    }
}

/// Inclusive range of acceptance years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub from: i32,
    pub to: i32,
}

impl YearRange {
    pub fn new(from: i32, to: i32) -> Result<Self, ConfigError> {
        if from > to {
            return Err(ConfigError::YearRange { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.from..=self.to).contains(&year)
    }

    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.from..=self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_follow_edgar_layout() {
        let config = PipelineConfig::default();
        assert_eq!(
            config.submissions_url("0000320193"),
            "https://data.sec.gov/submissions/CIK0000320193.json"
        );
        assert_eq!(
            config.archive_page_url("CIK0000320193-submissions-001.json"),
            "https://data.sec.gov/submissions/CIK0000320193-submissions-001.json"
        );
        assert_eq!(config.company_tickers_url(), "https://www.sec.gov/files/company_tickers.json");
    }

    #[test]
    fn year_range_is_inclusive_and_ordered() {
        let range = YearRange::new(2020, 2022).unwrap();
        assert!(range.contains(2020) && range.contains(2022));
        assert!(!range.contains(2019) && !range.contains(2023));
        assert_eq!(range.years().count(), 3);
        assert!(matches!(YearRange::new(2023, 2022), Err(ConfigError::YearRange { .. })));
    }

    #[test]
    fn validation_rejects_degenerate_settings() {
        assert!(PipelineConfig::default().validate().is_ok());
        let config = PipelineConfig { chunk_words: 0, ..PipelineConfig::default() };
        assert!(config.validate().is_err());
        let config = PipelineConfig { user_agent: " ".into(), ..PipelineConfig::default() };
        assert!(config.validate().is_err());
    }
}
