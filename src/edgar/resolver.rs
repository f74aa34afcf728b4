// src/edgar/resolver.rs
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::edgar::models::CompanyTickerEntry;
use crate::storage::write_atomically;
use crate::utils::error::{ConfigError, StorageError};

/// Width of a zero-padded CIK.
pub const CIK_WIDTH: usize = 10;

/// Uppercases, trims and maps share-class dots to dashes (`brk.b` -> `BRK-B`).
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase().replace('.', "-")
}

fn pad_cik(raw: &str) -> Option<String> {
    let digits = raw.trim();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("{:0>width$}", digits, width = CIK_WIDTH))
}

/// Read-only ticker -> CIK lookup, loaded once per run.
#[derive(Debug, Clone, Default)]
pub struct CikResolver {
    ciks: HashMap<String, String>,
}

impl CikResolver {
    /// Loads a JSON object mapping tickers to CIKs. Values may be strings or numbers.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let resolver = Self::from_json(&raw).map_err(|reason| ConfigError::Malformed {
            path: path.to_path_buf(),
            reason,
        })?;
        tracing::info!("Loaded {} ticker mappings from {}", resolver.len(), path.display());
        Ok(resolver)
    }

    pub fn from_json(raw: &str) -> Result<Self, String> {
        let object: HashMap<String, serde_json::Value> =
            serde_json::from_str(raw).map_err(|e| e.to_string())?;

        let mut ciks = HashMap::with_capacity(object.len());
        for (ticker, value) in object {
            let cik = match &value {
                serde_json::Value::String(s) => pad_cik(s),
                serde_json::Value::Number(n) => n.as_u64().and_then(|n| pad_cik(&n.to_string())),
                _ => None,
            }
            .ok_or_else(|| format!("invalid CIK for {ticker}: {value}"))?;
            ciks.insert(normalize_ticker(&ticker), cik);
        }
        Ok(Self { ciks })
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let ciks = pairs
            .into_iter()
            .filter_map(|(ticker, cik)| pad_cik(cik).map(|cik| (normalize_ticker(ticker), cik)))
            .collect();
        Self { ciks }
    }

    /// Returns the zero-padded CIK for `ticker`, if known.
    pub fn resolve(&self, ticker: &str) -> Option<&str> {
        self.ciks.get(&normalize_ticker(ticker)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ciks.len()
    }
}

/// Converts the regulator's `company_tickers.json` payload
/// (`{"0": {"cik_str": 320193, "ticker": "AAPL", ...}, ...}`) into a sorted
/// ticker -> padded CIK map.
pub fn ciks_from_company_tickers(raw: &str) -> Result<BTreeMap<String, String>, serde_json::Error> {
    let entries: HashMap<String, CompanyTickerEntry> = serde_json::from_str(raw)?;
    Ok(entries
        .into_values()
        .map(|entry| {
            (
                normalize_ticker(&entry.ticker),
                format!("{:0width$}", entry.cik_str, width = CIK_WIDTH),
            )
        })
        .collect())
}

/// Writes a ticker map atomically, so overlapping refreshes leave one
/// complete map behind.
pub fn save_cik_map(path: &Path, ciks: &BTreeMap<String, String>) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(ciks)
        .map_err(|e| StorageError::SerializationError(e.to_string()))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    write_atomically(path, json.as_bytes())?;
    tracing::info!("Saved {} CIK mappings to {}", ciks.len(), path.display());
    Ok(())
}
