//! Quote-history providers.
//!
//! Fetching is an external concern; the ranker only sees this trait.

use quantrank_core::{DailyBar, Error, Result, VolatilitySnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Supplies daily history per ticker.
///
/// Shared across ranking workers, so implementations must be `Sync`.
pub trait HistoryProvider: Sync {
    /// Daily bars for `ticker`, oldest first.
    fn daily_history(&self, ticker: &str) -> Result<Vec<DailyBar>>;
}

/// Everything one ranking run needs, as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Benchmark daily bars.
    #[serde(default)]
    pub benchmark: Vec<DailyBar>,
    /// Volatility-index snapshot; absent means the fallback context is used.
    #[serde(default)]
    pub volatility: Option<VolatilitySnapshot>,
    /// Daily bars keyed by ticker.
    #[serde(default)]
    pub histories: BTreeMap<String, Vec<DailyBar>>,
}

impl MarketSnapshot {
    /// Load a snapshot from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Tickers present in the snapshot, sorted.
    pub fn tickers(&self) -> Vec<String> {
        self.histories.keys().cloned().collect()
    }
}

/// Provider backed by an in-memory snapshot.
#[derive(Debug, Clone, Default)]
pub struct SnapshotProvider {
    histories: BTreeMap<String, Vec<DailyBar>>,
}

impl SnapshotProvider {
    /// Wrap the histories of a snapshot.
    pub fn new(histories: BTreeMap<String, Vec<DailyBar>>) -> Self {
        Self { histories }
    }

    /// Add or replace one ticker's history.
    pub fn insert(&mut self, ticker: impl Into<String>, bars: Vec<DailyBar>) {
        self.histories.insert(ticker.into(), bars);
    }
}

impl From<&MarketSnapshot> for SnapshotProvider {
    fn from(snapshot: &MarketSnapshot) -> Self {
        Self::new(snapshot.histories.clone())
    }
}

impl HistoryProvider for SnapshotProvider {
    fn daily_history(&self, ticker: &str) -> Result<Vec<DailyBar>> {
        self.histories
            .get(ticker)
            .cloned()
            .ok_or_else(|| Error::provider(format!("no history for {}", ticker)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_provider_lookup() {
        let json = r#"{
            "volatility": {"price": 20.0, "previous_close": 19.0, "reference_price": 21.0},
            "histories": {
                "XLE": [{"date": "2024-05-01", "open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5, "volume": 100.0}]
            }
        }"#;
        let snapshot: MarketSnapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.benchmark.is_empty());
        assert_eq!(snapshot.tickers(), vec!["XLE".to_string()]);

        let provider = SnapshotProvider::from(&snapshot);
        assert_eq!(provider.daily_history("XLE").unwrap().len(), 1);
        let err = provider.daily_history("GDX").unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
    }
}
