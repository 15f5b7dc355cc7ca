//! Ranking pipeline for the quantrank system.
//!
//! This crate handles:
//! - The quote-history provider seam and a JSON snapshot provider
//! - Per-ticker scoring into ranked results
//! - Parallel ranking of a ticker universe

pub mod provider;
pub mod orchestrator;

pub use provider::{HistoryProvider, MarketSnapshot, SnapshotProvider};
pub use orchestrator::Ranker;
