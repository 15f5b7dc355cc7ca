//! Data ingestion and normalization for the quantrank system.
//!
//! This crate handles:
//! - Daily history sanitation (ordering, de-duplication, non-finite bars)
//! - Market-context assembly from benchmark bars and a volatility snapshot
//! - Session clock and projected relative volume

pub mod history;
pub mod context;
pub mod session;

pub use history::{close_series, sanitize_history, trailing_return};
pub use context::{build_market_context, resolve_context};
pub use session::{minutes_since_open, projected_relative_volume};
