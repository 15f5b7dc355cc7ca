//! Feature computation for the quantrank system.
//!
//! This crate handles:
//! - Series statistics (SMA, EMA, rolling std, ATR)
//! - Squeeze classification
//! - Relative strength against the benchmark
//! - The chart indicator panel
//! - Per-ticker feature assembly

pub mod series;
pub mod squeeze;
pub mod relative_strength;
pub mod panel;
pub mod engine;

pub use series::{AtrSmoothing, EmaSeed};
pub use squeeze::{Band, SqueezeClassifier, SqueezeConfig};
pub use relative_strength::{compute_relative_strength, RelativeStrength};
pub use panel::{indicator_panel, PanelPoint};
pub use engine::{FeatureEngine, TickerFeatures};
