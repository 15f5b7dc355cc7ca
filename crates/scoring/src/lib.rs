//! Scoring and prediction for the quantrank system.
//!
//! This crate handles:
//! - Sigmoid normalization of raw inputs
//! - Sub-score weights and their volatility-regime adjustment
//! - The composite quality scorer
//! - Regime lookup tables and the intraday EOD predictor

pub mod normalize;
pub mod weights;
pub mod scorer;
pub mod regime;
pub mod predictor;

pub use normalize::sigmoid;
pub use weights::{adjusted_weights, normalize_weights, WeightRegime};
pub use scorer::{QuantScorer, ScoreBreakdown};
pub use predictor::IntradayPredictor;
