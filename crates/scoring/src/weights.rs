//! Sub-score weights and their volatility-regime adjustment.

use quantrank_core::config::{BaseWeights, ScoringConfig};
use quantrank_core::VolatilitySnapshot;

/// Volatility-index ratio to its reference above which the market is stressed.
const STRESS_RATIO: f64 = 1.0;
/// Volatility-index one-day change above which the market is stressed.
const STRESS_DAY_CHANGE: f64 = 0.10;
/// Volatility-index ratio to its reference below which the market is complacent.
const COMPLACENT_RATIO: f64 = 0.85;

/// Market mood inferred from the volatility index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightRegime {
    /// Stress, carrying `max(ratio, 1 + day_change)`.
    Stressed(f64),
    Complacent,
    Neutral,
}

impl WeightRegime {
    /// Classify a volatility snapshot; `None` when the level is unusable.
    pub fn classify(vol: &VolatilitySnapshot, max_spike: f64) -> Option<Self> {
        if !vol.price.is_finite() || vol.price <= 0.0 {
            return None;
        }
        let reference = if vol.reference_price.is_finite() && vol.reference_price > 0.0 {
            vol.reference_price
        } else {
            vol.price
        };
        let previous = if vol.previous_close.is_finite() && vol.previous_close != 0.0 {
            vol.previous_close
        } else {
            vol.price
        };
        let ratio = vol.price / reference;
        let day_change = ((vol.price - previous) / previous).min(max_spike);

        Some(if ratio > STRESS_RATIO || day_change > STRESS_DAY_CHANGE {
            WeightRegime::Stressed(ratio.max(1.0 + day_change))
        } else if ratio < COMPLACENT_RATIO {
            WeightRegime::Complacent
        } else {
            WeightRegime::Neutral
        })
    }
}

/// Clamp negatives to zero and scale to sum to one.
///
/// An all-zero input maps to the uniform distribution.
pub fn normalize_weights(weights: [f64; 6]) -> [f64; 6] {
    let clamped = weights.map(|w| if w.is_finite() { w.max(0.0) } else { 0.0 });
    let total: f64 = clamped.iter().sum();
    if total <= 0.0 {
        return [1.0 / 6.0; 6];
    }
    clamped.map(|w| w / total)
}

/// Base weights shifted for the volatility regime, then renormalized.
pub fn adjusted_weights(
    base: &BaseWeights,
    vol: &VolatilitySnapshot,
    config: &ScoringConfig,
) -> BaseWeights {
    let mut w = *base;
    match WeightRegime::classify(vol, config.max_vix_spike) {
        Some(WeightRegime::Stressed(stress)) => {
            w.risk += 0.15 * stress;
            w.pullback += 0.10;
            w.daily_performance -= 0.20;
            w.rs_line_momentum += 0.10;
        }
        Some(WeightRegime::Complacent) => w.strength += 0.10,
        Some(WeightRegime::Neutral) | None => {}
    }
    BaseWeights::from_array(normalize_weights(w.as_array()))
}
