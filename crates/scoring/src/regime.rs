//! Regime lookup tables for the EOD predictor.
//!
//! Each table maps a small tagged bucket to its multiplier or weight tuple so
//! the policy can be audited in one place.

use quantrank_core::{VixRegime, VolatilityRegime};

/// Classify a volatility-index level.
pub fn vix_regime(level: Option<f64>) -> VixRegime {
    match level {
        Some(v) if v < 15.0 => VixRegime::LowVol,
        Some(v) if v > 30.0 => VixRegime::HighVol,
        Some(_) => VixRegime::NormalVol,
        None => VixRegime::Unknown,
    }
}

/// Base move multiplier for a volatility-index band and its one-day change (percent).
pub fn vix_base_multiplier(regime: VixRegime, pct_change: f64) -> f64 {
    match regime {
        VixRegime::LowVol => 1.2 - pct_change / 200.0,
        VixRegime::NormalVol => 1.0 - pct_change / 150.0,
        VixRegime::HighVol => 0.8 - pct_change / 100.0,
        VixRegime::Unknown => 1.0,
    }
}

/// Classify an ATR z-score.
pub fn volatility_regime(z: f64) -> VolatilityRegime {
    let abs = z.abs();
    if abs > 2.0 {
        VolatilityRegime::Extreme
    } else if abs > 1.0 {
        VolatilityRegime::Elevated
    } else {
        VolatilityRegime::Normal
    }
}

/// Move adjustment for an ATR z-score: damp expanded ranges, lift compressed ones.
pub fn atr_z_adjustment(z: f64) -> f64 {
    let expanded = z > 0.0;
    match volatility_regime(z) {
        VolatilityRegime::Extreme if expanded => 0.7,
        VolatilityRegime::Extreme => 1.3,
        VolatilityRegime::Elevated if expanded => 0.85,
        VolatilityRegime::Elevated => 1.15,
        VolatilityRegime::Normal => 1.0,
    }
}

/// Combined volatility multiplier, clamped to [0.5, 1.5].
pub fn volatility_multiplier(regime: VixRegime, pct_change: f64, z: Option<f64>) -> f64 {
    let adjustment = z.map_or(1.0, atr_z_adjustment);
    (vix_base_multiplier(regime, pct_change) * adjustment).clamp(0.5, 1.5)
}

/// Session progress bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// First 30% of the session.
    Early,
    /// Middle 40%.
    Middle,
    /// Final 30%.
    Late,
}

impl SessionPhase {
    /// Bucket for the fraction of the session elapsed.
    pub fn from_progress(progress: f64) -> Self {
        if progress < 0.3 {
            SessionPhase::Early
        } else if progress < 0.7 {
            SessionPhase::Middle
        } else {
            SessionPhase::Late
        }
    }
}

/// Blend weights for price-vs-open, price-vs-VWAP and momentum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalWeights {
    pub open: f64,
    pub vwap: f64,
    pub roc: f64,
}

impl SignalWeights {
    const fn new(open: f64, vwap: f64, roc: f64) -> Self {
        Self { open, vwap, roc }
    }

    /// Weight table by phase, gap significance and volume.
    pub fn lookup(phase: SessionPhase, significant_gap: bool, high_volume: bool) -> Self {
        match (phase, significant_gap, high_volume) {
            (SessionPhase::Early, true, true) => Self::new(0.5, 0.2, 0.3),
            (SessionPhase::Early, true, false) => Self::new(0.6, 0.2, 0.2),
            (SessionPhase::Early, false, _) => Self::new(0.4, 0.4, 0.2),
            (SessionPhase::Middle, _, true) => Self::new(0.3, 0.5, 0.2),
            (SessionPhase::Middle, _, false) => Self::new(0.4, 0.4, 0.2),
            (SessionPhase::Late, _, _) => Self::new(0.5, 0.4, 0.1),
        }
    }

    /// Drop the VWAP leg and rescale open and momentum to their original total.
    pub fn without_vwap(self) -> Self {
        let total = self.open + self.roc;
        if total <= 0.0 {
            return Self::new(0.5, 0.0, 0.5);
        }
        let scale = (self.open + self.vwap + self.roc) / total;
        Self::new(self.open * scale, 0.0, self.roc * scale)
    }
}
