//! Configuration structures for the quantrank system.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Sector ETFs ranked when no universe is supplied.
pub const DEFAULT_UNIVERSE: [&str; 29] = [
    "ITA", "ROBO", "PEJ", "BLOK", "TAN", "CIBR", "IGV", "ARKG", "KWEB", "XLE", "SMH", "XLV",
    "XLF", "FDN", "XLY", "XLB", "UFO", "XRT", "XBI", "ITB", "MSOS", "IYT", "XLP", "IYZ", "NLR",
    "XME", "GDX", "JETS", "PBW",
];

/// Main configuration for the ranking system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Composite scorer sanitization bounds.
    pub scoring: ScoringConfig,
    /// Base sub-score weights before regime adjustment.
    pub weights: BaseWeights,
    /// EOD predictor calibration.
    pub predictor: PredictorParams,
    /// Orchestration settings.
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load a (possibly partial) configuration from a JSON file.
    ///
    /// Missing sections and fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break the scorer or predictor invariants.
    pub fn validate(&self) -> Result<()> {
        let s = &self.scoring;
        if s.min_percent_change >= s.max_percent_change {
            return Err(Error::config("percent-change clamp is empty"));
        }
        if s.min_ema_distance >= s.max_ema_distance {
            return Err(Error::config("EMA-distance clamp is empty"));
        }
        if !(s.min_price > 1.0) {
            return Err(Error::config("min_price must exceed 1.0"));
        }
        if !(s.atr_floor > 0.0) {
            return Err(Error::config("atr_floor must be positive"));
        }
        if self.weights.as_array().iter().any(|w| !w.is_finite()) {
            return Err(Error::config("base weights must be finite"));
        }
        let p = &self.predictor;
        if !(0.0..=1.0).contains(&p.atr_weight) {
            return Err(Error::config("atr_weight must be within [0, 1]"));
        }
        if p.vm_floor > p.vm_ceil {
            return Err(Error::config("volume multiplier floor exceeds ceiling"));
        }
        if self.pipeline.min_history_bars < 2 {
            return Err(Error::config("min_history_bars must be at least 2"));
        }
        Ok(())
    }
}

/// Composite scorer sanitization bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Price substituted for a non-finite price; also where the price penalty ends.
    pub min_price: f64,
    /// Lower clamp for today's percent change.
    pub min_percent_change: f64,
    /// Upper clamp for today's percent change.
    pub max_percent_change: f64,
    /// Upper clamp for the up/down-volume ratio.
    pub max_ud_ratio: f64,
    /// Lower clamp for EMA distances (percent).
    pub min_ema_distance: f64,
    /// Upper clamp for EMA distances (percent).
    pub max_ema_distance: f64,
    /// Cap on the volatility-index one-day change (fraction).
    pub max_vix_spike: f64,
    /// How far below an EMA (percent) still counts as an ideal pullback.
    pub undercut_tolerance: f64,
    /// Smallest ATR used as a divisor.
    pub atr_floor: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_price: 5.0,
            min_percent_change: -20.0,
            max_percent_change: 20.0,
            max_ud_ratio: 5.0,
            min_ema_distance: -10.0,
            max_ema_distance: 10.0,
            max_vix_spike: 0.50,
            undercut_tolerance: -0.5,
            atr_floor: 0.0001,
        }
    }
}

/// The six composite sub-score weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseWeights {
    pub daily_performance: f64,
    pub strength: f64,
    pub accumulation: f64,
    pub pullback: f64,
    pub risk: f64,
    pub rs_line_momentum: f64,
}

impl BaseWeights {
    /// Weights in declaration order.
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.daily_performance,
            self.strength,
            self.accumulation,
            self.pullback,
            self.risk,
            self.rs_line_momentum,
        ]
    }

    /// Build from weights in declaration order.
    pub fn from_array(w: [f64; 6]) -> Self {
        Self {
            daily_performance: w[0],
            strength: w[1],
            accumulation: w[2],
            pullback: w[3],
            risk: w[4],
            rs_line_momentum: w[5],
        }
    }
}

impl Default for BaseWeights {
    fn default() -> Self {
        Self {
            daily_performance: 0.05,
            strength: 0.10,
            accumulation: 0.10,
            pullback: 0.40,
            risk: 0.10,
            rs_line_momentum: 0.25,
        }
    }
}

/// EOD predictor calibration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorParams {
    /// Scale applied inside tanh to the raw intraday signal.
    pub intraday_tanh_scale: f64,
    /// Volume multiplier floor.
    pub vm_floor: f64,
    /// Volume multiplier ceiling.
    pub vm_ceil: f64,
    /// Exponent on the remaining session fraction.
    pub time_decay_alpha: f64,
    /// Tolerance (fraction) for a gap to count as holding.
    pub hold_threshold: f64,
    /// Cap on the high-volume time-decay bonus.
    pub max_volume_boost: f64,
    /// Prediction cap as a multiple of %ADR.
    pub adr_cap_multiple: f64,
    /// Absolute cap on the ATR z-score.
    pub atr_zscore_cap: f64,
    /// Weight of the ATR-derived range versus %ADR.
    pub atr_weight: f64,
    /// |z| above which the prediction cap widens.
    pub extreme_volatility_threshold: f64,
    /// ROC (percent per minute) treated as full-strength momentum.
    pub momentum_strong_roc: f64,
    /// Remaining-session fraction regarded as late day.
    pub late_day_fraction: f64,
    /// Minutes after open before a reversed gap can count as failed.
    pub failed_gap_minutes: f64,
    /// Bias when price trades below both open and VWAP.
    pub perf_bias_weak: f64,
    /// Bias when price trades above both open and VWAP.
    pub perf_bias_strong: f64,
    /// Aggression of the gap-hold decay.
    pub hold_factor_decay: f64,
}

impl Default for PredictorParams {
    fn default() -> Self {
        Self {
            intraday_tanh_scale: 3.0,
            vm_floor: 0.5,
            vm_ceil: 10.0,
            time_decay_alpha: 0.5,
            hold_threshold: 0.01,
            max_volume_boost: 0.3,
            adr_cap_multiple: 3.0,
            atr_zscore_cap: 3.0,
            atr_weight: 0.7,
            extreme_volatility_threshold: 1.5,
            momentum_strong_roc: 0.2,
            late_day_fraction: 0.15,
            failed_gap_minutes: 60.0,
            perf_bias_weak: 0.35,
            perf_bias_strong: 0.25,
            hold_factor_decay: 0.8,
        }
    }
}

/// Orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Tickers with fewer bars are skipped.
    pub min_history_bars: usize,
    /// Number of parallel workers (0 = auto).
    pub workers: usize,
    /// Tickers ranked when the caller supplies none.
    pub universe: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_history_bars: 50,
            workers: 0,
            universe: DEFAULT_UNIVERSE.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.weights.pullback, 0.40);
        assert_eq!(config.scoring.undercut_tolerance, -0.5);
        assert_eq!(config.predictor.failed_gap_minutes, 60.0);
        assert_eq!(config.pipeline.min_history_bars, 50);
        assert_eq!(config.pipeline.universe.len(), 29);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_base_weights_sum_to_one() {
        let sum: f64 = BaseWeights::default().as_array().iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_json() {
        let config: Config =
            serde_json::from_str(r#"{"pipeline": {"workers": 4}, "weights": {"risk": 0.2}}"#)
                .unwrap();
        assert_eq!(config.pipeline.workers, 4);
        assert_eq!(config.pipeline.min_history_bars, 50);
        assert_eq!(config.weights.risk, 0.2);
        assert_eq!(config.weights.pullback, 0.40);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.predictor.atr_weight = 1.5;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.scoring.min_ema_distance = 10.0;
        assert!(config.validate().is_err());
    }
}
