//! Core data types for the quantrank system.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// An indicator series aligned 1:1 with its source bars.
///
/// `None` marks the warm-up head where the indicator has no value yet.
pub type IndicatorSeries = Vec<Option<f64>>;

/// Regular-session length in minutes (09:30 to 16:00).
pub const SESSION_MINUTES: f64 = 390.0;

/// RS lookback horizons in trading days (3, 6, 9 and 12 months).
pub const RS_HORIZONS: [usize; 4] = [63, 126, 189, 252];

/// One daily OHLCV bar (a "quote" in market-data parlance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    /// Trading date, unique and strictly increasing within a history.
    pub date: NaiveDate,
    /// Open price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Close price.
    pub close: f64,
    /// Session volume.
    pub volume: f64,
}

impl DailyBar {
    /// True range against the previous close; the plain high-low span without one.
    #[inline]
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        let hl = self.high - self.low;
        match prev_close {
            Some(pc) => hl.max((self.high - pc).abs()).max((self.low - pc).abs()),
            None => hl,
        }
    }

    /// True if every price and volume field is finite.
    pub fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Volatility-index snapshot (e.g. VIX) for the scoring run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilitySnapshot {
    /// Current level.
    pub price: f64,
    /// Previous session close.
    pub previous_close: f64,
    /// Reference level (a longer-dated volatility index); falls back to `price`.
    pub reference_price: f64,
}

impl VolatilitySnapshot {
    /// Flat snapshot at a single level.
    pub fn flat(level: f64) -> Self {
        Self {
            price: level,
            previous_close: level,
            reference_price: level,
        }
    }

    /// One-day change in percent; zero without a usable previous close.
    pub fn pct_change(&self) -> f64 {
        if self.previous_close.is_finite() && self.previous_close != 0.0 {
            (self.price - self.previous_close) / self.previous_close * 100.0
        } else {
            0.0
        }
    }
}

/// Benchmark performance over the four RS horizons, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkPerformance {
    pub three_month: f64,
    pub six_month: f64,
    pub nine_month: f64,
    pub twelve_month: f64,
}

impl BenchmarkPerformance {
    /// Horizons ordered 3M, 6M, 9M, 12M.
    pub fn as_array(&self) -> [f64; 4] {
        [
            self.three_month,
            self.six_month,
            self.nine_month,
            self.twelve_month,
        ]
    }

    /// Build from horizons ordered 3M, 6M, 9M, 12M.
    pub fn from_array(values: [f64; 4]) -> Self {
        Self {
            three_month: values[0],
            six_month: values[1],
            nine_month: values[2],
            twelve_month: values[3],
        }
    }
}

/// Immutable market snapshot shared by every ticker in one scoring run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketContext {
    /// Benchmark daily bars, oldest first.
    pub benchmark_bars: Vec<DailyBar>,
    /// Benchmark close keyed by trading date.
    pub benchmark_close_by_date: BTreeMap<NaiveDate, f64>,
    /// Benchmark performance over the RS horizons.
    pub benchmark_performance: BenchmarkPerformance,
    /// Volatility-index snapshot.
    pub volatility: VolatilitySnapshot,
    /// Set when the provider failed and neutral defaults were substituted.
    pub is_fallback: bool,
}

impl MarketContext {
    /// Neutral context used when the market-context provider is unavailable.
    ///
    /// The numbers are plausible defaults, not sentinels; scoring proceeds
    /// without special-casing them.
    pub fn fallback() -> Self {
        Self {
            benchmark_bars: Vec::new(),
            benchmark_close_by_date: BTreeMap::new(),
            benchmark_performance: BenchmarkPerformance::from_array([5.0, 10.0, 12.0, 15.0]),
            volatility: VolatilitySnapshot::flat(18.5),
            is_fallback: true,
        }
    }

    /// Benchmark one-day change in percent from its last two bars.
    pub fn benchmark_change_pct(&self) -> f64 {
        let n = self.benchmark_bars.len();
        if n < 2 {
            return 0.0;
        }
        let last = self.benchmark_bars[n - 1].close;
        let prev = self.benchmark_bars[n - 2].close;
        if prev != 0.0 {
            (last - prev) / prev * 100.0
        } else {
            0.0
        }
    }
}

/// Bollinger-inside-Keltner compression level.
///
/// Variants are ordered by compression, so `High > Medium > Low > No`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SqueezeLabel {
    /// Bollinger band extends outside the widest Keltner channel.
    No,
    /// Inside the widest channel only.
    Low,
    /// Inside the middle channel.
    Medium,
    /// Inside the narrowest channel.
    High,
}

impl fmt::Display for SqueezeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SqueezeLabel::No => "No",
            SqueezeLabel::Low => "Low",
            SqueezeLabel::Medium => "Medium",
            SqueezeLabel::High => "High",
        };
        f.write_str(s)
    }
}

/// Inputs to the composite scorer for one ticker.
///
/// Distances are in percent of the EMA; slopes are fractional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMetrics {
    pub price: f64,
    pub high: f64,
    pub low: f64,
    /// Today's change in percent.
    pub percent_change: f64,
    /// RS rating multiple (1.0 = in line with the benchmark).
    pub rs_rating: f64,
    /// Up-volume / down-volume over the last 20 bars.
    pub ud_ratio: f64,
    /// Average daily range in percent.
    pub percent_adr: f64,
    pub atr: f64,
    pub distance_from_ema10: f64,
    pub distance_from_ema20: f64,
    pub distance_from_ema50: f64,
    pub ema10: f64,
    pub ema20: f64,
    pub ema50: f64,
    /// Zero or non-finite when there is no usable EMA200.
    pub ema200: f64,
    pub ema10_prev5: f64,
    pub ema20_prev5: f64,
    pub ema50_prev5: f64,
    /// 21-bar fractional change of the RS line.
    pub rs_line_slope: f64,
}

/// Raw intraday observables for the EOD predictor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictorInput {
    pub open_price: f64,
    pub current_price: f64,
    pub prev_close: f64,
    pub vwap: Option<f64>,
    /// Projected full-session volume over the average daily volume.
    pub relative_volume: f64,
    /// Average daily range in percent.
    pub percent_adr: f64,
    pub minutes_since_open: f64,
    /// Rate of change in percent per minute.
    pub roc: f64,
    /// Opening gap in percent.
    pub gap_percent: f64,
    pub atr14: Option<f64>,
    pub atr14_mean: Option<f64>,
    pub atr14_std: Option<f64>,
    /// Volatility-index one-day change in percent.
    pub vix_pct_change: f64,
    pub vix_level: Option<f64>,
    pub today_high: Option<f64>,
    pub today_low: Option<f64>,
}

/// Volatility-index level band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VixRegime {
    /// No volatility-index level supplied.
    Unknown,
    /// Level below 15.
    LowVol,
    /// Level between 15 and 30.
    NormalVol,
    /// Level above 30.
    HighVol,
}

impl VixRegime {
    pub fn as_str(self) -> &'static str {
        match self {
            VixRegime::Unknown => "unknown",
            VixRegime::LowVol => "low_vol",
            VixRegime::NormalVol => "normal_vol",
            VixRegime::HighVol => "high_vol",
        }
    }
}

/// ATR z-score band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolatilityRegime {
    Normal,
    /// |z| > 1.
    Elevated,
    /// |z| > 2.
    Extreme,
}

impl VolatilityRegime {
    pub fn as_str(self) -> &'static str {
        match self {
            VolatilityRegime::Normal => "normal",
            VolatilityRegime::Elevated => "elevated",
            VolatilityRegime::Extreme => "extreme",
        }
    }
}

/// Direction of the opening gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GapDirection {
    Up,
    Down,
}

/// Terminal or open-market state of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredictionRegime {
    /// Required inputs were non-finite or non-positive.
    InvalidInput,
    /// Session complete; the realized return is the prediction.
    Closed,
    /// Market open.
    Open {
        vix: VixRegime,
        /// Set when a significant, high-volume gap has reversed through VWAP.
        failed_gap: Option<GapDirection>,
    },
}

impl PredictionRegime {
    /// Flat label, e.g. `normal_vol_failed_gap_up`.
    pub fn label(&self) -> String {
        match self {
            PredictionRegime::InvalidInput => "invalid_input".to_string(),
            PredictionRegime::Closed => "closed".to_string(),
            PredictionRegime::Open { vix, failed_gap } => {
                let suffix = match failed_gap {
                    Some(GapDirection::Up) => "_failed_gap_up",
                    Some(GapDirection::Down) => "_failed_gap_down",
                    None => "",
                };
                format!("{}{}", vix.as_str(), suffix)
            }
        }
    }
}

impl fmt::Display for PredictionRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Components of the projected total-day range (fractions of previous close).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeBreakdown {
    pub adr_component: f64,
    pub atr_component: f64,
    pub final_projected: f64,
}

/// EOD prediction with a confidence band.
///
/// Percentages are returns on the previous close, ×100, rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorOutput {
    pub predicted_eod_change_pct: f64,
    pub lower_bound_pct: f64,
    pub upper_bound_pct: f64,
    pub confidence_level: f64,
    pub regime: PredictionRegime,
    pub atr_z_score: Option<f64>,
    pub volatility_regime: Option<VolatilityRegime>,
    pub range_breakdown: Option<RangeBreakdown>,
}

impl PredictorOutput {
    /// Zeroed, zero-confidence output for unusable inputs.
    pub fn invalid_input() -> Self {
        Self {
            predicted_eod_change_pct: 0.0,
            lower_bound_pct: 0.0,
            upper_bound_pct: 0.0,
            confidence_level: 0.0,
            regime: PredictionRegime::InvalidInput,
            atr_z_score: None,
            volatility_regime: None,
            range_breakdown: None,
        }
    }

    /// Degenerate point prediction once the session is over.
    pub fn closed(realized_pct: f64) -> Self {
        Self {
            predicted_eod_change_pct: realized_pct,
            lower_bound_pct: realized_pct,
            upper_bound_pct: realized_pct,
            confidence_level: 1.0,
            regime: PredictionRegime::Closed,
            atr_z_score: None,
            volatility_regime: None,
            range_breakdown: None,
        }
    }
}

/// Final per-ticker ranking record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    /// Composite quality score, 0 to 100.
    pub score: u8,
    pub ticker: String,
    pub price: f64,
    pub percent_change: f64,
    pub relative_volume: f64,
    pub predicted_change_pct: f64,
    /// One-day RS-line change in percent.
    pub rs_one_day_change_pct: f64,
    pub ud_ratio: f64,
    pub squeeze: SqueezeLabel,
    pub atr: f64,
    pub percent_adr: f64,
    pub ema10_distance_atr: f64,
    pub ema20_distance_atr: f64,
    pub ema50_distance_atr: f64,
    pub rs_rating: f64,
    /// Horizon-weighted raw performance (fractional returns), for tie inspection.
    pub rs_raw_score: f64,
}

/// Round to `decimals` places.
#[inline]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, open: f64, high: f64, low: f64, close: f64) -> DailyBar {
        DailyBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open,
            high,
            low,
            close,
            volume: 1_000.0,
        }
    }

    #[test]
    fn test_true_range() {
        let b = bar(2, 10.0, 12.0, 9.5, 11.0);
        assert_eq!(b.true_range(None), 2.5);
        // Gap up: |high - prev_close| dominates
        assert_eq!(b.true_range(Some(8.0)), 4.0);
        // Gap down: |low - prev_close| dominates
        assert_eq!(b.true_range(Some(14.0)), 4.5);
    }

    #[test]
    fn test_squeeze_label_order() {
        assert!(SqueezeLabel::High > SqueezeLabel::Medium);
        assert!(SqueezeLabel::Medium > SqueezeLabel::Low);
        assert!(SqueezeLabel::Low > SqueezeLabel::No);
        assert_eq!(SqueezeLabel::Medium.to_string(), "Medium");
    }

    #[test]
    fn test_regime_labels() {
        assert_eq!(PredictionRegime::InvalidInput.label(), "invalid_input");
        assert_eq!(PredictionRegime::Closed.label(), "closed");
        let open = PredictionRegime::Open {
            vix: VixRegime::NormalVol,
            failed_gap: Some(GapDirection::Up),
        };
        assert_eq!(open.to_string(), "normal_vol_failed_gap_up");
    }

    #[test]
    fn test_benchmark_change() {
        let mut ctx = MarketContext::fallback();
        assert_eq!(ctx.benchmark_change_pct(), 0.0);
        ctx.benchmark_bars = vec![bar(2, 100.0, 101.0, 99.0, 100.0), bar(3, 100.0, 99.0, 97.0, 98.0)];
        assert!((ctx.benchmark_change_pct() + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_volatility_pct_change() {
        let snap = VolatilitySnapshot {
            price: 22.0,
            previous_close: 20.0,
            reference_price: 21.0,
        };
        assert!((snap.pct_change() - 10.0).abs() < 1e-12);
        assert_eq!(VolatilitySnapshot { previous_close: 0.0, ..snap }.pct_change(), 0.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(-0.005001, 2), -0.01);
    }
}
