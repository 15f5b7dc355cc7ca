//! Per-ticker feature engine.
//!
//! Turns one sanitized daily history plus the shared market context into
//! everything the scorer and predictor consume.

use crate::relative_strength::{compute_relative_strength, RelativeStrength};
use crate::series::{
    atr, ema, last_value, lagged_value, mean, population_std, tail_values, AtrSmoothing, EmaSeed,
};
use crate::squeeze::SqueezeClassifier;
use quantrank_core::{
    DailyBar, Error, MarketContext, PredictorInput, Result, SqueezeLabel, StockMetrics,
};
use quantrank_ingestion::projected_relative_volume;

/// Window for %ADR, U/D ratio and average volume.
const LOOKBACK_20: usize = 20;
/// ATR period of the scorer.
const ATR_PERIOD: usize = 14;
/// EMA values are compared against their value this many bars earlier.
const EMA_SLOPE_LAG: usize = 5;
/// ATR used when the series has no usable value.
const ATR_FALLBACK: f64 = 0.01;
/// U/D ratio reported when there was no down volume.
const UD_RATIO_NO_DOWN_VOLUME: f64 = 5.0;

/// Current and 5-bar-lagged value of one EMA.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmaPoint {
    pub value: f64,
    pub prev5: f64,
}

impl EmaPoint {
    fn from_series(series: &[Option<f64>]) -> Self {
        let value = last_value(series).unwrap_or(0.0);
        let prev5 = lagged_value(series, EMA_SLOPE_LAG)
            .filter(|v| *v != 0.0)
            .unwrap_or(value);
        Self { value, prev5 }
    }
}

/// Everything derived from one ticker's history.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerFeatures {
    pub price: f64,
    pub prev_close: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    /// Today's change against the previous close, in percent.
    pub percent_change: f64,
    /// Opening gap against the previous close, in percent.
    pub gap_percent: f64,
    pub ema10: EmaPoint,
    pub ema20: EmaPoint,
    pub ema50: EmaPoint,
    pub ema200: EmaPoint,
    /// Rolling-mean ATR(14).
    pub atr: f64,
    pub atr14_mean: Option<f64>,
    pub atr14_std: Option<f64>,
    pub percent_adr: f64,
    pub ud_ratio: f64,
    pub avg_volume: f64,
    pub current_volume: f64,
    pub relative_strength: RelativeStrength,
    pub squeeze: SqueezeLabel,
}

impl TickerFeatures {
    /// Distance of the price from an EMA in percent of the EMA.
    pub fn distance_pct(&self, ema: f64) -> f64 {
        if ema == 0.0 {
            return 0.0;
        }
        (self.price - ema) / ema * 100.0
    }

    /// Distance of the price from an EMA in ATR units.
    pub fn distance_atr(&self, ema: f64) -> f64 {
        (self.price - ema) / self.atr
    }

    /// Scorer inputs.
    pub fn to_stock_metrics(&self) -> StockMetrics {
        StockMetrics {
            price: self.price,
            high: self.high,
            low: self.low,
            percent_change: self.percent_change,
            rs_rating: self.relative_strength.rating,
            ud_ratio: self.ud_ratio,
            percent_adr: self.percent_adr,
            atr: self.atr,
            distance_from_ema10: self.distance_pct(self.ema10.value),
            distance_from_ema20: self.distance_pct(self.ema20.value),
            distance_from_ema50: self.distance_pct(self.ema50.value),
            ema10: self.ema10.value,
            ema20: self.ema20.value,
            ema50: self.ema50.value,
            ema200: self.ema200.value,
            ema10_prev5: self.ema10.prev5,
            ema20_prev5: self.ema20.prev5,
            ema50_prev5: self.ema50.prev5,
            rs_line_slope: self.relative_strength.line_slope,
        }
    }

    /// Predictor inputs at `minutes_since_open`.
    ///
    /// The last bar stands in for today's session; its close doubles as VWAP.
    pub fn to_predictor_input(&self, minutes_since_open: f64, context: &MarketContext) -> PredictorInput {
        let roc = if minutes_since_open > 0.0 {
            self.percent_change / minutes_since_open
        } else {
            0.0
        };
        PredictorInput {
            open_price: self.open,
            current_price: self.price,
            prev_close: self.prev_close,
            vwap: Some(self.price),
            relative_volume: projected_relative_volume(
                self.current_volume,
                self.avg_volume,
                minutes_since_open,
            ),
            percent_adr: self.percent_adr,
            minutes_since_open,
            roc,
            gap_percent: self.gap_percent,
            atr14: Some(self.atr),
            atr14_mean: self.atr14_mean,
            atr14_std: self.atr14_std,
            vix_pct_change: context.volatility.pct_change(),
            vix_level: Some(context.volatility.price),
            today_high: Some(self.high),
            today_low: Some(self.low),
        }
    }
}

/// Computes [`TickerFeatures`] from daily histories.
#[derive(Debug, Clone)]
pub struct FeatureEngine {
    min_history_bars: usize,
    squeeze: SqueezeClassifier,
}

impl FeatureEngine {
    /// Create an engine that refuses histories shorter than `min_history_bars`.
    pub fn new(min_history_bars: usize) -> Self {
        Self {
            min_history_bars: min_history_bars.max(2),
            squeeze: SqueezeClassifier::default(),
        }
    }

    /// Compute features for one sanitized history (oldest bar first).
    pub fn compute(&self, bars: &[DailyBar], context: &MarketContext) -> Result<TickerFeatures> {
        let n = bars.len();
        if n < self.min_history_bars {
            return Err(Error::insufficient_data(format!(
                "{} bars, need {}",
                n, self.min_history_bars
            )));
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let last = &bars[n - 1];
        let price = last.close;
        let prev_close = bars[n - 2].close;
        if !(prev_close > 0.0) {
            return Err(Error::data("previous close is not positive"));
        }

        let atr_series = atr(&highs, &lows, &closes, ATR_PERIOD, AtrSmoothing::RollingMean);
        let atr = last_value(&atr_series)
            .filter(|v| *v != 0.0)
            .unwrap_or(ATR_FALLBACK);
        let atr_tail = tail_values(&atr_series, ATR_PERIOD);
        let (atr14_mean, atr14_std) = if atr_tail.is_empty() {
            (None, None)
        } else {
            (Some(mean(&atr_tail)), Some(population_std(&atr_tail)))
        };

        let recent = &bars[n.saturating_sub(LOOKBACK_20)..];
        let volumes: Vec<f64> = recent.iter().map(|b| b.volume).collect();

        Ok(TickerFeatures {
            price,
            prev_close,
            open: last.open,
            high: last.high,
            low: last.low,
            percent_change: (price - prev_close) / prev_close * 100.0,
            gap_percent: (last.open - prev_close) / prev_close * 100.0,
            ema10: EmaPoint::from_series(&ema(&closes, 10, EmaSeed::FirstValue)),
            ema20: EmaPoint::from_series(&ema(&closes, 20, EmaSeed::FirstValue)),
            ema50: EmaPoint::from_series(&ema(&closes, 50, EmaSeed::FirstValue)),
            ema200: EmaPoint::from_series(&ema(&closes, 200, EmaSeed::FirstValue)),
            atr,
            atr14_mean,
            atr14_std,
            percent_adr: percent_adr(recent),
            ud_ratio: ud_ratio(bars, LOOKBACK_20),
            avg_volume: mean(&volumes),
            current_volume: last.volume,
            relative_strength: compute_relative_strength(
                bars,
                &context.benchmark_performance,
                &context.benchmark_close_by_date,
            ),
            squeeze: self.squeeze.classify_last(bars),
        })
    }
}

/// Average high/low ratio minus one, in percent.
pub fn percent_adr(bars: &[DailyBar]) -> f64 {
    if bars.is_empty() {
        return 0.0;
    }
    let ratios: Vec<f64> = bars
        .iter()
        .map(|b| b.high / if b.low != 0.0 { b.low } else { 1.0 })
        .collect();
    (mean(&ratios) - 1.0) * 100.0
}

/// Up-day volume over down-day volume across the last `lookback` bars.
pub fn ud_ratio(bars: &[DailyBar], lookback: usize) -> f64 {
    let n = bars.len();
    let (mut up, mut down) = (0.0, 0.0);
    for i in n.saturating_sub(lookback).max(1)..n {
        let change = bars[i].close - bars[i - 1].close;
        if change > 0.0 {
            up += bars[i].volume;
        } else if change < 0.0 {
            down += bars[i].volume;
        }
    }
    if down > 0.0 {
        up / down
    } else {
        UD_RATIO_NO_DOWN_VOLUME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};
    use quantrank_core::VolatilitySnapshot;

    fn bar(i: usize, close: f64, volume: f64) -> DailyBar {
        DailyBar {
            date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + Duration::days(i as i64),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume,
        }
    }

    fn uptrend(n: usize) -> Vec<DailyBar> {
        (0..n).map(|i| bar(i, 50.0 + i as f64 * 0.5, 1_000.0)).collect()
    }

    #[test]
    fn test_rejects_short_history() {
        let engine = FeatureEngine::new(50);
        let err = engine
            .compute(&uptrend(49), &MarketContext::fallback())
            .unwrap_err();
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn test_uptrend_features() {
        let engine = FeatureEngine::new(50);
        let bars = uptrend(120);
        let f = engine.compute(&bars, &MarketContext::fallback()).unwrap();

        assert_relative_eq!(f.price, 109.5);
        assert_relative_eq!(f.prev_close, 109.0);
        assert_relative_eq!(f.percent_change, 0.5 / 109.0 * 100.0, epsilon = 1e-12);
        assert!(f.ema10.value < f.price);
        assert!(f.ema10.value > f.ema20.value && f.ema20.value > f.ema50.value);
        assert!(f.ema10.prev5 < f.ema10.value);
        // Every day is an up day
        assert_eq!(f.ud_ratio, 5.0);
        assert_relative_eq!(f.avg_volume, 1_000.0);
        assert!(f.atr > 0.0);
        assert!(f.atr14_mean.is_some() && f.atr14_std.is_some());
        // high/low = 1.01/0.99 on every bar
        assert_relative_eq!(f.percent_adr, (1.01 / 0.99 - 1.0) * 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ud_ratio_mixed() {
        let bars = vec![
            bar(0, 10.0, 100.0),
            bar(1, 11.0, 300.0),
            bar(2, 10.5, 100.0),
            bar(3, 10.5, 999.0),
            bar(4, 11.0, 200.0),
        ];
        // up 300 + 200, down 100; the unchanged day counts for neither
        assert_relative_eq!(ud_ratio(&bars, 20), 5.0);
        // Only the last two transitions
        assert_eq!(ud_ratio(&bars, 2), 5.0);
        assert_relative_eq!(ud_ratio(&bars, 3), 2.0);
    }

    #[test]
    fn test_metrics_and_predictor_input() {
        let engine = FeatureEngine::new(50);
        let bars = uptrend(80);
        let mut ctx = MarketContext::fallback();
        ctx.volatility = VolatilitySnapshot {
            price: 22.0,
            previous_close: 20.0,
            reference_price: 21.0,
        };
        let f = engine.compute(&bars, &ctx).unwrap();

        let m = f.to_stock_metrics();
        assert_relative_eq!(m.distance_from_ema10, f.distance_pct(f.ema10.value));
        assert!(m.distance_from_ema10 > 0.0);
        assert_eq!(m.rs_rating, f.relative_strength.rating);

        let p = f.to_predictor_input(195.0, &ctx);
        assert_eq!(p.vwap, Some(f.price));
        assert_relative_eq!(p.roc, f.percent_change / 195.0);
        assert_relative_eq!(p.vix_pct_change, 10.0, epsilon = 1e-12);
        assert_eq!(p.vix_level, Some(22.0));
        assert!(p.relative_volume > 1.0);

        let closed = f.to_predictor_input(0.0, &ctx);
        assert_eq!(closed.roc, 0.0);
    }

    #[test]
    fn test_atr_distance_units() {
        let engine = FeatureEngine::new(50);
        let f = engine
            .compute(&uptrend(60), &MarketContext::fallback())
            .unwrap();
        assert_relative_eq!(
            f.distance_atr(f.ema20.value),
            (f.price - f.ema20.value) / f.atr
        );
    }
}
