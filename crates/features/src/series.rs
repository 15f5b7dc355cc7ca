//! Series statistics over daily closes and ranges.
//!
//! Every function returns a series the same length as its input, with `None`
//! for the warm-up head where the statistic is undefined.
//!
//! Two EMA seeding conventions and two ATR smoothing conventions are in use.
//! Scores and chart indicators were calibrated against different ones, so
//! callers pick explicitly via [`EmaSeed`] and [`AtrSmoothing`].

use quantrank_core::IndicatorSeries;
use statrs::statistics::Statistics;

/// How the first EMA value is seeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmaSeed {
    /// Simple average of the first `period` values; undefined before `period - 1`.
    /// Used by the indicator panel.
    SmaSeeded,
    /// The first raw value; defined from index 0. Used by the scorer.
    FirstValue,
}

/// How true range is smoothed into ATR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtrSmoothing {
    /// Wilder recursion seeded by the mean of the first `period` true ranges.
    /// Used by the indicator panel.
    Wilder,
    /// Plain rolling mean of true range. Used by the scorer and squeeze.
    RollingMean,
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().mean()
}

/// Population standard deviation; 0 for fewer than two values.
pub fn population_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values.iter().population_std_dev()
}

/// Simple moving average of the trailing `period` values.
pub fn sma(values: &[f64], period: usize) -> IndicatorSeries {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    for (i, window) in values.windows(period).enumerate() {
        out[i + period - 1] = Some(window.iter().sum::<f64>() / period as f64);
    }
    out
}

/// Exponential moving average with `k = 2 / (period + 1)`.
pub fn ema(values: &[f64], period: usize, seed: EmaSeed) -> IndicatorSeries {
    let mut out = vec![None; values.len()];
    if period == 0 || values.is_empty() {
        return out;
    }
    let k = 2.0 / (period as f64 + 1.0);

    let (start, mut prev) = match seed {
        EmaSeed::FirstValue => (0, values[0]),
        EmaSeed::SmaSeeded => {
            if values.len() < period {
                return out;
            }
            let seed = values[..period].iter().sum::<f64>() / period as f64;
            (period - 1, seed)
        }
    };
    out[start] = Some(prev);
    for i in start + 1..values.len() {
        prev = values[i] * k + prev * (1.0 - k);
        out[i] = Some(prev);
    }
    out
}

/// Rolling population standard deviation around the SMA at the same index.
pub fn rolling_std(values: &[f64], period: usize) -> IndicatorSeries {
    let means = sma(values, period);
    means
        .iter()
        .enumerate()
        .map(|(i, m)| {
            m.map(|m| {
                let window = &values[i + 1 - period..=i];
                let variance = window.iter().map(|v| (v - m).powi(2)).sum::<f64>() / period as f64;
                variance.sqrt()
            })
        })
        .collect()
}

/// True range per bar; the first bar uses its plain high-low span.
pub fn true_range(highs: &[f64], lows: &[f64], closes: &[f64]) -> Vec<f64> {
    let n = highs.len().min(lows.len()).min(closes.len());
    (0..n)
        .map(|i| {
            let hl = highs[i] - lows[i];
            if i == 0 {
                hl
            } else {
                let pc = closes[i - 1];
                hl.max((highs[i] - pc).abs()).max((lows[i] - pc).abs())
            }
        })
        .collect()
}

/// Average true range under the chosen smoothing.
pub fn atr(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
    smoothing: AtrSmoothing,
) -> IndicatorSeries {
    let tr = true_range(highs, lows, closes);
    match smoothing {
        AtrSmoothing::RollingMean => sma(&tr, period),
        AtrSmoothing::Wilder => {
            let mut out = vec![None; tr.len()];
            if period == 0 || tr.len() < period {
                return out;
            }
            let p = period as f64;
            let mut prev = tr[..period].iter().sum::<f64>() / p;
            out[period - 1] = Some(prev);
            for i in period..tr.len() {
                prev = (prev * (p - 1.0) + tr[i]) / p;
                out[i] = Some(prev);
            }
            out
        }
    }
}

/// Last defined value of a series.
pub fn last_value(series: &[Option<f64>]) -> Option<f64> {
    series.last().copied().flatten()
}

/// Value `lag` bars before the last, if defined.
pub fn lagged_value(series: &[Option<f64>], lag: usize) -> Option<f64> {
    let n = series.len();
    if n <= lag {
        return None;
    }
    series[n - 1 - lag]
}

/// Defined values among the last `count` entries.
pub fn tail_values(series: &[Option<f64>], count: usize) -> Vec<f64> {
    let start = series.len().saturating_sub(count);
    series[start..].iter().flatten().copied().collect()
}
