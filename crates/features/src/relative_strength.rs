//! Relative strength against the benchmark.
//!
//! The rating compares horizon-weighted relative performance of the ticker
//! and the benchmark. The RS line is the daily close ratio over dates both
//! series share.

use chrono::NaiveDate;
use quantrank_core::{BenchmarkPerformance, DailyBar, RS_HORIZONS};
use std::collections::BTreeMap;

/// Horizon weights, 3M counted double.
pub const HORIZON_WEIGHTS: [f64; 4] = [0.4, 0.2, 0.2, 0.2];

/// Lookback of the RS-line slope, in aligned points.
pub const RS_SLOPE_LOOKBACK: usize = 21;

/// Upper clamp of the RS rating.
const MAX_RS_RATING: f64 = 3.0;

/// Relative-strength metrics for one ticker.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RelativeStrength {
    /// Weighted-relative ratio against the benchmark, clamped to [0, 3].
    pub rating: f64,
    /// Horizon-weighted sum of fractional returns.
    pub raw_score: f64,
    /// 21-point fractional change of the RS line.
    pub line_slope: f64,
    /// 1-point fractional change of the RS line.
    pub one_day_change: f64,
}

/// Percent performance per RS horizon; 0 where history is too short.
pub fn horizon_performance(closes: &[f64]) -> [f64; 4] {
    let n = closes.len();
    RS_HORIZONS.map(|days| {
        if n > days {
            let old = closes[n - 1 - days];
            if old != 0.0 {
                return (closes[n - 1] - old) / old * 100.0;
            }
        }
        0.0
    })
}

/// Horizon-weighted sum of `1 + pct/100` factors.
fn weighted_relative(performance: &[f64; 4]) -> f64 {
    performance
        .iter()
        .zip(HORIZON_WEIGHTS)
        .map(|(pct, w)| (1.0 + pct / 100.0) * w)
        .sum()
}

/// RS rating of a ticker against benchmark performance.
///
/// A non-positive benchmark weighted performance is neutral (1.0).
pub fn rs_rating(stock: &[f64; 4], benchmark: &BenchmarkPerformance) -> f64 {
    let stock_weighted = weighted_relative(stock);
    let bench_weighted = weighted_relative(&benchmark.as_array());
    let rating = if bench_weighted > 0.0 {
        stock_weighted / bench_weighted
    } else {
        1.0
    };
    rating.clamp(0.0, MAX_RS_RATING)
}

/// Horizon-weighted raw performance on fractional returns.
pub fn raw_rs_score(performance: &[f64; 4]) -> f64 {
    performance
        .iter()
        .zip(HORIZON_WEIGHTS)
        .map(|(pct, w)| pct / 100.0 * w)
        .sum()
}

/// Ticker close over benchmark close for every date both sides have.
pub fn rs_line(bars: &[DailyBar], benchmark_close_by_date: &BTreeMap<NaiveDate, f64>) -> Vec<f64> {
    bars.iter()
        .filter_map(|bar| {
            benchmark_close_by_date
                .get(&bar.date)
                .filter(|close| **close != 0.0)
                .map(|close| bar.close / close)
        })
        .collect()
}

/// Fractional change across the last `points` points; 0 with fewer.
fn line_change(line: &[f64], points: usize) -> f64 {
    let n = line.len();
    if points < 2 || n < points {
        return 0.0;
    }
    let base = line[n - points];
    if base == 0.0 {
        return 0.0;
    }
    (line[n - 1] - base) / base
}

/// Full relative-strength computation for one ticker.
pub fn compute_relative_strength(
    bars: &[DailyBar],
    benchmark: &BenchmarkPerformance,
    benchmark_close_by_date: &BTreeMap<NaiveDate, f64>,
) -> RelativeStrength {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let performance = horizon_performance(&closes);
    let line = rs_line(bars, benchmark_close_by_date);

    RelativeStrength {
        rating: rs_rating(&performance, benchmark),
        raw_score: raw_rs_score(&performance),
        line_slope: line_change(&line, RS_SLOPE_LOOKBACK),
        one_day_change: line_change(&line, 2),
    }
}
