//! Composite quality scorer.
//!
//! Six sigmoid-normalized sub-scores blended with regime-adjusted weights,
//! then discounted for extreme daily range and low price.

use crate::normalize::sigmoid;
use crate::weights::adjusted_weights;
use ordered_float::OrderedFloat;
use quantrank_core::config::{BaseWeights, ScoringConfig};
use quantrank_core::{MarketContext, StockMetrics};

/// Upper bound of an ideal pullback above each EMA (percent), for EMA10/20/50.
const IDEAL_PULLBACK_MAX: [f64; 3] = [1.5, 2.0, 4.0];
/// Blend of the three pullback sub-scores.
const PULLBACK_BLEND: [f64; 3] = [0.4, 0.4, 0.2];
/// Bonus for a coiled bullish stack with a rising RS line.
const COIL_BONUS: f64 = 0.25;
/// Upper clamp applied to the RS rating.
const MAX_RS_RATING: f64 = 3.0;

/// Sub-scores and penalties behind one composite score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub daily_performance: f64,
    pub strength: f64,
    pub accumulation: f64,
    pub pullback: f64,
    pub risk: f64,
    pub rs_momentum: f64,
    /// Weights after the volatility-regime adjustment.
    pub weights: BaseWeights,
    pub composite: f64,
    pub adr_penalty: f64,
    pub price_penalty: f64,
    /// Final 0-100 score.
    pub score: u8,
}

/// Fractional change of an EMA over its 5-bar lag; 0 without a lag value.
fn ema_slope(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous
}

/// Multiplier for an EMA's 5-bar slope.
fn slope_multiplier(slope: f64) -> f64 {
    if slope > 0.005 {
        1.2
    } else if slope < 0.0 {
        0.5
    } else if slope <= 0.001 {
        0.8
    } else {
        1.0
    }
}

/// Composite scorer; a pure function of its inputs.
#[derive(Debug, Clone, Default)]
pub struct QuantScorer {
    config: ScoringConfig,
    base_weights: BaseWeights,
}

impl QuantScorer {
    /// Create a scorer with explicit bounds and base weights.
    pub fn new(config: ScoringConfig, base_weights: BaseWeights) -> Self {
        Self {
            config,
            base_weights,
        }
    }

    /// Replace non-finite fields with neutral defaults and clamp to bounds.
    pub fn sanitize(&self, metrics: &StockMetrics) -> StockMetrics {
        let c = &self.config;
        let or = |v: f64, default: f64| if v.is_finite() { v } else { default };
        let distance = |v: f64| or(v, 0.0).clamp(c.min_ema_distance, c.max_ema_distance);

        let atr = or(metrics.atr, 0.0);
        StockMetrics {
            price: or(metrics.price, c.min_price),
            high: or(metrics.high, 0.0),
            low: or(metrics.low, 0.0),
            percent_change: or(metrics.percent_change, 0.0)
                .clamp(c.min_percent_change, c.max_percent_change),
            rs_rating: or(metrics.rs_rating, 1.0).clamp(0.0, MAX_RS_RATING),
            ud_ratio: or(metrics.ud_ratio, 1.0).clamp(0.0, c.max_ud_ratio),
            percent_adr: or(metrics.percent_adr, 0.0),
            atr: if atr > 0.0 { atr } else { c.atr_floor },
            distance_from_ema10: distance(metrics.distance_from_ema10),
            distance_from_ema20: distance(metrics.distance_from_ema20),
            distance_from_ema50: distance(metrics.distance_from_ema50),
            ema10: or(metrics.ema10, 0.0),
            ema20: or(metrics.ema20, 0.0),
            ema50: or(metrics.ema50, 0.0),
            // Left as is; a non-finite EMA200 simply fails the validity check.
            ema200: metrics.ema200,
            ema10_prev5: or(metrics.ema10_prev5, 0.0),
            ema20_prev5: or(metrics.ema20_prev5, 0.0),
            ema50_prev5: or(metrics.ema50_prev5, 0.0),
            rs_line_slope: or(metrics.rs_line_slope, 0.0),
        }
    }

    /// Pullback quality of one EMA distance against its ideal window.
    pub fn pullback_sub_score(&self, distance: f64, ideal_max: f64, slope: f64) -> f64 {
        let tolerance = self.config.undercut_tolerance;
        let base = if (tolerance..=ideal_max).contains(&distance) {
            1.0
        } else if distance > ideal_max {
            (1.0 - (distance - ideal_max) / (ideal_max * 2.0)).max(0.0)
        } else {
            (1.0 - (distance - tolerance).abs().powi(2) / 2.0).max(0.0)
        };
        base * slope_multiplier(slope)
    }

    /// Composite score in [0, 100].
    pub fn score(&self, metrics: &StockMetrics, context: &MarketContext) -> u8 {
        self.score_breakdown(metrics, context).score
    }

    /// Composite score with every intermediate.
    pub fn score_breakdown(&self, metrics: &StockMetrics, context: &MarketContext) -> ScoreBreakdown {
        let m = self.sanitize(metrics);
        let bench_change = context.benchmark_change_pct();
        let weights = adjusted_weights(&self.base_weights, &context.volatility, &self.config);

        // Daily performance
        let mut daily_performance = sigmoid(m.percent_change - bench_change, -3.0, 3.0, 2.0, true);
        if bench_change < -1.5 && m.percent_change > 0.0 {
            daily_performance = (daily_performance + 0.15).min(1.0);
        }

        let strength = sigmoid(m.rs_rating, 0.5, 1.5, 2.0, true);
        let accumulation = sigmoid(m.ud_ratio, 0.7, 2.5, 1.5, true);

        // Pullback
        let distances = [
            m.distance_from_ema10,
            m.distance_from_ema20,
            m.distance_from_ema50,
        ];
        let slopes = [
            ema_slope(m.ema10, m.ema10_prev5),
            ema_slope(m.ema20, m.ema20_prev5),
            ema_slope(m.ema50, m.ema50_prev5),
        ];
        let mut raw_pullback: f64 = (0..3)
            .map(|i| {
                self.pullback_sub_score(distances[i], IDEAL_PULLBACK_MAX[i], slopes[i])
                    * PULLBACK_BLEND[i]
            })
            .sum();

        let ema200_valid = m.ema200.is_finite() && m.ema200 > 0.0;
        let bullish = m.price > m.ema50
            && m.ema10 > m.ema20
            && m.ema20 > m.ema50
            && (!ema200_valid || m.ema50 > m.ema200);
        let rs_slope_score = sigmoid(m.rs_line_slope * 100.0, 0.0, 15.0, 1.0, false);
        let coiled = (m.ema10 - m.ema20).abs() / m.atr < 0.5;
        let bouncing = m.distance_from_ema10 >= 0.0;
        if bullish && coiled && bouncing && rs_slope_score > 0.8 {
            raw_pullback += COIL_BONUS;
        }
        let pullback = raw_pullback.clamp(0.0, 1.0);

        // Risk: nearest support below price, else nearest resistance above
        let nearest_support = distances
            .iter()
            .copied()
            .filter(|d| *d >= 0.0)
            .map(OrderedFloat)
            .min();
        let risk = match nearest_support {
            Some(OrderedFloat(support)) => {
                let window = if bullish { 4.0 } else { 3.0 };
                1.0 - sigmoid(support, 0.0, window, 1.5, false)
            }
            None => {
                let nearest_resistance = distances
                    .iter()
                    .copied()
                    .map(OrderedFloat)
                    .max()
                    .map_or(-5.0, |d| d.0);
                0.2 * sigmoid(nearest_resistance, -5.0, 0.0, 1.0, false)
            }
        }
        .clamp(0.0, 1.0);

        // RS momentum, rewarded when diverging from a flat or falling benchmark
        let rs_boost = if bench_change <= 0.0 && m.rs_line_slope > 0.0 {
            1.25
        } else {
            1.0
        };
        let rs_momentum = (rs_slope_score * rs_boost).min(1.0);

        let composite = daily_performance * weights.daily_performance
            + strength * weights.strength
            + accumulation * weights.accumulation
            + pullback * weights.pullback
            + risk * weights.risk
            + rs_momentum * weights.rs_line_momentum;

        let adr_penalty = if m.percent_adr > 20.0 {
            0.85
        } else if m.percent_adr < 1.5 {
            0.9
        } else {
            1.0
        };
        let min_price = self.config.min_price;
        let price_penalty = if m.price >= min_price {
            1.0
        } else if m.price >= 1.0 {
            0.7 + 0.3 * (m.price - 1.0) / (min_price - 1.0)
        } else {
            0.6
        };

        let final_fraction = (composite * adr_penalty * price_penalty).clamp(0.0, 1.0);
        let score = if final_fraction.is_finite() {
            (final_fraction * 100.0).round() as u8
        } else {
            0
        };

        ScoreBreakdown {
            daily_performance,
            strength,
            accumulation,
            pullback,
            risk,
            rs_momentum,
            weights,
            composite,
            adr_penalty,
            price_penalty,
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use quantrank_core::VolatilitySnapshot;

    fn healthy_metrics() -> StockMetrics {
        StockMetrics {
            price: 50.0,
            high: 50.5,
            low: 49.0,
            percent_change: 1.0,
            rs_rating: 1.3,
            ud_ratio: 2.0,
            percent_adr: 3.0,
            atr: 1.5,
            distance_from_ema10: 0.5,
            distance_from_ema20: 1.5,
            distance_from_ema50: 3.5,
            ema10: 49.75,
            ema20: 49.26,
            ema50: 48.31,
            ema200: 44.0,
            ema10_prev5: 49.0,
            ema20_prev5: 48.6,
            ema50_prev5: 47.9,
            rs_line_slope: 0.12,
        }
    }

    fn neutral_context() -> MarketContext {
        let mut ctx = MarketContext::fallback();
        ctx.volatility = VolatilitySnapshot::flat(18.0);
        ctx
    }

    #[test]
    fn test_pullback_sub_score_windows() {
        let scorer = QuantScorer::default();
        let flat = 0.003;
        assert_eq!(scorer.pullback_sub_score(0.0, 1.5, flat), 1.0);
        assert_eq!(scorer.pullback_sub_score(-0.5, 1.5, flat), 1.0);
        // 1.5 above a 1.5 window decays over 3.0
        assert_relative_eq!(scorer.pullback_sub_score(3.0, 1.5, flat), 0.5);
        // 1.0 below tolerance: 1 - 1/2
        assert_relative_eq!(scorer.pullback_sub_score(-1.5, 1.5, flat), 0.5);
        assert_eq!(scorer.pullback_sub_score(-5.0, 1.5, flat), 0.0);
        // Slope multipliers
        assert_relative_eq!(scorer.pullback_sub_score(0.0, 1.5, 0.01), 1.2);
        assert_relative_eq!(scorer.pullback_sub_score(0.0, 1.5, -0.01), 0.5);
        assert_relative_eq!(scorer.pullback_sub_score(0.0, 1.5, 0.0005), 0.8);
    }

    #[test]
    fn test_healthy_pullback_scores_high() {
        let scorer = QuantScorer::default();
        let b = scorer.score_breakdown(&healthy_metrics(), &neutral_context());
        assert_eq!(b.pullback, 1.0);
        assert!(b.score >= 70, "score {}", b.score);
        assert!(b.score <= 100);
        assert_eq!(b.adr_penalty, 1.0);
        assert_eq!(b.price_penalty, 1.0);
    }

    #[test]
    fn test_below_all_emas_caps_risk() {
        let scorer = QuantScorer::default();
        let metrics = StockMetrics {
            distance_from_ema10: -2.0,
            distance_from_ema20: -3.0,
            distance_from_ema50: -6.0,
            ..healthy_metrics()
        };
        let b = scorer.score_breakdown(&metrics, &neutral_context());
        assert!(b.risk <= 0.2);
        // Nearest resistance is -2.0
        assert_relative_eq!(b.risk, 0.2 * sigmoid(-2.0, -5.0, 0.0, 1.0, false));
    }

    #[test]
    fn test_sanitize_defaults() {
        let scorer = QuantScorer::default();
        let metrics = StockMetrics {
            price: f64::NAN,
            rs_rating: f64::INFINITY,
            ud_ratio: f64::NAN,
            atr: -1.0,
            percent_change: 45.0,
            distance_from_ema20: -50.0,
            ema200: f64::NAN,
            ..healthy_metrics()
        };
        let s = scorer.sanitize(&metrics);
        assert_eq!(s.price, 5.0);
        assert_eq!(s.rs_rating, 1.0);
        assert_eq!(s.ud_ratio, 1.0);
        assert_eq!(s.atr, 0.0001);
        assert_eq!(s.percent_change, 20.0);
        assert_eq!(s.distance_from_ema20, -10.0);
        assert!(scorer.score(&metrics, &neutral_context()) <= 100);
    }

    #[test]
    fn test_price_and_adr_penalties() {
        let scorer = QuantScorer::default();
        let ctx = neutral_context();
        let cheap = StockMetrics {
            price: 3.0,
            ..healthy_metrics()
        };
        assert_relative_eq!(scorer.score_breakdown(&cheap, &ctx).price_penalty, 0.85, epsilon = 1e-12);
        let penny = StockMetrics {
            price: 0.5,
            ..healthy_metrics()
        };
        assert_eq!(scorer.score_breakdown(&penny, &ctx).price_penalty, 0.6);
        let wild = StockMetrics {
            percent_adr: 25.0,
            ..healthy_metrics()
        };
        assert_eq!(scorer.score_breakdown(&wild, &ctx).adr_penalty, 0.85);
        let sleepy = StockMetrics {
            percent_adr: 1.0,
            ..healthy_metrics()
        };
        assert_eq!(scorer.score_breakdown(&sleepy, &ctx).adr_penalty, 0.9);
    }

    #[test]
    fn test_down_market_bonus() {
        let scorer = QuantScorer::default();
        let mut ctx = neutral_context();
        let d0 = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let bar = |d: u32, close: f64| quantrank_core::DailyBar {
            date: d0 + chrono::Duration::days(d as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        };
        ctx.benchmark_bars = vec![bar(0, 100.0), bar(1, 97.0)];
        let b = scorer.score_breakdown(&healthy_metrics(), &ctx);
        let base = sigmoid(1.0 + 3.0, -3.0, 3.0, 2.0, true);
        assert_relative_eq!(b.daily_performance, (base + 0.15).min(1.0));
        // Rising RS line against a falling benchmark gets the divergence boost
        assert!(b.rs_momentum >= sigmoid(12.0, 0.0, 15.0, 1.0, false));
    }

    #[test]
    fn test_score_is_idempotent() {
        let scorer = QuantScorer::default();
        let ctx = neutral_context();
        let m = healthy_metrics();
        assert_eq!(scorer.score_breakdown(&m, &ctx), scorer.score_breakdown(&m, &ctx));
    }
}
