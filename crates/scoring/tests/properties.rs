//! Property-based tests using proptest
//!
//! These tests verify invariants of the scorer, weights and predictor.

use proptest::prelude::*;
use quantrank_core::{
    MarketContext, PredictionRegime, PredictorInput, StockMetrics, VolatilitySnapshot,
};
use quantrank_scoring::{normalize_weights, IntradayPredictor, QuantScorer};

/// Mostly ordinary values with the occasional non-finite one.
fn messy_f64() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -1.0e4..1.0e4f64,
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
        1 => Just(f64::NEG_INFINITY),
    ]
}

prop_compose! {
    fn arb_metrics()(
        head in prop::array::uniform8(messy_f64()),
        emas in prop::array::uniform8(messy_f64()),
        tail in prop::array::uniform3(messy_f64()),
    ) -> StockMetrics {
        StockMetrics {
            price: head[0],
            high: head[1],
            low: head[2],
            percent_change: head[3],
            rs_rating: head[4],
            ud_ratio: head[5],
            percent_adr: head[6],
            atr: head[7],
            distance_from_ema10: emas[0],
            distance_from_ema20: emas[1],
            distance_from_ema50: emas[2],
            ema10: emas[3],
            ema20: emas[4],
            ema50: emas[5],
            ema200: emas[6],
            ema10_prev5: emas[7],
            ema20_prev5: tail[0],
            ema50_prev5: tail[1],
            rs_line_slope: tail[2],
        }
    }
}

prop_compose! {
    fn arb_volatility()(
        price in messy_f64(),
        previous_close in messy_f64(),
        reference_price in messy_f64(),
    ) -> VolatilitySnapshot {
        VolatilitySnapshot { price, previous_close, reference_price }
    }
}

prop_compose! {
    fn arb_open_market_input()(
        open_price in 1.0..1000.0f64,
        current_price in 1.0..1000.0f64,
        prev_close in 1.0..1000.0f64,
        vwap in prop::option::of(1.0..1000.0f64),
        relative_volume in 0.0..50.0f64,
        percent_adr in 0.1..30.0f64,
        minutes_since_open in 0.0..389.9f64,
        roc in -10.0..10.0f64,
        gap_percent in -80.0..80.0f64,
        atr14 in prop::option::of(0.0..50.0f64),
        atr14_mean in prop::option::of(0.0..50.0f64),
        atr14_std in prop::option::of(0.0..10.0f64),
        vix_pct_change in -100.0..100.0f64,
        vix_level in prop::option::of(5.0..80.0f64),
        today_high in prop::option::of(1.0..1000.0f64),
        today_low in prop::option::of(1.0..1000.0f64),
    ) -> PredictorInput {
        PredictorInput {
            open_price, current_price, prev_close, vwap, relative_volume, percent_adr,
            minutes_since_open, roc, gap_percent, atr14, atr14_mean, atr14_std,
            vix_pct_change, vix_level, today_high, today_low,
        }
    }
}

proptest! {
    #[test]
    fn prop_score_bounded(metrics in arb_metrics(), vol in arb_volatility()) {
        let mut ctx = MarketContext::fallback();
        ctx.volatility = vol;
        let score = QuantScorer::default().score(&metrics, &ctx);
        prop_assert!(score <= 100);
    }

    #[test]
    fn prop_score_deterministic(metrics in arb_metrics()) {
        let ctx = MarketContext::fallback();
        let scorer = QuantScorer::default();
        prop_assert_eq!(scorer.score(&metrics, &ctx), scorer.score(&metrics, &ctx));
    }

    #[test]
    fn prop_normalized_weights_sum_to_one(weights in prop::array::uniform6(0.0..10.0f64)) {
        let normalized = normalize_weights(weights);
        let total: f64 = normalized.iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
        prop_assert!(normalized.iter().all(|w| *w >= 0.0));
    }

    #[test]
    fn prop_prediction_inside_bounds(input in arb_open_market_input()) {
        let out = IntradayPredictor::default().predict(&input);
        let is_open = matches!(out.regime, PredictionRegime::Open { .. });
        prop_assert!(is_open);
        prop_assert!(out.lower_bound_pct <= out.predicted_eod_change_pct);
        prop_assert!(out.predicted_eod_change_pct <= out.upper_bound_pct);
        prop_assert!((0.5..=0.9).contains(&out.confidence_level));
    }

    #[test]
    fn prop_closed_session_is_point_prediction(
        input in arb_open_market_input(),
        minutes in 390.0..2000.0f64,
    ) {
        let input = PredictorInput { minutes_since_open: minutes, ..input };
        let out = IntradayPredictor::default().predict(&input);
        prop_assert_eq!(out.regime, PredictionRegime::Closed);
        prop_assert_eq!(out.lower_bound_pct, out.predicted_eod_change_pct);
        prop_assert_eq!(out.upper_bound_pct, out.predicted_eod_change_pct);
        prop_assert_eq!(out.confidence_level, 1.0);
    }
}
