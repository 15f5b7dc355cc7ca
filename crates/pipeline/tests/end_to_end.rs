//! End-to-end ranking scenarios over synthetic histories.

use chrono::{Duration, NaiveDate};
use quantrank_core::{
    Config, DailyBar, MarketContext, PredictionRegime, PredictorInput, VolatilitySnapshot,
};
use quantrank_features::FeatureEngine;
use quantrank_ingestion::build_market_context;
use quantrank_pipeline::{Ranker, SnapshotProvider};
use quantrank_scoring::{IntradayPredictor, QuantScorer};

/// Zero-range bars whose closes follow `close(i)`.
fn bars(n: usize, close: impl Fn(usize) -> f64) -> Vec<DailyBar> {
    let d0 = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
    (0..n)
        .map(|i| {
            let c = close(i);
            DailyBar {
                date: d0 + Duration::days(i as i64),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 10_000.0,
            }
        })
        .collect()
}

fn flat_benchmark_context() -> MarketContext {
    build_market_context(bars(300, |_| 100.0), VolatilitySnapshot::flat(18.0)).unwrap()
}

fn uptrend() -> Vec<DailyBar> {
    bars(300, |i| 50.0 + i as f64 * 0.25)
}

#[test]
fn test_linear_uptrend_against_flat_benchmark() {
    let context = flat_benchmark_context();
    assert!(!context.is_fallback);

    let features = FeatureEngine::new(50).compute(&uptrend(), &context).unwrap();
    assert!(features.relative_strength.rating > 1.0);
    assert!(features.relative_strength.line_slope > 0.0);

    // Price rides just above EMA10 in a steady trend
    let metrics = features.to_stock_metrics();
    assert!(metrics.distance_from_ema10 > 0.0 && metrics.distance_from_ema10 < 1.5);

    let breakdown = QuantScorer::default().score_breakdown(&metrics, &context);
    assert!(breakdown.pullback > 0.95, "pullback {}", breakdown.pullback);
    assert!(breakdown.score > 60, "score {}", breakdown.score);
}

#[test]
fn test_ranking_orders_and_skips() {
    let context = flat_benchmark_context();
    let mut provider = SnapshotProvider::default();
    provider.insert("TREND", uptrend());
    provider.insert("FADE", bars(300, |i| 150.0 - i as f64 * 0.25));
    provider.insert("YOUNG", bars(30, |i| 50.0 + i as f64));

    let tickers: Vec<String> = ["FADE", "TREND", "YOUNG", "DELISTED"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let results = Ranker::new(&Config::default()).rank_universe(&provider, &tickers, &context, 390.0);

    let order: Vec<&str> = results.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(order, vec!["TREND", "FADE"]);
    assert!(results[0].score > results[1].score);
    assert!(results[0].rs_rating > 1.0);
    assert!(results[1].rs_rating < 1.0);
    assert!(results[0].rs_raw_score > 0.0);
    assert!(results[1].rs_raw_score < 0.0);
}

#[test]
fn test_fallback_context_still_ranks() {
    let mut provider = SnapshotProvider::default();
    provider.insert("TREND", uptrend());
    let results = Ranker::new(&Config::default()).rank_universe(
        &provider,
        &["TREND".to_string()],
        &MarketContext::fallback(),
        120.0,
    );
    assert_eq!(results.len(), 1);
    assert!(results[0].score <= 100);
    // No shared dates with the fallback benchmark: RS line metrics default to 0
    assert_eq!(results[0].rs_one_day_change_pct, 0.0);
}

#[test]
fn test_zero_open_is_invalid_input() {
    let input = PredictorInput {
        open_price: 0.0,
        current_price: 100.0,
        prev_close: 100.0,
        vwap: None,
        relative_volume: 1.0,
        percent_adr: 2.0,
        minutes_since_open: 120.0,
        roc: 0.0,
        gap_percent: 0.0,
        atr14: None,
        atr14_mean: None,
        atr14_std: None,
        vix_pct_change: 0.0,
        vix_level: None,
        today_high: None,
        today_low: None,
    };
    let out = IntradayPredictor::default().predict(&input);
    assert_eq!(out.regime, PredictionRegime::InvalidInput);
    assert_eq!(out.predicted_eod_change_pct, 0.0);
    assert_eq!(out.lower_bound_pct, 0.0);
    assert_eq!(out.upper_bound_pct, 0.0);
    assert_eq!(out.confidence_level, 0.0);
}
