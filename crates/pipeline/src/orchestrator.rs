//! Per-ticker ranking and the batch runner.
//!
//! Each ticker is a pure function of its own history and one shared
//! [`MarketContext`], so the batch fans out across a rayon pool without
//! locking. A failing ticker is logged and omitted; it never aborts the batch.

use crate::provider::HistoryProvider;
use quantrank_core::{round_to, Config, DailyBar, MarketContext, RankedResult, Result};
use quantrank_features::FeatureEngine;
use quantrank_ingestion::sanitize_history;
use quantrank_scoring::{IntradayPredictor, QuantScorer};
use rayon::prelude::*;
use std::cmp::Ordering;
use tracing::{debug, info, warn};

/// Scores tickers into [`RankedResult`]s.
#[derive(Debug, Clone)]
pub struct Ranker {
    engine: FeatureEngine,
    scorer: QuantScorer,
    predictor: IntradayPredictor,
    workers: usize,
}

impl Ranker {
    /// Create a ranker from configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            engine: FeatureEngine::new(config.pipeline.min_history_bars),
            scorer: QuantScorer::new(config.scoring.clone(), config.weights),
            predictor: IntradayPredictor::new(config.predictor.clone()),
            workers: config.pipeline.workers,
        }
    }

    /// Score one ticker from its raw daily history.
    pub fn score_ticker(
        &self,
        ticker: &str,
        bars: Vec<DailyBar>,
        context: &MarketContext,
        minutes_since_open: f64,
    ) -> Result<RankedResult> {
        let bars = sanitize_history(bars);
        let features = self.engine.compute(&bars, context)?;

        let score = self.scorer.score(&features.to_stock_metrics(), context);
        let input = features.to_predictor_input(minutes_since_open, context);
        let prediction = self.predictor.predict(&input);

        Ok(RankedResult {
            score,
            ticker: ticker.to_string(),
            price: round_to(features.price, 2),
            percent_change: round_to(features.percent_change, 2),
            relative_volume: round_to(input.relative_volume, 2),
            predicted_change_pct: prediction.predicted_eod_change_pct,
            rs_one_day_change_pct: round_to(features.relative_strength.one_day_change * 100.0, 2),
            ud_ratio: round_to(features.ud_ratio, 2),
            squeeze: features.squeeze,
            atr: round_to(features.atr, 2),
            percent_adr: round_to(features.percent_adr, 2),
            ema10_distance_atr: round_to(features.distance_atr(features.ema10.value), 2),
            ema20_distance_atr: round_to(features.distance_atr(features.ema20.value), 2),
            ema50_distance_atr: round_to(features.distance_atr(features.ema50.value), 2),
            rs_rating: round_to(features.relative_strength.rating, 3),
            rs_raw_score: round_to(features.relative_strength.raw_score, 4),
        })
    }

    /// Fetch and score one ticker, logging and dropping any failure.
    fn rank_one<P: HistoryProvider>(
        &self,
        provider: &P,
        ticker: &str,
        context: &MarketContext,
        minutes_since_open: f64,
    ) -> Option<RankedResult> {
        let outcome = provider
            .daily_history(ticker)
            .and_then(|bars| self.score_ticker(ticker, bars, context, minutes_since_open));
        match outcome {
            Ok(result) => Some(result),
            Err(e) if e.is_insufficient_data() => {
                debug!(ticker, error = %e, "skipping ticker");
                None
            }
            Err(e) => {
                warn!(ticker, error = %e, "ticker failed");
                None
            }
        }
    }

    /// Rank a universe in parallel, best score first (ties by ticker).
    pub fn rank_universe<P: HistoryProvider>(
        &self,
        provider: &P,
        tickers: &[String],
        context: &MarketContext,
        minutes_since_open: f64,
    ) -> Vec<RankedResult> {
        if context.is_fallback {
            warn!("ranking against the fallback market context");
        }

        let run = || -> Vec<RankedResult> {
            tickers
                .par_iter()
                .filter_map(|t| self.rank_one(provider, t, context, minutes_since_open))
                .collect()
        };

        let mut results = if self.workers > 0 {
            match rayon::ThreadPoolBuilder::new().num_threads(self.workers).build() {
                Ok(pool) => pool.install(run),
                Err(e) => {
                    warn!(error = %e, workers = self.workers, "thread pool unavailable, using global pool");
                    run()
                }
            }
        } else {
            run()
        };

        results.sort_by(compare_ranked);
        info!(
            requested = tickers.len(),
            ranked = results.len(),
            skipped = tickers.len() - results.len(),
            top = results.first().map(|r| r.ticker.as_str()).unwrap_or("-"),
            "ranking complete"
        );
        results
    }
}

/// Score descending, then ticker ascending.
fn compare_ranked(a: &RankedResult, b: &RankedResult) -> Ordering {
    b.score.cmp(&a.score).then_with(|| a.ticker.cmp(&b.ticker))
}
