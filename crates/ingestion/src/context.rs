//! Market-context assembly.
//!
//! Builds the immutable per-run [`MarketContext`] from benchmark history and a
//! volatility-index snapshot. Fetching either is the caller's concern.

use crate::history::{sanitize_history, trailing_return};
use quantrank_core::{
    BenchmarkPerformance, DailyBar, Error, MarketContext, Result, VolatilitySnapshot, RS_HORIZONS,
};
use tracing::{debug, warn};

/// Assemble a market context from benchmark bars and a volatility snapshot.
///
/// Horizons the benchmark history cannot cover contribute 0 %.
pub fn build_market_context(
    benchmark_bars: Vec<DailyBar>,
    volatility: VolatilitySnapshot,
) -> Result<MarketContext> {
    let benchmark_bars = sanitize_history(benchmark_bars);
    if benchmark_bars.is_empty() {
        return Err(Error::data("benchmark history is empty"));
    }
    if !(volatility.price.is_finite() && volatility.price > 0.0) {
        return Err(Error::data(format!(
            "volatility index level {} is unusable",
            volatility.price
        )));
    }

    let perf = RS_HORIZONS.map(|days| {
        trailing_return(&benchmark_bars, days).map_or(0.0, |r| r * 100.0)
    });
    let benchmark_close_by_date = benchmark_bars.iter().map(|b| (b.date, b.close)).collect();

    debug!(
        bars = benchmark_bars.len(),
        perf_3m = perf[0],
        vix = volatility.price,
        "market context assembled"
    );

    Ok(MarketContext {
        benchmark_bars,
        benchmark_close_by_date,
        benchmark_performance: BenchmarkPerformance::from_array(perf),
        volatility,
        is_fallback: false,
    })
}

/// Resolve a fetch outcome into a usable context, degrading to the neutral fallback.
pub fn resolve_context(fetched: Result<MarketContext>) -> MarketContext {
    match fetched {
        Ok(ctx) => ctx,
        Err(e) => {
            warn!(error = %e, "market context unavailable, using fallback");
            MarketContext::fallback()
        }
    }
}
