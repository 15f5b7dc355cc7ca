//! Daily history sanitation.
//!
//! Providers occasionally return unordered, duplicated or partially empty
//! bars; everything downstream assumes strictly increasing dates.

use chrono::NaiveDate;
use quantrank_core::DailyBar;
use std::collections::BTreeMap;

/// Sort bars by date, drop non-finite bars and keep the last bar seen per date.
pub fn sanitize_history(bars: Vec<DailyBar>) -> Vec<DailyBar> {
    let mut by_date: BTreeMap<NaiveDate, DailyBar> = BTreeMap::new();
    for bar in bars {
        if bar.is_finite() {
            by_date.insert(bar.date, bar);
        }
    }
    by_date.into_values().collect()
}

/// Close prices in bar order.
pub fn close_series(bars: &[DailyBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Fractional return of the last close over the close `days` bars earlier.
///
/// Returns `None` unless there are more than `days` bars.
pub fn trailing_return(bars: &[DailyBar], days: usize) -> Option<f64> {
    let n = bars.len();
    if n <= days {
        return None;
    }
    let old = bars[n - 1 - days].close;
    let current = bars[n - 1].close;
    Some((current - old) / old)
}
