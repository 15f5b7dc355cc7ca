//! Per-bar chart indicator panel.
//!
//! Uses the SMA-seeded EMA and Wilder ATR, unlike the scorer.

use crate::series::{atr, ema, rolling_std, sma, AtrSmoothing, EmaSeed};
use crate::squeeze::panel_squeeze;
use chrono::NaiveDate;
use quantrank_core::{DailyBar, SqueezeLabel};
use serde::{Deserialize, Serialize};

/// Indicator values for one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelPoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub ema10: Option<f64>,
    pub ema20: Option<f64>,
    pub ema50: Option<f64>,
    pub ema200: Option<f64>,
    /// Binary High/No squeeze.
    pub squeeze: SqueezeLabel,
}

/// Build the indicator panel for a sanitized history.
pub fn indicator_panel(bars: &[DailyBar]) -> Vec<PanelPoint> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();

    let ema10 = ema(&closes, 10, EmaSeed::SmaSeeded);
    let ema20 = ema(&closes, 20, EmaSeed::SmaSeeded);
    let ema50 = ema(&closes, 50, EmaSeed::SmaSeeded);
    let ema200 = ema(&closes, 200, EmaSeed::SmaSeeded);
    let sma20 = sma(&closes, 20);
    let std20 = rolling_std(&closes, 20);
    let atr20 = atr(&highs, &lows, &closes, 20, AtrSmoothing::Wilder);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| PanelPoint {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            ema10: ema10[i],
            ema20: ema20[i],
            ema50: ema50[i],
            ema200: ema200[i],
            squeeze: panel_squeeze(sma20[i], std20[i], ema20[i], atr20[i]),
        })
        .collect()
}
