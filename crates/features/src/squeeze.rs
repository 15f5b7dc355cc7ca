//! Squeeze (volatility compression) classification.
//!
//! Compares Bollinger bands against nested Keltner channels. Tight
//! Bollinger-inside-Keltner nesting precedes breakouts.

use crate::series::{atr, rolling_std, sma, AtrSmoothing};
use quantrank_core::{DailyBar, SqueezeLabel};

/// Upper/lower pair of a price band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub upper: f64,
    pub lower: f64,
}

impl Band {
    /// Band of `basis ± mult * width`.
    #[inline]
    pub fn around(basis: f64, width: f64, mult: f64) -> Self {
        Self {
            upper: basis + mult * width,
            lower: basis - mult * width,
        }
    }

    /// True if `self` lies within `outer` (edges inclusive).
    #[inline]
    pub fn fits_inside(&self, outer: &Band) -> bool {
        self.upper <= outer.upper && self.lower >= outer.lower
    }
}

/// Squeeze classifier configuration.
#[derive(Debug, Clone)]
pub struct SqueezeConfig {
    /// Window for SMA, standard deviation and the Keltner deviation.
    pub length: usize,
    /// Bollinger standard-deviation multiplier.
    pub bb_mult: f64,
    /// Keltner multipliers, narrowest first.
    pub kc_mults: [f64; 3],
}

impl Default for SqueezeConfig {
    fn default() -> Self {
        Self {
            length: 20,
            bb_mult: 2.0,
            kc_mults: [1.0, 1.5, 2.0],
        }
    }
}

/// Four-level classifier used by the ranking table (SMA basis for both bands).
#[derive(Debug, Clone, Default)]
pub struct SqueezeClassifier {
    config: SqueezeConfig,
}

impl SqueezeClassifier {
    /// Label a Bollinger band against Keltner channels ordered narrowest first.
    pub fn classify(bollinger: &Band, keltner: &[Band; 3]) -> SqueezeLabel {
        if !bollinger.fits_inside(&keltner[2]) {
            SqueezeLabel::No
        } else if bollinger.fits_inside(&keltner[0]) {
            SqueezeLabel::High
        } else if bollinger.fits_inside(&keltner[1]) {
            SqueezeLabel::Medium
        } else {
            SqueezeLabel::Low
        }
    }

    /// Label the last bar of a history.
    ///
    /// The Keltner deviation is the rolling-mean ATR over the same window.
    /// Histories shorter than the window are `No`.
    pub fn classify_last(&self, bars: &[DailyBar]) -> SqueezeLabel {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let len = self.config.length;

        let basis = sma(&closes, len).last().copied().flatten();
        let stdev = rolling_std(&closes, len).last().copied().flatten();
        let dev_kc = atr(&highs, &lows, &closes, len, AtrSmoothing::RollingMean)
            .last()
            .copied()
            .flatten();

        match (basis, stdev, dev_kc) {
            (Some(basis), Some(stdev), Some(dev_kc)) => {
                let bollinger = Band::around(basis, stdev, self.config.bb_mult);
                let keltner = self.config.kc_mults.map(|m| Band::around(basis, dev_kc, m));
                Self::classify(&bollinger, &keltner)
            }
            _ => SqueezeLabel::No,
        }
    }
}

/// Binary squeeze used by the indicator panel: SMA Bollinger inside an EMA-based
/// 1.5x Keltner channel is `High`, anything else (including warm-up) is `No`.
pub fn panel_squeeze(
    sma20: Option<f64>,
    std20: Option<f64>,
    ema20: Option<f64>,
    atr20: Option<f64>,
) -> SqueezeLabel {
    match (sma20, std20, ema20, atr20) {
        (Some(basis), Some(stdev), Some(kc_basis), Some(atr)) => {
            let bollinger = Band::around(basis, stdev, 2.0);
            let keltner = Band::around(kc_basis, atr, 1.5);
            if bollinger.fits_inside(&keltner) {
                SqueezeLabel::High
            } else {
                SqueezeLabel::No
            }
        }
        _ => SqueezeLabel::No,
    }
}
