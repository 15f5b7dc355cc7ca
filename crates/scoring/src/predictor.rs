//! Intraday end-of-day return predictor.
//!
//! Projects the total-day range from %ADR, ATR and volume, then spends the
//! part not yet realized in the direction the intraday signals point,
//! damped by gap-hold, volatility regime and remaining session time.
//!
//! State machine: `InvalidInput` and `Closed` are terminal; every other
//! input is an open-market prediction.

use crate::regime::{vix_regime, volatility_multiplier, volatility_regime, SessionPhase, SignalWeights};
use quantrank_core::config::PredictorParams;
use quantrank_core::{
    round_to, GapDirection, PredictionRegime, PredictorInput, PredictorOutput, RangeBreakdown,
    VolatilityRegime, SESSION_MINUTES,
};

/// |gap| in percent above which a gap is significant.
const SIGNIFICANT_GAP_PCT: f64 = 2.0;
/// Relative volume above which volume is high.
const HIGH_VOLUME: f64 = 2.0;
/// Hard clamp of the ATR z-score inside the range projection.
const RANGE_Z_CLAMP: f64 = 3.0;

/// Sign as -1, 0 or 1 (zero stays zero).
#[inline]
fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Finite value or a default.
#[inline]
fn finite_or(value: f64, default: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        default
    }
}

/// Projected total-day range with its ATR z-score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedRange {
    /// Fraction of the previous close.
    pub projected: f64,
    pub atr_z_score: Option<f64>,
    pub breakdown: RangeBreakdown,
}

/// Blend ATR and %ADR into a projected range, scaled by volume and floored by the gap.
pub fn projected_range(
    percent_adr: f64,
    atr14: Option<f64>,
    atr14_mean: Option<f64>,
    atr14_std: Option<f64>,
    current_price: f64,
    volume_multiplier: f64,
    gap_percent: f64,
    atr_weight: f64,
) -> ProjectedRange {
    let adr = percent_adr / 100.0;
    let mut atr_z_score = None;
    let mut atr_range = 0.0;

    if let (Some(atr), Some(mean), Some(std)) = (atr14, atr14_mean, atr14_std) {
        if atr.is_finite() && mean.is_finite() && std.is_finite() && std > 0.0 {
            let z = ((atr - mean) / std).clamp(-RANGE_Z_CLAMP, RANGE_Z_CLAMP);
            let scaler = (1.0 + z * 0.2).clamp(0.6, 1.6);
            atr_range = atr / current_price * scaler;
            atr_z_score = Some(z);
        }
    }

    let base = if atr_range > 0.0 {
        (atr_range * atr_weight + adr * (1.0 - atr_weight)).max(adr * 0.5)
    } else {
        atr_range = adr;
        adr
    };

    let gap_floored = (base * volume_multiplier).max((gap_percent / 100.0).abs());
    let projected = gap_floored.clamp(adr * 0.3, adr * 12.0);

    ProjectedRange {
        projected,
        atr_z_score,
        breakdown: RangeBreakdown {
            adr_component: adr,
            atr_component: atr_range,
            final_projected: projected,
        },
    }
}

/// How well a gap is holding: 1 while price stays beyond the threshold in the
/// gap direction, decaying with deterioration (floor 0.2) otherwise.
pub fn hold_factor(
    gap_percent: f64,
    price_vs_open: f64,
    price_vs_vwap: Option<f64>,
    params: &PredictorParams,
) -> f64 {
    if gap_percent.abs() < 1.0 {
        return 1.0;
    }
    let gap_up = gap_percent > 0.0;
    let level = match price_vs_vwap {
        Some(vwap) if gap_up => price_vs_open.min(vwap),
        Some(vwap) => price_vs_open.max(vwap),
        None => price_vs_open,
    };
    let holding = if gap_up {
        level >= -params.hold_threshold
    } else {
        level <= params.hold_threshold
    };
    if holding {
        return 1.0;
    }
    let deterioration = level.abs() / ((gap_percent / 100.0).abs() + 1e-6);
    (1.0 - deterioration * params.hold_factor_decay).max(0.2)
}

/// Remaining-time damping of the directional move, widened on heavy volume
/// (relative volume above 3) by a log-scaled bonus.
pub fn time_decay(remaining: f64, relative_volume: f64, params: &PredictorParams) -> f64 {
    let decay = remaining.powf(params.time_decay_alpha);
    if relative_volume > 3.0 {
        let boost = params
            .max_volume_boost
            .min((relative_volume / 3.0).log10() * 0.2);
        decay * (1.0 + boost.max(0.0))
    } else {
        decay
    }
}

/// Predictor inputs after defaults and clamps.
#[derive(Debug, Clone, Copy)]
struct Sanitized {
    relative_volume: f64,
    roc: f64,
    gap_percent: f64,
    vix_pct_change: f64,
    vix_level: Option<f64>,
    minutes: f64,
}

impl Sanitized {
    fn from_input(input: &PredictorInput) -> Self {
        let computed_gap = ((input.open_price - input.prev_close) / input.prev_close * 100.0)
            .clamp(-50.0, 50.0);
        // A supplied zero gap against a real computed gap is an upstream default.
        let gap_percent = if input.gap_percent.is_finite() {
            let supplied = input.gap_percent.clamp(-50.0, 50.0);
            if supplied == 0.0 && computed_gap.abs() > 0.01 {
                computed_gap
            } else {
                supplied
            }
        } else {
            computed_gap
        };

        Self {
            relative_volume: finite_or(input.relative_volume, 1.0).clamp(0.1, 20.0),
            roc: finite_or(input.roc, 0.0).clamp(-5.0, 5.0),
            gap_percent,
            vix_pct_change: finite_or(input.vix_pct_change, 0.0).clamp(-50.0, 50.0),
            vix_level: input.vix_level.filter(|v| v.is_finite()),
            minutes: finite_or(input.minutes_since_open, 0.0).clamp(0.0, SESSION_MINUTES),
        }
    }
}

/// Projects a ticker's end-of-day return from intraday action.
#[derive(Debug, Clone, Default)]
pub struct IntradayPredictor {
    params: PredictorParams,
}

impl IntradayPredictor {
    /// Create a predictor with the given calibration.
    pub fn new(params: PredictorParams) -> Self {
        Self { params }
    }

    /// Predict the EOD change with a confidence band.
    pub fn predict(&self, input: &PredictorInput) -> PredictorOutput {
        let p = &self.params;
        let (open, current, prev, adr_pct) = (
            input.open_price,
            input.current_price,
            input.prev_close,
            input.percent_adr,
        );
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !(usable(open) && usable(current) && usable(prev) && usable(adr_pct)) {
            return PredictorOutput::invalid_input();
        }

        let s = Sanitized::from_input(input);
        if s.minutes >= SESSION_MINUTES {
            return PredictorOutput::closed(round_to((current - prev) / prev * 100.0, 2));
        }

        let gap_dir = sign(s.gap_percent);
        let adr = adr_pct / 100.0;
        let return_so_far = (current - prev) / prev;
        let (high, low) = (
            input.today_high.filter(|v| v.is_finite()),
            input.today_low.filter(|v| v.is_finite()),
        );
        let realized_range = match (high, low) {
            (Some(h), Some(l)) if h > 0.0 && l > 0.0 => (h - l).max(0.0) / prev,
            _ => return_so_far.abs(),
        };
        let remaining = ((SESSION_MINUTES - s.minutes) / SESSION_MINUTES).clamp(0.0, 1.0);
        let volume_multiplier =
            (1.0 + s.relative_volume.max(0.1).ln()).clamp(p.vm_floor, p.vm_ceil);

        let range = projected_range(
            adr_pct,
            input.atr14,
            input.atr14_mean,
            input.atr14_std,
            current,
            volume_multiplier,
            s.gap_percent,
            p.atr_weight,
        );
        let projected = range.projected;
        let z = range
            .atr_z_score
            .map(|z| z.clamp(-p.atr_zscore_cap, p.atr_zscore_cap));
        let abs_z = z.map(f64::abs);

        let price_vs_open = (current - open) / open;
        let price_vs_vwap = input
            .vwap
            .filter(|v| *v > 0.0)
            .map(|vwap| (current - vwap) / vwap);

        // Intraday signal
        let significant_gap = s.gap_percent.abs() > SIGNIFICANT_GAP_PCT;
        let high_volume = s.relative_volume > HIGH_VOLUME;
        let phase = SessionPhase::from_progress((s.minutes / SESSION_MINUTES).clamp(0.0, 1.0));
        let weights = SignalWeights::lookup(phase, significant_gap, high_volume);

        let roc_cumulative = s.roc * s.minutes.max(1.0);
        let roc_influence = if s.gap_percent.abs() < SIGNIFICANT_GAP_PCT || high_volume {
            roc_cumulative
        } else {
            roc_cumulative * 0.25
        };
        let roc_signal = roc_influence.clamp(-10.0, 10.0).tanh();

        let (intraday_raw, roc_weight) = match price_vs_vwap {
            Some(vs_vwap) => {
                let mut bias = 0.0;
                if vs_vwap < 0.0 && price_vs_open < 0.0 {
                    bias -= p.perf_bias_weak;
                    if s.roc <= 0.0 {
                        bias -= p.perf_bias_weak;
                    }
                } else if vs_vwap >= 0.0 && price_vs_open >= 0.0 {
                    bias += p.perf_bias_strong;
                    if s.roc >= 0.0 {
                        bias += p.perf_bias_strong;
                    }
                }
                let raw = price_vs_open * weights.open
                    + vs_vwap * weights.vwap
                    + roc_signal * weights.roc
                    + bias;
                (raw, weights.roc)
            }
            None => {
                let w = weights.without_vwap();
                (price_vs_open * w.open + roc_signal * w.roc, weights.roc)
            }
        };

        // Regime, hold and momentum
        let vix = vix_regime(s.vix_level);
        let vol_mult = volatility_multiplier(vix, s.vix_pct_change, z);
        let hold = hold_factor(s.gap_percent, price_vs_open, price_vs_vwap, p);

        let aligned = sign(s.roc) == gap_dir;
        let momentum_strength = (s.roc.abs() / p.momentum_strong_roc.max(1e-6)).clamp(0.0, 1.0);
        let time_factor = 0.5 + 0.5 * remaining;
        let base_boost = (if aligned { 0.2 } else { 0.1 }) * momentum_strength * time_factor;
        let momentum_boost = 1.0 + base_boost * (1.0 - roc_weight);

        let score = (intraday_raw * p.intraday_tanh_scale).tanh() * hold * vol_mult;
        let adjusted_score = score * momentum_boost;

        let decay = time_decay(remaining, s.relative_volume, p);
        let remaining_potential = (projected - realized_range).max(0.0);
        let mut predicted = return_so_far + remaining_potential * adjusted_score * decay;

        // Caps
        let crossed_against = price_vs_vwap.is_some_and(|v| gap_dir * v < 0.0);
        let failed_gap = significant_gap
            && high_volume
            && crossed_against
            && s.minutes > p.failed_gap_minutes;

        let mut base_cap = (s.gap_percent / 100.0).abs().max(adr * p.adr_cap_multiple);
        if let Some(az) = abs_z.filter(|az| *az > p.extreme_volatility_threshold) {
            base_cap *= (1.0 + (az - p.extreme_volatility_threshold) * 0.25).min(2.5);
        }
        let cap = base_cap.clamp(adr * 0.3, adr * 12.0);

        let mut buffer = adr * (0.05 + (0.05 * s.relative_volume / 2.0).min(0.1));
        if let Some(az) = abs_z.filter(|az| *az > 1.0) {
            buffer *= 1.0 + az * 0.1;
        }
        buffer *= 1.0 + 0.5 * momentum_strength * time_factor * if aligned { 1.0 } else { 0.5 };

        let late_day = remaining < p.late_day_fraction;
        let strong_trend = aligned
            && !crossed_against
            && momentum_strength > 0.3
            && adjusted_score > 0.3
            && projected - realized_range > 0.0
            && price_vs_open.abs() > 0.01;

        let safe_high = high.unwrap_or(0.0);
        let safe_low = low.unwrap_or(0.0);
        let mut cap_up = gap_dir > 0.0 && safe_high > 0.0 && (!strong_trend || late_day);
        let mut cap_down = gap_dir < 0.0 && safe_low > 0.0 && (!strong_trend || late_day);
        if failed_gap {
            if gap_dir > 0.0 {
                cap_up = true;
            } else {
                cap_down = true;
            }
        }
        let high_cap = (safe_high * (1.0 + buffer) - prev) / prev;
        let low_cap = (safe_low * (1.0 - buffer) - prev) / prev;

        if cap_up {
            predicted = predicted.min(high_cap);
        }
        if cap_down {
            predicted = predicted.max(low_cap);
        }
        predicted = predicted.clamp(-cap, cap);

        // Confidence and interval
        let mut interval = projected * 0.4;
        let mut confidence: f64 = 0.8;
        match abs_z {
            Some(az) if az > 2.0 => {
                confidence -= 0.2;
                interval *= 1.5 + (az - 2.0) * 0.3;
            }
            Some(az) => interval *= 1.0 + az * 0.2,
            None => {}
        }
        let calm_z = abs_z.map_or(true, |az| az < 1.0);
        if s.relative_volume > 5.0 || s.relative_volume < 0.5 {
            confidence -= 0.1;
        }
        if s.vix_level.is_some_and(|v| v > 30.0) {
            confidence -= 0.1;
        }
        if failed_gap {
            confidence -= 0.15;
        }
        if s.relative_volume < 0.5 && calm_z {
            confidence -= 0.05;
        }
        if aligned
            && !crossed_against
            && momentum_strength > 0.3
            && s.vix_level.map_or(true, |v| v < 18.0)
            && calm_z
        {
            confidence += 0.03;
        }
        let confidence = confidence.clamp(0.5, 0.9);

        let volume_uncertainty = if s.relative_volume > 5.0 {
            1.3
        } else if s.relative_volume < 0.5 {
            1.4
        } else {
            1.0
        };
        let interval = (interval * vol_mult * volume_uncertainty).max(adr * 0.05);

        let mut lower = (predicted - interval).clamp(-cap, cap);
        let mut upper = (predicted + interval).clamp(-cap, cap);
        if cap_up && safe_high > 0.0 {
            upper = upper.min(high_cap);
        }
        if cap_down && safe_low > 0.0 {
            lower = lower.max(low_cap);
        }
        // High/low re-capping can cross the prediction on inconsistent inputs.
        let lower = lower.min(predicted);
        let upper = upper.max(predicted);

        let failed_direction = if !failed_gap {
            None
        } else if gap_dir > 0.0 {
            Some(GapDirection::Up)
        } else {
            Some(GapDirection::Down)
        };

        PredictorOutput {
            predicted_eod_change_pct: round_to(predicted * 100.0, 2),
            lower_bound_pct: round_to(lower * 100.0, 2),
            upper_bound_pct: round_to(upper * 100.0, 2),
            confidence_level: round_to(confidence, 2),
            regime: PredictionRegime::Open {
                vix,
                failed_gap: failed_direction,
            },
            atr_z_score: range.atr_z_score,
            volatility_regime: Some(z.map_or(VolatilityRegime::Normal, volatility_regime)),
            range_breakdown: Some(range.breakdown),
        }
    }
}
