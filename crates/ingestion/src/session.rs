//! Session clock and intraday volume projection.

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use quantrank_core::SESSION_MINUTES;

/// Regular-session open, minutes after midnight exchange-local time (09:30).
const OPEN_MINUTE_OF_DAY: u32 = 9 * 60 + 30;
/// Regular-session close, minutes after midnight exchange-local time (16:00).
const CLOSE_MINUTE_OF_DAY: u32 = 16 * 60;

/// Standardized U-shaped cumulative intraday volume profile.
///
/// One entry per minute for the first 15 minutes, then one per 5 minutes.
pub const CUMULATIVE_VOLUME_PROFILE: &[f64] = &[
    0.008, 0.016, 0.024, 0.032, 0.040,
    0.047, 0.054, 0.061, 0.068, 0.075,
    0.081, 0.087, 0.093, 0.099, 0.105,
    0.130, 0.153, 0.173, 0.191, 0.208, 0.224,
    0.239, 0.253, 0.266, 0.279, 0.291, 0.303, 0.315, 0.327,
    0.339, 0.350, 0.361, 0.372, 0.383, 0.394, 0.405, 0.416, 0.427, 0.438,
    0.449, 0.460, 0.471, 0.482, 0.493, 0.504, 0.515, 0.526, 0.537, 0.548,
    0.559, 0.570, 0.581, 0.592, 0.603, 0.614, 0.625, 0.636, 0.647, 0.658,
    0.669, 0.680, 0.691, 0.702, 0.713, 0.724, 0.735, 0.746, 0.757, 0.768,
    0.779, 0.790, 0.801, 0.812, 0.823, 0.834, 0.845, 0.856, 0.867, 0.878,
    0.889, 0.900, 0.912, 0.924, 0.936, 0.948, 0.962, 0.978, 1.000, 1.000,
];

/// Minutes since the regular-session open for an exchange-local timestamp.
///
/// Weekends and times outside 09:30-16:00 report a complete session (390).
pub fn minutes_since_open(local: NaiveDateTime) -> f64 {
    if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
        return SESSION_MINUTES;
    }
    let minute_of_day = local.hour() * 60 + local.minute();
    if (OPEN_MINUTE_OF_DAY..CLOSE_MINUTE_OF_DAY).contains(&minute_of_day) {
        (minute_of_day - OPEN_MINUTE_OF_DAY) as f64
    } else {
        SESSION_MINUTES
    }
}

/// Fraction of a typical session's volume traded after `minutes_since_open`.
fn fraction_complete(minutes_since_open: f64) -> f64 {
    let last = CUMULATIVE_VOLUME_PROFILE.len() - 1;
    let idx = if minutes_since_open < 15.0 {
        minutes_since_open.floor().clamp(0.0, 14.0) as usize
    } else {
        (15 + ((minutes_since_open - 15.0) / 5.0).floor() as usize).min(last)
    };
    CUMULATIVE_VOLUME_PROFILE[idx].clamp(0.001, 1.0)
}

/// Current volume extrapolated to a full session, relative to the average volume.
pub fn projected_relative_volume(current_volume: f64, avg_volume: f64, minutes_since_open: f64) -> f64 {
    if avg_volume == 0.0 {
        return 0.0;
    }
    if minutes_since_open >= SESSION_MINUTES {
        return current_volume / avg_volume;
    }
    let projected = current_volume / fraction_complete(minutes_since_open);
    (projected / avg_volume).max(0.0)
}
