//! Sigmoid normalization of raw sub-score inputs.

/// Map `value`, clamped to `[min, max]`, onto (0, 1) through a logistic curve.
///
/// The clamped value is scaled linearly to [0, 1] and squashed around the
/// midpoint with `steepness`. With `asymmetric`, readings below the midpoint
/// use a 1.5x steeper curve so weakness is penalized harder than strength is
/// rewarded.
pub fn sigmoid(value: f64, min: f64, max: f64, steepness: f64, asymmetric: bool) -> f64 {
    if max == min {
        return if value == min {
            0.5
        } else if value > max {
            1.0
        } else {
            0.0
        };
    }
    let linear = (value.clamp(min, max) - min) / (max - min);
    let steepness = if asymmetric && linear < 0.5 {
        steepness * 1.5
    } else {
        steepness
    };
    1.0 / (1.0 + (-steepness * (linear - 0.5) * 10.0).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_midpoint_is_half() {
        assert_relative_eq!(sigmoid(0.0, -3.0, 3.0, 2.0, true), 0.5);
        assert_relative_eq!(sigmoid(1.0, 0.5, 1.5, 2.0, false), 0.5);
    }

    #[test]
    fn test_clamps_outside_range() {
        assert_eq!(sigmoid(100.0, 0.0, 1.0, 1.0, false), sigmoid(1.0, 0.0, 1.0, 1.0, false));
        assert_eq!(sigmoid(-100.0, 0.0, 1.0, 1.0, false), sigmoid(0.0, 0.0, 1.0, 1.0, false));
        // 1 / (1 + e^-5)
        assert_relative_eq!(sigmoid(1.0, 0.0, 1.0, 1.0, false), 1.0 / (1.0 + (-5.0f64).exp()));
    }

    #[test]
    fn test_asymmetric_penalizes_below_midpoint() {
        let sym = sigmoid(-1.5, -3.0, 3.0, 2.0, false);
        let asym = sigmoid(-1.5, -3.0, 3.0, 2.0, true);
        assert!(asym < sym);
        // Above the midpoint both agree
        assert_eq!(
            sigmoid(1.5, -3.0, 3.0, 2.0, false),
            sigmoid(1.5, -3.0, 3.0, 2.0, true)
        );
    }

    #[test]
    fn test_degenerate_range() {
        assert_eq!(sigmoid(2.0, 2.0, 2.0, 1.0, false), 0.5);
        assert_eq!(sigmoid(3.0, 2.0, 2.0, 1.0, false), 1.0);
        assert_eq!(sigmoid(1.0, 2.0, 2.0, 1.0, false), 0.0);
    }

    #[test]
    fn test_monotonic() {
        let mut prev = 0.0;
        for i in 0..=40 {
            let v = sigmoid(-4.0 + i as f64 * 0.2, -3.0, 3.0, 2.0, true);
            assert!(v >= prev);
            prev = v;
        }
    }
}
