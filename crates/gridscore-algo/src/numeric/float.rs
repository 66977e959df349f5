//! Elementwise float helpers that keep NaN visible.
//!
//! `f64::max` and `f64::min` return the non-NaN operand, which would turn a
//! degenerate flow or voltage into a clean zero. These propagate it instead.

/// `max(a, b)`, NaN if either operand is NaN.
pub fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

/// `max(v, 0)`, NaN stays NaN.
pub fn positive_part(v: f64) -> f64 {
    nan_max(v, 0.0)
}

/// Clamp to `hi` first and then to `lo`, so `lo` wins an inverted range.
/// NaN stays NaN.
pub fn clamp_hi_lo(v: f64, lo: f64, hi: f64) -> f64 {
    if v.is_nan() {
        v
    } else {
        v.min(hi).max(lo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_propagates() {
        assert!(nan_max(f64::NAN, 1.0).is_nan());
        assert!(nan_max(1.0, f64::NAN).is_nan());
        assert!(positive_part(f64::NAN).is_nan());
        assert!(clamp_hi_lo(f64::NAN, 0.0, 1.0).is_nan());
    }

    #[test]
    fn finite_values_behave_like_std() {
        assert_eq!(nan_max(-1.0, 2.0), 2.0);
        assert_eq!(positive_part(-3.0), 0.0);
        assert_eq!(positive_part(0.25), 0.25);
        assert_eq!(clamp_hi_lo(2.0, 0.0, 1.0), 1.0);
        // inverted range
        assert_eq!(clamp_hi_lo(0.5, 1.0, 0.0), 1.0);
    }
}
