//! Numeric conversion and interpolation helpers
#[must_use]
pub const fn usize_to_f64(value: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let newval = value as f64;
    newval
}

#[must_use]
pub const fn f64_to_usize(value: f64) -> usize {
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_sign_loss)]
    let newval = value as usize;
    newval
}

/// Linear interpolation between `(x0, y0)` and `(x1, y1)` at `x`.
///
/// If both abscissae coincide, `y0` is returned.
#[must_use]
pub fn lerp(x0: f64, y0: f64, x1: f64, y1: f64, x: f64) -> f64 {
    #[allow(clippy::float_cmp)]
    if x1 == x0 {
        return y0;
    }
    let ratio = (x - x0) / (x1 - x0);
    y0.mul_add(1.0 - ratio, y1 * ratio)
}

/// Find the bracketing indices of `x` in a strictly ascending axis.
///
/// Values outside the axis are clamped to the first / last interval. The returned ratio is
/// clamped to `[0.0, 1.0]`. The axis must contain at least one element.
#[must_use]
pub fn clamped_bracket(axis: &[f64], x: f64) -> (usize, usize, f64) {
    let last = axis.len().saturating_sub(1);
    if last == 0 || x <= axis[0] {
        return (0, 0, 0.0);
    }
    if x >= axis[last] {
        return (last, last, 0.0);
    }
    let upper = axis.iter().position(|a| *a >= x).unwrap_or(last);
    let lower = upper - 1;
    let ratio = (x - axis[lower]) / (axis[upper] - axis[lower]);
    (lower, upper, ratio.clamp(0.0, 1.0))
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    #[test]
    fn conversions() {
        assert_eq!(usize_to_f64(3), 3.0);
        assert_eq!(f64_to_usize(3.7), 3);
        assert_eq!(f64_to_usize(-1.0), 0);
    }
    #[test]
    fn lerp_values() {
        assert_abs_diff_eq!(lerp(0.0, 1.0, 2.0, 3.0, 1.0), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(lerp(0.0, 1.0, 2.0, 3.0, 0.0), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(lerp(1.0, 5.0, 1.0, 7.0, 1.0), 5.0, epsilon = 1e-12);
    }
    #[test]
    fn bracket() {
        let axis = [0.0, 10.0, 20.0];
        assert_eq!(clamped_bracket(&axis, -5.0), (0, 0, 0.0));
        assert_eq!(clamped_bracket(&axis, 25.0), (2, 2, 0.0));
        let (l, u, r) = clamped_bracket(&axis, 15.0);
        assert_eq!((l, u), (1, 2));
        assert_abs_diff_eq!(r, 0.5, epsilon = 1e-12);
        let (l, u, r) = clamped_bracket(&axis, 10.0);
        assert_eq!((l, u), (0, 1));
        assert_abs_diff_eq!(r, 1.0, epsilon = 1e-12);
        assert_eq!(clamped_bracket(&[4.0], 5.0), (0, 0, 0.0));
    }
}
