//! Heading helpers.
//!
//! Headings are compass-style degrees: 0 along +Y, increasing clockwise.

/// Normalize a heading to [0, 360) degrees.
#[inline]
pub fn normalize_heading(deg: f64) -> f64 {
    let h = deg.rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to exactly 360.0
    if h >= 360.0 { 0.0 } else { h }
}

/// Wrap a heading difference into (-180, 180] degrees.
#[inline]
pub fn wrap_delta(deg: f64) -> f64 {
    let d = normalize_heading(deg);
    if d > 180.0 { d - 360.0 } else { d }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_heading() {
        assert_relative_eq!(normalize_heading(0.0), 0.0);
        assert_relative_eq!(normalize_heading(360.0), 0.0);
        assert_relative_eq!(normalize_heading(370.0), 10.0, epsilon = 1e-9);
        assert_relative_eq!(normalize_heading(-10.0), 350.0, epsilon = 1e-9);
        assert_relative_eq!(normalize_heading(-725.0), 355.0, epsilon = 1e-9);
        assert_eq!(normalize_heading(-1e-18), 0.0);
    }

    #[test]
    fn test_wrap_delta() {
        assert_relative_eq!(wrap_delta(340.0), -20.0, epsilon = 1e-9);
        assert_relative_eq!(wrap_delta(-340.0), 20.0, epsilon = 1e-9);
        assert_relative_eq!(wrap_delta(180.0), 180.0);
        assert_relative_eq!(wrap_delta(-180.0), 180.0);
        assert_relative_eq!(wrap_delta(90.0), 90.0);
        assert_relative_eq!(wrap_delta(-90.0), -90.0);
    }
}
