use crate::C;
use num_traits::Float;

/// Returns the unit `(east, north)` vector of compass bearing
/// `azimuth` (degrees clockwise from north).
pub fn direction<T>(azimuth: T) -> (T, T)
where
    T: Float,
{
    azimuth.to_radians().sin_cos()
}

/// Returns the number of azimuth bins covering the full circle at
/// `step` degrees, or `None` if `step` does not evenly divide 360.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn bin_count(step: C) -> Option<usize> {
    if !(step.is_finite() && step > 0.0 && step <= 360.0) {
        return None;
    }
    let n = (360.0 / step).round();
    ((n * step - 360.0).abs() <= 1e-9).then_some(n as usize)
}

#[cfg(test)]
mod tests {
    use super::{bin_count, direction};
    use approx::assert_relative_eq;

    #[test]
    fn test_direction() {
        let (east, north) = direction(0.0_f64);
        assert_relative_eq!(east, 0.0);
        assert_relative_eq!(north, 1.0);

        let (east, north) = direction(90.0_f64);
        assert_relative_eq!(east, 1.0);
        assert_relative_eq!(north, 0.0, epsilon = 1e-15);

        let (east, north) = direction(225.0_f64);
        assert_relative_eq!(east, -std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-15);
        assert_relative_eq!(north, -std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-15);
    }

    #[test]
    fn test_bin_count() {
        assert_eq!(bin_count(1.0), Some(360));
        assert_eq!(bin_count(0.25), Some(1440));
        assert_eq!(bin_count(11.25), Some(32));
        assert_eq!(bin_count(360.0), Some(1));
        assert_eq!(bin_count(7.0), None);
        assert_eq!(bin_count(0.0), None);
        assert_eq!(bin_count(-1.0), None);
        assert_eq!(bin_count(f64::NAN), None);
        assert_eq!(bin_count(720.0), None);
    }
}
