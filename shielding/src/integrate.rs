//! Fuses the terrain skyline with the sample's own dip plane into a
//! topographic shielding factor.

use crate::{dip::DipPlane, horizon::Skyline, ShieldingError, C};
use log::error;
use num_traits::Float;
use serde::Serialize;

/// One azimuth row of a sample's sky table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SkyBin {
    pub azimuth: C,
    pub zenith: C,
    pub horizon: C,
    pub dip_elevation: C,
    pub topo_shield: C,
}

/// Outcome of integrating one sample's sky.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Shielding {
    /// Fraction of cosmic-ray flux reaching the sample, in `[0, 1]`.
    pub factor: C,

    /// Mean shielding contribution over every retained bin.
    pub mean_topo_shield: C,

    /// Number of azimuth bins.
    pub bins: usize,

    /// Bins left out of the mean for producing non-finite values.
    pub excluded: usize,
}

/// Returns the fraction of flux blocked at an effective elevation
/// angle of `elevation` degrees.
///
/// Anything at or below the horizontal blocks nothing.
pub fn contribution<T: Float>(elevation: T, exponent: T) -> T {
    if elevation >= T::zero() {
        elevation.to_radians().sin().powf(exponent)
    } else if elevation.is_nan() {
        elevation
    } else {
        T::zero()
    }
}

/// The higher of the two angles, NaN if either is.
fn effective_elevation(horizon: C, dip_elevation: C) -> C {
    if horizon.is_nan() || dip_elevation.is_nan() {
        C::NAN
    } else {
        horizon.max(dip_elevation)
    }
}

/// Returns the per-azimuth sky table of `skyline` seen from a surface
/// lying on `dip`.
pub fn table(skyline: &Skyline, dip: &DipPlane, exponent: C) -> Vec<SkyBin> {
    skyline
        .iter()
        .map(|(azimuth, horizon)| {
            let dip_elevation = dip.occlusion(azimuth);
            SkyBin {
                azimuth,
                zenith: 90.0 - horizon,
                horizon,
                dip_elevation,
                topo_shield: contribution(effective_elevation(horizon, dip_elevation), exponent),
            }
        })
        .collect()
}

/// Integrates the shielding of `skyline` and `dip` over the full
/// circle.
///
/// Bins are summed in azimuth order so repeated runs agree to the
/// last bit.
#[allow(clippy::cast_precision_loss)]
pub fn integrate(
    skyline: &Skyline,
    dip: &DipPlane,
    exponent: C,
) -> Result<Shielding, ShieldingError> {
    let bins = skyline.len();
    let mut sum = 0.0;
    let mut retained = 0_usize;

    for SkyBin {
        azimuth,
        horizon,
        dip_elevation,
        topo_shield,
        ..
    } in table(skyline, dip, exponent)
    {
        if topo_shield.is_finite() {
            sum += topo_shield;
            retained += 1;
        } else {
            error!(
                "non-finite shielding at azimuth {azimuth}°; horizon: {horizon}, dip elevation: {dip_elevation}; excluding bin"
            );
        }
    }

    if retained == 0 {
        return Err(ShieldingError::NumericDomain);
    }

    let mean_topo_shield = sum / retained as C;
    Ok(Shielding {
        factor: 1.0 - mean_topo_shield,
        mean_topo_shield,
        bins,
        excluded: bins - retained,
    })
}

#[cfg(test)]
mod tests {
    use super::{contribution, integrate, table, DipPlane, ShieldingError, Skyline, C};
    use crate::{constants::ATTENUATION_EXPONENT as EXP, test_grids::grid_fn};
    use approx::assert_relative_eq;
    use geo::geometry::Coord;

    /// Horizon traced from the origin of the plane `z = x`, which is
    /// `atan(sin(azimuth))` at every azimuth.
    fn plane_skyline(step: C) -> Skyline {
        let grid = grid_fn(100, 1.0, |x, _| x);
        Skyline::builder()
            .observer(Coord { x: 0.0, y: 0.0 })
            .radius(50.0)
            .azimuth_step(step)
            .build(&grid)
            .unwrap()
    }

    #[test]
    fn test_contribution() {
        assert_eq!(contribution(0.0, EXP), 0.0);
        assert_eq!(contribution(-10.0, EXP), 0.0);
        assert_relative_eq!(contribution(90.0, EXP), 1.0);
        assert_relative_eq!(contribution(30.0, EXP), 0.5_f64.powf(3.3));
        assert!(contribution(f64::NAN, EXP).is_nan());
    }

    #[test]
    fn test_flat_open_sky() {
        let skyline = Skyline::from_angles(1.0, vec![0.0; 360]).unwrap();
        let shielding = integrate(&skyline, &DipPlane::horizontal(), EXP).unwrap();
        assert_eq!(shielding.factor, 1.0);
        assert_eq!(shielding.mean_topo_shield, 0.0);
        assert_eq!(shielding.bins, 360);
        assert_eq!(shielding.excluded, 0);
    }

    #[test]
    fn test_uniform_horizon() {
        let skyline = Skyline::from_angles(10.0, vec![30.0; 36]).unwrap();
        let shielding = integrate(&skyline, &DipPlane::horizontal(), EXP).unwrap();
        assert_relative_eq!(shielding.factor, 1.0 - 0.5_f64.powf(3.3), epsilon = 1e-12);
    }

    #[test]
    fn test_more_obstruction_never_exposes() {
        let dip = DipPlane::new(40.0, 25.0);
        let mut angles: Vec<C> = (0..72).map(|idx| C::from(idx % 7) * 3.0 - 5.0).collect();
        let mut previous = integrate(&Skyline::from_angles(5.0, angles.clone()).unwrap(), &dip, EXP)
            .unwrap()
            .factor;
        for idx in [3, 17, 40, 41, 70, 0] {
            angles[idx] += 12.0;
            let factor = integrate(&Skyline::from_angles(5.0, angles.clone()).unwrap(), &dip, EXP)
                .unwrap()
                .factor;
            assert!(factor <= previous);
            previous = factor;
        }
    }

    #[test]
    fn test_resolution_convergence() {
        let dip = DipPlane::horizontal();
        let factors: Vec<C> = [45.0, 22.5, 11.25, 5.625]
            .into_iter()
            .map(|step| {
                let skyline = plane_skyline(step);
                for (azimuth, horizon) in skyline.iter() {
                    let expected = azimuth.to_radians().sin().atan().to_degrees();
                    assert_relative_eq!(horizon, expected, epsilon = 1e-9);
                }
                integrate(&skyline, &dip, EXP).unwrap().factor
            })
            .collect();
        let deltas: Vec<C> = factors.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
        assert!(deltas[0] > deltas[1]);
        assert!(deltas[1] > deltas[2]);
        assert_relative_eq!(factors[3], 0.920_766_5, epsilon = 1e-6);
    }

    #[test]
    fn test_dip_plane_shields_open_sky() {
        let skyline = Skyline::from_angles(1.0, vec![0.0; 360]).unwrap();
        let gentle = integrate(&skyline, &DipPlane::new(0.0, 20.0), EXP).unwrap();
        let steep = integrate(&skyline, &DipPlane::new(0.0, 60.0), EXP).unwrap();
        assert!(gentle.factor < 1.0);
        assert!(steep.factor < gentle.factor);

        // Terrain above the dip plane is what counts.
        let high = Skyline::from_angles(1.0, vec![70.0; 360]).unwrap();
        let shielded = integrate(&high, &DipPlane::new(0.0, 20.0), EXP).unwrap();
        let level = integrate(&high, &DipPlane::horizontal(), EXP).unwrap();
        assert_relative_eq!(shielded.factor, level.factor, epsilon = 1e-12);
    }

    #[test]
    fn test_table_rows() {
        let skyline = Skyline::from_angles(90.0, vec![0.0, 10.0, 0.0, 0.0]).unwrap();
        let rows = table(&skyline, &DipPlane::new(0.0, 30.0), EXP);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].azimuth, 90.0);
        assert_eq!(rows[1].zenith, 80.0);
        assert_relative_eq!(rows[1].dip_elevation, -30.0, epsilon = 1e-12);
        assert_relative_eq!(rows[1].topo_shield, 10.0_f64.to_radians().sin().powf(3.3));
        assert_relative_eq!(rows[3].dip_elevation, 30.0, epsilon = 1e-12);
        assert_relative_eq!(rows[3].topo_shield, 0.5_f64.powf(3.3), epsilon = 1e-12);
        assert_relative_eq!(rows[0].topo_shield, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_nan_bins_are_excluded() {
        let mut angles = vec![30.0; 4];
        angles[1] = f64::NAN;
        let skyline = Skyline::from_angles(90.0, angles).unwrap();
        let shielding = integrate(&skyline, &DipPlane::horizontal(), EXP).unwrap();
        assert_eq!(shielding.excluded, 1);
        assert_eq!(shielding.bins, 4);
        assert_relative_eq!(shielding.factor, 1.0 - 0.5_f64.powf(3.3), epsilon = 1e-12);

        let skyline = Skyline::from_angles(180.0, vec![f64::NAN; 2]).unwrap();
        assert!(matches!(
            integrate(&skyline, &DipPlane::horizontal(), EXP),
            Err(ShieldingError::NumericDomain)
        ));
    }
}
