use crate::{
    constants::{
        ATTENUATION_EXPONENT, AZIMUTH_STEP, MAX_RAY_SAMPLES, REFRACTION_COEFFICIENT, SEARCH_RADIUS,
    },
    math::bin_count,
    ElevationSource, ShieldingError, C,
};
use serde::{Deserialize, Serialize};

/// System-wide parameters of a shielding computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShieldingConfig {
    /// Maximum horizon search distance, in DEM units.
    pub radius: C,

    /// Angular resolution of the skyline, degrees.
    pub azimuth_step: C,

    /// Maximum distance between ray samples; defaults to the DEM's
    /// cell size.
    pub ray_step: Option<C>,

    /// Exponent of the angular cosmic-ray flux distribution.
    pub exponent: C,

    /// Lower distant terrain for earth curvature.
    pub earth_curve: bool,

    /// Refraction coefficient applied with `earth_curve`.
    pub refraction: C,

    /// Extra height added to every sample's eye.
    pub eye_lift: C,
}

impl Default for ShieldingConfig {
    fn default() -> Self {
        Self {
            radius: SEARCH_RADIUS,
            azimuth_step: AZIMUTH_STEP,
            ray_step: None,
            exponent: ATTENUATION_EXPONENT,
            earth_curve: false,
            refraction: REFRACTION_COEFFICIENT,
            eye_lift: 0.0,
        }
    }
}

/// A [ShieldingConfig] checked against a specific DEM.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Params {
    pub radius: C,
    pub azimuth_step: C,
    pub bins: usize,
    pub ray_step: C,
    pub exponent: C,
    pub earth_curve: bool,
    pub refraction: C,
    pub eye_lift: C,
}

impl ShieldingConfig {
    /// Returns concrete parameters for computing shielding over
    /// `source`.
    ///
    /// Every check that can fail a whole batch happens here, before
    /// any sample is touched.
    pub fn validate<S: ElevationSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<Params, ShieldingError> {
        let cell_size = source.cell_size();
        let ray_step = self.ray_step.unwrap_or(cell_size);
        if !(ray_step.is_finite() && ray_step > 0.0 && ray_step <= cell_size * (1.0 + 1e-9)) {
            return Err(ShieldingError::RayStep {
                step: ray_step,
                cell_size,
            });
        }

        if !(self.radius.is_finite() && self.radius >= ray_step) {
            return Err(ShieldingError::Radius(self.radius));
        }
        let diagonal = {
            let extent = source.extent();
            extent.width().hypot(extent.height())
        };
        if self.radius > diagonal {
            return Err(ShieldingError::RadiusExceedsExtent {
                radius: self.radius,
                diagonal,
            });
        }
        if self.radius / ray_step > MAX_RAY_SAMPLES {
            return Err(ShieldingError::RaySamples {
                radius: self.radius,
                step: ray_step,
                max: MAX_RAY_SAMPLES,
            });
        }

        let bins = bin_count(self.azimuth_step)
            .ok_or(ShieldingError::AzimuthStep(self.azimuth_step))?;

        if !(self.exponent.is_finite() && self.exponent > 0.0) {
            return Err(ShieldingError::Exponent(self.exponent));
        }
        if !(0.0..1.0).contains(&self.refraction) {
            return Err(ShieldingError::Refraction(self.refraction));
        }
        if !self.eye_lift.is_finite() {
            return Err(ShieldingError::EyeLift(self.eye_lift));
        }

        Ok(Params {
            radius: self.radius,
            azimuth_step: self.azimuth_step,
            bins,
            ray_step,
            exponent: self.exponent,
            earth_curve: self.earth_curve,
            refraction: self.refraction,
            eye_lift: self.eye_lift,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ShieldingConfig, ShieldingError};
    use dem::Grid;
    use geo::geometry::Coord;

    /// 2000 x 2000 unit flat grid centered on the origin.
    fn flat() -> Grid {
        Grid::new(
            Coord {
                x: -1000.0,
                y: -1000.0,
            },
            10.0,
            (200, 200),
            None,
            vec![0.0; 200 * 200],
        )
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let params = ShieldingConfig::default().validate(&flat()).unwrap();
        assert_eq!(params.radius, 1000.0);
        assert_eq!(params.bins, 360);
        assert_eq!(params.ray_step, 10.0);
        assert_eq!(params.exponent, 3.3);
        assert!(!params.earth_curve);
        assert_eq!(params.eye_lift, 0.0);
    }

    #[test]
    fn test_rejects_bad_radius() {
        let grid = flat();
        let config = ShieldingConfig {
            radius: -1.0,
            ..ShieldingConfig::default()
        };
        assert!(matches!(
            config.validate(&grid),
            Err(ShieldingError::Radius(_))
        ));
        let config = ShieldingConfig {
            radius: 5000.0,
            ..ShieldingConfig::default()
        };
        assert!(matches!(
            config.validate(&grid),
            Err(ShieldingError::RadiusExceedsExtent { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_steps() {
        let grid = flat();
        let config = ShieldingConfig {
            azimuth_step: 7.0,
            ..ShieldingConfig::default()
        };
        let err = config.validate(&grid).unwrap_err();
        assert!(matches!(err, ShieldingError::AzimuthStep(_)));
        assert!(err.is_fatal());

        let config = ShieldingConfig {
            ray_step: Some(20.0),
            ..ShieldingConfig::default()
        };
        assert!(matches!(
            config.validate(&grid),
            Err(ShieldingError::RayStep { .. })
        ));

        let config = ShieldingConfig {
            ray_step: Some(2.5),
            ..ShieldingConfig::default()
        };
        assert_eq!(config.validate(&grid).unwrap().ray_step, 2.5);

        let config = ShieldingConfig {
            ray_step: Some(1e-9),
            ..ShieldingConfig::default()
        };
        let err = config.validate(&grid).unwrap_err();
        assert!(matches!(err, ShieldingError::RaySamples { .. }));
        assert!(err.is_fatal());

        let config = ShieldingConfig {
            ray_step: Some(0.05),
            ..ShieldingConfig::default()
        };
        assert_eq!(config.validate(&grid).unwrap().ray_step, 0.05);
    }

    #[test]
    fn test_rejects_bad_physics() {
        let grid = flat();
        let config = ShieldingConfig {
            exponent: 0.0,
            ..ShieldingConfig::default()
        };
        assert!(matches!(
            config.validate(&grid),
            Err(ShieldingError::Exponent(_))
        ));
        let config = ShieldingConfig {
            refraction: 1.0,
            ..ShieldingConfig::default()
        };
        assert!(matches!(
            config.validate(&grid),
            Err(ShieldingError::Refraction(_))
        ));
    }
}
