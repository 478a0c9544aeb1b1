use crate::{sample::Crs, C};
use dem::DemError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShieldingError {
    #[error("missing required parameter '{0}'")]
    Builder(&'static str),

    #[error("sample CRS {samples} does not match DEM CRS {dem}")]
    CrsMismatch { dem: Crs, samples: Crs },

    #[error("search radius must be positive and finite, got {0}")]
    Radius(C),

    #[error("search radius {radius} exceeds the DEM extent diagonal {diagonal}")]
    RadiusExceedsExtent { radius: C, diagonal: C },

    #[error("azimuth step must evenly divide 360 degrees, got {0}")]
    AzimuthStep(C),

    #[error("ray step {step} must be positive and no larger than the DEM cell size {cell_size}")]
    RayStep { step: C, cell_size: C },

    #[error("search radius {radius} at ray step {step} takes more than {max} samples per ray")]
    RaySamples { radius: C, step: C, max: C },

    #[error("attenuation exponent must be positive and finite, got {0}")]
    Exponent(C),

    #[error("refraction coefficient must be in [0, 1), got {0}")]
    Refraction(C),

    #[error("eye lift must be finite, got {0}")]
    EyeLift(C),

    #[error("invalid {0} {1}")]
    Orientation(&'static str, C),

    #[error("no ground elevation at ({x}, {y})")]
    OutOfBounds { x: C, y: C },

    #[error("every azimuth bin produced a non-finite contribution")]
    NumericDomain,

    #[error("cancelled before completion")]
    Cancelled,

    #[error("commit failed: {0}")]
    Commit(String),

    #[error("{0}")]
    Dem(#[from] DemError),
}

impl ShieldingError {
    /// Returns `true` for errors that invalidate a whole batch rather
    /// than a single sample.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Builder(_)
                | Self::CrsMismatch { .. }
                | Self::Radius(_)
                | Self::RadiusExceedsExtent { .. }
                | Self::AzimuthStep(_)
                | Self::RayStep { .. }
                | Self::RaySamples { .. }
                | Self::Exponent(_)
                | Self::Refraction(_)
                | Self::EyeLift(_)
                | Self::Dem(_)
        )
    }
}
