/// Mean earth radius in meters.
pub const MEAN_EARTH_RADIUS: f64 = 6_371_008.8;

/// Empirical exponent of the cosmic-ray angular flux distribution,
/// `flux ∝ sin(elevation)^3.3`.
pub const ATTENUATION_EXPONENT: f64 = 3.3;

/// Atmospheric refraction coefficient used when curvature correction
/// is enabled.
pub const REFRACTION_COEFFICIENT: f64 = 0.13;

/// Default horizon search radius, in DEM coordinate units.
pub const SEARCH_RADIUS: f64 = 1000.0;

/// Default angular resolution of a skyline, in degrees.
pub const AZIMUTH_STEP: f64 = 1.0;

/// Most samples a single ray may take, `radius / ray_step`.
pub const MAX_RAY_SAMPLES: f64 = 100_000.0;
