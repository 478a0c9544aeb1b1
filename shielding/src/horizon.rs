//! Horizon extraction by marching rays outward across a DEM.

use crate::{
    config::{Params, ShieldingConfig},
    constants::{AZIMUTH_STEP, MEAN_EARTH_RADIUS, REFRACTION_COEFFICIENT, SEARCH_RADIUS},
    math::{bin_count, curvature_drop, direction, elevation_angle},
    source::contains,
    ElevationSource, ShieldingError, C,
};
use geo::geometry::{Coord, Rect};
use log::{debug, warn};
use rayon::prelude::*;
use serde::Serialize;

/// Horizon angle as a function of azimuth around a full circle.
///
/// Bin `i` holds azimuth `i * azimuth_step`, measured in degrees
/// clockwise from grid north.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Skyline {
    /// Degrees between consecutive azimuths.
    azimuth_step: C,

    /// Elevation angle of the horizon above horizontal, degrees.
    horizon: Vec<C>,

    /// Bins whose ray found no terrain at all.
    gaps: Vec<usize>,
}

impl Skyline {
    pub fn builder() -> SkylineBuilder {
        SkylineBuilder {
            observer: None,
            height: 0.0,
            eye_lift: 0.0,
            radius: SEARCH_RADIUS,
            ray_step: None,
            azimuth_step: AZIMUTH_STEP,
            earth_curve: false,
            refraction: REFRACTION_COEFFICIENT,
        }
    }

    /// Returns a skyline with the given horizon angles, one per
    /// `azimuth_step` degrees starting at north.
    pub fn from_angles(azimuth_step: C, horizon: Vec<C>) -> Result<Self, ShieldingError> {
        if bin_count(azimuth_step) == Some(horizon.len()) {
            Ok(Self {
                azimuth_step,
                horizon,
                gaps: Vec::new(),
            })
        } else {
            Err(ShieldingError::AzimuthStep(azimuth_step))
        }
    }

    /// Marches one ray per azimuth bin outward from `observer`, whose
    /// eye sits at `eye_elev`.
    ///
    /// The horizon of a bin is the highest elevation angle of any
    /// terrain sample along its ray. Rays are independent and traced
    /// in parallel; the result only depends on the arguments.
    pub fn trace<S>(source: &S, observer: Coord<C>, eye_elev: C, params: &Params) -> Self
    where
        S: ElevationSource + ?Sized,
    {
        let now = std::time::Instant::now();
        let caster = RayCaster::new(source, observer, eye_elev, params);

        #[allow(clippy::cast_precision_loss)]
        let angles: Vec<Option<C>> = (0..params.bins)
            .into_par_iter()
            .map(|idx| caster.cast(idx as C * params.azimuth_step))
            .collect();

        let mut gaps = Vec::new();
        let horizon = angles
            .into_iter()
            .enumerate()
            .map(|(idx, angle)| {
                angle.unwrap_or_else(|| {
                    gaps.push(idx);
                    0.0
                })
            })
            .collect();

        if let Some(first) = gaps.first() {
            warn!(
                "skyline at ({}, {}): {} of {} azimuths found no terrain, first at {}°; treating them as open sky",
                observer.x,
                observer.y,
                gaps.len(),
                params.bins,
                *first as C * params.azimuth_step,
            );
        }
        debug!(
            "skyline; bins: {}, steps: {}, exec: {:?}",
            params.bins,
            caster.steps,
            now.elapsed()
        );

        Self {
            azimuth_step: params.azimuth_step,
            horizon,
            gaps,
        }
    }

    pub fn azimuth_step(&self) -> C {
        self.azimuth_step
    }

    /// Returns the number of azimuth bins.
    pub fn len(&self) -> usize {
        self.horizon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.horizon.is_empty()
    }

    /// Returns the azimuth of bin `idx`, degrees.
    #[allow(clippy::cast_precision_loss)]
    pub fn azimuth(&self, idx: usize) -> C {
        idx as C * self.azimuth_step
    }

    /// Returns the horizon angle of bin `idx`, degrees above
    /// horizontal.
    pub fn horizon(&self, idx: usize) -> C {
        self.horizon[idx]
    }

    /// Returns the zenith angle of the horizon of bin `idx`.
    pub fn zenith(&self, idx: usize) -> C {
        90.0 - self.horizon[idx]
    }

    /// Returns the bins whose ray found no terrain.
    pub fn gaps(&self) -> &[usize] {
        &self.gaps
    }

    /// Returns an iterator over `(azimuth, horizon)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (C, C)> + '_ {
        self.horizon
            .iter()
            .enumerate()
            .map(|(idx, horizon)| (self.azimuth(idx), *horizon))
    }
}

pub struct SkylineBuilder {
    observer: Option<Coord<C>>,

    /// Eye height above ground.
    height: C,

    /// Extra eye height on top of `height`.
    eye_lift: C,

    radius: C,

    /// Maximum distance between ray samples.
    ray_step: Option<C>,

    azimuth_step: C,

    /// Lower distant terrain for earth curvature.
    earth_curve: bool,

    refraction: C,
}

impl SkylineBuilder {
    pub fn observer(mut self, coord: Coord<C>) -> Self {
        self.observer = Some(coord);
        self
    }

    pub fn height(mut self, height: C) -> Self {
        self.height = height;
        self
    }

    pub fn eye_lift(mut self, lift: C) -> Self {
        self.eye_lift = lift;
        self
    }

    pub fn radius(mut self, radius: C) -> Self {
        self.radius = radius;
        self
    }

    pub fn ray_step(mut self, step: C) -> Self {
        self.ray_step = Some(step);
        self
    }

    pub fn azimuth_step(mut self, degrees: C) -> Self {
        self.azimuth_step = degrees;
        self
    }

    pub fn earth_curve(mut self, add_curve: bool) -> Self {
        self.earth_curve = add_curve;
        self
    }

    pub fn refraction(mut self, coefficient: C) -> Self {
        self.refraction = coefficient;
        self
    }

    /// Copies every parameter of `config` into this builder.
    pub fn config(mut self, config: &ShieldingConfig) -> Self {
        self.radius = config.radius;
        self.ray_step = config.ray_step;
        self.azimuth_step = config.azimuth_step;
        self.earth_curve = config.earth_curve;
        self.refraction = config.refraction;
        self.eye_lift = config.eye_lift;
        self
    }

    pub fn build<S>(&self, source: &S) -> Result<Skyline, ShieldingError>
    where
        S: ElevationSource + ?Sized,
    {
        let observer = self.observer.ok_or(ShieldingError::Builder("observer"))?;
        let params = ShieldingConfig {
            radius: self.radius,
            azimuth_step: self.azimuth_step,
            ray_step: self.ray_step,
            earth_curve: self.earth_curve,
            refraction: self.refraction,
            eye_lift: self.eye_lift,
            ..ShieldingConfig::default()
        }
        .validate(source)?;
        let ground = source
            .ground_elevation(observer)
            .ok_or(ShieldingError::OutOfBounds {
                x: observer.x,
                y: observer.y,
            })?;
        let eye_elev = ground + self.height + params.eye_lift;
        Ok(Skyline::trace(source, observer, eye_elev, &params))
    }
}

struct RayCaster<'a, S: ?Sized> {
    source: &'a S,
    extent: Rect<C>,
    observer: Coord<C>,
    eye_elev: C,

    /// Number of samples along each ray.
    steps: usize,

    /// Distance between samples.
    step: C,

    /// Highest terrain in the DEM, when it is at or above the eye.
    ceiling: Option<C>,

    /// Refraction coefficient, when correcting for earth curvature.
    refraction: Option<C>,
}

impl<'a, S> RayCaster<'a, S>
where
    S: ElevationSource + ?Sized,
{
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn new(source: &'a S, observer: Coord<C>, eye_elev: C, params: &Params) -> Self {
        let steps = (params.radius / params.ray_step).ceil().max(1.0);
        #[allow(clippy::cast_precision_loss)]
        let step = params.radius / steps;
        Self {
            source,
            extent: source.extent(),
            observer,
            eye_elev,
            steps: steps as usize,
            step,
            ceiling: source.max_elevation().filter(|max| *max >= eye_elev),
            refraction: params.earth_curve.then_some(params.refraction),
        }
    }

    /// Returns the highest elevation angle, in degrees, of terrain
    /// along `azimuth`, or `None` if the ray found no terrain.
    #[allow(clippy::cast_precision_loss)]
    fn cast(&self, azimuth: C) -> Option<C> {
        let (east, north) = direction(azimuth);
        let mut best: Option<C> = None;

        for k in 1..=self.steps {
            let distance = k as C * self.step;

            // The angle to the highest terrain in the DEM only
            // shrinks with distance, so once it can't beat the
            // current best nothing further along can either.
            if let (Some(best), Some(ceiling)) = (best, self.ceiling) {
                if elevation_angle(self.eye_elev, distance, ceiling) <= best {
                    break;
                }
            }

            let coord = Coord {
                x: self.observer.x + east * distance,
                y: self.observer.y + north * distance,
            };
            // Extents are convex; a ray that leaves never returns.
            if !contains(&self.extent, coord) {
                break;
            }

            if let Some(elev) = self.source.elevation(coord) {
                let elev = match self.refraction {
                    Some(refraction) => {
                        elev - curvature_drop(distance, refraction, MEAN_EARTH_RADIUS)
                    }
                    None => elev,
                };
                let angle = elevation_angle(self.eye_elev, distance, elev);
                best = Some(best.map_or(angle, |best| best.max(angle)));
            }
        }

        best.map(C::to_degrees)
    }
}
