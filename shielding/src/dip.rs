use crate::{sample::Orientation, C};

/// The sampled surface itself, modelled as an inclined plane that
/// occludes part of the sky.
///
/// Strike follows the convention of being 90° less than the
/// down-slope aspect of the surface, so the plane rises highest when
/// looking up-slope at `strike - 90` and falls away toward the aspect
/// at `strike + 90`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DipPlane {
    strike: C,
    dip: C,
}

impl DipPlane {
    pub fn new(strike: C, dip: C) -> Self {
        Self { strike, dip }
    }

    /// A horizontal surface, which never occludes anything above the
    /// horizon.
    pub fn horizontal() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Returns the elevation angle, in degrees, up to which this plane
    /// hides the sky at `azimuth`.
    ///
    /// `azimuth` is a compass bearing. The plane is evaluated in the
    /// counter-clockwise-from-east frame, `90 - azimuth`, in which its
    /// angle reads `atan(tan(dip) * cos(180 - horiz - strike))`.
    ///
    /// Negative angles mean the plane falls away below the horizon.
    pub fn occlusion(&self, azimuth: C) -> C {
        let horiz = 90.0 - azimuth;
        let along = (180.0 - horiz - self.strike).to_radians().cos();
        (self.dip.to_radians().tan() * along).atan().to_degrees()
    }
}

impl From<Orientation> for DipPlane {
    fn from(Orientation { strike, dip, .. }: Orientation) -> Self {
        Self::new(strike, dip)
    }
}
