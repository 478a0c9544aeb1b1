use crate::{ShieldingError, C};
use geo::geometry::Coord;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Identifies a sample within its point store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleId(pub String);

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SampleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SampleId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// A geolocated sample as read from a point store.
///
/// Unspecified orientation and height default to 0.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePoint {
    pub id: SampleId,

    /// Planar position, in the DEM's coordinate system.
    pub position: Coord<C>,

    /// Compass bearing of the sampled surface's strike, degrees.
    pub strike: Option<C>,

    /// Inclination of the sampled surface from horizontal, degrees.
    pub dip: Option<C>,

    /// Height of the sample above the ground.
    pub height: Option<C>,
}

impl SamplePoint {
    pub fn new(id: impl Into<SampleId>, position: Coord<C>) -> Self {
        Self {
            id: id.into(),
            position,
            strike: None,
            dip: None,
            height: None,
        }
    }

    pub fn strike(mut self, degrees: C) -> Self {
        self.strike = Some(degrees);
        self
    }

    pub fn dip(mut self, degrees: C) -> Self {
        self.dip = Some(degrees);
        self
    }

    pub fn height(mut self, height: C) -> Self {
        self.height = Some(height);
        self
    }

    /// Returns this sample's orientation with defaults substituted.
    ///
    /// Strike is normalized into `[0, 360)`.
    pub fn orientation(&self) -> Result<Orientation, ShieldingError> {
        let strike = self.strike.unwrap_or(0.0);
        let dip = self.dip.unwrap_or(0.0);
        let height = self.height.unwrap_or(0.0);
        if !strike.is_finite() {
            return Err(ShieldingError::Orientation("strike", strike));
        }
        if !(0.0..=90.0).contains(&dip) {
            return Err(ShieldingError::Orientation("dip", dip));
        }
        if !height.is_finite() {
            return Err(ShieldingError::Orientation("height", height));
        }
        Ok(Orientation {
            strike: strike.rem_euclid(360.0),
            dip,
            height,
        })
    }
}

/// A sample's resolved strike, dip, and height above ground.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Orientation {
    pub strike: C,
    pub dip: C,
    pub height: C,
}

/// A coordinate reference system identifier.
///
/// Only used to reject samples and DEMs declared in different
/// systems; no reprojection is ever performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Crs {
    Epsg(u32),
    Named(String),
}

impl FromStr for Crs {
    type Err = std::convert::Infallible;

    /// Parses `EPSG:32611`, `urn:ogc:def:crs:EPSG::32611`, and similar
    /// spellings into [Crs::Epsg]; anything else is kept verbatim.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();
        if let Some(idx) = upper.rfind("EPSG") {
            let code = upper[idx + 4..].trim_start_matches(':');
            if let Ok(code) = code.parse::<u32>() {
                return Ok(Self::Epsg(code));
            }
        }
        Ok(Self::Named(trimmed.to_owned()))
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Epsg(code) => write!(f, "EPSG:{code}"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Coord, Crs, Orientation, SamplePoint, ShieldingError};

    const ORIGIN: Coord = Coord { x: 0.0, y: 0.0 };

    #[test]
    fn test_defaults() {
        let sample = SamplePoint::new("a", ORIGIN);
        assert_eq!(
            sample.orientation().unwrap(),
            Orientation {
                strike: 0.0,
                dip: 0.0,
                height: 0.0
            }
        );
        let explicit = SamplePoint::new("a", ORIGIN).strike(0.0).dip(0.0).height(0.0);
        assert_eq!(sample.orientation().unwrap(), explicit.orientation().unwrap());
    }

    #[test]
    fn test_strike_normalized() {
        let sample = SamplePoint::new("a", ORIGIN).strike(-90.0);
        assert_eq!(sample.orientation().unwrap().strike, 270.0);
        let sample = SamplePoint::new("a", ORIGIN).strike(360.0);
        assert_eq!(sample.orientation().unwrap().strike, 0.0);
    }

    #[test]
    fn test_invalid_orientation() {
        let sample = SamplePoint::new("a", ORIGIN).dip(95.0);
        assert!(matches!(
            sample.orientation(),
            Err(ShieldingError::Orientation("dip", _))
        ));
        let sample = SamplePoint::new("a", ORIGIN).height(f64::NAN);
        assert!(matches!(
            sample.orientation(),
            Err(ShieldingError::Orientation("height", _))
        ));
    }

    #[test]
    fn test_crs_parse() {
        let parse = |s: &str| s.parse::<Crs>().unwrap();
        assert_eq!(parse("EPSG:32611"), Crs::Epsg(32611));
        assert_eq!(parse("urn:ogc:def:crs:EPSG::32611"), Crs::Epsg(32611));
        assert_eq!(parse("epsg:4326"), Crs::Epsg(4326));
        assert_eq!(parse(" local grid "), Crs::Named("local grid".to_owned()));
        assert_eq!(Crs::Epsg(32611).to_string(), "EPSG:32611");
    }
}
