//! Topographic shielding of cosmogenic nuclide samples.
//!
//! For each sample the surrounding terrain is reduced to a [Skyline]
//! by marching rays across a DEM, the sample's own inclined surface
//! is modelled as a [DipPlane], and the two are fused into the
//! fraction of cosmic-ray flux that still reaches the sample.
//!
//! # References
//!
//! 1. Dunne, J., Elmore, D., & Muzikar, P. (1999). Scaling factors
//!    for the rates of production of cosmogenic nuclides for
//!    geometric shielding and attenuation at depth on sloped surfaces.
//!    Geomorphology, 27(1-2), 3-11.

mod batch;
mod config;
pub mod constants;
mod dip;
mod error;
mod horizon;
mod integrate;
mod math;
mod sample;
mod source;
#[cfg(test)]
mod test_grids;

pub use crate::{
    batch::{
        Batch, BatchSummary, CancelToken, ResultSink, ResultStore, SampleFailure, SampleOutcome,
    },
    config::{Params, ShieldingConfig},
    dip::DipPlane,
    error::ShieldingError,
    horizon::{Skyline, SkylineBuilder},
    integrate::{contribution, integrate, table, Shielding, SkyBin},
    sample::{Crs, Orientation, SampleId, SamplePoint},
    source::ElevationSource,
};
pub use dem::C;
