mod azimuth;
mod elevation_angle;

pub(crate) use {
    azimuth::{bin_count, direction},
    elevation_angle::{curvature_drop, elevation_angle},
};
