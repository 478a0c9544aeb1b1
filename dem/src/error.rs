use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DemError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("missing header field '{0}' in {1}")]
    MissingField(&'static str, PathBuf),

    #[error("invalid header line '{0}' in {1}")]
    Header(String, PathBuf),

    #[error("invalid elevation sample '{0}' in {1}")]
    Sample(String, PathBuf),

    #[error("expected {expected} elevation samples, found {actual}")]
    SampleCount { expected: usize, actual: usize },

    #[error("unsupported grid file {0}")]
    Extension(PathBuf),

    #[error("invalid grid geometry: {0}")]
    Geometry(&'static str),
}
