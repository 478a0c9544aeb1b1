//! Runs the shielding pipeline over many samples against one shared
//! DEM.

use crate::{
    config::{Params, ShieldingConfig},
    dip::DipPlane,
    horizon::Skyline,
    integrate::{integrate, table, Shielding, SkyBin},
    sample::{Crs, Orientation, SampleId, SamplePoint},
    ElevationSource, ShieldingError, C,
};
use dashmap::DashMap;
use log::{info, warn};
use rayon::prelude::*;
use serde::{Serialize, Serializer};
use std::{
    collections::HashMap,
    fmt::Display,
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};

/// Everything computed for a single sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOutcome {
    pub orientation: Orientation,

    /// Ground elevation beneath the sample.
    pub ground: C,

    /// Elevation the skyline was traced from.
    pub eye: C,

    pub skyline: Skyline,
    pub shielding: Shielding,
}

impl SampleOutcome {
    /// Returns this sample's per-azimuth sky table.
    pub fn table(&self, exponent: C) -> Vec<SkyBin> {
        table(&self.skyline, &DipPlane::from(self.orientation), exponent)
    }
}

/// Receives each sample's outcome as soon as it completes.
///
/// Called concurrently, at most once per sample.
pub trait ResultSink: Sync {
    fn commit(&self, sample: &SamplePoint, outcome: &SampleOutcome) -> Result<(), ShieldingError>;
}

/// In-memory shielding factors keyed by sample.
#[derive(Debug, Default)]
pub struct ResultStore {
    results: DashMap<SampleId, Shielding>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &SampleId) -> Option<Shielding> {
        self.results.get(id).map(|entry| *entry.value())
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_map(self) -> HashMap<SampleId, Shielding> {
        self.results.into_iter().collect()
    }
}

impl ResultSink for ResultStore {
    fn commit(&self, sample: &SamplePoint, outcome: &SampleOutcome) -> Result<(), ShieldingError> {
        self.results.insert(sample.id.clone(), outcome.shielding);
        Ok(())
    }
}

/// Cooperative cancellation shared by every worker of a batch.
#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: AtomicBool,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a token that cancels itself once `deadline` passes.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
            || self.deadline.map_or(false, |deadline| Instant::now() >= deadline)
    }
}

#[derive(Debug, Serialize)]
pub struct SampleFailure {
    pub id: SampleId,
    #[serde(serialize_with = "serialize_display")]
    pub error: ShieldingError,
}

/// What happened to every sample of a batch.
#[derive(Debug, Default, Serialize)]
pub struct BatchSummary {
    pub completed: usize,
    pub failures: Vec<SampleFailure>,

    /// Samples interrupted before committing.
    pub cancelled: Vec<SampleId>,

    /// Azimuth bins, over every completed sample, whose ray found no
    /// terrain.
    pub profile_gaps: usize,

    /// Azimuth bins, over every completed sample, left out of the
    /// mean.
    pub excluded_bins: usize,
}

fn serialize_display<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Display,
    S: Serializer,
{
    serializer.collect_str(value)
}

enum Status {
    Completed { gaps: usize, excluded: usize },
    Failed(SampleFailure),
    Cancelled(SampleId),
}

/// Shielding parameters bound to a single DEM.
pub struct Batch<'a, S: ?Sized> {
    source: &'a S,
    params: Params,
}

impl<'a, S> Batch<'a, S>
where
    S: ElevationSource + ?Sized,
{
    /// Validates `config` against `source`.
    ///
    /// A CRS missing on either side is assumed to match the other.
    pub fn new(
        source: &'a S,
        config: &ShieldingConfig,
        dem_crs: Option<&Crs>,
        sample_crs: Option<&Crs>,
    ) -> Result<Self, ShieldingError> {
        if let (Some(dem), Some(samples)) = (dem_crs, sample_crs) {
            if dem != samples {
                return Err(ShieldingError::CrsMismatch {
                    dem: dem.clone(),
                    samples: samples.clone(),
                });
            }
        }
        let params = config.validate(source)?;
        Ok(Self { source, params })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Computes the shielding of one sample without side effects.
    pub fn compute(&self, sample: &SamplePoint) -> Result<SampleOutcome, ShieldingError> {
        let orientation = sample.orientation()?;
        let position = sample.position;
        let ground = self
            .source
            .ground_elevation(position)
            .ok_or(ShieldingError::OutOfBounds {
                x: position.x,
                y: position.y,
            })?;
        let eye = ground + orientation.height + self.params.eye_lift;
        let skyline = Skyline::trace(self.source, position, eye, &self.params);
        let shielding = integrate(&skyline, &DipPlane::from(orientation), self.params.exponent)?;
        Ok(SampleOutcome {
            orientation,
            ground,
            eye,
            skyline,
            shielding,
        })
    }

    /// Computes and commits every sample in parallel.
    ///
    /// A failed or cancelled sample commits nothing and never stops
    /// the others. `on_done` is called once per sample, whatever its
    /// fate.
    pub fn run<K, F>(
        &self,
        samples: &[SamplePoint],
        sink: &K,
        cancel: &CancelToken,
        on_done: F,
    ) -> BatchSummary
    where
        K: ResultSink + ?Sized,
        F: Fn() + Sync,
    {
        let now = Instant::now();
        let statuses: Vec<Status> = samples
            .par_iter()
            .map(|sample| {
                let status = self.process(sample, sink, cancel);
                on_done();
                status
            })
            .collect();

        let mut summary = BatchSummary::default();
        for status in statuses {
            match status {
                Status::Completed { gaps, excluded } => {
                    summary.completed += 1;
                    summary.profile_gaps += gaps;
                    summary.excluded_bins += excluded;
                }
                Status::Failed(failure) => summary.failures.push(failure),
                Status::Cancelled(id) => summary.cancelled.push(id),
            }
        }

        info!(
            "batch; samples: {}, completed: {}, failed: {}, cancelled: {}, profile gaps: {}, exec: {:?}",
            samples.len(),
            summary.completed,
            summary.failures.len(),
            summary.cancelled.len(),
            summary.profile_gaps,
            now.elapsed()
        );
        summary
    }

    fn process<K>(&self, sample: &SamplePoint, sink: &K, cancel: &CancelToken) -> Status
    where
        K: ResultSink + ?Sized,
    {
        if cancel.is_cancelled() {
            return Status::Cancelled(sample.id.clone());
        }
        let committed = self.compute(sample).and_then(|outcome| {
            if cancel.is_cancelled() {
                return Ok(None);
            }
            sink.commit(sample, &outcome)?;
            Ok(Some(outcome))
        });
        match committed {
            Ok(Some(outcome)) => Status::Completed {
                gaps: outcome.skyline.gaps().len(),
                excluded: outcome.shielding.excluded,
            },
            Ok(None) => Status::Cancelled(sample.id.clone()),
            Err(error) => {
                warn!("sample {}: {error}", sample.id);
                Status::Failed(SampleFailure {
                    id: sample.id.clone(),
                    error,
                })
            }
        }
    }
}
