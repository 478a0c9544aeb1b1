use crate::{
    options::Shield,
    points::{Fields, PointStore, Unresolved},
    progress,
};
use anyhow::{anyhow, Context, Result};
use dem::Grid;
use log::info;
use serde::Serialize;
use shielding::{
    Batch, BatchSummary, CancelToken, ResultSink, ResultStore, SampleId, SampleOutcome,
    SamplePoint, ShieldingConfig, ShieldingError, SkyBin,
};
use std::{
    collections::{HashMap, HashSet},
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    time::Duration,
};

impl Shield {
    pub fn run(&self) -> Result<()> {
        if let Some(threads) = self.threads {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()?;
        }

        let grid = Grid::open(&self.dem.dem, self.dem.grid_mode.into())
            .with_context(|| format!("opening {}", self.dem.dem.display()))?;
        let mut points = PointStore::open(&self.points)
            .with_context(|| format!("reading {}", self.points.display()))?;
        let fields = Fields {
            strike: self.strike_field.as_deref(),
            dip: self.dip_field.as_deref(),
            height: self.height_field.as_deref(),
            id: self.id_field.as_deref(),
        };
        let (samples, unresolved) = points.samples(&fields)?;
        info!(
            "{} of {} features resolved into samples",
            samples.len(),
            points.len()
        );

        let config = ShieldingConfig::from(self.config);
        let batch = Batch::new(
            &grid,
            &config,
            self.dem.dem_crs.as_ref(),
            points.crs().as_ref(),
        )?;

        let cancel = match self.timeout {
            Some(secs) => CancelToken::with_timeout(
                Duration::try_from_secs_f64(secs).context("invalid timeout")?,
            ),
            None => CancelToken::new(),
        };
        let store = ResultStore::new();
        let pb = progress::bar(self.points.display().to_string(), samples.len() as u64);
        let summary = match &self.skyline_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                let sink = SkylineWriter {
                    store: &store,
                    paths: table_paths(dir, &samples),
                    exponent: config.exponent,
                };
                batch.run(&samples, &sink, &cancel, || pb.inc(1))
            }
            None => batch.run(&samples, &store, &cancel, || pb.inc(1)),
        };
        pb.finish_and_clear();

        points.update(&self.shield_field, self.id_field.as_deref(), &store.into_map());
        points
            .write(&self.out)
            .with_context(|| format!("writing {}", self.out.display()))?;

        let summary = Summary {
            batch: summary,
            unresolved,
        };
        if let Some(path) = &self.summary {
            let mut wtr = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(&mut wtr, &summary)?;
            wtr.flush()?;
        }

        eprintln!(
            "{} shielded, {} failed, {} cancelled, {} unresolved",
            summary.batch.completed,
            summary.batch.failures.len(),
            summary.batch.cancelled.len(),
            summary.unresolved.len()
        );
        Ok(())
    }
}

/// A batch summary plus the input features that never became samples.
#[derive(Serialize)]
struct Summary {
    #[serde(flatten)]
    batch: BatchSummary,
    unresolved: Vec<Unresolved>,
}

/// Returns a distinct `<dir>/<id>.json` for every sample.
///
/// Characters outside `[A-Za-z0-9-]` become `_`, and names that then
/// clash get a numeric suffix in sample order.
fn table_paths(dir: &Path, samples: &[SamplePoint]) -> HashMap<SampleId, PathBuf> {
    let mut taken = HashSet::new();
    samples
        .iter()
        .map(|sample| {
            let stem: String = sample
                .id
                .0
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
                .collect();
            let mut name = stem.clone();
            let mut suffix = 1;
            while !taken.insert(name.clone()) {
                name = format!("{stem}-{suffix}");
                suffix += 1;
            }
            (sample.id.clone(), dir.join(format!("{name}.json")))
        })
        .collect()
}

/// Dumps each sample's sky table next to committing its factor.
struct SkylineWriter<'a> {
    store: &'a ResultStore,
    paths: HashMap<SampleId, PathBuf>,
    exponent: f64,
}

#[derive(Serialize)]
struct SkyTable<'a> {
    id: &'a str,
    x: f64,
    y: f64,
    ground: f64,
    eye: f64,
    factor: f64,
    bins: Vec<SkyBin>,
}

impl<'a> SkylineWriter<'a> {
    fn write(&self, sample: &SamplePoint, outcome: &SampleOutcome) -> Result<()> {
        let table = SkyTable {
            id: &sample.id.0,
            x: sample.position.x,
            y: sample.position.y,
            ground: outcome.ground,
            eye: outcome.eye,
            factor: outcome.shielding.factor,
            bins: outcome.table(self.exponent),
        };
        let path = self
            .paths
            .get(&sample.id)
            .ok_or_else(|| anyhow!("no sky table path for {}", sample.id))?;
        let mut wtr = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut wtr, &table)?;
        wtr.flush()?;
        Ok(())
    }
}

impl<'a> ResultSink for SkylineWriter<'a> {
    fn commit(&self, sample: &SamplePoint, outcome: &SampleOutcome) -> Result<(), ShieldingError> {
        self.write(sample, outcome)
            .map_err(|e| ShieldingError::Commit(format!("{e:#}")))?;
        self.store.commit(sample, outcome)
    }
}
