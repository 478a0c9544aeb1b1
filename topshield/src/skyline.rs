use crate::options::{Skyline, SkylineCmd};
use anyhow::Result;
use dem::Grid;
use serde::Serialize;
use shielding::{Batch, SampleOutcome, SamplePoint, ShieldingConfig, SkyBin};
use std::io::Write;

impl Skyline {
    pub fn run(&self) -> Result<()> {
        let grid = Grid::open(&self.dem.dem, self.dem.grid_mode.into())?;
        let config = ShieldingConfig::from(self.config);
        let batch = Batch::new(&grid, &config, self.dem.dem_crs.as_ref(), None)?;

        let mut sample = SamplePoint::new("cli", self.at.0);
        sample.strike = self.strike;
        sample.dip = self.dip;
        sample.height = self.height;
        let outcome = batch.compute(&sample)?;
        let bins = outcome.table(config.exponent);

        match self.cmd {
            SkylineCmd::Display => print_table(&outcome, &bins)?,
            SkylineCmd::Json => print_json(&sample, &outcome, bins)?,
        }
        Ok(())
    }
}

fn print_table(outcome: &SampleOutcome, bins: &[SkyBin]) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(
        stdout,
        "{:>9} {:>9} {:>9} {:>9} {:>11}",
        "Azimuth", "Zenith", "Horizon", "DipElev", "TopoShield"
    )?;
    for SkyBin {
        azimuth,
        zenith,
        horizon,
        dip_elevation,
        topo_shield,
    } in bins
    {
        writeln!(
            stdout,
            "{azimuth:>9.3} {zenith:>9.3} {horizon:>9.3} {dip_elevation:>9.3} {topo_shield:>11.6}"
        )?;
    }
    writeln!(stdout)?;
    writeln!(stdout, "ground:      {:.3}", outcome.ground)?;
    writeln!(stdout, "eye:         {:.3}", outcome.eye)?;
    writeln!(stdout, "profile gaps: {}", outcome.skyline.gaps().len())?;
    writeln!(stdout, "shielding:   {:.6}", outcome.shielding.factor)?;
    Ok(())
}

fn print_json(sample: &SamplePoint, outcome: &SampleOutcome, bins: Vec<SkyBin>) -> Result<()> {
    #[derive(Serialize)]
    struct JsonSkyline {
        location: [f64; 2],
        ground: f64,
        eye: f64,
        factor: f64,
        gaps: usize,
        bins: Vec<SkyBin>,
    }

    let json = serde_json::to_string(&JsonSkyline {
        location: [sample.position.x, sample.position.y],
        ground: outcome.ground,
        eye: outcome.eye,
        factor: outcome.shielding.factor,
        gaps: outcome.skyline.gaps().len(),
        bins,
    })?;
    println!("{json}");
    Ok(())
}
