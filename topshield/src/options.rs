use anyhow::{anyhow, Error as AnyError};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dem::GridMode;
use geo::geometry::Coord;
use shielding::{constants, Crs, ShieldingConfig};
use std::{path::PathBuf, str::FromStr};

/// Compute topographic shielding of cosmogenic nuclide samples.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub enum Cli {
    /// Compute and store the shielding factor of every point in a
    /// GeoJSON file.
    Shield(Shield),

    /// Print the sky table of a single point.
    Skyline(Skyline),
}

#[derive(Debug, Clone, Args)]
pub struct Shield {
    #[command(flatten)]
    pub dem: DemArgs,

    /// GeoJSON FeatureCollection of sample points.
    #[arg(short, long)]
    pub points: PathBuf,

    /// Where to write the updated FeatureCollection.
    #[arg(short, long)]
    pub out: PathBuf,

    /// Property holding each sample's strike, in degrees.
    #[arg(long)]
    pub strike_field: Option<String>,

    /// Property holding each sample's dip, in degrees.
    #[arg(long)]
    pub dip_field: Option<String>,

    /// Property holding each sample's height above ground.
    #[arg(long)]
    pub height_field: Option<String>,

    /// Property to store the shielding factor in.
    #[arg(long, default_value = "TopoShield")]
    pub shield_field: String,

    /// Property identifying samples. Defaults to the feature id, then
    /// the feature's index.
    #[arg(long)]
    pub id_field: Option<String>,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Stop starting new samples after this many seconds.
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Write each sample's sky table to `<dir>/<id>.json`.
    #[arg(long)]
    pub skyline_dir: Option<PathBuf>,

    /// Write a JSON summary of the batch to this file.
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Number of worker threads. Defaults to one per core.
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,
}

#[derive(Debug, Clone, Args)]
pub struct Skyline {
    #[command(flatten)]
    pub dem: DemArgs,

    /// Sample position "x,y", in the DEM's coordinate system.
    #[arg(long)]
    pub at: XY,

    /// Sample height above ground.
    #[arg(long)]
    pub height: Option<f64>,

    /// Sample surface strike, in degrees.
    #[arg(long)]
    pub strike: Option<f64>,

    /// Sample surface dip, in degrees.
    #[arg(long)]
    pub dip: Option<f64>,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub cmd: SkylineCmd,
}

#[derive(Debug, Subcommand, Clone, Copy)]
pub enum SkylineCmd {
    /// Print a table to stdout.
    Display,

    /// Print JSON to stdout.
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct DemArgs {
    /// Elevation grid, either ESRI ASCII (.asc) or float (.flt with
    /// a .hdr sidecar).
    #[arg(short, long)]
    pub dem: PathBuf,

    /// How to load the elevation grid.
    #[arg(long, value_enum, default_value_t = GridModeArg::InMem)]
    pub grid_mode: GridModeArg,

    /// Coordinate reference system of the DEM, e.g. "EPSG:32611".
    #[arg(long)]
    pub dem_crs: Option<Crs>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GridModeArg {
    InMem,
    MemMap,
}

impl From<GridModeArg> for GridMode {
    fn from(mode: GridModeArg) -> Self {
        match mode {
            GridModeArg::InMem => GridMode::InMem,
            GridModeArg::MemMap => GridMode::MemMap,
        }
    }
}

#[derive(Debug, Clone, Copy, Args)]
pub struct ConfigArgs {
    /// Maximum horizon search distance, in DEM units.
    #[arg(short, long, default_value_t = constants::SEARCH_RADIUS)]
    pub radius: f64,

    /// Angular resolution, in degrees. Must evenly divide 360.
    #[arg(short, long, default_value_t = constants::AZIMUTH_STEP)]
    pub azimuth_step: f64,

    /// Distance between ray samples. Defaults to the DEM cell size.
    #[arg(long)]
    pub ray_step: Option<f64>,

    /// Exponent of the angular cosmic-ray flux distribution.
    #[arg(long, default_value_t = constants::ATTENUATION_EXPONENT)]
    pub exponent: f64,

    /// Lower distant terrain for earth curvature.
    #[arg(short, long, default_value_t = false)]
    pub earth_curve: bool,

    /// Refraction coefficient used with --earth-curve.
    #[arg(long, default_value_t = constants::REFRACTION_COEFFICIENT)]
    pub refraction: f64,

    /// Extra height added to every sample's eye.
    #[arg(long, default_value_t = 0.0)]
    pub eye_lift: f64,
}

impl From<ConfigArgs> for ShieldingConfig {
    fn from(
        ConfigArgs {
            radius,
            azimuth_step,
            ray_step,
            exponent,
            earth_curve,
            refraction,
            eye_lift,
        }: ConfigArgs,
    ) -> Self {
        Self {
            radius,
            azimuth_step,
            ray_step,
            exponent,
            earth_curve,
            refraction,
            eye_lift,
        }
    }
}

#[derive(Clone, Debug, Copy)]
pub struct XY(pub Coord<f64>);

impl FromStr for XY {
    type Err = AnyError;
    fn from_str(s: &str) -> Result<Self, AnyError> {
        let (x_str, y_str) = s.split_once(',').ok_or_else(|| anyhow!("not a valid x,y"))?;
        let x = f64::from_str(x_str.trim())?;
        let y = f64::from_str(y_str.trim())?;
        Ok(Self(Coord { x, y }))
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, ShieldingConfig, XY};
    use clap::{CommandFactory, Parser};

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_xy() {
        let XY(coord) = "1000.5, -20".parse().unwrap();
        assert_eq!(coord.x, 1000.5);
        assert_eq!(coord.y, -20.0);
        assert!("1000.5".parse::<XY>().is_err());
        assert!("a,b".parse::<XY>().is_err());
    }

    #[test]
    fn test_config_defaults() {
        let Cli::Shield(shield) = Cli::parse_from([
            "topshield", "shield", "--dem", "a.asc", "--points", "p.json", "--out", "o.json",
        ]) else {
            panic!("expected shield command");
        };
        assert_eq!(ShieldingConfig::from(shield.config), ShieldingConfig::default());
        assert_eq!(shield.shield_field, "TopoShield");
        assert!(shield.dem.dem_crs.is_none());
    }
}
