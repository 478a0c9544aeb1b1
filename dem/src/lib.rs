//! Planar digital elevation models.
//!
//! A [Grid] is a regular raster of square cells in a projected
//! coordinate system. It is georeferenced by the outer lower-left
//! corner of its south-western cell, and each sample represents the
//! elevation at the center of its cell.
//!
//! # References
//!
//! 1. [Esri ASCII raster format](https://desktop.arcgis.com/en/arcmap/latest/manage-data/raster-and-images/esri-ascii-raster-format.htm)
//! 1. [BIL, BIP, and BSQ raster files](https://desktop.arcgis.com/en/arcmap/latest/manage-data/raster-and-images/bil-bip-and-bsq-raster-files.htm)

mod asc;
mod error;
mod flt;
mod header;

pub use crate::error::DemError;
use crate::header::Header;
use byteorder::{BigEndian as BE, ByteOrder, LittleEndian as LE};
use geo::geometry::{Coord, Rect};
use log::debug;
use memmap2::Mmap;
use std::{mem::size_of, path::Path, sync::OnceLock};

/// Base floating point type used for all coordinates and calculations.
pub type C = f64;

#[derive(Debug)]
pub struct Grid {
    /// Outer lower-left corner of the grid.
    ll_corner: Coord<C>,

    /// Width and height of a cell, in coordinate units.
    cell_size: C,

    /// Number of (columns, rows) in this grid.
    dimensions: (usize, usize),

    /// Marker for missing samples.
    nodata: Option<f32>,

    /// Lowest and highest valid samples, computed on first use.
    range: OnceLock<Option<(f32, f32)>>,

    /// Elevation samples, northern row first.
    samples: SampleStore,
}

#[derive(Debug)]
pub(crate) enum SampleStore {
    InMem(Box<[f32]>),
    MemMap { map: Mmap, big_endian: bool },
}

impl SampleStore {
    fn len(&self) -> usize {
        match self {
            Self::InMem(samples) => samples.len(),
            Self::MemMap { map, .. } => map.len() / size_of::<f32>(),
        }
    }

    fn get_unchecked(&self, index: usize) -> f32 {
        match self {
            Self::InMem(samples) => samples[index],
            Self::MemMap { map, big_endian } => {
                let start = index * size_of::<f32>();
                let bytes = &map[start..start + size_of::<f32>()];
                if *big_endian {
                    BE::read_f32(bytes)
                } else {
                    LE::read_f32(bytes)
                }
            }
        }
    }
}

/// How to handle grid samples.
///
/// Mapping avoids reading a large grid up front, but every lookup
/// then decodes its sample from the mapped bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridMode {
    /// Parse samples and load them into memory.
    InMem,

    /// Memory map binary grid contents. ASCII grids are always parsed.
    MemMap,
}

impl Grid {
    /// Returns a grid over `samples`, which are ordered row by row
    /// starting with the northern row.
    pub fn new(
        ll_corner: Coord<C>,
        cell_size: C,
        dimensions: (usize, usize),
        nodata: Option<f32>,
        samples: Vec<f32>,
    ) -> Result<Self, DemError> {
        let header = Header {
            dimensions,
            ll_corner,
            cell_size,
            nodata,
            big_endian: false,
        };
        if samples.len() != header.len() {
            return Err(DemError::SampleCount {
                expected: header.len(),
                actual: samples.len(),
            });
        }
        Self::from_header(header, SampleStore::InMem(samples.into_boxed_slice()))
    }

    /// Opens the grid at `path`, choosing a parser by file extension
    /// (`asc` or `flt`).
    pub fn open<P: AsRef<Path>>(path: P, mode: GridMode) -> Result<Self, DemError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .map(str::to_ascii_lowercase);
        debug!("loading {path:?} ({mode:?})");
        match (ext.as_deref(), mode) {
            (Some("asc"), _) => asc::load(path),
            (Some("flt"), GridMode::InMem) => flt::load(path),
            (Some("flt"), GridMode::MemMap) => flt::memmap(path),
            _ => Err(DemError::Extension(path.to_owned())),
        }
    }

    /// Returns the number of samples in this grid.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        let (cols, rows) = self.dimensions;
        cols * rows
    }

    /// Returns the number of (columns, rows).
    pub fn dimensions(&self) -> (usize, usize) {
        self.dimensions
    }

    pub fn cell_size(&self) -> C {
        self.cell_size
    }

    pub fn nodata(&self) -> Option<f32> {
        self.nodata
    }

    /// Returns the outer bounds of this grid.
    #[allow(clippy::cast_precision_loss)]
    pub fn extent(&self) -> Rect<C> {
        let (cols, rows) = self.dimensions;
        Rect::new(
            self.ll_corner,
            Coord {
                x: self.ll_corner.x + cols as C * self.cell_size,
                y: self.ll_corner.y + rows as C * self.cell_size,
            },
        )
    }

    /// Returns the lowest valid sample in this grid.
    pub fn min_elevation(&self) -> Option<f32> {
        self.range().map(|(min, _)| min)
    }

    /// Returns the highest valid sample in this grid.
    pub fn max_elevation(&self) -> Option<f32> {
        self.range().map(|(_, max)| max)
    }

    /// Returns the sample of the cell containing `coord`.
    ///
    /// Returns `None` outside the grid and for missing samples.
    pub fn get(&self, coord: Coord<C>) -> Option<f32> {
        let (x, y) = self.coord_to_xy(coord)?;
        self.get_xy((x, y))
    }

    /// Returns the elevation at `coord`, bilinearly interpolated
    /// between the four surrounding cell centers.
    ///
    /// Falls back to the containing cell's sample along the outer
    /// half-cell border and next to missing samples.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn interpolate(&self, coord: Coord<C>) -> Option<C> {
        let fx = (coord.x - self.ll_corner.x) / self.cell_size - 0.5;
        let fy = (coord.y - self.ll_corner.y) / self.cell_size - 0.5;
        let (x0, y0) = (fx.floor(), fy.floor());
        let (cols, rows) = self.dimensions;
        if x0 >= 0.0 && y0 >= 0.0 && x0 + 1.0 < cols as C && y0 + 1.0 < rows as C {
            let (tx, ty) = (fx - x0, fy - y0);
            let (x0, y0) = (x0 as usize, y0 as usize);
            if let (Some(sw), Some(se), Some(nw), Some(ne)) = (
                self.get_xy((x0, y0)),
                self.get_xy((x0 + 1, y0)),
                self.get_xy((x0, y0 + 1)),
                self.get_xy((x0 + 1, y0 + 1)),
            ) {
                let s = C::from(sw) * (1.0 - tx) + C::from(se) * tx;
                let n = C::from(nw) * (1.0 - tx) + C::from(ne) * tx;
                return Some(s * (1.0 - ty) + n * ty);
            }
        }
        self.get(coord).map(C::from)
    }
}

/// Private API
impl Grid {
    pub(crate) fn from_header(header: Header, samples: SampleStore) -> Result<Self, DemError> {
        let Header {
            dimensions,
            ll_corner,
            cell_size,
            nodata,
            ..
        } = header;
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(DemError::Geometry("cell size must be positive"));
        }
        if dimensions.0 == 0 || dimensions.1 == 0 {
            return Err(DemError::Geometry("grid must have at least one cell"));
        }
        if !(ll_corner.x.is_finite() && ll_corner.y.is_finite()) {
            return Err(DemError::Geometry("corner must be finite"));
        }
        if samples.len() != header.len() {
            return Err(DemError::SampleCount {
                expected: header.len(),
                actual: samples.len(),
            });
        }
        Ok(Self {
            ll_corner,
            cell_size,
            dimensions,
            nodata,
            range: OnceLock::new(),
            samples,
        })
    }

    fn is_valid(&self, sample: f32) -> bool {
        !sample.is_nan() && Some(sample) != self.nodata
    }

    /// Returns the valid sample at `(x, y)` where `(0, 0)` is the
    /// south-western cell.
    fn get_xy(&self, (x, y): (usize, usize)) -> Option<f32> {
        let sample = self.samples.get_unchecked(self.xy_to_linear_index((x, y)));
        self.is_valid(sample).then_some(sample)
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    fn coord_to_xy(&self, coord: Coord<C>) -> Option<(usize, usize)> {
        let x = ((coord.x - self.ll_corner.x) / self.cell_size).floor();
        let y = ((coord.y - self.ll_corner.y) / self.cell_size).floor();
        let (cols, rows) = self.dimensions;
        if x >= 0.0 && y >= 0.0 && x < cols as C && y < rows as C {
            Some((x as usize, y as usize))
        } else {
            None
        }
    }

    fn xy_to_linear_index(&self, (x, y): (usize, usize)) -> usize {
        let (cols, rows) = self.dimensions;
        cols * (rows - y - 1) + x
    }

    fn range(&self) -> Option<(f32, f32)> {
        *self.range.get_or_init(|| {
            (0..self.samples.len())
                .map(|idx| self.samples.get_unchecked(idx))
                .filter(|sample| self.is_valid(*sample))
                .fold(None, |range, sample| match range {
                    None => Some((sample, sample)),
                    Some((min, max)) => Some((f32::min(min, sample), f32::max(max, sample))),
                })
        })
    }
}
