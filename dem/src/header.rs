//! Key/value headers shared by ESRI ASCII grids and the `.hdr`
//! sidecar of ESRI binary float grids.

use crate::{DemError, C};
use geo::geometry::Coord;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Header {
    /// Number of (columns, rows).
    pub dimensions: (usize, usize),

    /// Outer lower-left corner of the grid.
    pub ll_corner: Coord<C>,

    pub cell_size: C,

    pub nodata: Option<f32>,

    /// Byte order of binary samples; ignored for ASCII grids.
    pub big_endian: bool,
}

impl Header {
    /// Returns the number of samples the header describes.
    pub fn len(&self) -> usize {
        let (cols, rows) = self.dimensions;
        cols * rows
    }
}

/// Whether a header coordinate names the outer corner or the center
/// of the lower-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Corner,
    Center,
}

#[derive(Debug, Default)]
pub(crate) struct HeaderBuilder {
    ncols: Option<usize>,
    nrows: Option<usize>,
    x: Option<(C, Anchor)>,
    y: Option<(C, Anchor)>,
    cell_size: Option<C>,
    nodata: Option<f32>,
    big_endian: bool,
}

impl HeaderBuilder {
    /// Consumes `line` if it is a header line.
    ///
    /// Returns `false` when `line` starts with a number, meaning the
    /// header is over and sample data begins.
    pub fn accept(&mut self, line: &str, path: &Path) -> Result<bool, DemError> {
        let mut tokens = line.split_whitespace();
        let Some(key) = tokens.next() else {
            return Ok(true);
        };
        if key.parse::<f32>().is_ok() {
            return Ok(false);
        }
        let mk_err = || DemError::Header(line.to_owned(), path.to_owned());
        let value = tokens.next().ok_or_else(mk_err)?;
        match key.to_ascii_lowercase().as_str() {
            "ncols" => self.ncols = Some(value.parse().map_err(|_| mk_err())?),
            "nrows" => self.nrows = Some(value.parse().map_err(|_| mk_err())?),
            "xllcorner" => self.x = Some((value.parse().map_err(|_| mk_err())?, Anchor::Corner)),
            "xllcenter" => self.x = Some((value.parse().map_err(|_| mk_err())?, Anchor::Center)),
            "yllcorner" => self.y = Some((value.parse().map_err(|_| mk_err())?, Anchor::Corner)),
            "yllcenter" => self.y = Some((value.parse().map_err(|_| mk_err())?, Anchor::Center)),
            "cellsize" => self.cell_size = Some(value.parse().map_err(|_| mk_err())?),
            "nodata_value" | "nodata" => self.nodata = Some(value.parse().map_err(|_| mk_err())?),
            "byteorder" => {
                self.big_endian = match value.to_ascii_lowercase().as_str() {
                    "msbfirst" | "m" => true,
                    "lsbfirst" | "i" => false,
                    _ => return Err(mk_err()),
                }
            }
            // Other writers add keys we have no use for (nbits,
            // pixeltype, ...).
            _ => (),
        };
        Ok(true)
    }

    pub fn finish(self, path: &Path) -> Result<Header, DemError> {
        let missing = |field| DemError::MissingField(field, path.to_owned());
        let cols = self.ncols.ok_or_else(|| missing("ncols"))?;
        let rows = self.nrows.ok_or_else(|| missing("nrows"))?;
        let (x, x_anchor) = self.x.ok_or_else(|| missing("xllcorner"))?;
        let (y, y_anchor) = self.y.ok_or_else(|| missing("yllcorner"))?;
        let cell_size = self.cell_size.ok_or_else(|| missing("cellsize"))?;
        let to_corner = |v: C, anchor| match anchor {
            Anchor::Corner => v,
            Anchor::Center => v - cell_size / 2.0,
        };
        Ok(Header {
            dimensions: (cols, rows),
            ll_corner: Coord {
                x: to_corner(x, x_anchor),
                y: to_corner(y, y_anchor),
            },
            cell_size,
            nodata: self.nodata,
            big_endian: self.big_endian,
        })
    }
}
