//! Read-only elevation lookups consumed by the horizon profiler.

use crate::C;
use dem::Grid;
use geo::geometry::{Coord, Rect};

/// A DEM the horizon profiler can march across.
///
/// Implementations must be safe for concurrent readers; every lookup
/// takes `&self`.
pub trait ElevationSource: Sync {
    /// Returns the terrain elevation at `coord`, or `None` outside
    /// the extent and for missing data.
    fn elevation(&self, coord: Coord<C>) -> Option<C>;

    /// Returns the ground elevation beneath a sample at `coord`.
    fn ground_elevation(&self, coord: Coord<C>) -> Option<C> {
        self.elevation(coord)
    }

    /// Returns the rectangle outside of which every lookup is `None`.
    fn extent(&self) -> Rect<C>;

    /// Returns the spacing between elevation samples.
    fn cell_size(&self) -> C;

    /// Returns an upper bound of every elevation, if known.
    fn max_elevation(&self) -> Option<C> {
        None
    }
}

impl ElevationSource for Grid {
    fn elevation(&self, coord: Coord<C>) -> Option<C> {
        self.interpolate(coord)
    }

    fn extent(&self) -> Rect<C> {
        Grid::extent(self)
    }

    fn cell_size(&self) -> C {
        Grid::cell_size(self)
    }

    fn max_elevation(&self) -> Option<C> {
        Grid::max_elevation(self).map(C::from)
    }
}

/// Returns `true` if `coord` lies within `extent`.
pub(crate) fn contains(extent: &Rect<C>, coord: Coord<C>) -> bool {
    let (min, max) = (extent.min(), extent.max());
    min.x <= coord.x && coord.x <= max.x && min.y <= coord.y && coord.y <= max.y
}
