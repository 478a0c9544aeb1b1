//! Synthetic terrain shared by unit tests.

use crate::C;
use dem::Grid;
use geo::geometry::Coord;

pub const NODATA: f32 = -9999.0;

/// Returns a square grid of `2 * half + 1` cells per side, centered
/// on the origin, with each cell's sample set to `f(x, y)` of its
/// center.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn grid_fn(half: usize, cell_size: C, f: impl Fn(C, C) -> C) -> Grid {
    let n = 2 * half + 1;
    let corner = -(half as C + 0.5) * cell_size;
    let mut samples = Vec::with_capacity(n * n);
    // Northern row first.
    for row in (0..n).rev() {
        for col in 0..n {
            let x = (col as C - half as C) * cell_size;
            let y = (row as C - half as C) * cell_size;
            samples.push(f(x, y) as f32);
        }
    }
    Grid::new(
        Coord {
            x: corner,
            y: corner,
        },
        cell_size,
        (n, n),
        Some(NODATA),
        samples,
    )
    .unwrap()
}

/// Flat ground at 0 with a 50 high, 5 cell wide wall 100 east of the
/// origin.
pub fn obstruction() -> Grid {
    grid_fn(500, 1.0, |x, y| {
        if x == 100.0 && y.abs() <= 2.0 {
            50.0
        } else {
            0.0
        }
    })
}
