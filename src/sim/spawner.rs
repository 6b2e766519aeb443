//! Spawning: power-up drops, random special shapes, and the core
//!
//! Shape placement is rejection sampling with a retry budget and may fail
//! silently. Core placement is an exhaustive scan so it always succeeds on
//! a level that has room for it. The two must stay separate algorithms.

use rand::Rng;

use super::grid::Grid;
use super::state::{PowerUpKind, SpecialCell, SpecialKind};

/// Tetromino-like 4-cell shapes used for special spawns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl ShapeKind {
    pub const ALL: [Self; 7] = [Self::I, Self::O, Self::T, Self::S, Self::Z, Self::J, Self::L];

    /// 4 cells relative to the anchor; each (dx, dy)
    pub fn cells(&self) -> &'static [(usize, usize); 4] {
        match self {
            Self::I => &[(0, 0), (1, 0), (2, 0), (3, 0)],
            Self::O => &[(0, 0), (1, 0), (0, 1), (1, 1)],
            Self::T => &[(0, 0), (1, 0), (2, 0), (1, 1)],
            Self::S => &[(1, 0), (2, 0), (0, 1), (1, 1)],
            Self::Z => &[(0, 0), (1, 0), (1, 1), (2, 1)],
            Self::J => &[(0, 0), (0, 1), (1, 1), (2, 1)],
            Self::L => &[(2, 0), (0, 1), (1, 1), (2, 1)],
        }
    }
}

/// The fixed 2x2 footprint of the core
pub const CORE_SHAPE: ShapeKind = ShapeKind::O;

/// Cells covered by `shape` anchored at `(x, y)`
pub fn footprint(shape: ShapeKind, x: usize, y: usize) -> [(usize, usize); 4] {
    let offsets = *shape.cells();
    offsets.map(|(dx, dy)| (x + dx, y + dy))
}

/// A placement is valid iff every covered cell is in bounds, alive and not special
pub fn is_valid_placement(grid: &Grid, cells: &[(usize, usize)]) -> bool {
    cells
        .iter()
        .all(|&(x, y)| grid.is_alive(x, y) && !grid.is_special(x, y))
}

fn mark(grid: &mut Grid, cells: &[(usize, usize)], kind: SpecialKind) {
    for &(x, y) in cells {
        grid.set_special(x, y, SpecialCell::new(kind));
    }
}

/// Roll for a drop after an ordinary destruction
pub fn roll_drop<R: Rng>(rng: &mut R, drop_rate: f64) -> Option<PowerUpKind> {
    if drop_rate > 0.0 && rng.random::<f64>() < drop_rate {
        Some(random_power_up(rng))
    } else {
        None
    }
}

/// Uniformly random power-up category
pub fn random_power_up<R: Rng>(rng: &mut R) -> PowerUpKind {
    PowerUpKind::ALL[rng.random_range(0..PowerUpKind::ALL.len())]
}

/// Try up to `attempts` random shape/anchor pairs; the first valid one is marked.
///
/// Returns the covered engine-space cells, or `None` when the budget ran out.
pub fn place_random_shape<R: Rng>(
    grid: &mut Grid,
    rng: &mut R,
    kind: SpecialKind,
    attempts: u32,
) -> Option<Vec<(usize, usize)>> {
    if grid.rows() == 0 || grid.cols() == 0 {
        return None;
    }
    for _ in 0..attempts {
        let shape = ShapeKind::ALL[rng.random_range(0..ShapeKind::ALL.len())];
        let x = rng.random_range(0..grid.cols());
        let y = rng.random_range(0..grid.rows());
        let cells = footprint(shape, x, y);
        if is_valid_placement(grid, &cells) {
            mark(grid, &cells, kind);
            return Some(cells.to_vec());
        }
    }
    None
}

/// Columns of the centered band searched for the core anchor
pub fn core_band(cols: usize, band_width: usize) -> std::ops::RangeInclusive<usize> {
    let band_width = band_width.min(cols).max(2);
    let start = (cols - band_width) / 2;
    // Last anchor whose 2x2 footprint still fits inside the band
    start..=start + band_width - 2
}

/// Scan rows from the far edge toward the paddle inside the centered band and
/// mark the first valid 2x2 placement as core.
pub fn place_core(grid: &mut Grid, band_width: usize) -> Option<Vec<(usize, usize)>> {
    if grid.rows() < 2 || grid.cols() < 2 {
        return None;
    }
    let start_row = crate::consts::CORE_SCAN_START_ROW.min(grid.rows() - 2);
    for y in start_row..grid.rows() - 1 {
        for x in core_band(grid.cols(), band_width) {
            let cells = footprint(CORE_SHAPE, x, y);
            if is_valid_placement(grid, &cells) {
                mark(grid, &cells, SpecialKind::Core);
                return Some(cells.to_vec());
            }
        }
    }
    None
}
