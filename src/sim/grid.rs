//! Grid store: cell occupancy plus sparse special-cell metadata
//!
//! Coordinates are engine-space `(x, y)`: `x` is the column, `y` the row
//! with row 0 at the far edge from the paddle.

use std::collections::BTreeMap;

use super::state::{PowerUpKind, SpecialCell, SpecialKind};

/// What was left behind when a cell was cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearedCell {
    pub special: Option<SpecialCell>,
    pub guaranteed_drop: Option<PowerUpKind>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    /// Row-major occupancy
    alive: Vec<bool>,
    specials: BTreeMap<(usize, usize), SpecialCell>,
    guaranteed_drops: BTreeMap<(usize, usize), PowerUpKind>,
}

impl Grid {
    /// Empty grid; dimensions are fixed for its lifetime
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            alive: vec![false; rows * cols],
            specials: BTreeMap::new(),
            guaranteed_drops: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.cols && (y as usize) < self.rows
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.cols && y < self.rows).then(|| y * self.cols + x)
    }

    pub fn is_alive(&self, x: usize, y: usize) -> bool {
        self.index(x, y).is_some_and(|i| self.alive[i])
    }

    /// Mark a cell alive (level load only)
    pub fn fill(&mut self, x: usize, y: usize) {
        if let Some(i) = self.index(x, y) {
            self.alive[i] = true;
        }
    }

    pub fn special(&self, x: usize, y: usize) -> Option<&SpecialCell> {
        self.specials.get(&(x, y))
    }

    pub fn special_mut(&mut self, x: usize, y: usize) -> Option<&mut SpecialCell> {
        self.specials.get_mut(&(x, y))
    }

    pub fn is_special(&self, x: usize, y: usize) -> bool {
        self.specials.contains_key(&(x, y))
    }

    /// Attach special metadata. Refused (returns false) unless the cell is alive.
    pub fn set_special(&mut self, x: usize, y: usize, cell: SpecialCell) -> bool {
        if !self.is_alive(x, y) {
            return false;
        }
        self.specials.insert((x, y), cell);
        true
    }

    /// Promise a specific drop when this cell is destroyed
    pub fn set_guaranteed_drop(&mut self, x: usize, y: usize, kind: PowerUpKind) -> bool {
        if !self.is_alive(x, y) {
            return false;
        }
        self.guaranteed_drops.insert((x, y), kind);
        true
    }

    pub fn guaranteed_drop(&self, x: usize, y: usize) -> Option<PowerUpKind> {
        self.guaranteed_drops.get(&(x, y)).copied()
    }

    /// Kill a cell, removing any metadata attached to it
    pub fn clear(&mut self, x: usize, y: usize) -> ClearedCell {
        if let Some(i) = self.index(x, y) {
            self.alive[i] = false;
        }
        ClearedCell {
            special: self.specials.remove(&(x, y)),
            guaranteed_drop: self.guaranteed_drops.remove(&(x, y)),
        }
    }

    /// Number of live cells
    pub fn alive_count(&self) -> usize {
        self.alive.iter().filter(|&&a| a).count()
    }

    /// Special cells in (x, y) order
    pub fn specials(&self) -> impl Iterator<Item = ((usize, usize), &SpecialCell)> {
        self.specials.iter().map(|(&pos, cell)| (pos, cell))
    }

    pub fn count_special(&self, kind: SpecialKind) -> usize {
        self.specials.values().filter(|c| c.kind == kind).count()
    }

    /// Live cells in row-major order
    pub fn alive_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let cols = self.cols;
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, a)| **a)
            .map(move |(i, _)| (i % cols, i / cols))
    }
}
