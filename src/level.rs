//! Level definitions supplied by the level provider
//!
//! A level is a rectangular layout of `#` (filled) and `.` (empty) cells plus
//! optional special cells and guaranteed drops. Rows and coordinates use the
//! caller's vertical convention and are converted to engine space when the
//! grid is built.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::VerticalAxis;
use crate::sim::grid::Grid;
use crate::sim::state::{PowerUpKind, SpecialCell, SpecialKind};

const FILLED: char = '#';
const EMPTY: char = '.';

/// Level loading errors
#[derive(Error, Debug)]
pub enum LevelError {
    #[error("invalid level JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("level has no cells")]
    EmptyGrid,

    #[error("row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unexpected character {ch:?} at row {row}, column {col}")]
    InvalidCell { row: usize, col: usize, ch: char },
}

/// A pre-placed special cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialPlacement {
    pub x: usize,
    pub y: usize,
    pub kind: SpecialKind,
    /// Overrides the kind's spawn hp
    #[serde(default)]
    pub hp: Option<u8>,
}

/// A cell that always releases a specific power-up when destroyed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuaranteedDrop {
    pub x: usize,
    pub y: usize,
    pub kind: PowerUpKind,
}

/// Initial grid and level flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDefinition {
    /// Rows in the caller's convention (`layout[0]` is caller row 0)
    pub layout: Vec<String>,
    #[serde(default)]
    pub specials: Vec<SpecialPlacement>,
    #[serde(default)]
    pub drops: Vec<GuaranteedDrop>,
    /// Boss levels are flagged for the session layer only
    #[serde(default)]
    pub boss: bool,
    /// Place the core by deterministic scan when the engine starts
    #[serde(default)]
    pub place_core: bool,
}

impl LevelDefinition {
    /// Parse and validate a level
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let level: Self = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    /// Level from layout rows alone
    pub fn from_rows(rows: &[&str]) -> Result<Self, LevelError> {
        let level = Self {
            layout: rows.iter().map(|r| r.to_string()).collect(),
            specials: Vec::new(),
            drops: Vec::new(),
            boss: false,
            place_core: false,
        };
        level.validate()?;
        Ok(level)
    }

    /// An all-empty level of the given size
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            layout: vec![EMPTY.to_string().repeat(cols); rows],
            specials: Vec::new(),
            drops: Vec::new(),
            boss: false,
            place_core: false,
        }
    }

    /// Built-in 20x12 level used by the demo runner (bottom-up rows)
    pub fn demo() -> Self {
        let mut layout = vec![EMPTY.to_string().repeat(12); 20];
        for row in layout.iter_mut().skip(12) {
            *row = FILLED.to_string().repeat(12);
        }
        layout[12] = "##.######.##".to_string();
        Self {
            layout,
            specials: vec![
                SpecialPlacement {
                    x: 1,
                    y: 17,
                    kind: SpecialKind::Armored,
                    hp: None,
                },
                SpecialPlacement {
                    x: 10,
                    y: 17,
                    kind: SpecialKind::Mirror,
                    hp: None,
                },
                SpecialPlacement {
                    x: 6,
                    y: 13,
                    kind: SpecialKind::Bomb,
                    hp: None,
                },
            ],
            drops: vec![GuaranteedDrop {
                x: 3,
                y: 18,
                kind: PowerUpKind::MultiBall,
            }],
            boss: false,
            place_core: true,
        }
    }

    pub fn rows(&self) -> usize {
        self.layout.len()
    }

    pub fn cols(&self) -> usize {
        self.layout.first().map(|r| r.chars().count()).unwrap_or(0)
    }

    /// Check the layout is a non-empty rectangle of known cell characters
    pub fn validate(&self) -> Result<(), LevelError> {
        let cols = self.cols();
        if self.layout.is_empty() || cols == 0 {
            return Err(LevelError::EmptyGrid);
        }
        for (row, line) in self.layout.iter().enumerate() {
            let found = line.chars().count();
            if found != cols {
                return Err(LevelError::RaggedRow {
                    row,
                    expected: cols,
                    found,
                });
            }
            if let Some((col, ch)) = line
                .chars()
                .enumerate()
                .find(|(_, ch)| *ch != FILLED && *ch != EMPTY)
            {
                return Err(LevelError::InvalidCell { row, col, ch });
            }
        }
        Ok(())
    }

    /// Build the engine-space grid.
    ///
    /// Tolerant of unvalidated input: short rows are padded with empty cells,
    /// and specials or drops that cannot be honoured are skipped with a warning.
    pub fn build_grid(&self, axis: VerticalAxis) -> Grid {
        let rows = self.rows();
        let cols = self
            .layout
            .iter()
            .map(|r| r.chars().count())
            .max()
            .unwrap_or(0);
        let mut grid = Grid::new(rows, cols);

        for (caller_row, line) in self.layout.iter().enumerate() {
            let y = axis.to_engine_row(caller_row, rows);
            for (x, ch) in line.chars().enumerate() {
                if ch == FILLED {
                    grid.fill(x, y);
                }
            }
        }

        for placement in &self.specials {
            let Some(y) = self.engine_row(placement.y, axis) else {
                log::warn!(
                    "Skipping special {:?}: row {} out of bounds",
                    placement.kind,
                    placement.y
                );
                continue;
            };
            let cell = match placement.hp {
                Some(hp) => SpecialCell::with_hp(placement.kind, hp),
                None => SpecialCell::new(placement.kind),
            };
            if !grid.set_special(placement.x, y, cell) {
                log::warn!(
                    "Skipping special {:?} at ({}, {}): cell is empty",
                    placement.kind,
                    placement.x,
                    placement.y
                );
            }
        }

        for drop in &self.drops {
            let placed = self
                .engine_row(drop.y, axis)
                .is_some_and(|y| grid.set_guaranteed_drop(drop.x, y, drop.kind));
            if !placed {
                log::warn!(
                    "Skipping guaranteed {:?} drop at ({}, {})",
                    drop.kind,
                    drop.x,
                    drop.y
                );
            }
        }

        grid
    }

    fn engine_row(&self, caller_row: usize, axis: VerticalAxis) -> Option<usize> {
        (caller_row < self.rows()).then(|| axis.to_engine_row(caller_row, self.rows()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let json = r#"{
            "layout": ["..##", ".###"],
            "specials": [{ "x": 2, "y": 0, "kind": "bomb" }],
            "drops": [{ "x": 1, "y": 1, "kind": "multi_ball" }],
            "place_core": true
        }"#;
        let level = LevelDefinition::from_json(json).unwrap();
        assert_eq!(level.rows(), 2);
        assert_eq!(level.cols(), 4);
        assert!(level.place_core);
        assert!(!level.boss);
        assert_eq!(level.specials[0].kind, SpecialKind::Bomb);
        assert_eq!(level.drops[0].kind, PowerUpKind::MultiBall);

        let grid = level.build_grid(VerticalAxis::BottomUp);
        assert_eq!(grid.alive_count(), 5);
        assert_eq!(grid.guaranteed_drop(1, 0), Some(PowerUpKind::MultiBall));
    }

    #[test]
    fn test_validate_errors() {
        assert!(matches!(
            LevelDefinition::from_rows(&[]),
            Err(LevelError::EmptyGrid)
        ));
        assert!(matches!(
            LevelDefinition::from_rows(&["###", "##"]),
            Err(LevelError::RaggedRow {
                row: 1,
                expected: 3,
                found: 2
            })
        ));
        assert!(matches!(
            LevelDefinition::from_rows(&["#x#"]),
            Err(LevelError::InvalidCell {
                row: 0,
                col: 1,
                ch: 'x'
            })
        ));
        assert!(matches!(
            LevelDefinition::from_json("{"),
            Err(LevelError::Parse(_))
        ));
    }

    #[test]
    fn test_build_grid_bottom_up() {
        let level = LevelDefinition::from_rows(&["#...", "...."]).unwrap();
        // Caller row 0 is the engine's last row
        let grid = level.build_grid(VerticalAxis::BottomUp);
        assert!(grid.is_alive(0, 1));
        assert!(!grid.is_alive(0, 0));

        let grid = level.build_grid(VerticalAxis::TopDown);
        assert!(grid.is_alive(0, 0));
    }

    #[test]
    fn test_build_grid_skips_bad_entries() {
        let mut level = LevelDefinition::from_rows(&["#.", "##"]).unwrap();
        level.specials.push(SpecialPlacement {
            x: 1,
            y: 0,
            kind: SpecialKind::Cursed,
            hp: None,
        });
        level.specials.push(SpecialPlacement {
            x: 0,
            y: 0,
            kind: SpecialKind::Armored,
            hp: Some(5),
        });
        level.drops.push(GuaranteedDrop {
            x: 0,
            y: 9,
            kind: PowerUpKind::Piercing,
        });

        let grid = level.build_grid(VerticalAxis::TopDown);
        assert_eq!(grid.specials().count(), 1);
        assert_eq!(grid.special(0, 0).map(|c| c.hp), Some(5));
        assert_eq!(grid.guaranteed_drop(0, 0), None);
    }

    #[test]
    fn test_demo_level_is_valid() {
        let level = LevelDefinition::demo();
        level.validate().unwrap();
        let grid = level.build_grid(VerticalAxis::BottomUp);
        assert_eq!(grid.specials().count(), 3);
        assert!(grid.alive_count() > 0);
    }
}
