//! Outbound events and the throttled presentation snapshot
//!
//! Events are queued during fixed steps and drained by the host after
//! `advance` returns. Cell positions use the caller's row convention.

use serde::{Deserialize, Serialize};

use super::state::{PowerUpKind, SpecialKind};

/// A cell coordinate in the caller's convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellPos {
    pub x: usize,
    pub y: usize,
}

/// Events fired synchronously during a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// A single cell was destroyed
    BlockDestroyed { pos: CellPos },
    /// Total cells destroyed during one fixed step
    BlocksDestroyed { count: u32 },
    /// A bomb cell reached 0 hp
    BombDetonated { pos: CellPos },
    /// A cursed cell was hit (fires on every hit)
    CursedHit { pos: CellPos },
    /// A mirror cell was hit
    MirrorHit { pos: CellPos },
    /// A core cell was destroyed (round ends by objective)
    CoreDestroyed { pos: CellPos },
    /// A special shape was placed
    ShapeSpawned { kind: SpecialKind, cells: Vec<CellPos> },
    /// A drop started falling
    DropSpawned { kind: PowerUpKind, pos: CellPos },
    /// The paddle caught a drop (or the host granted a power-up)
    PowerUpCollected { kind: PowerUpKind },
    /// Lives counter changed
    LivesChanged { lives: u32 },
    /// Lives reached zero
    LifeDepleted,
    /// Throttled state sample for the presentation layer
    Snapshot(Snapshot),
}

/// First ball's kinematics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallSample {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

/// Read-only state sample emitted every snapshot interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub ball: Option<BallSample>,
    pub paddle_x: f32,
    pub paddle_width: f32,
    pub lives: u32,
}

/// Wall-time gate for snapshot emission
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotThrottle {
    interval_ms: f64,
    elapsed_ms: f64,
}

impl SnapshotThrottle {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            elapsed_ms: 0.0,
        }
    }

    /// Add wall time; true when a snapshot is due
    pub fn tick(&mut self, wall_delta_ms: f64) -> bool {
        if wall_delta_ms.is_finite() && wall_delta_ms > 0.0 {
            self.elapsed_ms += wall_delta_ms;
        }
        if self.elapsed_ms >= self.interval_ms {
            // Drop the backlog: one snapshot per due frame
            self.elapsed_ms %= self.interval_ms;
            true
        } else {
            false
        }
    }
}
