//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID, grid cells row-major)
//! - No rendering or platform dependencies

pub mod clock;
pub mod collision;
pub mod effects;
pub mod events;
pub mod grid;
pub mod spawner;
pub mod state;
pub mod tick;

pub use clock::FixedClock;
pub use effects::{ActiveEffects, StepModifiers, TimedEffect};
pub use events::{BallSample, CellPos, GameEvent, Snapshot, SnapshotThrottle};
pub use grid::Grid;
pub use spawner::ShapeKind;
pub use state::{
    Ball, BallState, Debuff, GameState, Paddle, PaddleIntent, Pickup, PowerUpKind, RoundPhase,
    SpecialCell, SpecialKind,
};
pub use tick::{SpawnRequest, TickInput, tick};
