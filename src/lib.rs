//! Brick Rush - brick-destruction physics core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (grid, balls, drops, effects, collisions)
//! - `engine`: Host-facing engine object (frame driving, controls, events)
//! - `level`: Level definitions supplied by the level provider
//! - `settings`: Data-driven tuning

pub mod engine;
pub mod level;
pub mod settings;
pub mod sim;

pub use engine::Engine;
pub use level::{LevelDefinition, LevelError};
pub use settings::{EngineSettings, VerticalAxis};

/// Simulation constants that define determinism (not tunable)
pub mod consts {
    /// Fixed simulation timestep in milliseconds (250 Hz)
    pub const FIXED_STEP_MS: f64 = 4.0;
    /// Largest frame delta accepted by `advance` (stall guard)
    pub const MAX_FRAME_DELTA_MS: f64 = 24.0;

    /// Fixed step as f32 for integration math
    pub const FIXED_STEP_MS_F32: f32 = FIXED_STEP_MS as f32;

    /// Hit points of a randomly spawned armored shape cell
    pub const ARMORED_SPAWN_HP: u8 = 3;
    /// Hit points of every other spawned special cell
    pub const DEFAULT_SPECIAL_HP: u8 = 1;

    /// First engine row the core search considers (row 0 is the outermost edge)
    pub const CORE_SCAN_START_ROW: usize = 1;

    /// Maximum ball speed (velocity units, before the speed multiplier)
    pub const BALL_MAX_SPEED: f32 = 0.9;
    /// Largest host speed multiplier accepted
    pub const MAX_HOST_SPEED: f32 = 8.0;
    /// Upper bound on ball substeps per fixed step
    pub const MAX_BALL_SUBSTEPS: u32 = 8;
}

/// Center of a cell in continuous grid units
#[inline]
pub fn cell_center(x: usize, y: usize) -> glam::Vec2 {
    glam::Vec2::new(x as f32 + 0.5, y as f32 + 0.5)
}
