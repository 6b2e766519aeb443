//! Engine tuning
//!
//! Every gameplay constant that a host may want to rebalance lives here.
//! Loaded once from JSON (or defaulted) and handed to the engine at creation.

use serde::{Deserialize, Serialize};

/// Row convention used by the caller for level input and cell output.
///
/// The engine always simulates with row 0 at the far edge and the paddle
/// over the last rows. Screen-oriented callers count rows upward from the
/// paddle side instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAxis {
    /// Caller row 0 is the engine's row 0
    TopDown,
    /// Caller row 0 is the engine's last row
    #[default]
    BottomUp,
}

impl VerticalAxis {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerticalAxis::TopDown => "top_down",
            VerticalAxis::BottomUp => "bottom_up",
        }
    }

    /// Map a caller row to an engine row (the mapping is its own inverse)
    #[inline]
    pub fn to_engine_row(&self, row: usize, rows: usize) -> usize {
        match self {
            VerticalAxis::TopDown => row,
            VerticalAxis::BottomUp => rows - 1 - row,
        }
    }

    /// Map an engine row back to the caller's convention
    #[inline]
    pub fn to_caller_row(&self, row: usize, rows: usize) -> usize {
        self.to_engine_row(row, rows)
    }

    /// Map a continuous engine y (0 = far edge) into the caller's convention
    #[inline]
    pub fn to_caller_y(&self, y: f32, height: f32) -> f32 {
        match self {
            VerticalAxis::TopDown => y,
            VerticalAxis::BottomUp => height - y,
        }
    }

    #[inline]
    pub fn to_caller_vy(&self, vy: f32) -> f32 {
        match self {
            VerticalAxis::TopDown => vy,
            VerticalAxis::BottomUp => -vy,
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    // === Round ===
    /// Lives at round start
    pub initial_lives: u32,

    // === Ball ===
    /// Ball radius in cells
    pub ball_radius: f32,
    /// Global scalar turning velocity x milliseconds into cells
    pub ball_speed_scale: f32,
    /// Velocity given to a docked ball on launch
    pub launch_velocity: (f32, f32),
    /// Smallest horizontal speed after a paddle bounce
    pub min_horizontal_speed: f32,
    /// Steepest paddle bounce angle from vertical (radians)
    pub max_bounce_angle: f32,

    // === Paddle ===
    /// Paddle width before effects and debuffs (cells)
    pub paddle_base_width: f32,
    /// Height of the paddle's collision band (cells)
    pub paddle_thickness: f32,
    /// Distance from the bottom boundary to the paddle's top edge (cells)
    pub paddle_offset_from_bottom: f32,
    /// Paddle travel speed (cells per ms)
    pub paddle_speed: f32,

    // === Drops ===
    /// Probability that an ordinary destruction spawns a drop
    pub drop_rate: f64,
    /// Drop fall speed (cells per ms)
    pub drop_fall_speed: f32,
    /// Drop catch box edge length (cells)
    pub drop_size: f32,

    // === Effect durations (ms) ===
    pub piercing_duration_ms: u64,
    pub extend_duration_ms: u64,
    pub slow_motion_duration_ms: u64,
    pub chaotic_duration_ms: u64,

    // === Effect strengths ===
    /// Paddle width multiplier while extended
    pub extend_factor: f32,
    /// Paddle width multiplier under the shrink debuff
    pub shrink_factor: f32,
    /// Ball speed multiplier during slow-motion
    pub slow_motion_factor: f32,
    /// Ball speed multiplier under the slow-ball debuff
    pub slow_debuff_factor: f32,
    /// Max per-step horizontal jitter while chaotic
    pub chaos_jitter: f32,
    /// Max horizontal jitter added by a mirror bounce
    pub mirror_jitter: f32,
    /// Extra horizontal speed given to multi-ball clones
    pub multi_ball_spread: f32,

    // === Spawner ===
    /// Random placement attempts before a shape request gives up
    pub shape_spawn_attempts: u32,
    /// Width of the centered column band searched for the core
    pub core_band_width: usize,

    // === Presentation ===
    /// Wall time between throttled snapshots (ms)
    pub snapshot_interval_ms: f64,
    /// Caller's row convention
    pub vertical_axis: VerticalAxis,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            initial_lives: 3,

            ball_radius: 0.35,
            ball_speed_scale: 0.06,
            launch_velocity: (0.27, -0.315),
            min_horizontal_speed: 0.06,
            max_bounce_angle: std::f32::consts::FRAC_PI_3,

            paddle_base_width: 3.0,
            paddle_thickness: 0.4,
            paddle_offset_from_bottom: 1.5,
            paddle_speed: 0.03,

            drop_rate: 0.12,
            drop_fall_speed: 0.006,
            drop_size: 0.8,

            piercing_duration_ms: 8_000,
            extend_duration_ms: 10_000,
            slow_motion_duration_ms: 8_000,
            chaotic_duration_ms: 6_000,

            extend_factor: 1.45,
            shrink_factor: 0.7,
            slow_motion_factor: 0.6,
            slow_debuff_factor: 0.75,
            chaos_jitter: 0.004,
            mirror_jitter: 0.03,
            multi_ball_spread: 0.05,

            shape_spawn_attempts: 50,
            core_band_width: 4,

            snapshot_interval_ms: 200.0,
            vertical_axis: VerticalAxis::BottomUp,
        }
    }
}

impl EngineSettings {
    /// Parse settings from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::sanitized)
    }

    /// Replace non-finite or out-of-range values with defaults/clamps
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        fn positive(value: f32, fallback: f32) -> f32 {
            if value.is_finite() && value > 0.0 { value } else { fallback }
        }
        fn non_negative(value: f32, fallback: f32) -> f32 {
            if value.is_finite() && value >= 0.0 { value } else { fallback }
        }

        self.ball_radius = positive(self.ball_radius, defaults.ball_radius).min(0.5);
        self.ball_speed_scale = positive(self.ball_speed_scale, defaults.ball_speed_scale);
        if !(self.launch_velocity.0.is_finite() && self.launch_velocity.1.is_finite()) {
            self.launch_velocity = defaults.launch_velocity;
        }
        self.min_horizontal_speed =
            non_negative(self.min_horizontal_speed, defaults.min_horizontal_speed);
        self.max_bounce_angle = positive(self.max_bounce_angle, defaults.max_bounce_angle)
            .min(std::f32::consts::FRAC_PI_2 * 0.95);

        self.paddle_base_width = positive(self.paddle_base_width, defaults.paddle_base_width);
        self.paddle_thickness = positive(self.paddle_thickness, defaults.paddle_thickness);
        self.paddle_offset_from_bottom = positive(
            self.paddle_offset_from_bottom,
            defaults.paddle_offset_from_bottom,
        );
        self.paddle_speed = non_negative(self.paddle_speed, defaults.paddle_speed);

        self.drop_rate = if self.drop_rate.is_finite() {
            self.drop_rate.clamp(0.0, 1.0)
        } else {
            defaults.drop_rate
        };
        self.drop_fall_speed = non_negative(self.drop_fall_speed, defaults.drop_fall_speed);
        self.drop_size = positive(self.drop_size, defaults.drop_size);

        self.extend_factor = positive(self.extend_factor, defaults.extend_factor);
        self.shrink_factor = positive(self.shrink_factor, defaults.shrink_factor);
        self.slow_motion_factor = positive(self.slow_motion_factor, defaults.slow_motion_factor);
        self.slow_debuff_factor = positive(self.slow_debuff_factor, defaults.slow_debuff_factor);
        self.chaos_jitter = non_negative(self.chaos_jitter, defaults.chaos_jitter);
        self.mirror_jitter = non_negative(self.mirror_jitter, defaults.mirror_jitter);
        self.multi_ball_spread = non_negative(self.multi_ball_spread, defaults.multi_ball_spread);

        self.core_band_width = self.core_band_width.max(2);
        if !(self.snapshot_interval_ms.is_finite() && self.snapshot_interval_ms > 0.0) {
            self.snapshot_interval_ms = defaults.snapshot_interval_ms;
        }
        self
    }
}
