//! Fixed timestep accumulator
//!
//! Turns variable frame deltas into a whole number of fixed steps so the
//! simulation depends only on total elapsed time, not on frame rate.

use crate::consts::{FIXED_STEP_MS, MAX_FRAME_DELTA_MS};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixedClock {
    /// Leftover sub-step time carried between frames (ms)
    accumulator_ms: f64,
}

impl FixedClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamp a raw frame delta to `[0, MAX_FRAME_DELTA_MS]` (NaN counts as 0)
    pub fn clamp_delta(frame_delta_ms: f64) -> f64 {
        if frame_delta_ms.is_nan() {
            0.0
        } else {
            frame_delta_ms.clamp(0.0, MAX_FRAME_DELTA_MS)
        }
    }

    /// Add frame time and return how many fixed steps must run now
    pub fn accumulate(&mut self, frame_delta_ms: f64) -> u32 {
        self.accumulator_ms += Self::clamp_delta(frame_delta_ms);
        let mut steps = 0;
        while self.accumulator_ms >= FIXED_STEP_MS {
            self.accumulator_ms -= FIXED_STEP_MS;
            steps += 1;
        }
        steps
    }

    /// Time waiting for the next step (ms)
    pub fn leftover_ms(&self) -> f64 {
        self.accumulator_ms
    }

    /// Interpolation alpha for rendering between steps (0.0 to 1.0)
    pub fn alpha(&self) -> f64 {
        self.accumulator_ms / FIXED_STEP_MS
    }
}
