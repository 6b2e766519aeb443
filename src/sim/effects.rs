//! Timed power-up effects and their combined influence on physics
//!
//! Effects are stored as expiry timestamps in simulated milliseconds. An
//! effect is active iff `now < expiry`; re-activation refreshes the expiry.

use serde::{Deserialize, Serialize};

use super::state::{Debuff, PowerUpKind};
use crate::consts::MAX_HOST_SPEED;
use crate::settings::EngineSettings;

/// Effects with a duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimedEffect {
    Piercing,
    PaddleExtend,
    SlowMotion,
    ChaoticBall,
}

impl TimedEffect {
    /// Timed effect granted by a power-up (multi-ball is instantaneous)
    pub fn from_power_up(kind: PowerUpKind) -> Option<Self> {
        match kind {
            PowerUpKind::Piercing => Some(TimedEffect::Piercing),
            PowerUpKind::ExtendPaddle => Some(TimedEffect::PaddleExtend),
            PowerUpKind::SlowMotion => Some(TimedEffect::SlowMotion),
            PowerUpKind::ChaoticBall => Some(TimedEffect::ChaoticBall),
            PowerUpKind::MultiBall => None,
        }
    }

    pub fn duration_ms(&self, settings: &EngineSettings) -> u64 {
        match self {
            TimedEffect::Piercing => settings.piercing_duration_ms,
            TimedEffect::PaddleExtend => settings.extend_duration_ms,
            TimedEffect::SlowMotion => settings.slow_motion_duration_ms,
            TimedEffect::ChaoticBall => settings.chaotic_duration_ms,
        }
    }
}

/// Expiry timestamps for every timed effect (0 = never activated)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffects {
    pub piercing_until: u64,
    pub extend_until: u64,
    pub slow_motion_until: u64,
    pub chaotic_until: u64,
}

impl ActiveEffects {
    fn expiry_mut(&mut self, effect: TimedEffect) -> &mut u64 {
        match effect {
            TimedEffect::Piercing => &mut self.piercing_until,
            TimedEffect::PaddleExtend => &mut self.extend_until,
            TimedEffect::SlowMotion => &mut self.slow_motion_until,
            TimedEffect::ChaoticBall => &mut self.chaotic_until,
        }
    }

    pub fn expiry(&self, effect: TimedEffect) -> u64 {
        match effect {
            TimedEffect::Piercing => self.piercing_until,
            TimedEffect::PaddleExtend => self.extend_until,
            TimedEffect::SlowMotion => self.slow_motion_until,
            TimedEffect::ChaoticBall => self.chaotic_until,
        }
    }

    #[inline]
    pub fn is_active(&self, effect: TimedEffect, now_ms: u64) -> bool {
        now_ms < self.expiry(effect)
    }

    /// Start (or refresh) an effect; durations never stack
    pub fn activate(&mut self, effect: TimedEffect, now_ms: u64, settings: &EngineSettings) {
        *self.expiry_mut(effect) = now_ms + effect.duration_ms(settings);
    }

    /// Remaining time of an effect in ms (0 when inactive)
    pub fn remaining_ms(&self, effect: TimedEffect, now_ms: u64) -> u64 {
        self.expiry(effect).saturating_sub(now_ms)
    }
}

/// Per-step physics parameters derived from effects, debuff and host scalar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepModifiers {
    pub piercing: bool,
    pub chaotic: bool,
    /// Multiplier applied to velocity x fixed step
    pub speed_multiplier: f32,
    pub paddle_width: f32,
}

impl StepModifiers {
    pub fn compute(
        effects: &ActiveEffects,
        debuff: Option<Debuff>,
        now_ms: u64,
        host_speed: f32,
        settings: &EngineSettings,
    ) -> Self {
        let extend = effects.is_active(TimedEffect::PaddleExtend, now_ms);
        let slow_motion = effects.is_active(TimedEffect::SlowMotion, now_ms);

        let host_speed = host_speed.clamp(0.0, MAX_HOST_SPEED);
        let mut speed_multiplier = settings.ball_speed_scale * host_speed;
        if debuff == Some(Debuff::SlowBall) {
            speed_multiplier *= settings.slow_debuff_factor;
        }
        if slow_motion {
            speed_multiplier *= settings.slow_motion_factor;
        }

        Self {
            piercing: effects.is_active(TimedEffect::Piercing, now_ms),
            chaotic: effects.is_active(TimedEffect::ChaoticBall, now_ms)
                || debuff == Some(Debuff::ChaoticPath),
            speed_multiplier,
            paddle_width: paddle_width(extend, debuff, settings),
        }
    }
}

/// Paddle width = base x (extend ? factor : 1) x (shrink ? factor : 1)
pub fn paddle_width(extend: bool, debuff: Option<Debuff>, settings: &EngineSettings) -> f32 {
    let mut width = settings.paddle_base_width;
    if extend {
        width *= settings.extend_factor;
    }
    if debuff == Some(Debuff::PaddleShrink) {
        width *= settings.shrink_factor;
    }
    width
}
