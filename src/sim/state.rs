//! Game state and core simulation types
//!
//! Everything a fixed step reads or mutates lives in [`GameState`].

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::effects::ActiveEffects;
use super::events::{CellPos, GameEvent};
use super::grid::Grid;
use crate::settings::{EngineSettings, VerticalAxis};

/// Current phase of the round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// A ball is docked on the paddle, waiting for launch
    Serve,
    /// At least one ball is in flight
    Playing,
    /// Lives reached zero
    LivesDepleted,
    /// A core cell was destroyed
    CoreDestroyed,
}

impl RoundPhase {
    /// Terminal phases stop ball integration until reset
    pub fn is_terminal(&self) -> bool {
        matches!(self, RoundPhase::LivesDepleted | RoundPhase::CoreDestroyed)
    }
}

/// Special cell behaviors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialKind {
    Armored,
    Bomb,
    Cursed,
    Mirror,
    Core,
}

impl SpecialKind {
    pub const ALL: [Self; 5] = [
        Self::Armored,
        Self::Bomb,
        Self::Cursed,
        Self::Mirror,
        Self::Core,
    ];

    /// Hit points for a freshly spawned cell of this kind
    pub fn spawn_hp(&self) -> u8 {
        match self {
            SpecialKind::Armored => crate::consts::ARMORED_SPAWN_HP,
            _ => crate::consts::DEFAULT_SPECIAL_HP,
        }
    }

    /// Core cells never roll for power-ups
    pub fn rolls_for_drop(&self) -> bool {
        *self != SpecialKind::Core
    }
}

/// Metadata attached to a special cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialCell {
    pub kind: SpecialKind,
    pub hp: u8,
}

impl SpecialCell {
    pub fn new(kind: SpecialKind) -> Self {
        Self {
            kind,
            hp: kind.spawn_hp(),
        }
    }

    pub fn with_hp(kind: SpecialKind, hp: u8) -> Self {
        Self { kind, hp: hp.max(1) }
    }
}

/// Power-up categories carried by drops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    Piercing,
    ExtendPaddle,
    SlowMotion,
    ChaoticBall,
    MultiBall,
}

impl PowerUpKind {
    pub const ALL: [Self; 5] = [
        Self::Piercing,
        Self::ExtendPaddle,
        Self::SlowMotion,
        Self::ChaoticBall,
        Self::MultiBall,
    ];
}

/// Debuffs imposed by the session layer (expiry owned by the caller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Debuff {
    /// Paddle width x shrink factor
    PaddleShrink,
    /// Ball speed x slow debuff factor
    SlowBall,
    /// Ball path jitters every step
    ChaoticPath,
}

impl Debuff {
    pub fn as_str(&self) -> &'static str {
        match self {
            Debuff::PaddleShrink => "paddle_shrink",
            Debuff::SlowBall => "slow_ball",
            Debuff::ChaoticPath => "chaotic_path",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "paddle_shrink" | "shrink" => Some(Debuff::PaddleShrink),
            "slow_ball" | "slow" => Some(Debuff::SlowBall),
            "chaotic_path" | "chaos" => Some(Debuff::ChaoticPath),
            _ => None,
        }
    }
}

/// Ball state - docked on the paddle or free-moving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallState {
    Docked,
    Free,
}

/// A ball entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub state: BallState,
}

impl Ball {
    pub fn is_free(&self) -> bool {
        self.state == BallState::Free
    }

    /// Sit the ball on top of the paddle's center
    pub fn dock_on(&mut self, paddle: &Paddle, paddle_top: f32, radius: f32) {
        self.state = BallState::Docked;
        self.vel = Vec2::ZERO;
        self.pos = Vec2::new(paddle.center(), paddle_top - radius);
    }

    /// Launch a docked ball; free balls are left alone
    pub fn launch(&mut self, velocity: Vec2) -> bool {
        if self.state == BallState::Docked {
            self.vel = velocity;
            self.state = BallState::Free;
            true
        } else {
            false
        }
    }

    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.vel.is_finite()
    }
}

/// Directional paddle intent from keyboard input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaddleIntent {
    Left,
    #[default]
    Stop,
    Right,
}

impl PaddleIntent {
    pub fn sign(&self) -> f32 {
        match self {
            PaddleIntent::Left => -1.0,
            PaddleIntent::Stop => 0.0,
            PaddleIntent::Right => 1.0,
        }
    }
}

/// The player's paddle (`x` is the left edge)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    pub x: f32,
    pub width: f32,
}

impl Paddle {
    /// Paddle centered in a field `cols` cells wide
    pub fn centered(cols: usize, width: f32) -> Self {
        Self {
            x: (cols as f32 - width) / 2.0,
            width,
        }
    }

    #[inline]
    pub fn center(&self) -> f32 {
        self.x + self.width / 2.0
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Change width keeping the current center, then clamp into the field
    pub fn resize_centered(&mut self, width: f32, cols: usize) {
        let center = self.center();
        self.width = width;
        self.x = center - width / 2.0;
        self.clamp_to(cols);
    }

    /// Move horizontally, clamped to the field
    pub fn shift(&mut self, dx: f32, cols: usize) {
        self.x += dx;
        self.clamp_to(cols);
    }

    /// Move the center toward `target` by at most `max_step`
    pub fn move_toward(&mut self, target: f32, max_step: f32, cols: usize) {
        let delta = (target - self.center()).clamp(-max_step, max_step);
        self.shift(delta, cols);
    }

    fn clamp_to(&mut self, cols: usize) {
        let max_x = (cols as f32 - self.width).max(0.0);
        self.x = self.x.clamp(0.0, max_x);
    }
}

/// A falling power-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub pos: Vec2,
    pub vy: f32,
    pub kind: PowerUpKind,
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Seed the RNG was created from
    pub seed: u64,
    /// Single source of randomness for the round
    pub rng: Pcg32,
    /// Fixed steps run so far
    pub time_ticks: u64,
    /// Simulated time in ms (`time_ticks` x fixed step)
    pub now_ms: u64,
    pub phase: RoundPhase,
    pub lives: u32,
    pub grid: Grid,
    pub paddle: Paddle,
    /// Active balls (sorted by id)
    pub balls: Vec<Ball>,
    /// Falling drops (sorted by id)
    pub drops: Vec<Pickup>,
    pub effects: ActiveEffects,
    /// Externally owned debuff, read every step
    pub debuff: Option<Debuff>,
    /// Whether the core has been placed this engine lifetime
    pub core_placed: bool,
    /// Events fired since the last drain
    pub events: Vec<GameEvent>,
    /// Caller row convention for outbound cell coordinates
    pub vertical_axis: VerticalAxis,
    next_id: u32,
}

impl GameState {
    /// Fresh round state over `grid` with one ball docked
    pub fn new(grid: Grid, settings: &EngineSettings, seed: u64) -> Self {
        let paddle = Paddle::centered(grid.cols(), settings.paddle_base_width);
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            now_ms: 0,
            phase: RoundPhase::Serve,
            lives: settings.initial_lives.max(1),
            grid,
            paddle,
            balls: Vec::new(),
            drops: Vec::new(),
            effects: ActiveEffects::default(),
            debuff: None,
            core_placed: false,
            events: Vec::new(),
            vertical_axis: settings.vertical_axis,
            next_id: 1,
        };
        state.spawn_ball_docked(settings);
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Height of the playfield in cells
    #[inline]
    pub fn field_height(&self) -> f32 {
        self.grid.rows() as f32
    }

    /// Top edge of the paddle's collision band
    #[inline]
    pub fn paddle_top(&self, settings: &EngineSettings) -> f32 {
        self.field_height() - settings.paddle_offset_from_bottom
    }

    /// Spawn a ball docked on the paddle
    pub fn spawn_ball_docked(&mut self, settings: &EngineSettings) {
        let id = self.next_entity_id();
        let mut ball = Ball {
            id,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            state: BallState::Docked,
        };
        ball.dock_on(&self.paddle, self.paddle_top(settings), settings.ball_radius);
        self.balls.push(ball);
    }

    /// Engine cell coordinates in the caller's row convention
    pub fn caller_pos(&self, x: usize, y: usize) -> CellPos {
        CellPos {
            x,
            y: self.vertical_axis.to_caller_row(y, self.grid.rows()),
        }
    }

    /// First live ball, preferring balls already in flight
    pub fn first_live_ball(&self) -> Option<&Ball> {
        self.balls
            .iter()
            .find(|b| b.is_free())
            .or_else(|| self.balls.first())
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Ensure pools are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.balls.sort_by_key(|b| b.id);
        self.drops.sort_by_key(|d| d.id);
    }
}
