//! Host-facing engine object
//!
//! Owns the game state, the fixed-step clock and the latched controls. The
//! host calls [`Engine::advance`] once per display frame, sets controls in
//! between, and drains the event queue after each frame.

use crate::consts::MAX_HOST_SPEED;
use crate::level::LevelDefinition;
use crate::settings::EngineSettings;
use crate::sim::clock::FixedClock;
use crate::sim::effects::{ActiveEffects, StepModifiers};
use crate::sim::events::{BallSample, CellPos, GameEvent, Snapshot, SnapshotThrottle};
use crate::sim::grid::Grid;
use crate::sim::state::{
    Ball, Debuff, GameState, Paddle, PaddleIntent, Pickup, PowerUpKind, RoundPhase, SpecialKind,
};
use crate::sim::tick::{self, SpawnRequest, TickInput};

pub struct Engine {
    settings: EngineSettings,
    level: LevelDefinition,
    seed: u64,
    state: GameState,
    clock: FixedClock,
    input: TickInput,
    paused: bool,
    /// Highest spawn token accepted so far
    last_spawn_token: Option<u64>,
    throttle: SnapshotThrottle,
    last_snapshot: Option<Snapshot>,
}

impl Engine {
    pub fn new(level: LevelDefinition, settings: EngineSettings, seed: u64) -> Self {
        let settings = settings.sanitized();
        let state = Self::build_state(&level, &settings, seed);
        let throttle = SnapshotThrottle::new(settings.snapshot_interval_ms);
        Self {
            settings,
            level,
            seed,
            state,
            clock: FixedClock::new(),
            input: TickInput::default(),
            paused: false,
            last_spawn_token: None,
            throttle,
            last_snapshot: None,
        }
    }

    fn build_state(level: &LevelDefinition, settings: &EngineSettings, seed: u64) -> GameState {
        let grid = level.build_grid(settings.vertical_axis);
        log::info!(
            "Loaded {}x{} level ({} cells, {} special, boss: {}) with seed {}",
            grid.cols(),
            grid.rows(),
            grid.alive_count(),
            grid.specials().count(),
            level.boss,
            seed
        );

        let mut state = GameState::new(grid, settings, seed);
        state.core_placed = state.grid.count_special(SpecialKind::Core) > 0;
        if level.place_core && !state.core_placed {
            tick::spawn_special(&mut state, SpecialKind::Core, settings);
            match state.events.last() {
                Some(GameEvent::ShapeSpawned { cells, .. }) => {
                    log::info!("Core placed at {:?}", cells);
                }
                _ => log::info!("Level has no room for the core"),
            }
        }
        state
    }

    /// Full re-initialization from the level and seed the engine was built with
    pub fn reset(&mut self) {
        self.state = Self::build_state(&self.level, &self.settings, self.seed);
        self.clock = FixedClock::new();
        self.input = TickInput::default();
        self.paused = false;
        self.last_spawn_token = None;
        self.throttle = SnapshotThrottle::new(self.settings.snapshot_interval_ms);
        self.last_snapshot = None;
    }

    /// Feed one display frame; returns the number of fixed steps run
    pub fn advance(&mut self, frame_delta_ms: f64) -> u32 {
        let steps = if self.paused {
            // Keep the cosmetic paddle width in sync with the debuff
            let mods = StepModifiers::compute(
                &self.state.effects,
                self.state.debuff,
                self.state.now_ms,
                self.input.speed_multiplier,
                &self.settings,
            );
            let cols = self.state.grid.cols();
            self.state.paddle.resize_centered(mods.paddle_width, cols);
            0
        } else {
            let steps = self.clock.accumulate(frame_delta_ms);
            for _ in 0..steps {
                tick::tick(&mut self.state, &self.input, &self.settings);
                // Clear one-shot inputs after processing
                self.input.clear_one_shots();
            }
            steps
        };

        if self.throttle.tick(frame_delta_ms) {
            let snapshot = self.snapshot();
            self.last_snapshot = Some(snapshot);
            self.state.emit(GameEvent::Snapshot(snapshot));
        }
        steps
    }

    // === Controls (latched until the next step) ===

    pub fn set_paddle_intent(&mut self, intent: PaddleIntent) {
        self.input.intent = intent;
    }

    /// Pointer control: move the paddle center toward `x` (cells)
    pub fn set_paddle_target(&mut self, x: Option<f32>) {
        self.input.target_x = x;
    }

    /// Launch docked balls at the next step (no-op for balls in flight)
    pub fn launch(&mut self) {
        self.input.launch = true;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Host speed scalar, capped at `MAX_HOST_SPEED`
    pub fn set_speed_multiplier(&mut self, multiplier: f32) {
        if multiplier.is_finite() && multiplier >= 0.0 {
            if multiplier > MAX_HOST_SPEED {
                log::debug!("Capping speed multiplier {} to {}", multiplier, MAX_HOST_SPEED);
            }
            self.input.speed_multiplier = multiplier.min(MAX_HOST_SPEED);
        } else {
            log::warn!("Ignoring invalid speed multiplier {}", multiplier);
        }
    }

    pub fn set_debuff(&mut self, debuff: Option<Debuff>) {
        self.state.debuff = debuff;
    }

    /// Set the debuff from its external name; empty or "none" clears it
    pub fn set_debuff_by_name(&mut self, name: &str) {
        let trimmed = name.trim();
        let debuff = if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            None
        } else {
            let parsed = Debuff::from_name(trimmed);
            if parsed.is_none() {
                log::warn!("Unknown debuff {:?}, clearing", trimmed);
            }
            parsed
        };
        self.set_debuff(debuff);
    }

    /// Request a special block. Returns false if `token` was already seen.
    pub fn request_special_block(&mut self, kind: SpecialKind, token: u64) -> bool {
        if self.last_spawn_token.is_some_and(|last| token <= last) {
            log::debug!("Ignoring repeated spawn token {}", token);
            return false;
        }
        self.last_spawn_token = Some(token);
        self.input.spawn_requests.push(SpawnRequest { kind, token });
        true
    }

    /// Grant a power-up as if its drop had been caught
    pub fn activate_power_up(&mut self, kind: PowerUpKind) {
        self.input.power_ups.push(kind);
    }

    // === Outputs ===

    /// Take every event fired since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.state.events)
    }

    pub fn pending_events(&self) -> &[GameEvent] {
        &self.state.events
    }

    /// Current state sample in the caller's vertical convention
    pub fn snapshot(&self) -> Snapshot {
        let axis = self.settings.vertical_axis;
        let height = self.state.field_height();
        Snapshot {
            ball: self.state.first_live_ball().map(|b| BallSample {
                x: b.pos.x,
                y: axis.to_caller_y(b.pos.y, height),
                vx: b.vel.x,
                vy: axis.to_caller_vy(b.vel.y),
            }),
            paddle_x: self.state.paddle.x,
            paddle_width: self.state.paddle.width,
            lives: self.state.lives,
        }
    }

    pub fn last_snapshot(&self) -> Option<&Snapshot> {
        self.last_snapshot.as_ref()
    }

    // === Read-only views ===

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn level(&self) -> &LevelDefinition {
        &self.level
    }

    pub fn balls(&self) -> &[Ball] {
        &self.state.balls
    }

    pub fn drops(&self) -> &[Pickup] {
        &self.state.drops
    }

    pub fn paddle(&self) -> &Paddle {
        &self.state.paddle
    }

    pub fn grid(&self) -> &Grid {
        &self.state.grid
    }

    pub fn lives(&self) -> u32 {
        self.state.lives
    }

    pub fn phase(&self) -> RoundPhase {
        self.state.phase
    }

    pub fn debuff(&self) -> Option<Debuff> {
        self.state.debuff
    }

    pub fn active_effects(&self) -> &ActiveEffects {
        &self.state.effects
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Simulated time in ms
    pub fn now_ms(&self) -> u64 {
        self.state.now_ms
    }

    /// Fraction of a fixed step waiting in the accumulator, for render interpolation
    pub fn interpolation_alpha(&self) -> f64 {
        self.clock.alpha()
    }

    /// Live cells in the caller's convention, row-major in engine order
    pub fn alive_cells(&self) -> Vec<CellPos> {
        self.state
            .grid
            .alive_cells()
            .map(|(x, y)| self.state.caller_pos(x, y))
            .collect()
    }
}
