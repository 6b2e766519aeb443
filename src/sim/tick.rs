//! Fixed timestep simulation tick
//!
//! One call advances the round by exactly one fixed step: latched controls,
//! paddle, balls (walls, paddle, grid), lives, then drops.

use glam::Vec2;
use rand::Rng;

use super::collision::{
    CellHit, clamp_speed, first_contact, hit_cell, is_below_board, resolve_paddle, resolve_walls,
};
use super::effects::{StepModifiers, TimedEffect};
use super::events::GameEvent;
use super::spawner::{place_core, place_random_shape, roll_drop};
use super::state::{
    Ball, BallState, GameState, PaddleIntent, Pickup, PowerUpKind, RoundPhase, SpecialKind,
};
use crate::consts::{BALL_MAX_SPEED, FIXED_STEP_MS, FIXED_STEP_MS_F32, MAX_BALL_SUBSTEPS};
use crate::settings::EngineSettings;

/// Host request for a special block, tagged for de-duplication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnRequest {
    pub kind: SpecialKind,
    pub token: u64,
}

/// Latched controls consumed at the next step boundary
#[derive(Debug, Clone, PartialEq)]
pub struct TickInput {
    /// Keyboard direction (wins over the pointer while held)
    pub intent: PaddleIntent,
    /// Pointer target for the paddle center
    pub target_x: Option<f32>,
    /// Launch docked balls
    pub launch: bool,
    /// Host speed scalar
    pub speed_multiplier: f32,
    /// Special block requests (already de-duplicated by token)
    pub spawn_requests: Vec<SpawnRequest>,
    /// Power-ups granted by the host
    pub power_ups: Vec<PowerUpKind>,
}

impl Default for TickInput {
    fn default() -> Self {
        Self {
            intent: PaddleIntent::Stop,
            target_x: None,
            launch: false,
            speed_multiplier: 1.0,
            spawn_requests: Vec::new(),
            power_ups: Vec::new(),
        }
    }
}

impl TickInput {
    /// Clear inputs that apply to a single step only
    pub fn clear_one_shots(&mut self) {
        self.launch = false;
        self.spawn_requests.clear();
        self.power_ups.clear();
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, settings: &EngineSettings) {
    // Terminal rounds wait for a reset
    if state.phase.is_terminal() {
        return;
    }

    state.time_ticks += 1;
    state.now_ms = state.time_ticks * FIXED_STEP_MS as u64;

    for request in &input.spawn_requests {
        spawn_special(state, request.kind, settings);
    }
    for &kind in &input.power_ups {
        activate_power_up(state, kind, settings);
    }

    let mods = StepModifiers::compute(
        &state.effects,
        state.debuff,
        state.now_ms,
        input.speed_multiplier,
        settings,
    );
    let cols = state.grid.cols();
    state.paddle.resize_centered(mods.paddle_width, cols);
    move_paddle(state, input, settings);

    let paddle_top = state.paddle_top(settings);
    let launch_velocity = Vec2::from(settings.launch_velocity);
    for ball in state.balls.iter_mut() {
        if input.launch {
            ball.launch(launch_velocity);
        }
        if ball.state == BallState::Docked {
            ball.dock_on(&state.paddle, paddle_top, settings.ball_radius);
        }
    }

    let destroyed = step_balls(state, &mods, settings);
    if destroyed > 0 {
        state.emit(GameEvent::BlocksDestroyed { count: destroyed });
    }

    if !state.phase.is_terminal() {
        if state.balls.is_empty() {
            lose_life(state, settings);
        }
        update_drops(state, settings);
    }

    if !state.phase.is_terminal() {
        state.phase = if state.balls.iter().any(Ball::is_free) {
            RoundPhase::Playing
        } else {
            RoundPhase::Serve
        };
    }

    state.normalize_order();
}

fn move_paddle(state: &mut GameState, input: &TickInput, settings: &EngineSettings) {
    let max_step = settings.paddle_speed * FIXED_STEP_MS_F32;
    let cols = state.grid.cols();
    if input.intent != PaddleIntent::Stop {
        state.paddle.shift(input.intent.sign() * max_step, cols);
    } else if let Some(target) = input.target_x.filter(|t| t.is_finite()) {
        state.paddle.move_toward(target, max_step, cols);
    }
}

/// Substeps needed so one move never exceeds the ball radius or the paddle band
fn substeps(ball: &Ball, speed_multiplier: f32, settings: &EngineSettings) -> u32 {
    let travel = ball.vel.length() * FIXED_STEP_MS_F32 * speed_multiplier;
    let limit = settings.ball_radius.min(settings.paddle_thickness);
    ((travel / limit).ceil() as u32).clamp(1, MAX_BALL_SUBSTEPS)
}

/// Integrate and collide every free ball; returns cells destroyed this step
fn step_balls(state: &mut GameState, mods: &StepModifiers, settings: &EngineSettings) -> u32 {
    let radius = settings.ball_radius;
    let cols = state.grid.cols();
    let field_height = state.field_height();
    let paddle_top = state.paddle_top(settings);

    let mut destroyed = 0;
    let mut lost: Vec<u32> = Vec::new();

    for idx in 0..state.balls.len() {
        if !state.balls[idx].is_free() {
            continue;
        }
        let mut ball = state.balls[idx].clone();

        if !ball.is_finite() {
            log::warn!("Ball {} had non-finite kinematics, resetting", ball.id);
            ball.pos = Vec2::new(state.paddle.center(), paddle_top - radius);
            ball.vel = Vec2::from(settings.launch_velocity);
        }

        if mods.chaotic && settings.chaos_jitter > 0.0 {
            let jitter = settings.chaos_jitter;
            ball.vel.x += state.rng.random_range(-jitter..=jitter);
        }
        clamp_speed(&mut ball, BALL_MAX_SPEED);

        let num_steps = substeps(&ball, mods.speed_multiplier, settings);
        let step_scale = FIXED_STEP_MS_F32 * mods.speed_multiplier / num_steps as f32;
        let mut grid_hit = false;

        for _step in 0..num_steps {
            let before = ball.pos;
            ball.pos += ball.vel * step_scale;

            resolve_walls(&mut ball, radius, cols);
            resolve_paddle(&mut ball, before, &state.paddle, paddle_top, settings);

            // At most one grid collision per ball per step
            if grid_hit {
                continue;
            }
            if let Some((x, y)) = first_contact(&state.grid, ball.pos, radius) {
                grid_hit = true;
                let hit = hit_cell(&mut state.grid, x, y);
                if apply_cell_hit(state, &mut ball, hit, settings) {
                    destroyed += 1;
                }
                if !mods.piercing {
                    ball.vel.y = -ball.vel.y;
                    ball.pos = before;
                    break;
                }
                if state.phase.is_terminal() {
                    break;
                }
            }
        }

        if is_below_board(&ball, radius, field_height) {
            lost.push(ball.id);
        }
        state.balls[idx] = ball;

        if state.phase.is_terminal() {
            break;
        }
    }

    if !lost.is_empty() {
        state.balls.retain(|b| !lost.contains(&b.id));
        log::trace!("{} ball(s) left play", lost.len());
    }
    destroyed
}

/// Fire per-type events and side effects for a hit; true if the cell died
fn apply_cell_hit(
    state: &mut GameState,
    ball: &mut Ball,
    hit: CellHit,
    settings: &EngineSettings,
) -> bool {
    let pos = state.caller_pos(hit.x, hit.y);

    match hit.kind {
        Some(SpecialKind::Cursed) => state.emit(GameEvent::CursedHit { pos }),
        Some(SpecialKind::Mirror) => {
            state.emit(GameEvent::MirrorHit { pos });
            let jitter = if settings.mirror_jitter > 0.0 {
                state
                    .rng
                    .random_range(-settings.mirror_jitter..=settings.mirror_jitter)
            } else {
                0.0
            };
            ball.vel.x = -ball.vel.x + jitter;
            clamp_speed(ball, BALL_MAX_SPEED);
        }
        _ => {}
    }

    if !hit.destroyed {
        return false;
    }

    state.emit(GameEvent::BlockDestroyed { pos });
    match hit.kind {
        Some(SpecialKind::Bomb) => state.emit(GameEvent::BombDetonated { pos }),
        Some(SpecialKind::Core) => {
            log::info!("Core destroyed at ({}, {})", pos.x, pos.y);
            state.emit(GameEvent::CoreDestroyed { pos });
            state.phase = RoundPhase::CoreDestroyed;
            return true;
        }
        _ => {}
    }

    let drop = hit
        .guaranteed_drop
        .or_else(|| roll_drop(&mut state.rng, settings.drop_rate));
    if let Some(kind) = drop {
        spawn_drop(state, kind, hit.x, hit.y, settings);
    }
    true
}

fn spawn_drop(
    state: &mut GameState,
    kind: PowerUpKind,
    x: usize,
    y: usize,
    settings: &EngineSettings,
) {
    let id = state.next_entity_id();
    state.drops.push(Pickup {
        id,
        pos: crate::cell_center(x, y),
        vy: settings.drop_fall_speed,
        kind,
    });
    let pos = state.caller_pos(x, y);
    state.emit(GameEvent::DropSpawned { kind, pos });
}

fn lose_life(state: &mut GameState, settings: &EngineSettings) {
    state.lives = state.lives.saturating_sub(1);
    state.emit(GameEvent::LivesChanged { lives: state.lives });
    if state.lives == 0 {
        log::info!("Lives depleted at {} ms", state.now_ms);
        state.emit(GameEvent::LifeDepleted);
        state.phase = RoundPhase::LivesDepleted;
    } else {
        log::info!("Life lost, {} remaining", state.lives);
        state.spawn_ball_docked(settings);
        state.phase = RoundPhase::Serve;
    }
}

/// Fall, get caught by the paddle, or leave through the bottom
fn update_drops(state: &mut GameState, settings: &EngineSettings) {
    if state.drops.is_empty() {
        return;
    }
    let half = settings.drop_size / 2.0;
    let (left, right) = (state.paddle.x, state.paddle.right());
    let top = state.paddle_top(settings);
    let bottom = top + settings.paddle_thickness;
    let field_height = state.field_height();

    let mut caught = Vec::new();
    state.drops.retain_mut(|drop| {
        drop.pos.y += drop.vy * FIXED_STEP_MS_F32;
        let overlaps_x = drop.pos.x + half >= left && drop.pos.x - half <= right;
        let overlaps_y = drop.pos.y + half >= top && drop.pos.y - half <= bottom;
        if overlaps_x && overlaps_y {
            caught.push(drop.kind);
            false
        } else {
            drop.pos.y - half <= field_height
        }
    });

    for kind in caught {
        activate_power_up(state, kind, settings);
    }
}

/// Apply a power-up now: timed effects refresh their expiry, multi-ball splits
pub fn activate_power_up(state: &mut GameState, kind: PowerUpKind, settings: &EngineSettings) {
    state.emit(GameEvent::PowerUpCollected { kind });
    match TimedEffect::from_power_up(kind) {
        Some(effect) => state.effects.activate(effect, state.now_ms, settings),
        None => spawn_multi_ball(state, settings),
    }
}

/// Clone the first live ball into two balls diverging horizontally
fn spawn_multi_ball(state: &mut GameState, settings: &EngineSettings) {
    let Some(source) = state.first_live_ball().cloned() else {
        return;
    };
    let base = if source.is_free() {
        source.vel
    } else {
        Vec2::from(settings.launch_velocity)
    };
    let vx = base.x.abs() + settings.multi_ball_spread;
    for sign in [1.0, -1.0] {
        let id = state.next_entity_id();
        state.balls.push(Ball {
            id,
            pos: source.pos,
            vel: Vec2::new(sign * vx, base.y),
            state: BallState::Free,
        });
    }
}

/// Place a special block: the core by deterministic scan, anything else by
/// random shape search. Failure is silent.
pub fn spawn_special(state: &mut GameState, kind: SpecialKind, settings: &EngineSettings) {
    let cells = if kind == SpecialKind::Core {
        if state.core_placed {
            log::debug!("Core already placed, ignoring request");
            return;
        }
        state.core_placed = true;
        place_core(&mut state.grid, settings.core_band_width)
    } else {
        place_random_shape(
            &mut state.grid,
            &mut state.rng,
            kind,
            settings.shape_spawn_attempts,
        )
    };

    match cells {
        Some(cells) => {
            let cells: Vec<_> = cells.iter().map(|&(x, y)| state.caller_pos(x, y)).collect();
            log::debug!("Spawned {:?} shape at {:?}", kind, cells);
            state.emit(GameEvent::ShapeSpawned { kind, cells });
        }
        None => log::debug!("No valid placement for {:?}", kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::Grid;
    use crate::sim::state::{Debuff, SpecialCell};

    fn settings() -> EngineSettings {
        EngineSettings {
            drop_rate: 0.0,
            ..Default::default()
        }
    }

    fn state_with(grid: Grid) -> GameState {
        GameState::new(grid, &settings(), 12345)
    }

    fn launch_input() -> TickInput {
        TickInput {
            launch: true,
            ..Default::default()
        }
    }

    /// Put the single ball in flight at a chosen spot
    fn place_ball(state: &mut GameState, x: f32, y: f32, vx: f32, vy: f32) {
        let ball = &mut state.balls[0];
        ball.state = BallState::Free;
        ball.pos = Vec2::new(x, y);
        ball.vel = Vec2::new(vx, vy);
    }

    fn count(events: &[GameEvent], pred: impl Fn(&GameEvent) -> bool) -> usize {
        events.iter().filter(|e| pred(e)).count()
    }

    #[test]
    fn test_tick_serve_to_playing() {
        let mut state = state_with(Grid::new(20, 10));
        assert_eq!(state.phase, RoundPhase::Serve);

        tick(&mut state, &TickInput::default(), &settings());
        assert_eq!(state.phase, RoundPhase::Serve);
        assert_eq!(state.now_ms, 4);

        tick(&mut state, &launch_input(), &settings());
        assert_eq!(state.phase, RoundPhase::Playing);
        assert!(state.balls[0].is_free());
        assert_eq!(state.balls[0].vel, Vec2::new(0.27, -0.315));
    }

    #[test]
    fn test_docked_ball_follows_paddle() {
        let mut state = state_with(Grid::new(20, 10));
        let input = TickInput {
            intent: PaddleIntent::Right,
            ..Default::default()
        };
        for _ in 0..10 {
            tick(&mut state, &input, &settings());
        }
        assert!(state.paddle.center() > 5.0);
        assert!((state.balls[0].pos.x - state.paddle.center()).abs() < 1e-5);
    }

    #[test]
    fn test_pointer_target_moves_paddle() {
        let mut state = state_with(Grid::new(20, 10));
        let input = TickInput {
            target_x: Some(2.0),
            ..Default::default()
        };
        for _ in 0..200 {
            tick(&mut state, &input, &settings());
        }
        assert!((state.paddle.center() - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_plain_cell_clears_and_reflects() {
        let mut grid = Grid::new(20, 10);
        grid.fill(5, 2);
        let mut state = state_with(grid);
        place_ball(&mut state, 5.5, 3.36, 0.0, -0.3);

        tick(&mut state, &TickInput::default(), &settings());

        assert!(!state.grid.is_alive(5, 2));
        assert!(state.balls[0].vel.y > 0.0);
        assert_eq!(
            count(&state.events, |e| matches!(e, GameEvent::BlockDestroyed { .. })),
            1
        );
        assert!(state.events.contains(&GameEvent::BlocksDestroyed { count: 1 }));
    }

    #[test]
    fn test_single_hit_per_step() {
        let mut grid = Grid::new(20, 10);
        grid.fill(4, 2);
        grid.fill(5, 2);
        let mut state = state_with(grid);
        // Box straddles both cells
        place_ball(&mut state, 5.0, 3.36, 0.0, -0.3);

        tick(&mut state, &TickInput::default(), &settings());
        assert_eq!(state.grid.alive_count(), 1);
        assert!(!state.grid.is_alive(4, 2));
    }

    #[test]
    fn test_piercing_damages_without_reflecting() {
        let mut grid = Grid::new(20, 10);
        grid.fill(5, 2);
        let mut state = state_with(grid);
        state.effects.activate(TimedEffect::Piercing, 0, &settings());
        place_ball(&mut state, 5.5, 3.36, 0.0, -0.3);

        tick(&mut state, &TickInput::default(), &settings());
        assert!(!state.grid.is_alive(5, 2));
        assert!(state.balls[0].vel.y < 0.0);
    }

    #[test]
    fn test_mirror_flips_vx_even_without_destruction() {
        let mut grid = Grid::new(20, 10);
        grid.fill(5, 2);
        grid.set_special(5, 2, SpecialCell::with_hp(SpecialKind::Mirror, 2));
        let mut state = state_with(grid);
        place_ball(&mut state, 5.5, 3.36, 0.2, -0.3);

        tick(&mut state, &TickInput::default(), &settings());
        assert!(state.grid.is_alive(5, 2));
        assert!(state.balls[0].vel.x < 0.0);
        assert!((state.balls[0].vel.x + 0.2).abs() <= settings().mirror_jitter + 1e-6);
        assert_eq!(count(&state.events, |e| matches!(e, GameEvent::MirrorHit { .. })), 1);
    }

    #[test]
    fn test_core_hit_ends_round_without_drop() {
        let mut grid = Grid::new(20, 10);
        grid.fill(5, 2);
        grid.set_special(5, 2, SpecialCell::new(SpecialKind::Core));
        grid.set_guaranteed_drop(5, 2, PowerUpKind::MultiBall);
        let mut state = state_with(grid);
        place_ball(&mut state, 5.5, 3.36, 0.0, -0.3);

        tick(&mut state, &TickInput::default(), &settings());
        assert_eq!(state.phase, RoundPhase::CoreDestroyed);
        assert!(state.drops.is_empty());
        assert_eq!(count(&state.events, |e| matches!(e, GameEvent::CoreDestroyed { .. })), 1);

        // Terminal: nothing moves any more
        let before = state.balls.clone();
        tick(&mut state, &TickInput::default(), &settings());
        assert_eq!(state.balls, before);
    }

    #[test]
    fn test_guaranteed_drop_falls_and_is_caught() {
        let mut grid = Grid::new(20, 10);
        grid.fill(5, 2);
        grid.set_guaranteed_drop(5, 2, PowerUpKind::ExtendPaddle);
        let mut state = state_with(grid);
        place_ball(&mut state, 5.5, 3.36, 0.0, -0.3);

        tick(&mut state, &TickInput::default(), &settings());
        assert_eq!(state.drops.len(), 1);
        assert_eq!(state.drops[0].kind, PowerUpKind::ExtendPaddle);

        // Keep the paddle under the falling drop
        let input = TickInput {
            target_x: Some(5.5),
            ..Default::default()
        };
        for _ in 0..1_000 {
            tick(&mut state, &input, &settings());
            if state.drops.is_empty() {
                break;
            }
        }
        assert!(
            state
                .events
                .contains(&GameEvent::PowerUpCollected { kind: PowerUpKind::ExtendPaddle })
        );
        assert!(state.effects.is_active(TimedEffect::PaddleExtend, state.now_ms));
    }

    #[test]
    fn test_multi_ball_adds_two_immediately() {
        let mut state = state_with(Grid::new(20, 10));
        tick(&mut state, &launch_input(), &settings());
        let before = state.balls.len();
        activate_power_up(&mut state, PowerUpKind::MultiBall, &settings());
        assert_eq!(state.balls.len(), before + 2);

        let source_vx = state.balls[0].vel.x.abs();
        let clones = &state.balls[before..];
        assert!(clones[0].vel.x > source_vx);
        assert!(clones[1].vel.x < -source_vx);
    }

    #[test]
    fn test_losing_last_ball_docks_a_new_one() {
        let mut state = state_with(Grid::new(20, 10));
        place_ball(&mut state, 0.5, 19.9, 0.0, 0.3);

        tick(&mut state, &TickInput::default(), &settings());
        assert_eq!(state.lives, 2);
        assert_eq!(state.balls.len(), 1);
        assert_eq!(state.balls[0].state, BallState::Docked);
        assert_eq!(state.phase, RoundPhase::Serve);
        assert!(state.events.contains(&GameEvent::LivesChanged { lives: 2 }));
    }

    #[test]
    fn test_last_life_fires_depleted_once() {
        let mut state = state_with(Grid::new(20, 10));
        state.lives = 1;
        place_ball(&mut state, 0.5, 19.9, 0.0, 0.3);

        for _ in 0..10 {
            tick(&mut state, &TickInput::default(), &settings());
        }
        assert_eq!(state.lives, 0);
        assert!(state.balls.is_empty());
        assert_eq!(state.phase, RoundPhase::LivesDepleted);
        assert_eq!(count(&state.events, |e| *e == GameEvent::LifeDepleted), 1);
    }

    #[test]
    fn test_non_finite_ball_is_reset() {
        let mut state = state_with(Grid::new(20, 10));
        place_ball(&mut state, f32::NAN, 5.0, 0.1, f32::INFINITY);
        tick(&mut state, &TickInput::default(), &settings());
        assert!(state.balls[0].is_finite());
    }

    #[test]
    fn test_spawn_special_core_only_once() {
        let mut grid = Grid::new(20, 10);
        for y in 0..6 {
            for x in 0..10 {
                grid.fill(x, y);
            }
        }
        let mut state = state_with(grid);
        spawn_special(&mut state, SpecialKind::Core, &settings());
        spawn_special(&mut state, SpecialKind::Core, &settings());
        assert_eq!(state.grid.count_special(SpecialKind::Core), 4);
        assert_eq!(
            count(&state.events, |e| matches!(e, GameEvent::ShapeSpawned { .. })),
            1
        );
    }

    #[test]
    fn test_fast_ball_does_not_skip_the_paddle() {
        for host_speed in [6.0, 8.0, 50.0] {
            let mut state = state_with(Grid::new(20, 10));
            let center = state.paddle.center();
            // One full-size move would carry the lower edge from just above
            // the band to below it
            place_ball(&mut state, center, 18.1, 0.0, 0.415);
            let input = TickInput {
                speed_multiplier: host_speed,
                ..Default::default()
            };

            tick(&mut state, &input, &settings());
            assert_eq!(state.balls.len(), 1, "host speed {host_speed}");
            assert!(state.balls[0].vel.y < 0.0, "host speed {host_speed}");
            assert_eq!(state.lives, 3);
        }
    }

    #[test]
    fn test_ball_speed_stays_capped() {
        let settings = EngineSettings {
            chaos_jitter: 0.05,
            mirror_jitter: 0.5,
            ..settings()
        };
        let mut grid = Grid::new(20, 10);
        for x in 0..10 {
            grid.fill(x, 1);
            grid.set_special(x, 1, SpecialCell::with_hp(SpecialKind::Mirror, 200));
        }
        let mut state = GameState::new(grid, &settings, 7);
        state.debuff = Some(Debuff::ChaoticPath);
        place_ball(&mut state, 5.0, 10.0, 0.6, -0.6);
        let input = TickInput {
            launch: true,
            target_x: Some(5.0),
            speed_multiplier: 8.0,
            ..Default::default()
        };

        for _ in 0..2_000 {
            tick(&mut state, &input, &settings);
            for ball in &state.balls {
                assert!(ball.vel.length() <= BALL_MAX_SPEED + 1e-5);
            }
        }
    }

    #[test]
    fn test_chaos_changes_vx_within_jitter() {
        let chaotic_states = {
            let mut by_debuff = state_with(Grid::new(20, 10));
            by_debuff.debuff = Some(Debuff::ChaoticPath);
            let mut by_effect = state_with(Grid::new(20, 10));
            by_effect.effects.activate(TimedEffect::ChaoticBall, 0, &settings());
            [by_debuff, by_effect]
        };
        let jitter = settings().chaos_jitter;

        for mut state in chaotic_states {
            place_ball(&mut state, 5.0, 10.0, 0.1, -0.2);
            let mut changed = false;
            for _ in 0..20 {
                let before = state.balls[0].vel.x;
                tick(&mut state, &TickInput::default(), &settings());
                let delta = (state.balls[0].vel.x - before).abs();
                assert!(delta <= jitter + 1e-6);
                changed |= delta > 0.0;
            }
            assert!(changed);
        }
    }

    #[test]
    fn test_no_jitter_without_chaos() {
        let mut state = state_with(Grid::new(20, 10));
        place_ball(&mut state, 5.0, 10.0, 0.1, -0.2);
        for _ in 0..20 {
            tick(&mut state, &TickInput::default(), &settings());
        }
        assert_eq!(state.balls[0].vel.x, 0.1);
    }

    #[test]
    fn test_slow_modifiers_shorten_travel() {
        let travel = |state: &mut GameState| {
            place_ball(state, 5.0, 10.0, 0.27, -0.315);
            tick(state, &TickInput::default(), &settings());
            state.balls[0].pos.distance(Vec2::new(5.0, 10.0))
        };
        let normal = travel(&mut state_with(Grid::new(20, 10)));

        let mut slow_motion = state_with(Grid::new(20, 10));
        slow_motion.effects.activate(TimedEffect::SlowMotion, 0, &settings());
        let slow_motion = travel(&mut slow_motion);

        let mut slow_ball = state_with(Grid::new(20, 10));
        slow_ball.debuff = Some(Debuff::SlowBall);
        let slow_ball = travel(&mut slow_ball);

        assert!(normal > 0.0);
        assert!((slow_motion / normal - settings().slow_motion_factor).abs() < 1e-4);
        assert!((slow_ball / normal - settings().slow_debuff_factor).abs() < 1e-4);
    }

    #[test]
    fn test_drop_rate_spawns_pickup_on_plain_cell() {
        let settings = EngineSettings {
            drop_rate: 1.0,
            ..settings()
        };
        let mut grid = Grid::new(20, 10);
        grid.fill(5, 2);
        let mut state = GameState::new(grid, &settings, 99);
        place_ball(&mut state, 5.5, 3.36, 0.0, -0.3);

        tick(&mut state, &TickInput::default(), &settings);
        assert_eq!(state.drops.len(), 1);
        assert_eq!(
            count(&state.events, |e| matches!(e, GameEvent::DropSpawned { .. })),
            1
        );
    }

    #[test]
    fn test_core_never_rolls_a_drop() {
        let settings = EngineSettings {
            drop_rate: 1.0,
            ..settings()
        };
        let mut grid = Grid::new(20, 10);
        grid.fill(5, 2);
        grid.set_special(5, 2, SpecialCell::new(SpecialKind::Core));
        let mut state = GameState::new(grid, &settings, 99);
        place_ball(&mut state, 5.5, 3.36, 0.0, -0.3);

        tick(&mut state, &TickInput::default(), &settings);
        assert_eq!(state.phase, RoundPhase::CoreDestroyed);
        assert!(state.drops.is_empty());
        assert_eq!(
            count(&state.events, |e| matches!(e, GameEvent::DropSpawned { .. })),
            0
        );
    }

    #[test]
    fn test_missed_pickup_leaves_through_bottom() {
        let mut state = state_with(Grid::new(20, 10));
        state.drops.push(Pickup {
            id: 100,
            pos: Vec2::new(0.5, 19.5),
            vy: settings().drop_fall_speed,
            kind: PowerUpKind::Piercing,
        });

        for _ in 0..100 {
            tick(&mut state, &TickInput::default(), &settings());
        }
        assert!(state.drops.is_empty());
        assert_eq!(
            count(&state.events, |e| matches!(e, GameEvent::PowerUpCollected { .. })),
            0
        );
        assert!(!state.effects.is_active(TimedEffect::Piercing, state.now_ms));
    }

    #[test]
    fn test_caught_multi_ball_pickup_adds_two_balls() {
        let mut state = state_with(Grid::new(20, 10));
        let center = state.paddle.center();
        state.drops.push(Pickup {
            id: 100,
            pos: Vec2::new(center, 18.0),
            vy: settings().drop_fall_speed,
            kind: PowerUpKind::MultiBall,
        });
        assert_eq!(state.balls.len(), 1);

        for _ in 0..50 {
            tick(&mut state, &TickInput::default(), &settings());
            if state.drops.is_empty() {
                break;
            }
        }
        assert!(state.drops.is_empty());
        assert_eq!(state.balls.len(), 3);
        assert!(
            state
                .events
                .contains(&GameEvent::PowerUpCollected { kind: PowerUpKind::MultiBall })
        );
    }
}
