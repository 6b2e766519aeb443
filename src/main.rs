//! Brick Rush headless runner
//!
//! Loads a level (and optional settings) from JSON, drives the engine with
//! synthetic 60 Hz frames under a paddle-follow autopilot, and logs events.
//!
//! Usage: `brick-rush [level.json] [settings.json] [seconds] [seed]`

use std::process::ExitCode;

use brick_rush::sim::GameEvent;
use brick_rush::{Engine, EngineSettings, LevelDefinition};

const FRAME_MS: f64 = 1000.0 / 60.0;
const DEFAULT_SECONDS: u32 = 60;

#[cfg(not(target_arch = "wasm32"))]
fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

#[cfg(target_arch = "wasm32")]
fn init_logging() {}

fn load_level(path: Option<&String>) -> Result<LevelDefinition, String> {
    let Some(path) = path else {
        return Ok(LevelDefinition::demo());
    };
    let json = std::fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))?;
    LevelDefinition::from_json(&json).map_err(|e| format!("{path}: {e}"))
}

fn load_settings(path: Option<&String>) -> Result<EngineSettings, String> {
    let Some(path) = path else {
        return Ok(EngineSettings::default());
    };
    let json = std::fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))?;
    EngineSettings::from_json(&json).map_err(|e| format!("{path}: {e}"))
}

/// Track the first free ball; launch whenever one is docked
fn autopilot(engine: &mut Engine) {
    let target = engine.balls().iter().find(|b| b.is_free()).map(|b| b.pos.x);
    match target {
        Some(x) => engine.set_paddle_target(Some(x)),
        None => engine.launch(),
    }
}

fn main() -> ExitCode {
    init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let level = match load_level(args.first()) {
        Ok(level) => level,
        Err(e) => {
            log::error!("Failed to load level: {e}");
            return ExitCode::FAILURE;
        }
    };
    let settings = match load_settings(args.get(1)) {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Failed to load settings: {e}");
            return ExitCode::FAILURE;
        }
    };
    let seconds = args
        .get(2)
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(DEFAULT_SECONDS);
    let seed = args
        .get(3)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0x5EED);

    log::info!("Brick Rush (headless) starting, {seconds}s with seed {seed}");
    let mut engine = Engine::new(level, settings, seed);

    let frames = (seconds as f64 * 1000.0 / FRAME_MS) as u64;
    let mut destroyed = 0u32;
    for frame in 0..frames {
        autopilot(&mut engine);
        engine.advance(FRAME_MS);

        for event in engine.drain_events() {
            match &event {
                GameEvent::BlocksDestroyed { count } => destroyed += count,
                GameEvent::Snapshot(snapshot) => log::trace!("{:?}", snapshot),
                GameEvent::BlockDestroyed { .. } => {}
                other => match serde_json::to_string(other) {
                    Ok(json) => log::debug!("{json}"),
                    Err(e) => log::warn!("Could not encode event: {e}"),
                },
            }
        }

        if engine.phase().is_terminal() {
            log::info!("Round over after frame {frame}: {:?}", engine.phase());
            break;
        }
    }

    log::info!(
        "Simulated {} ms: {} cells destroyed, {} left, {} lives, phase {:?}",
        engine.now_ms(),
        destroyed,
        engine.grid().alive_count(),
        engine.lives(),
        engine.phase()
    );
    ExitCode::SUCCESS
}
