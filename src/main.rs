/// Entry point and game loop.
///
/// Threads:
///   - main: fixed-rate scheduler running tick, sound, draw
///   - input: terminal key events into the player's `IntentHandle`
///
/// Logs go to a file (the terminal belongs to the game): `JUMPER_LOG_FILE`
/// names it, `RUST_LOG` filters it.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use config::GameConfig;
use error::GameError;
use sim::engine::MovementEngine;
use sim::level::{self, MapSource};
use sim::scheduler::{Scheduler, StopSignal, SystemClock};
use sim::world::World;
use ui::renderer::Renderer;
use ui::sound::{self, SoundEngine};

const DEFAULT_LOG_FILE: &str = "jumper.log";

fn init_logging() {
    let path = std::env::var("JUMPER_LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_ansi(false);

    match File::create(&path) {
        Ok(file) => builder.with_writer(Mutex::new(file)).init(),
        Err(e) => {
            eprintln!("Cannot open log file {path}: {e} (logging disabled)");
            builder.with_writer(std::io::sink).init();
        }
    }
}

fn main() -> ExitCode {
    init_logging();
    let config = GameConfig::load();

    let source = MapSource::select(std::env::args_os().nth(1).map(PathBuf::from), &config.map);
    let grid = match level::load_grid(&source, config.map.tile_size) {
        Ok(grid) => grid,
        Err(e) => {
            tracing::error!(source = %source.describe(), error = %e, "level load failed");
            eprintln!("Cannot load level {}: {e}", source.describe());
            return ExitCode::FAILURE;
        }
    };

    let size = config.physics.player_size();
    for (what, point) in [("spawn", config.map.spawn), ("reset point", config.map.reset_point)] {
        if level::spawn_blocked(&grid, point, size) {
            tracing::warn!(x = point.x, y = point.y, "{what} overlaps a solid tile");
        }
    }

    let engine = MovementEngine::new(config.physics.clone(), config.timing.dt());
    let mut world = World::new(grid, engine, config.map.spawn);

    let mut renderer = Renderer::new(config.display.clone());
    let honor_release = match renderer.init() {
        Ok(enhanced) => enhanced,
        Err(e) => {
            // Raw mode may already be on; leave the terminal usable.
            let _ = renderer.cleanup();
            tracing::error!(error = %e, "terminal init failed");
            eprintln!("Terminal init failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let sound = if config.sound { SoundEngine::new() } else { None };

    let stop = StopSignal::new();
    let result = run(&config, &mut world, &mut renderer, sound.as_ref(), honor_release, &stop);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    match result {
        Ok(()) => {
            let p = world.player.position();
            println!("Stopped after {} ticks at ({:.1}, {:.1}).", world.tick, p.x, p.y);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "game error");
            eprintln!("Game error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(
    config: &GameConfig,
    world: &mut World,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    honor_release: bool,
    stop: &StopSignal,
) -> Result<(), GameError> {
    let input = ui::input::spawn(
        world.player.handle(),
        stop.clone(),
        config.map.reset_point,
        honor_release,
    )?;

    let scheduler = Scheduler::new(config.timing.tick_interval(), stop.clone());
    tracing::info!(interval_ms = scheduler.interval().as_millis() as u64, "game loop starting");

    let result = scheduler.run(&SystemClock, || -> Result<(), GameError> {
        let events = world.tick();
        sound::process_sound_events(sound, &events);
        renderer.render(world)?;
        Ok(())
    });

    // The input thread only exits once stop is raised.
    stop.stop();
    if input.join().is_err() {
        tracing::error!("input thread panicked");
    }

    result.map(|_| ())
}
