//! simpleactions demo runner.
//!
//! Runs a headless `bevy_ecs` world in which one agent entity owns an
//! [`ActionList`](components::actionlist::ActionList) built from the action
//! catalog. Every action is started on the first frame and the world is then
//! stepped at a fixed rate, letting start delays, duration overrides and ticks
//! play out. Lifecycle events are printed as they are observed.
//!
//! # Main Loop
//!
//! 1. Load the catalog from `--config` (built-in catalog when missing)
//! 2. Insert resources and register the action observers
//! 3. Run the `setup` system, which spawns the agent and starts its actions
//! 4. Step the frame schedule for `--seconds` simulated seconds:
//!    - advance world time
//!    - fire due action timers
//!    - tick active actions
//! 5. Cancel whatever is still running and release every action holder
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --config actions.ini --seconds 5 --trace-json
//! ```

mod components;
mod events;
mod game;
mod resources;
mod systems;

use crate::components::persistent::Persistent;
use crate::resources::actioncatalog::ActionCatalog;
use crate::resources::actioneventlog::{ActionEventLog, ActionEventRecord};
use crate::resources::actiontimers::ActionTimers;
use crate::resources::worldcontext::{WorldContext, WorldKind};
use crate::resources::worldtime::WorldTime;
use crate::systems::time::update_world_time;
use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemId;
use clap::Parser;
use std::path::PathBuf;

/// Headless action lifecycle simulator
#[derive(Parser)]
#[command(version, about = "Runs the action lifecycle demo world without a window.")]
struct Cli {
    /// Action catalog to load (INI).
    #[arg(long, value_name = "PATH", default_value = "./actions.ini")]
    config: PathBuf,

    /// World kind the actions run in: game, play_in_editor, editor,
    /// editor_preview or game_preview. Overrides the catalog.
    #[arg(long, value_name = "KIND")]
    world: Option<WorldKind>,

    /// Simulated seconds. Overrides the catalog.
    #[arg(long, value_name = "N")]
    seconds: Option<f32>,

    /// Fixed frames per second. Overrides the catalog.
    #[arg(long, value_name = "N")]
    fps: Option<u32>,

    /// Print lifecycle events as JSON lines on stdout.
    #[arg(long)]
    trace_json: bool,

    /// Write the built-in catalog as INI and exit.
    /// Optionally provide a path (default: ./actions.ini).
    #[arg(long, value_name = "PATH")]
    write_default_config: Option<Option<PathBuf>>,
}

fn register_persistent<M>(
    world: &mut World,
    system: impl IntoSystem<(), (), M> + 'static,
) -> SystemId {
    let id = world.register_system(system);
    world.entity_mut(id.entity()).insert(Persistent);
    id
}

fn run_registered(world: &mut World, id: SystemId, label: &str) {
    if let Err(e) = world.run_system(id) {
        log::error!("System '{}' failed: {}", label, e);
    }
    world.flush();
}

fn emit_trace(records: Vec<ActionEventRecord>, trace_json: bool) {
    for record in records {
        if trace_json {
            match serde_json::to_string(&record) {
                Ok(line) => println!("{line}"),
                Err(e) => log::error!("Failed to serialize trace record: {}", e),
            }
        } else {
            log::info!(
                "[{:>7.3}s] {:<10} {} (success: {})",
                record.time,
                record.event,
                record.action,
                record.success
            );
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Early-exit: write the built-in catalog and quit
    if let Some(maybe_path) = cli.write_default_config {
        let path = maybe_path.unwrap_or_else(|| PathBuf::from("./actions.ini"));
        let mut catalog = ActionCatalog::builtin();
        catalog.config_path = path;
        if let Err(e) = catalog.save_to_file() {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
        println!("Action catalog written to {}", catalog.config_path.display());
        return;
    }

    // --------------- Catalog ---------------
    let mut catalog = ActionCatalog::with_path(cli.config.clone());
    if let Err(e) = catalog.load_from_file() {
        log::warn!("{}; using the built-in catalog", e);
        catalog = ActionCatalog::builtin();
    }
    if let Some(world_kind) = cli.world {
        catalog.simulation.world = world_kind;
    }
    if let Some(seconds) = cli.seconds {
        catalog.simulation.seconds = seconds.max(0.0);
    }
    if let Some(fps) = cli.fps {
        catalog.simulation.fps = fps.max(1);
    }
    let simulation = catalog.simulation;
    log::info!(
        "Running {} action(s) in a {} world for {:.2}s at {} fps",
        catalog.len(),
        simulation.world,
        simulation.seconds,
        simulation.fps
    );

    // --------------- ECS world + resources ---------------
    let mut world = World::new();
    game::insert_resources(&mut world, catalog);
    game::register_observers(&mut world);

    let setup_id = register_persistent(&mut world, game::setup);
    let cancel_all_id = register_persistent(&mut world, game::cancel_all);
    let release_all_id = register_persistent(&mut world, game::release_all);
    world.flush();

    let mut update = game::build_schedule();
    if let Err(e) = update.initialize(&mut world) {
        eprintln!("Error initializing schedule: {e}");
        std::process::exit(1);
    }

    run_registered(&mut world, setup_id, "setup");
    let log = world.resource::<ActionEventLog>().clone();
    emit_trace(log.drain(0.0), cli.trace_json);

    // --------------- Main loop ---------------
    let dt = simulation.frame_delta();
    let frames = (simulation.seconds * simulation.fps as f32).round() as u64;
    for _ in 0..frames {
        update_world_time(&mut world, dt);

        update.run(&mut world);

        world.clear_trackers();

        let elapsed = world.resource::<WorldTime>().elapsed;
        emit_trace(log.drain(elapsed), cli.trace_json);
    }

    // --------------- Teardown ---------------
    run_registered(&mut world, cancel_all_id, "cancel_all");
    world.resource_mut::<WorldContext>().tearing_down = true;
    run_registered(&mut world, release_all_id, "release_all");

    let time = world.resource::<WorldTime>();
    let (elapsed, frame_count) = (time.elapsed, time.frame_count);
    emit_trace(log.drain(elapsed), cli.trace_json);
    log::info!(
        "Simulation finished after {} frame(s), {:.3}s; {} timer(s) left pending",
        frame_count,
        elapsed,
        world.resource::<ActionTimers>().len()
    );
}
