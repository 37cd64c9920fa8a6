//! Demo world setup and teardown.
//!
//! The executable in `main.rs` drives these in order:
//!
//! 1. [`insert_resources`] and [`register_observers`]
//! 2. [`setup`] (registered system) spawns the agent and requests every start
//! 3. the [`build_schedule`] schedule runs once per frame
//! 4. [`cancel_all`], then [`release_all`] once the world is tearing down

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use log::info;

use crate::components::action::Action;
use crate::components::actionbehavior::LogBehavior;
use crate::components::actionlist::{ActionList, ActionSingle};
use crate::components::persistent::Persistent;
use crate::events::action::ActionCommand;
use crate::events::actionrequest::{ActionRequest, ActionSlot, ReleaseActionsEvent};
use crate::resources::actioncatalog::ActionCatalog;
use crate::resources::actioneventlog::ActionEventLog;
use crate::resources::actiontimers::ActionTimers;
use crate::resources::worldcontext::WorldContext;
use crate::resources::worldtime::WorldTime;
use crate::systems::actionrequest::{action_request_observer, release_actions_observer};
use crate::systems::actiontick::tick_actions;
use crate::systems::actiontimers::{release_removed_action_timers, update_action_timers};

/// Insert every resource the action systems read.
pub fn insert_resources(world: &mut World, catalog: ActionCatalog) {
    let simulation = catalog.simulation;
    world.insert_resource(WorldTime::default().with_time_scale(simulation.time_scale));
    world.insert_resource(WorldContext::new(simulation.world));
    world.insert_resource(ActionTimers::new());
    world.insert_resource(ActionEventLog::new());
    world.insert_resource(catalog);
}

/// Spawn the action observers as persistent entities.
pub fn register_observers(world: &mut World) {
    world.spawn((Observer::new(action_request_observer), Persistent));
    world.spawn((Observer::new(release_actions_observer), Persistent));
    // Observers must exist before anything triggers a request.
    world.flush();
}

/// Per-frame schedule: timers of removed containers are dropped first, then
/// timers fire before ticks so a timer ending an action also stops its tick
/// for the frame.
pub fn build_schedule() -> Schedule {
    let mut update = Schedule::default();
    update.add_systems(
        (
            release_removed_action_timers,
            update_action_timers,
            tick_actions,
        )
            .chain(),
    );
    update
}

/// Spawn an instigator and an agent holding one logged action per catalog
/// entry, then request a start of all of them.
pub fn setup(mut commands: Commands, catalog: Res<ActionCatalog>, log: Res<ActionEventLog>) {
    let instigator = commands.spawn_empty().id();

    let mut list = ActionList::new();
    for (name, settings) in catalog.entries.iter() {
        let mut action = Action::new(name.clone(), *settings, LogBehavior::default());
        log.attach(&mut action);
        list.push(action);
    }
    info!("Spawning agent with {} action(s)", list.len());
    let agent = commands.spawn(list).id();

    commands.trigger(ActionRequest {
        target: agent,
        slot: ActionSlot::All,
        command: ActionCommand::Start {
            acting_actor: Some(agent),
            instigator: Some(instigator),
        },
    });
}

/// Request a cancel of every action in the world.
pub fn cancel_all(
    mut commands: Commands,
    holders: Query<Entity, Or<(With<ActionList>, With<ActionSingle>)>>,
) {
    for entity in holders.iter() {
        commands.trigger(ActionRequest {
            target: entity,
            slot: ActionSlot::All,
            command: ActionCommand::Cancel,
        });
    }
}

/// Release every action holder and despawn the remaining non-persistent
/// entities.
pub fn release_all(
    mut commands: Commands,
    holders: Query<Entity, Or<(With<ActionList>, With<ActionSingle>)>>,
    others: Query<Entity, (Without<Persistent>, Without<ActionList>, Without<ActionSingle>)>,
) {
    for entity in holders.iter() {
        commands.trigger(ReleaseActionsEvent { entity });
    }
    for entity in others.iter() {
        commands.entity(entity).try_despawn();
    }
}
