//! Frame ticker for actions.
//!
//! [`tick_actions`] polls every action held in an
//! [`ActionList`](crate::components::actionlist::ActionList) or
//! [`ActionSingle`](crate::components::actionlist::ActionSingle) once per frame
//! and ticks the ones whose gate is open (active, tick enabled, `can_tick`).
//! Actions with [`TickType::Never`] are skipped without polling.

use bevy_ecs::prelude::*;

use crate::components::action::{Action, TickType};
use crate::components::actionlist::{ActionList, ActionSingle};
use crate::resources::worldtime::WorldTime;
use crate::systems::actionservices::ActionServices;

fn tick_one(action: &mut Action, owner: Entity, delta: f32, services: &mut ActionServices) {
    if action.tick_type() == TickType::Never || !action.is_tickable() {
        return;
    }
    services.with_host(Some(owner), |host| action.tick(delta, host));
}

/// Tick every eligible action with the scaled frame delta.
pub fn tick_actions(
    world_time: Res<WorldTime>,
    mut lists: Query<(Entity, &mut ActionList)>,
    mut singles: Query<(Entity, &mut ActionSingle)>,
    mut services: ActionServices,
) {
    let delta = world_time.delta;
    for (entity, mut list) in lists.iter_mut() {
        for action in list.iter_mut() {
            tick_one(action, entity, delta, &mut services);
        }
    }
    for (entity, mut single) in singles.iter_mut() {
        if let Some(action) = single.action_mut() {
            tick_one(action, entity, delta, &mut services);
        }
    }
}
