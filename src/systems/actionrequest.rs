//! Observers applying ECS requests to actions.
//!
//! - [`action_request_observer`] – applies an
//!   [`ActionRequest`](crate::events::actionrequest::ActionRequest) to the
//!   addressed action(s)
//! - [`release_actions_observer`] – cancels the timers of an entity's actions
//!   and despawns it
//!
//! # Registration
//!
//! ```ignore
//! world.spawn((Observer::new(action_request_observer), Persistent));
//! world.spawn((Observer::new(release_actions_observer), Persistent));
//! world.flush();
//! ```

use bevy_ecs::prelude::*;
use log::{debug, warn};

use crate::components::action::Action;
use crate::components::actionlist::{ActionList, ActionSingle};
use crate::events::actionrequest::{ActionRequest, ActionSlot, ReleaseActionsEvent};
use crate::systems::actionservices::ActionServices;

/// Resolve `slot` to the actions it addresses.
pub fn select_actions<'a>(
    slot: &ActionSlot,
    list: Option<&'a mut ActionList>,
    single: Option<&'a mut ActionSingle>,
) -> Vec<&'a mut Action> {
    match slot {
        ActionSlot::Single => single.and_then(|s| s.action_mut()).into_iter().collect(),
        ActionSlot::Index(index) => list
            .and_then(|l| l.action_mut(*index))
            .into_iter()
            .collect(),
        ActionSlot::Named(name) => {
            if let Some(list) = list {
                if let Some(index) = list.position(name) {
                    return list.action_mut(index).into_iter().collect();
                }
            }
            single
                .and_then(|s| s.action_mut())
                .filter(|a| a.name() == name)
                .into_iter()
                .collect()
        }
        ActionSlot::All => list
            .into_iter()
            .flat_map(|l| l.iter_mut())
            .chain(single.into_iter().flat_map(|s| s.action_mut()))
            .collect(),
    }
}

/// Apply an [`ActionRequest`] with the engine's timer service and context.
///
/// Requests addressing nothing are reported and dropped.
pub fn action_request_observer(
    trigger: On<ActionRequest>,
    mut lists: Query<&mut ActionList>,
    mut singles: Query<&mut ActionSingle>,
    mut services: ActionServices,
) {
    let request = trigger.event();
    let mut list = lists.get_mut(request.target).ok();
    let mut single = singles.get_mut(request.target).ok();

    let targets = select_actions(&request.slot, list.as_deref_mut(), single.as_deref_mut());
    if targets.is_empty() {
        warn!(
            "ActionRequest: no action at {:?} on entity {:?}; {:?} dropped",
            request.slot, request.target, request.command
        );
        return;
    }

    for action in targets {
        services.with_host(Some(request.target), |host| {
            action.apply(request.command, host);
        });
    }
}

/// Cancel every timer of the entity's actions, then despawn the entity.
pub fn release_actions_observer(
    trigger: On<ReleaseActionsEvent>,
    mut lists: Query<&mut ActionList>,
    mut singles: Query<&mut ActionSingle>,
    mut services: ActionServices,
    mut commands: Commands,
) {
    let entity = trigger.event().entity;

    if let Ok(mut list) = lists.get_mut(entity) {
        for action in list.iter_mut() {
            action.release_timers(&mut *services.timers);
        }
    }
    if let Ok(mut single) = singles.get_mut(entity) {
        if let Some(action) = single.action_mut() {
            action.release_timers(&mut *services.timers);
        }
    }
    let stray = services.timers.cancel_owned_by(entity);
    if stray > 0 {
        debug!("Released {} stray timer(s) of entity {:?}", stray, entity);
    }

    commands.entity(entity).try_despawn();
}
