//! Action timer system.
//!
//! [`update_action_timers`] advances the
//! [`ActionTimers`](crate::resources::actiontimers::ActionTimers) service by the
//! frame delta and delivers every due timer to the action that scheduled it.
//!
//! # System Flow
//!
//! Each frame:
//!
//! 1. Advance all pending timers by `WorldTime::delta`
//! 2. Pop the most overdue timer
//! 3. Find the owning action in the owner entity's
//!    [`ActionList`](crate::components::actionlist::ActionList), then its
//!    [`ActionSingle`](crate::components::actionlist::ActionSingle)
//! 4. Call [`Action::on_timer_fired`](crate::components::action::Action::on_timer_fired)
//! 5. Repeat until nothing is due
//!
//! Popping one timer at a time means an action ending inside step 4 cancels
//! its other timers before they are popped.
//!
//! [`release_removed_action_timers`] runs before it and cancels the timers of
//! action containers that were removed or despawned without a
//! [`ReleaseActionsEvent`](crate::events::actionrequest::ReleaseActionsEvent).

use bevy_ecs::prelude::*;
use log::{debug, warn};

use crate::components::actionlist::{ActionList, ActionSingle};
use crate::resources::actiontimers::ActionTimers;
use crate::resources::worldtime::WorldTime;
use crate::systems::actionservices::ActionServices;

/// Advance action timers and dispatch the due ones.
pub fn update_action_timers(
    world_time: Res<WorldTime>,
    mut lists: Query<&mut ActionList>,
    mut singles: Query<&mut ActionSingle>,
    mut services: ActionServices,
) {
    services.timers.advance(world_time.delta);

    while let Some(fired) = services.timers.pop_due() {
        let Some(owner) = fired.target.owner else {
            warn!(
                "Timer {} ({:?}) has no owner entity and cannot be delivered; dropped",
                fired.handle.raw(),
                fired.target.kind
            );
            continue;
        };

        let mut delivered = false;
        if let Ok(mut list) = lists.get_mut(owner) {
            if let Some(action) = list.find_timer_owner(fired.handle) {
                services.with_host(Some(owner), |host| {
                    action.on_timer_fired(fired.handle, host);
                });
                delivered = true;
            }
        }
        if !delivered {
            if let Ok(mut single) = singles.get_mut(owner) {
                if let Some(action) = single.find_timer_owner(fired.handle) {
                    services.with_host(Some(owner), |host| {
                        action.on_timer_fired(fired.handle, host);
                    });
                    delivered = true;
                }
            }
        }
        if !delivered {
            debug!(
                "Timer {} ({:?}) fired for entity {:?} with no matching action",
                fired.handle.raw(),
                fired.target.kind,
                owner
            );
        }
    }
}

/// Cancel the timers of removed [`ActionList`]/[`ActionSingle`] components.
///
/// When the entity still holds the other container, the timers of its actions
/// are kept.
pub fn release_removed_action_timers(
    mut removed_lists: RemovedComponents<ActionList>,
    mut removed_singles: RemovedComponents<ActionSingle>,
    lists: Query<&ActionList>,
    singles: Query<&ActionSingle>,
    mut timers: ResMut<ActionTimers>,
) {
    let removed: Vec<Entity> = removed_lists
        .read()
        .chain(removed_singles.read())
        .collect();

    for entity in removed {
        let list = lists.get(entity).ok();
        let single = singles.get(entity).ok();
        let cancelled = timers.cancel_owned_by_except(entity, |handle| {
            list.is_some_and(|l| l.holds_timer(handle))
                || single.is_some_and(|s| s.holds_timer(handle))
        });
        if cancelled > 0 {
            debug!(
                "Cancelled {} timer(s) of removed actions on entity {:?}",
                cancelled, entity
            );
        }
    }
}
