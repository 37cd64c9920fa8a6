//! Engine services shared by the action systems.
//!
//! Every system or observer that drives an
//! [`Action`](crate::components::action::Action) needs the timer service, the
//! world context and a way to check entity liveness. [`ActionServices`] bundles
//! them and builds the [`ActionHost`] an action operation expects.

use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemParam;

use crate::components::action::ActionHost;
use crate::resources::actiontimers::ActionTimers;
use crate::resources::worldcontext::{EcsContextResolver, WorldContext};

/// Bundled system parameters for running action operations.
#[derive(SystemParam)]
pub struct ActionServices<'w, 's> {
    pub timers: ResMut<'w, ActionTimers>,
    pub context: Res<'w, WorldContext>,
    pub live: Query<'w, 's, Entity>,
}

impl ActionServices<'_, '_> {
    /// Run `f` with a host whose owner is `owner`.
    pub fn with_host<R>(
        &mut self,
        owner: Option<Entity>,
        f: impl FnOnce(&mut ActionHost<'_>) -> R,
    ) -> R {
        let live = &self.live;
        let is_alive = |entity: Entity| live.contains(entity);
        let resolver = EcsContextResolver {
            world: &*self.context,
            is_alive: &is_alive,
        };
        let mut host = ActionHost::new(&mut *self.timers, &resolver).with_owner(owner);
        f(&mut host)
    }
}
