//! ECS-facing requests against actions held by entities.
//!
//! Systems and game code rarely hold the timer service and context resolver
//! needed to call [`Action`](crate::components::action::Action) methods
//! directly. They trigger an [`ActionRequest`] instead, and the
//! [`action_request_observer`](crate::systems::actionrequest::action_request_observer)
//! applies it with the engine's services.
//!
//! # Example
//!
//! ```ignore
//! commands.trigger(ActionRequest {
//!     target: hero,
//!     slot: ActionSlot::Named("dash".into()),
//!     command: ActionCommand::Start { acting_actor: Some(hero), instigator: Some(player) },
//! });
//! ```
//!
//! # Related
//!
//! - [`crate::systems::actionrequest`] – observers handling these events
//! - [`crate::events::action::ActionCommand`] – the commands carried here

use bevy_ecs::prelude::*;

use crate::events::action::ActionCommand;

/// Which action of an entity a request addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionSlot {
    /// The [`ActionSingle`](crate::components::actionlist::ActionSingle) slot.
    Single,
    /// An index into the [`ActionList`](crate::components::actionlist::ActionList).
    Index(usize),
    /// The first list entry with this name, falling back to the single slot.
    Named(String),
    /// Every action of the entity, list first, then the single slot.
    All,
}

/// Apply `command` to the action(s) in `slot` on `target`.
#[derive(Event, Debug, Clone)]
pub struct ActionRequest {
    pub target: Entity,
    pub slot: ActionSlot,
    pub command: ActionCommand,
}

/// Cancel every live timer of the entity's actions, then despawn it.
///
/// Actions are not ended; no lifecycle event is broadcast.
#[derive(Event, Debug, Clone, Copy)]
pub struct ReleaseActionsEvent {
    pub entity: Entity,
}
