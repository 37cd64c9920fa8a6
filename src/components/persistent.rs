//! Marker for engine-owned entities.
//!
//! Observers and other service entities carry [`Persistent`] so that
//! [`crate::game::release_all`] leaves them alone when the simulation winds down.

use bevy_ecs::prelude::Component;

/// Entity survives [`crate::game::release_all`].
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Persistent;
