//! ECS components for entities.
//!
//! This module groups the action model and the components that attach actions
//! to entities in the world.
//!
//! Submodules overview:
//! - [`action`] – the action lifecycle state machine and its host services
//! - [`actionbehavior`] – per-action hooks run at start, stop, reset and tick
//! - [`actionlist`] – list and single-slot containers holding actions
//! - [`actionsettings`] – per-action configuration values
//! - [`persistent`] – marker for engine-owned entities that outlive teardown

pub mod action;
pub mod actionbehavior;
pub mod actionlist;
pub mod actionsettings;
pub mod persistent;
