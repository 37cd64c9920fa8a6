//! simpleactions library.
//!
//! This module exposes the action model together with its ECS components,
//! resources, systems and events for use in integration tests and as a
//! reusable library.

pub mod components;
pub mod events;
pub mod game;
pub mod resources;
pub mod systems;
