//! Event types exchanged around actions.
//!
//! Submodules:
//! - [`action`] – lifecycle event kinds, subscriber lists and deferred commands
//! - [`actionrequest`] – ECS events addressing the actions held by an entity
//!
//! See each submodule for concrete event data and semantics.
pub mod action;
pub mod actionrequest;
