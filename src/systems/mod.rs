//! Engine systems.
//!
//! This module groups the ECS systems and observers that drive actions once per
//! frame and on request.
//!
//! Submodules overview
//! - [`actionrequest`] – apply action requests and release an entity's actions
//! - [`actionservices`] – shared timer, context and liveness parameters
//! - [`actiontick`] – tick active actions with the frame delta
//! - [`actiontimers`] – advance action timers, dispatch the due ones and drop
//!   those of removed containers
//! - [`time`] – update simulation time and delta

pub mod actionrequest;
pub mod actionservices;
pub mod actiontick;
pub mod actiontimers;
pub mod time;
