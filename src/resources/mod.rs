//! ECS resources made available to systems.
//!
//! This module groups the long-lived data injected into the ECS world and
//! accessed by the action systems during execution.
//!
//! Overview
//! - `actioncatalog` – named action settings and simulation values loaded from INI
//! - `actioneventlog` – shared trace of lifecycle events
//! - `actiontimers` – one-shot timer service backing start delays and durations
//! - `worldcontext` – kind of world the actions run in and its resolvers
//! - `worldtime` – simulation time and delta
pub mod actioncatalog;
pub mod actioneventlog;
pub mod actiontimers;
pub mod worldcontext;
pub mod worldtime;
