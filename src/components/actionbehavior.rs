//! Overridable side effects of an action.
//!
//! The lifecycle of an [`Action`](crate::components::action::Action) is fixed;
//! what it *does* is supplied by an [`ActionBehavior`]. Every hook has an empty
//! default body so a behavior only implements the ones it cares about.
//!
//! # Hook order
//!
//! - `on_start` – when the action starts, or when its start delay elapses
//! - `on_tick` – every frame while the action is tickable
//! - `on_stop` – when the action ends (if `stop_when_active_started`)
//! - `on_reset` – after the end broadcasts, for final cleanup
//!
//! # Example
//!
//! ```ignore
//! struct Blink { remaining: u32 }
//!
//! impl ActionBehavior for Blink {
//!     fn on_start(&mut self, ctx: &mut HookContext) {
//!         self.remaining = 3;
//!     }
//!     fn on_tick(&mut self, ctx: &mut HookContext, _delta: f32) {
//!         self.remaining -= 1;
//!         if self.remaining == 0 {
//!             ctx.commands.finish(true);
//!         }
//!     }
//! }
//! ```

use bevy_ecs::prelude::Entity;

use crate::components::actionsettings::ActionSettings;
use crate::events::action::ActionCommands;

/// Data handed to lifecycle hooks.
pub struct HookContext<'a> {
    /// Name of the action running the hook.
    pub action: &'a str,
    pub acting_actor: Option<Entity>,
    pub instigator: Option<Entity>,
    /// Deferred requests against the same action.
    pub commands: &'a mut ActionCommands,
}

/// Side effects of an action variant.
pub trait ActionBehavior: Send + Sync + 'static {
    /// The action is starting (after its start delay, if any).
    fn on_start(&mut self, _ctx: &mut HookContext<'_>) {}

    /// The action is ending. `success` is false when it was cancelled.
    fn on_stop(&mut self, _ctx: &mut HookContext<'_>, _success: bool) {}

    /// The action has completely ended.
    fn on_reset(&mut self, _ctx: &mut HookContext<'_>) {}

    fn on_tick(&mut self, _ctx: &mut HookContext<'_>, _delta: f32) {}

    /// First initialization inside editor tooling.
    fn on_editor_initialize(&mut self, _settings: &ActionSettings) {}

    /// A setting was changed from editor tooling.
    fn on_editor_property_changed(&mut self, _settings: &ActionSettings) {}
}

/// Behavior with no side effects.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBehavior;

impl ActionBehavior for NoopBehavior {}

/// Behavior that reports every hook through the log.
#[derive(Debug, Default, Clone)]
pub struct LogBehavior {
    /// Seconds accumulated by `on_tick` during the current run.
    pub ticked: f32,
}

impl ActionBehavior for LogBehavior {
    fn on_start(&mut self, ctx: &mut HookContext<'_>) {
        self.ticked = 0.0;
        log::info!(
            "Action '{}' started (actor {:?}, instigator {:?})",
            ctx.action,
            ctx.acting_actor,
            ctx.instigator
        );
    }

    fn on_stop(&mut self, ctx: &mut HookContext<'_>, success: bool) {
        log::info!(
            "Action '{}' stopped after {:.2}s of ticking. Success: {}",
            ctx.action,
            self.ticked,
            success
        );
    }

    fn on_reset(&mut self, ctx: &mut HookContext<'_>) {
        log::debug!("Action '{}' reset", ctx.action);
    }

    fn on_tick(&mut self, _ctx: &mut HookContext<'_>, delta: f32) {
        self.ticked += delta;
    }
}
