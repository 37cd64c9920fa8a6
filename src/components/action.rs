//! The action lifecycle state machine.
//!
//! An [`Action`] is a named behavior that an acting actor performs on behalf
//! of an instigator. It moves between two states:
//!
//! - **Inactive** – initial state, re-entered after every end
//! - **Active** – between an accepted start and the matching end; while a
//!   start delay is running the action is active but its start hook has not
//!   run yet
//!
//! # Transitions
//!
//! 1. [`Action::start`] resolves the execution context, applies the double
//!    start policy, marks the action active, broadcasts `Started`, schedules
//!    the duration override and runs (or delays) the start hook
//! 2. [`Action::finish`] ends the action unless a duration override is still
//!    running
//! 3. [`Action::cancel`] broadcasts `Cancelled` and ends unsuccessfully
//! 4. [`Action::end`] cancels timers, disables ticking, runs the stop hook,
//!    broadcasts `Completed`/`Failed` then `Ended`, runs the reset hook and
//!    clears the actor references
//!
//! Side effects are supplied by an [`ActionBehavior`]. Everything the action
//! needs from the engine comes through an [`ActionHost`].
//!
//! # Related
//!
//! - [`crate::events::action`] – event kinds, subscribers and deferred commands
//! - [`crate::resources::actiontimers`] – the timer service
//! - [`crate::systems::actiontick`] – the frame ticker

use std::fmt;

use bevy_ecs::prelude::Entity;
use log::{debug, warn};

use crate::components::actionbehavior::{ActionBehavior, HookContext, NoopBehavior};
use crate::components::actionsettings::ActionSettings;
use crate::events::action::{
    ActionBindings, ActionCommand, ActionCommands, ActionDelegates, ActionEvent, ActionEventKind,
};
use crate::resources::actiontimers::{ActionTimerKind, TimerHandle, TimerService, TimerTarget};
use crate::resources::worldcontext::{ContextQuery, ContextResolver};

/// Upper bound of deferred commands applied after a single operation.
const MAX_DEFERRED_COMMANDS: usize = 256;

/// Engine services an action needs during a transition.
pub struct ActionHost<'a> {
    pub timers: &'a mut dyn TimerService,
    pub resolver: &'a dyn ContextResolver,
    /// Entity holding the action, if any.
    pub owner: Option<Entity>,
}

impl<'a> ActionHost<'a> {
    /// Host without an owner entity.
    ///
    /// `update_action_timers` routes fired timers by owner and drops the
    /// owner-less ones with a warning. Callers using a host without
    /// [`with_owner`](Self::with_owner) must drive their own
    /// [`ActionTimers`](crate::resources::actiontimers::ActionTimers) and hand
    /// due timers to [`Action::on_timer_fired`].
    pub fn new(timers: &'a mut dyn TimerService, resolver: &'a dyn ContextResolver) -> Self {
        Self {
            timers,
            resolver,
            owner: None,
        }
    }

    pub fn with_owner(mut self, owner: Option<Entity>) -> Self {
        self.owner = owner;
        self
    }
}

/// How the frame ticker should treat an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickType {
    /// Never polled.
    Never,
    /// Polled every frame, ticked when [`Action::is_tickable`] holds.
    Conditional,
}

/// A startable, cancellable, completable behavior with lifecycle events.
pub struct Action {
    name: String,
    uid: Option<String>,
    settings: ActionSettings,
    active: bool,
    tick_enabled: bool,
    acting_actor: Option<Entity>,
    instigator: Option<Entity>,
    start_delay_timer: Option<TimerHandle>,
    duration_timer: Option<TimerHandle>,
    delegates: ActionDelegates,
    commands: ActionCommands,
    behavior: Box<dyn ActionBehavior>,
    editor_initialized: bool,
}

impl Action {
    pub fn new(
        name: impl Into<String>,
        settings: ActionSettings,
        behavior: impl ActionBehavior,
    ) -> Self {
        Self::from_boxed(name, settings, Box::new(behavior))
    }

    pub fn from_boxed(
        name: impl Into<String>,
        mut settings: ActionSettings,
        behavior: Box<dyn ActionBehavior>,
    ) -> Self {
        settings.sanitize();
        Self {
            name: name.into(),
            uid: None,
            settings,
            active: false,
            tick_enabled: false,
            acting_actor: None,
            instigator: None,
            start_delay_timer: None,
            duration_timer: None,
            delegates: ActionDelegates::default(),
            commands: ActionCommands::default(),
            behavior,
            editor_initialized: false,
        }
    }

    /// Action without side effects; only the lifecycle events are observable.
    pub fn noop(name: impl Into<String>, settings: ActionSettings) -> Self {
        Self::new(name, settings, NoopBehavior)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unique identifier, generated on first access.
    pub fn id(&mut self) -> &str {
        self.uid.get_or_insert_with(generate_uid)
    }

    pub fn has_id(&self) -> bool {
        self.uid.is_some()
    }

    pub fn settings(&self) -> &ActionSettings {
        &self.settings
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Active, but the start hook is still waiting for its delay.
    pub fn is_start_pending(&self) -> bool {
        self.active && self.start_delay_timer.is_some()
    }

    pub fn acting_actor(&self) -> Option<Entity> {
        self.acting_actor
    }

    pub fn instigator(&self) -> Option<Entity> {
        self.instigator
    }

    pub fn start_delay_timer(&self) -> Option<TimerHandle> {
        self.start_delay_timer
    }

    pub fn duration_timer(&self) -> Option<TimerHandle> {
        self.duration_timer
    }

    /// Whether `handle` is one of this action's live timers.
    pub fn owns_timer(&self, handle: TimerHandle) -> bool {
        self.start_delay_timer == Some(handle) || self.duration_timer == Some(handle)
    }

    pub fn behavior(&self) -> &dyn ActionBehavior {
        self.behavior.as_ref()
    }

    pub fn delegates(&self) -> &ActionDelegates {
        &self.delegates
    }

    /// Subscribe to one event kind.
    pub fn subscribe(
        &mut self,
        kind: ActionEventKind,
        callback: impl FnMut(&ActionEvent<'_>, &mut ActionCommands) + Send + Sync + 'static,
    ) {
        self.delegates.add(kind, Box::new(callback));
    }

    /// Subscribe under `key` unless that key is already bound to `kind`.
    pub fn subscribe_unique(
        &mut self,
        kind: ActionEventKind,
        key: impl Into<String>,
        callback: impl FnMut(&ActionEvent<'_>, &mut ActionCommands) + Send + Sync + 'static,
    ) -> bool {
        self.delegates.add_unique(kind, key, Box::new(callback))
    }

    /// Remove every subscription bound under `key`.
    pub fn unsubscribe(&mut self, key: &str) -> usize {
        self.delegates.remove(key)
    }

    /// Start the action.
    ///
    /// Rejected starts broadcast `Failed` and leave the state untouched.
    /// Starting an active action either restarts it (when
    /// `allow_double_start`) or is ignored.
    ///
    /// A cancel or finish requested from a `Started` subscriber is deferred:
    /// it runs after the start hook, which is therefore never suppressed.
    pub fn start(
        &mut self,
        acting_actor: Option<Entity>,
        instigator: Option<Entity>,
        host: &mut ActionHost<'_>,
    ) {
        self.start_now(acting_actor, instigator, host);
        self.flush(host);
    }

    /// Bind per-call subscribers, then start.
    pub fn start_bound(
        &mut self,
        acting_actor: Option<Entity>,
        instigator: Option<Entity>,
        bindings: ActionBindings,
        host: &mut ActionHost<'_>,
    ) {
        bindings.bind_into(&mut self.delegates);
        self.start(acting_actor, instigator, host);
    }

    /// End the action, unless a duration override is still running.
    pub fn finish(&mut self, success: bool, host: &mut ActionHost<'_>) {
        self.finish_now(success, host);
        self.flush(host);
    }

    /// Interrupt the action: `Cancelled`, then an unsuccessful end.
    pub fn cancel(&mut self, host: &mut ActionHost<'_>) {
        self.cancel_now(host);
        self.flush(host);
    }

    /// End the action now. Ending an inactive action does nothing.
    pub fn end(&mut self, success: bool, host: &mut ActionHost<'_>) {
        self.end_now(success, host);
        self.flush(host);
    }

    /// Apply a single command as if called directly.
    pub fn apply(&mut self, command: ActionCommand, host: &mut ActionHost<'_>) {
        self.run_command(command, host);
        self.flush(host);
    }

    /// Set the tick gate. Only has an effect when `can_tick` is set; an
    /// inactive action never ticks.
    pub fn set_tick_enabled(&mut self, enabled: bool) {
        if !self.settings.can_tick {
            return;
        }
        self.tick_enabled = enabled && self.active;
    }

    /// The effective tick gate.
    pub fn tick_enabled(&self) -> bool {
        self.tick_enabled
    }

    pub fn is_tickable(&self) -> bool {
        self.active && self.tick_enabled && self.settings.can_tick
    }

    pub fn tick_type(&self) -> TickType {
        if self.settings.can_tick {
            TickType::Conditional
        } else {
            TickType::Never
        }
    }

    /// Run the tick hook if the action is tickable.
    pub fn tick(&mut self, delta: f32, host: &mut ActionHost<'_>) {
        if !self.is_tickable() {
            return;
        }
        let mut ctx = HookContext {
            action: &self.name,
            acting_actor: self.acting_actor,
            instigator: self.instigator,
            commands: &mut self.commands,
        };
        self.behavior.on_tick(&mut ctx, delta);
        self.flush(host);
    }

    /// Deliver a fired timer. Returns false if the handle is not ours.
    pub fn on_timer_fired(&mut self, handle: TimerHandle, host: &mut ActionHost<'_>) -> bool {
        if self.start_delay_timer == Some(handle) {
            self.start_delay_timer = None;
            if self.active {
                debug!("Start delay elapsed. Action '{}'.", self.name);
                self.run_start_hook();
            }
            self.flush(host);
            return true;
        }
        if self.duration_timer == Some(handle) {
            self.duration_timer = None;
            debug!("Duration override elapsed. Action '{}'.", self.name);
            self.finish_now(true, host);
            self.flush(host);
            return true;
        }
        false
    }

    /// Cancel live timers without ending the action. Used when the owner is
    /// destroyed.
    pub fn release_timers(&mut self, timers: &mut dyn TimerService) {
        self.clear_timers(timers);
        self.commands.clear();
    }

    /// Run the editor initialization hook. Only the first call has an effect.
    pub fn initialize_for_editor(&mut self) -> bool {
        if self.editor_initialized {
            return false;
        }
        self.behavior.on_editor_initialize(&self.settings);
        self.editor_initialized = true;
        true
    }

    /// Change the settings of an inactive action.
    ///
    /// Values are clamped afterwards. Non-interactive edits notify the
    /// behavior. Returns false (and changes nothing) while the action is
    /// active.
    pub fn edit_settings(
        &mut self,
        interactive: bool,
        edit: impl FnOnce(&mut ActionSettings),
    ) -> bool {
        if self.active {
            warn!(
                "edit_settings: Failed. Action '{}' is active; settings are fixed during a run.",
                self.name
            );
            return false;
        }
        edit(&mut self.settings);
        self.settings.sanitize();
        if !interactive {
            self.behavior.on_editor_property_changed(&self.settings);
        }
        true
    }

    fn start_now(
        &mut self,
        acting_actor: Option<Entity>,
        instigator: Option<Entity>,
        host: &mut ActionHost<'_>,
    ) {
        let query = ContextQuery {
            owner: host.owner,
            acting_actor,
            instigator,
        };
        let Some(context) = host.resolver.resolve(&query) else {
            warn!("start: Failed. Action '{}' world not valid.", self.name);
            self.broadcast(ActionEventKind::Failed, false);
            return;
        };
        if context.is_preview() && !self.settings.allow_in_editor_preview {
            warn!(
                "start: Failed. Action '{}' not allowed in preview world: {}.",
                self.name, context.kind
            );
            self.broadcast(ActionEventKind::Failed, false);
            return;
        }
        if context.is_level_editor() && !self.settings.allow_in_level_editor {
            warn!(
                "start: Failed. Action '{}' not allowed in editor world: {}.",
                self.name, context.kind
            );
            self.broadcast(ActionEventKind::Failed, false);
            return;
        }

        if self.active {
            if self.settings.allow_double_start {
                debug!("start: Restarting. Action '{}' already active.", self.name);
                self.cancel_now(host);
            } else {
                debug!("start: Failed. Action '{}' already active.", self.name);
                return;
            }
        }

        self.clear_timers(host.timers);
        self.active = true;
        self.acting_actor = acting_actor;
        self.instigator = instigator;
        if self.settings.auto_enable_tick_while_active {
            self.set_tick_enabled(true);
        }

        debug!("start: Starting. Action '{}'.", self.name);
        self.broadcast(ActionEventKind::Started, true);

        if self.settings.has_duration_override() {
            let handle = host.timers.schedule(
                self.settings.total_duration(),
                TimerTarget::new(host.owner, ActionTimerKind::Duration),
            );
            self.duration_timer = Some(handle);
        }

        if self.settings.has_start_delay() {
            let handle = host.timers.schedule(
                self.settings.start_delay,
                TimerTarget::new(host.owner, ActionTimerKind::StartDelay),
            );
            self.start_delay_timer = Some(handle);
        } else {
            self.run_start_hook();
        }
    }

    fn finish_now(&mut self, success: bool, host: &mut ActionHost<'_>) {
        if let Some(handle) = self.duration_timer {
            if host.timers.remaining(handle) > 0.0 {
                debug!(
                    "finish: Ignored. Action '{}' has a running duration override.",
                    self.name
                );
                return;
            }
        }
        self.end_now(success, host);
    }

    fn cancel_now(&mut self, host: &mut ActionHost<'_>) {
        self.broadcast(ActionEventKind::Cancelled, false);
        self.end_now(false, host);
    }

    fn end_now(&mut self, success: bool, host: &mut ActionHost<'_>) {
        if !self.active {
            debug!("end: Failed. Action '{}' isn't active.", self.name);
            return;
        }

        self.clear_timers(host.timers);
        self.active = false;
        self.tick_enabled = false;
        debug!(
            "end: Stopping. Action '{}'. Success: {}.",
            self.name, success
        );

        if self.settings.stop_when_active_started {
            let mut ctx = HookContext {
                action: &self.name,
                acting_actor: self.acting_actor,
                instigator: self.instigator,
                commands: &mut self.commands,
            };
            self.behavior.on_stop(&mut ctx, success);
        }

        let outcome = if success {
            ActionEventKind::Completed
        } else {
            ActionEventKind::Failed
        };
        self.broadcast(outcome, success);
        self.broadcast(ActionEventKind::Ended, success);

        let mut ctx = HookContext {
            action: &self.name,
            acting_actor: self.acting_actor,
            instigator: self.instigator,
            commands: &mut self.commands,
        };
        self.behavior.on_reset(&mut ctx);

        // Kept until now so the end broadcasts and the reset hook can read them.
        self.acting_actor = None;
        self.instigator = None;
    }

    fn run_start_hook(&mut self) {
        let mut ctx = HookContext {
            action: &self.name,
            acting_actor: self.acting_actor,
            instigator: self.instigator,
            commands: &mut self.commands,
        };
        self.behavior.on_start(&mut ctx);
    }

    fn run_command(&mut self, command: ActionCommand, host: &mut ActionHost<'_>) {
        match command {
            ActionCommand::Start {
                acting_actor,
                instigator,
            } => self.start_now(acting_actor, instigator, host),
            ActionCommand::Finish { success } => self.finish_now(success, host),
            ActionCommand::Cancel => self.cancel_now(host),
            ActionCommand::End { success } => self.end_now(success, host),
            ActionCommand::SetTickEnabled(enabled) => self.set_tick_enabled(enabled),
        }
    }

    fn flush(&mut self, host: &mut ActionHost<'_>) {
        let mut applied = 0;
        while let Some(command) = self.commands.pop() {
            if applied == MAX_DEFERRED_COMMANDS {
                warn!(
                    "Action '{}' queued more than {} commands in one operation; dropping the rest.",
                    self.name, MAX_DEFERRED_COMMANDS
                );
                self.commands.clear();
                return;
            }
            applied += 1;
            self.run_command(command, host);
        }
    }

    fn clear_timers(&mut self, timers: &mut dyn TimerService) {
        if let Some(handle) = self.start_delay_timer.take() {
            timers.cancel(handle);
        }
        if let Some(handle) = self.duration_timer.take() {
            timers.cancel(handle);
        }
    }

    fn broadcast(&mut self, kind: ActionEventKind, success: bool) {
        let event = ActionEvent {
            kind,
            action: &self.name,
            success,
            acting_actor: self.acting_actor,
            instigator: self.instigator,
        };
        self.delegates.broadcast(&event, &mut self.commands);
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("uid", &self.uid)
            .field("active", &self.active)
            .field("tick_enabled", &self.tick_enabled)
            .field("acting_actor", &self.acting_actor)
            .field("instigator", &self.instigator)
            .field("start_delay_timer", &self.start_delay_timer)
            .field("duration_timer", &self.duration_timer)
            .field("settings", &self.settings)
            .field("delegates", &self.delegates)
            .finish()
    }
}

fn generate_uid() -> String {
    format!(
        "{:08X}{:08X}{:08X}{:08X}",
        fastrand::u32(..),
        fastrand::u32(..),
        fastrand::u32(..),
        fastrand::u32(..)
    )
}
