//! Per-action configuration.
//!
//! [`ActionSettings`] is set before an action starts and stays constant for
//! the whole run. Values usually come from the
//! [`ActionCatalog`](crate::resources::actioncatalog::ActionCatalog) INI file.

use serde::{Deserialize, Serialize};

/// Configuration of a single action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionSettings {
    /// Starting an active action cancels the running one and starts again.
    /// When false, starting an active action is ignored.
    pub allow_double_start: bool,
    /// Run the stop hook when the action ends.
    pub stop_when_active_started: bool,
    /// The action may tick while active.
    pub can_tick: bool,
    /// Enable ticking on start. Ticking is always disabled on end.
    pub auto_enable_tick_while_active: bool,
    /// The action may run in editor and game preview viewports.
    pub allow_in_editor_preview: bool,
    /// The action may run in the level editor while no game is running.
    pub allow_in_level_editor: bool,
    /// Seconds between the start request and the start hook.
    pub start_delay: f32,
    /// Forced lifetime in seconds; zero or negative disables it.
    pub duration_override: f32,
}

impl Default for ActionSettings {
    fn default() -> Self {
        Self {
            allow_double_start: true,
            stop_when_active_started: true,
            can_tick: false,
            auto_enable_tick_while_active: false,
            allow_in_editor_preview: false,
            allow_in_level_editor: false,
            start_delay: 0.0,
            duration_override: 0.0,
        }
    }
}

impl ActionSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_double_start(mut self, allow: bool) -> Self {
        self.allow_double_start = allow;
        self
    }

    pub fn with_stop_when_active_started(mut self, stop: bool) -> Self {
        self.stop_when_active_started = stop;
        self
    }

    /// Allow ticking, optionally enabling it automatically on start.
    pub fn with_tick(mut self, can_tick: bool, auto_enable: bool) -> Self {
        self.can_tick = can_tick;
        self.auto_enable_tick_while_active = auto_enable;
        self
    }

    pub fn with_editor_preview(mut self, allow: bool) -> Self {
        self.allow_in_editor_preview = allow;
        self
    }

    pub fn with_level_editor(mut self, allow: bool) -> Self {
        self.allow_in_level_editor = allow;
        self
    }

    pub fn with_start_delay(mut self, seconds: f32) -> Self {
        self.start_delay = seconds;
        self.sanitize();
        self
    }

    pub fn with_duration_override(mut self, seconds: f32) -> Self {
        self.duration_override = seconds;
        self.sanitize();
        self
    }

    /// Clamp values into their valid ranges.
    ///
    /// Negative or non-finite start delays become zero, non-finite durations
    /// become zero (disabled).
    pub fn sanitize(&mut self) {
        if !self.start_delay.is_finite() || self.start_delay < 0.0 {
            self.start_delay = 0.0;
        }
        if !self.duration_override.is_finite() {
            self.duration_override = 0.0;
        }
    }

    pub fn has_start_delay(&self) -> bool {
        self.start_delay > 0.0
    }

    pub fn has_duration_override(&self) -> bool {
        self.duration_override > 0.0
    }

    /// Seconds from start until the duration override forces the end.
    ///
    /// The forced duration is counted after the start delay.
    pub fn total_duration(&self) -> f32 {
        self.duration_override + self.start_delay.max(0.0)
    }
}
