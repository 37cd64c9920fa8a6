//! Action lifecycle events and subscriber lists.
//!
//! Every [`Action`](crate::components::action::Action) owns an
//! [`ActionDelegates`] value holding one ordered subscriber list per
//! [`ActionEventKind`]. Broadcasting calls the subscribers synchronously in
//! registration order.
//!
//! Subscribers cannot borrow the action while it is mid-transition. Instead
//! they receive an [`ActionCommands`] queue; commands pushed there are applied
//! once the current operation returns, before any timer can fire.
//!
//! # Example
//!
//! ```ignore
//! action.subscribe(ActionEventKind::Ended, |event, commands| {
//!     if !event.success {
//!         // retry straight away
//!         commands.start(event.acting_actor, event.instigator);
//!     }
//! });
//! ```

use std::collections::VecDeque;
use std::fmt;

use bevy_ecs::prelude::Entity;
use serde::Serialize;
use smallvec::SmallVec;

/// The five lifecycle broadcasts of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActionEventKind {
    /// The start request was accepted.
    Started,
    /// The action was interrupted.
    Cancelled,
    /// The action ended, successfully or not.
    Ended,
    /// The action ended successfully.
    Completed,
    /// The action failed to start, or ended unsuccessfully.
    Failed,
}

impl ActionEventKind {
    pub const ALL: [ActionEventKind; 5] = [
        ActionEventKind::Started,
        ActionEventKind::Cancelled,
        ActionEventKind::Ended,
        ActionEventKind::Completed,
        ActionEventKind::Failed,
    ];

    fn index(self) -> usize {
        match self {
            ActionEventKind::Started => 0,
            ActionEventKind::Cancelled => 1,
            ActionEventKind::Ended => 2,
            ActionEventKind::Completed => 3,
            ActionEventKind::Failed => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionEventKind::Started => "started",
            ActionEventKind::Cancelled => "cancelled",
            ActionEventKind::Ended => "ended",
            ActionEventKind::Completed => "completed",
            ActionEventKind::Failed => "failed",
        }
    }
}

impl fmt::Display for ActionEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Payload delivered to subscribers.
///
/// `success` carries the outcome for [`ActionEventKind::Ended`]. For the other
/// kinds it holds the implied outcome: true for `Started` and `Completed`,
/// false for `Cancelled` and `Failed`.
#[derive(Debug, Clone, Copy)]
pub struct ActionEvent<'a> {
    pub kind: ActionEventKind,
    /// Name of the broadcasting action.
    pub action: &'a str,
    pub success: bool,
    pub acting_actor: Option<Entity>,
    pub instigator: Option<Entity>,
}

/// A request against an action, applied after the current transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCommand {
    Start {
        acting_actor: Option<Entity>,
        instigator: Option<Entity>,
    },
    Finish { success: bool },
    Cancel,
    End { success: bool },
    SetTickEnabled(bool),
}

/// FIFO queue of deferred [`ActionCommand`]s.
#[derive(Debug, Default)]
pub struct ActionCommands {
    queue: VecDeque<ActionCommand>,
}

impl ActionCommands {
    pub fn push(&mut self, command: ActionCommand) {
        self.queue.push_back(command);
    }

    pub fn start(&mut self, acting_actor: Option<Entity>, instigator: Option<Entity>) {
        self.push(ActionCommand::Start {
            acting_actor,
            instigator,
        });
    }

    pub fn finish(&mut self, success: bool) {
        self.push(ActionCommand::Finish { success });
    }

    pub fn cancel(&mut self) {
        self.push(ActionCommand::Cancel);
    }

    pub fn end(&mut self, success: bool) {
        self.push(ActionCommand::End { success });
    }

    pub fn set_tick_enabled(&mut self, enabled: bool) {
        self.push(ActionCommand::SetTickEnabled(enabled));
    }

    pub(crate) fn pop(&mut self) -> Option<ActionCommand> {
        self.queue.pop_front()
    }

    pub(crate) fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Subscriber callback.
pub type ActionCallback =
    Box<dyn FnMut(&ActionEvent<'_>, &mut ActionCommands) + Send + Sync + 'static>;

struct Binding {
    key: Option<String>,
    callback: ActionCallback,
}

/// Ordered subscriber lists, one per [`ActionEventKind`].
#[derive(Default)]
pub struct ActionDelegates {
    lists: [SmallVec<[Binding; 2]>; 5],
}

impl ActionDelegates {
    /// Append an anonymous subscriber.
    pub fn add(&mut self, kind: ActionEventKind, callback: ActionCallback) {
        self.lists[kind.index()].push(Binding {
            key: None,
            callback,
        });
    }

    /// Append a keyed subscriber unless one with the same key is already bound
    /// to `kind`. Returns whether it was added.
    pub fn add_unique(
        &mut self,
        kind: ActionEventKind,
        key: impl Into<String>,
        callback: ActionCallback,
    ) -> bool {
        let key = key.into();
        let list = &mut self.lists[kind.index()];
        if list.iter().any(|b| b.key.as_deref() == Some(key.as_str())) {
            return false;
        }
        list.push(Binding {
            key: Some(key),
            callback,
        });
        true
    }

    /// Remove every subscriber bound under `key`, for all kinds.
    /// Returns how many were removed.
    pub fn remove(&mut self, key: &str) -> usize {
        let mut removed = 0;
        for list in self.lists.iter_mut() {
            let before = list.len();
            list.retain(|b| b.key.as_deref() != Some(key));
            removed += before - list.len();
        }
        removed
    }

    pub fn clear(&mut self) {
        for list in self.lists.iter_mut() {
            list.clear();
        }
    }

    pub fn len(&self, kind: ActionEventKind) -> usize {
        self.lists[kind.index()].len()
    }

    pub fn is_bound(&self, kind: ActionEventKind) -> bool {
        !self.lists[kind.index()].is_empty()
    }

    /// Call every subscriber of `event.kind` in registration order.
    pub fn broadcast(&mut self, event: &ActionEvent<'_>, commands: &mut ActionCommands) {
        for binding in self.lists[event.kind.index()].iter_mut() {
            (binding.callback)(event, commands);
        }
    }
}

impl fmt::Debug for ActionDelegates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for kind in ActionEventKind::ALL {
            map.entry(&kind.as_str(), &self.len(kind));
        }
        map.finish()
    }
}

/// Per-call subscribers handed to
/// [`Action::start_bound`](crate::components::action::Action::start_bound).
///
/// Every present callback is bound under `key` with add-unique semantics, so
/// starting twice with the same key does not duplicate bindings.
pub struct ActionBindings {
    pub key: String,
    pub started: Option<ActionCallback>,
    pub cancelled: Option<ActionCallback>,
    pub ended: Option<ActionCallback>,
    pub completed: Option<ActionCallback>,
    pub failed: Option<ActionCallback>,
}

impl ActionBindings {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            started: None,
            cancelled: None,
            ended: None,
            completed: None,
            failed: None,
        }
    }

    /// Set the callback for one event kind (builder pattern).
    pub fn on(
        mut self,
        kind: ActionEventKind,
        callback: impl FnMut(&ActionEvent<'_>, &mut ActionCommands) + Send + Sync + 'static,
    ) -> Self {
        let slot = match kind {
            ActionEventKind::Started => &mut self.started,
            ActionEventKind::Cancelled => &mut self.cancelled,
            ActionEventKind::Ended => &mut self.ended,
            ActionEventKind::Completed => &mut self.completed,
            ActionEventKind::Failed => &mut self.failed,
        };
        *slot = Some(Box::new(callback));
        self
    }

    /// Bind every present callback into `delegates`.
    pub fn bind_into(self, delegates: &mut ActionDelegates) {
        let key = self.key;
        let slots = [
            (ActionEventKind::Started, self.started),
            (ActionEventKind::Cancelled, self.cancelled),
            (ActionEventKind::Ended, self.ended),
            (ActionEventKind::Completed, self.completed),
            (ActionEventKind::Failed, self.failed),
        ];
        for (kind, callback) in slots {
            if let Some(callback) = callback {
                delegates.add_unique(kind, key.clone(), callback);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn event(kind: ActionEventKind) -> ActionEvent<'static> {
        ActionEvent {
            kind,
            action: "test",
            success: true,
            acting_actor: None,
            instigator: None,
        }
    }

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &str) -> ActionCallback {
        let log = log.clone();
        let tag = tag.to_string();
        Box::new(move |_event, _commands| log.lock().unwrap().push(tag.clone()))
    }

    #[test]
    fn broadcast_runs_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut delegates = ActionDelegates::default();
        delegates.add(ActionEventKind::Started, recorder(&log, "a"));
        delegates.add(ActionEventKind::Started, recorder(&log, "b"));
        delegates.add(ActionEventKind::Ended, recorder(&log, "ended"));

        let mut commands = ActionCommands::default();
        delegates.broadcast(&event(ActionEventKind::Started), &mut commands);

        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn add_unique_ignores_duplicate_keys() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut delegates = ActionDelegates::default();
        assert!(delegates.add_unique(ActionEventKind::Failed, "ui", recorder(&log, "1")));
        assert!(!delegates.add_unique(ActionEventKind::Failed, "ui", recorder(&log, "2")));
        assert!(delegates.add_unique(ActionEventKind::Ended, "ui", recorder(&log, "3")));
        assert_eq!(delegates.len(ActionEventKind::Failed), 1);

        assert_eq!(delegates.remove("ui"), 2);
        assert!(!delegates.is_bound(ActionEventKind::Failed));
        assert!(!delegates.is_bound(ActionEventKind::Ended));
    }

    #[test]
    fn subscribers_can_queue_commands() {
        let mut delegates = ActionDelegates::default();
        delegates.add(
            ActionEventKind::Started,
            Box::new(|_event, commands| commands.finish(false)),
        );
        let mut commands = ActionCommands::default();
        delegates.broadcast(&event(ActionEventKind::Started), &mut commands);
        assert_eq!(commands.pop(), Some(ActionCommand::Finish { success: false }));
        assert!(commands.is_empty());
    }

    #[test]
    fn bindings_bind_each_present_callback_once() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut delegates = ActionDelegates::default();
        let log_started = log.clone();
        ActionBindings::new("caller")
            .on(ActionEventKind::Started, move |_e, _c| {
                log_started.lock().unwrap().push("started".to_string())
            })
            .bind_into(&mut delegates);
        ActionBindings::new("caller")
            .on(ActionEventKind::Started, |_e, _c| {})
            .bind_into(&mut delegates);

        assert_eq!(delegates.len(ActionEventKind::Started), 1);
        assert_eq!(delegates.len(ActionEventKind::Ended), 0);
    }
}
