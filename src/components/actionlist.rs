//! Containers that attach actions to entities.
//!
//! - [`ActionList`] – ordered list of actions
//! - [`ActionSingle`] – a single optional action slot
//!
//! Both are plain aggregation; the lifecycle lives on
//! [`Action`](crate::components::action::Action) and is driven by
//! [`crate::systems::actionrequest`], [`crate::systems::actiontimers`] and
//! [`crate::systems::actiontick`].
//!
//! An action taken out of a container has its live timers cancelled on the
//! way out. Removing a whole container (or despawning its entity) is covered
//! by [`release_removed_action_timers`](crate::systems::actiontimers::release_removed_action_timers).

use bevy_ecs::prelude::Component;

use crate::components::action::Action;
use crate::resources::actiontimers::{TimerHandle, TimerService};

/// Ordered list of actions owned by an entity.
#[derive(Component, Debug, Default)]
pub struct ActionList {
    pub actions: Vec<Action>,
}

impl ActionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action (builder pattern).
    pub fn with(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn action(&self, index: usize) -> Option<&Action> {
        self.actions.get(index)
    }

    pub fn action_mut(&mut self, index: usize) -> Option<&mut Action> {
        self.actions.get_mut(index)
    }

    /// Remove the action at `index`, cancelling its live timers.
    pub fn remove(&mut self, index: usize, timers: &mut dyn TimerService) -> Option<Action> {
        if index >= self.actions.len() {
            return None;
        }
        let mut action = self.actions.remove(index);
        action.release_timers(timers);
        Some(action)
    }

    /// Whether any held action owns `handle`.
    pub fn holds_timer(&self, handle: TimerHandle) -> bool {
        self.actions.iter().any(|a| a.owns_timer(handle))
    }

    /// Index of the first action called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.actions.iter().position(|a| a.name() == name)
    }

    /// The action owning `handle`, if any.
    pub fn find_timer_owner(&mut self, handle: TimerHandle) -> Option<&mut Action> {
        self.actions.iter_mut().find(|a| a.owns_timer(handle))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Action> {
        self.actions.iter_mut()
    }
}

/// A single optional action owned by an entity.
#[derive(Component, Debug, Default)]
pub struct ActionSingle {
    pub action: Option<Action>,
}

impl ActionSingle {
    pub fn new(action: Action) -> Self {
        Self {
            action: Some(action),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    pub fn action_mut(&mut self) -> Option<&mut Action> {
        self.action.as_mut()
    }

    /// Replace the slot content, returning the previous action with its
    /// timers cancelled.
    pub fn replace(&mut self, action: Action, timers: &mut dyn TimerService) -> Option<Action> {
        let mut previous = self.action.replace(action)?;
        previous.release_timers(timers);
        Some(previous)
    }

    /// Empty the slot, returning the action with its timers cancelled.
    pub fn take(&mut self, timers: &mut dyn TimerService) -> Option<Action> {
        let mut action = self.action.take()?;
        action.release_timers(timers);
        Some(action)
    }

    pub fn holds_timer(&self, handle: TimerHandle) -> bool {
        self.action.as_ref().is_some_and(|a| a.owns_timer(handle))
    }

    pub fn find_timer_owner(&mut self, handle: TimerHandle) -> Option<&mut Action> {
        self.action.as_mut().filter(|a| a.owns_timer(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::action::ActionHost;
    use crate::components::actionsettings::ActionSettings;
    use crate::resources::actiontimers::ActionTimers;
    use crate::resources::worldcontext::{FixedContext, WorldKind};

    #[test]
    fn list_keeps_insertion_order() {
        let list = ActionList::new()
            .with(Action::noop("first", ActionSettings::default()))
            .with(Action::noop("second", ActionSettings::default()));
        assert_eq!(list.len(), 2);
        assert_eq!(list.action(0).unwrap().name(), "first");
        assert_eq!(list.position("second"), Some(1));
        assert_eq!(list.position("third"), None);
    }

    #[test]
    fn single_slot_replace_and_take() {
        let mut timers = ActionTimers::new();
        let mut single = ActionSingle::empty();
        assert!(single.action().is_none());
        assert!(
            single
                .replace(Action::noop("a", ActionSettings::default()), &mut timers)
                .is_none()
        );
        let previous = single.replace(Action::noop("b", ActionSettings::default()), &mut timers);
        assert_eq!(previous.unwrap().name(), "a");
        assert_eq!(single.take(&mut timers).unwrap().name(), "b");
        assert!(single.action().is_none());
    }

    fn started(name: &str, timers: &mut ActionTimers) -> Action {
        let resolver = FixedContext::of(WorldKind::Game);
        let mut host = ActionHost::new(timers, &resolver);
        let mut action = Action::noop(
            name,
            ActionSettings::new()
                .with_start_delay(1.0)
                .with_duration_override(5.0),
        );
        action.start(None, None, &mut host);
        action
    }

    #[test]
    fn replacing_an_active_action_cancels_its_timers() {
        let mut timers = ActionTimers::new();
        let mut single = ActionSingle::new(started("hold", &mut timers));
        assert_eq!(timers.len(), 2);

        let previous = single.replace(Action::noop("idle", ActionSettings::default()), &mut timers);
        drop(previous);
        assert!(timers.is_empty());

        single.replace(started("again", &mut timers), &mut timers);
        assert!(single.take(&mut timers).is_some());
        assert!(timers.is_empty());
    }

    #[test]
    fn removing_from_the_list_cancels_timers() {
        let mut timers = ActionTimers::new();
        let mut list = ActionList::new()
            .with(started("first", &mut timers))
            .with(Action::noop("second", ActionSettings::default()));
        let handle = list.action(0).unwrap().duration_timer().unwrap();
        assert!(list.holds_timer(handle));

        assert_eq!(list.remove(0, &mut timers).unwrap().name(), "first");
        assert!(timers.is_empty());
        assert!(!list.holds_timer(handle));
        assert!(list.remove(5, &mut timers).is_none());
    }
}
