//! Action lifecycle tests driven directly through the timer service, without
//! an ECS schedule.

use std::sync::{Arc, Mutex};

use bevy_ecs::prelude::*;

use simpleactions::components::action::{Action, ActionHost};
use simpleactions::components::actionbehavior::{ActionBehavior, HookContext};
use simpleactions::components::actionsettings::ActionSettings;
use simpleactions::events::action::{ActionBindings, ActionEventKind};
use simpleactions::resources::actiontimers::{ActionTimers, TimerService};
use simpleactions::resources::worldcontext::{FixedContext, WorldKind};

type Journal = Arc<Mutex<Vec<String>>>;

/// Behavior that writes every hook into a shared journal.
struct Recording {
    journal: Journal,
}

impl ActionBehavior for Recording {
    fn on_start(&mut self, _ctx: &mut HookContext<'_>) {
        self.journal.lock().unwrap().push("hook:start".into());
    }

    fn on_stop(&mut self, _ctx: &mut HookContext<'_>, success: bool) {
        self.journal
            .lock()
            .unwrap()
            .push(format!("hook:stop({success})"));
    }

    fn on_reset(&mut self, ctx: &mut HookContext<'_>) {
        // Actor references must still be readable here.
        self.journal
            .lock()
            .unwrap()
            .push(format!("hook:reset(actor={})", ctx.acting_actor.is_some()));
    }

    fn on_tick(&mut self, _ctx: &mut HookContext<'_>, delta: f32) {
        self.journal.lock().unwrap().push(format!("hook:tick({delta})"));
    }
}

fn recorded_action(name: &str, settings: ActionSettings) -> (Action, Journal) {
    let journal: Journal = Arc::new(Mutex::new(Vec::new()));
    let mut action = Action::new(
        name,
        settings,
        Recording {
            journal: journal.clone(),
        },
    );
    for kind in ActionEventKind::ALL {
        let journal = journal.clone();
        action.subscribe(kind, move |event, _commands| {
            journal.lock().unwrap().push(format!(
                "event:{}({},actor={})",
                event.kind,
                event.success,
                event.acting_actor.is_some()
            ));
        });
    }
    (action, journal)
}

fn take(journal: &Journal) -> Vec<String> {
    std::mem::take(&mut *journal.lock().unwrap())
}

/// Advance the timer service by `dt` and deliver every due timer.
fn advance(action: &mut Action, timers: &mut ActionTimers, resolver: &FixedContext, dt: f32) {
    timers.advance(dt);
    while let Some(fired) = timers.pop_due() {
        let mut host = ActionHost::new(&mut *timers, resolver);
        action.on_timer_fired(fired.handle, &mut host);
    }
}

fn actors() -> (Entity, Entity) {
    let mut world = World::new();
    (world.spawn_empty().id(), world.spawn_empty().id())
}

#[test]
fn valid_start_broadcasts_started_once() {
    let mut timers = ActionTimers::new();
    let resolver = FixedContext::of(WorldKind::Game);
    let (actor, instigator) = actors();
    let (mut action, journal) = recorded_action("wave", ActionSettings::default());

    let mut host = ActionHost::new(&mut timers, &resolver);
    action.start(Some(actor), Some(instigator), &mut host);

    assert!(action.is_active());
    assert_eq!(action.acting_actor(), Some(actor));
    assert_eq!(action.instigator(), Some(instigator));
    assert_eq!(take(&journal), vec!["event:started(true,actor=true)", "hook:start"]);
}

#[test]
fn start_without_context_fails_and_keeps_state() {
    let mut timers = ActionTimers::new();
    let resolver = FixedContext::unavailable();
    let (mut action, journal) = recorded_action("wave", ActionSettings::default());

    let mut host = ActionHost::new(&mut timers, &resolver);
    action.start(None, None, &mut host);

    assert!(!action.is_active());
    assert_eq!(take(&journal), vec!["event:failed(false,actor=false)"]);
}

#[test]
fn preview_and_editor_worlds_respect_flags() {
    let mut timers = ActionTimers::new();

    for kind in [WorldKind::EditorPreview, WorldKind::GamePreview] {
        let resolver = FixedContext::of(kind);
        let (mut blocked, journal) = recorded_action("blocked", ActionSettings::default());
        let mut host = ActionHost::new(&mut timers, &resolver);
        blocked.start(None, None, &mut host);
        assert!(!blocked.is_active(), "{kind} should reject");
        assert_eq!(take(&journal), vec!["event:failed(false,actor=false)"]);

        let mut allowed = Action::noop("allowed", ActionSettings::new().with_editor_preview(true));
        allowed.start(None, None, &mut host);
        assert!(allowed.is_active(), "{kind} should accept");
    }

    let resolver = FixedContext::of(WorldKind::Editor);
    let mut host = ActionHost::new(&mut timers, &resolver);
    let mut blocked = Action::noop("blocked", ActionSettings::default());
    blocked.start(None, None, &mut host);
    assert!(!blocked.is_active());
    let mut allowed = Action::noop("allowed", ActionSettings::new().with_level_editor(true));
    allowed.start(None, None, &mut host);
    assert!(allowed.is_active());

    // Neither flag matters in a play-in-editor world.
    let resolver = FixedContext::of(WorldKind::PlayInEditor);
    let mut host = ActionHost::new(&mut timers, &resolver);
    let mut action = Action::noop("pie", ActionSettings::default());
    action.start(None, None, &mut host);
    assert!(action.is_active());
}

#[test]
fn double_start_disallowed_changes_nothing() {
    let mut timers = ActionTimers::new();
    let resolver = FixedContext::of(WorldKind::Game);
    let (first, second) = actors();
    let (mut action, journal) =
        recorded_action("once", ActionSettings::new().with_double_start(false));

    let mut host = ActionHost::new(&mut timers, &resolver);
    action.start(Some(first), None, &mut host);
    take(&journal);

    action.start(Some(second), None, &mut host);
    assert!(action.is_active());
    assert_eq!(action.acting_actor(), Some(first));
    assert!(take(&journal).is_empty());
}

#[test]
fn double_start_allowed_restarts_through_cancel() {
    let mut timers = ActionTimers::new();
    let resolver = FixedContext::of(WorldKind::Game);
    let (first, second) = actors();
    let (mut action, journal) = recorded_action("again", ActionSettings::default());

    let mut host = ActionHost::new(&mut timers, &resolver);
    action.start(Some(first), None, &mut host);
    take(&journal);

    action.start(Some(second), None, &mut host);
    assert_eq!(
        take(&journal),
        vec![
            "event:cancelled(false,actor=true)",
            "hook:stop(false)",
            "event:failed(false,actor=true)",
            "event:ended(false,actor=true)",
            "hook:reset(actor=true)",
            "event:started(true,actor=true)",
            "hook:start",
        ]
    );
    assert!(action.is_active());
    assert_eq!(action.acting_actor(), Some(second));
}

#[test]
fn double_start_skips_stop_hook_when_disabled() {
    let mut timers = ActionTimers::new();
    let resolver = FixedContext::of(WorldKind::Game);
    let (mut action, journal) = recorded_action(
        "again",
        ActionSettings::new().with_stop_when_active_started(false),
    );

    let mut host = ActionHost::new(&mut timers, &resolver);
    action.start(None, None, &mut host);
    take(&journal);
    action.start(None, None, &mut host);

    let entries = take(&journal);
    assert!(!entries.iter().any(|e| e.starts_with("hook:stop")));
    assert_eq!(entries.first().map(String::as_str), Some("event:cancelled(false,actor=false)"));
    assert_eq!(entries.last().map(String::as_str), Some("hook:start"));
}

#[test]
fn end_twice_only_acts_once() {
    let mut timers = ActionTimers::new();
    let resolver = FixedContext::of(WorldKind::Game);
    let (mut action, journal) = recorded_action("twice", ActionSettings::default());

    let mut host = ActionHost::new(&mut timers, &resolver);
    action.start(None, None, &mut host);
    take(&journal);

    action.end(true, &mut host);
    let first = take(&journal);
    assert_eq!(
        first,
        vec![
            "hook:stop(true)",
            "event:completed(true,actor=false)",
            "event:ended(true,actor=false)",
            "hook:reset(actor=false)",
        ]
    );

    action.end(true, &mut host);
    assert!(take(&journal).is_empty());
    assert!(!action.is_active());
}

#[test]
fn delayed_start_with_duration_override_runs_to_completion() {
    let mut timers = ActionTimers::new();
    let resolver = FixedContext::of(WorldKind::Game);
    let (mut action, journal) = recorded_action(
        "charge",
        ActionSettings::new()
            .with_start_delay(2.0)
            .with_duration_override(5.0),
    );

    {
        let mut host = ActionHost::new(&mut timers, &resolver);
        action.start(None, None, &mut host);
    }
    assert_eq!(take(&journal), vec!["event:started(true,actor=false)"]);
    assert!(action.is_start_pending());

    advance(&mut action, &mut timers, &resolver, 1.0);
    assert!(take(&journal).is_empty());

    advance(&mut action, &mut timers, &resolver, 1.0);
    assert_eq!(take(&journal), vec!["hook:start"]);
    assert!(!action.is_start_pending());

    for _ in 0..4 {
        advance(&mut action, &mut timers, &resolver, 1.0);
    }
    assert!(take(&journal).is_empty());
    assert!(action.is_active());

    advance(&mut action, &mut timers, &resolver, 1.0);
    assert_eq!(
        take(&journal),
        vec![
            "hook:stop(true)",
            "event:completed(true,actor=false)",
            "event:ended(true,actor=false)",
            "hook:reset(actor=false)",
        ]
    );
    assert!(!action.is_active());
    assert!(timers.is_empty());
}

#[test]
fn finish_is_ignored_while_duration_override_runs() {
    let mut timers = ActionTimers::new();
    let resolver = FixedContext::of(WorldKind::Game);
    let (mut action, journal) =
        recorded_action("hold", ActionSettings::new().with_duration_override(5.0));

    {
        let mut host = ActionHost::new(&mut timers, &resolver);
        action.start(None, None, &mut host);
    }
    take(&journal);

    advance(&mut action, &mut timers, &resolver, 1.0);
    {
        let mut host = ActionHost::new(&mut timers, &resolver);
        action.finish(false, &mut host);
        action.finish(true, &mut host);
    }
    assert!(action.is_active());
    assert!(take(&journal).is_empty());

    for _ in 0..4 {
        advance(&mut action, &mut timers, &resolver, 1.0);
    }
    assert_eq!(
        take(&journal),
        vec![
            "hook:stop(true)",
            "event:completed(true,actor=false)",
            "event:ended(true,actor=false)",
            "hook:reset(actor=false)",
        ]
    );
}

#[test]
fn set_tick_enabled_needs_can_tick() {
    let mut timers = ActionTimers::new();
    let resolver = FixedContext::of(WorldKind::Game);
    let mut host = ActionHost::new(&mut timers, &resolver);

    let mut action = Action::noop("still", ActionSettings::default());
    action.start(None, None, &mut host);
    action.set_tick_enabled(true);
    assert!(!action.tick_enabled());
    assert!(!action.is_tickable());
}

#[test]
fn cancel_turns_tick_off_and_clears_actors_last() {
    let mut timers = ActionTimers::new();
    let resolver = FixedContext::of(WorldKind::Game);
    let (actor, instigator) = actors();
    let (mut action, journal) =
        recorded_action("spin", ActionSettings::new().with_tick(true, true));

    let mut host = ActionHost::new(&mut timers, &resolver);
    action.start(Some(actor), Some(instigator), &mut host);
    assert!(action.tick_enabled());
    action.tick(0.25, &mut host);
    take(&journal);

    action.cancel(&mut host);
    assert!(!action.tick_enabled());
    assert_eq!(
        take(&journal),
        vec![
            "event:cancelled(false,actor=true)",
            "hook:stop(false)",
            "event:failed(false,actor=true)",
            "event:ended(false,actor=true)",
            "hook:reset(actor=true)",
        ]
    );
    assert_eq!(action.acting_actor(), None);
    assert_eq!(action.instigator(), None);

    action.tick(0.25, &mut host);
    assert!(take(&journal).is_empty());
}

#[test]
fn cancel_stops_pending_timers() {
    let mut timers = ActionTimers::new();
    let resolver = FixedContext::of(WorldKind::Game);
    let (mut action, journal) = recorded_action(
        "windup",
        ActionSettings::new()
            .with_start_delay(1.0)
            .with_duration_override(1.0),
    );

    {
        let mut host = ActionHost::new(&mut timers, &resolver);
        action.start(None, None, &mut host);
        assert_eq!(host.timers.remaining(action.start_delay_timer().unwrap()), 1.0);
        action.cancel(&mut host);
    }
    assert!(timers.is_empty());
    take(&journal);

    advance(&mut action, &mut timers, &resolver, 5.0);
    assert!(take(&journal).is_empty());
}

#[test]
fn subscriber_commands_apply_after_the_broadcast() {
    let mut timers = ActionTimers::new();
    let resolver = FixedContext::of(WorldKind::Game);
    let (mut action, journal) = recorded_action("blink", ActionSettings::default());
    action.subscribe(ActionEventKind::Started, |_event, commands| {
        commands.finish(true);
    });

    let mut host = ActionHost::new(&mut timers, &resolver);
    action.start(None, None, &mut host);

    assert!(!action.is_active());
    assert_eq!(
        take(&journal),
        vec![
            "event:started(true,actor=false)",
            "hook:start",
            "hook:stop(true)",
            "event:completed(true,actor=false)",
            "event:ended(true,actor=false)",
            "hook:reset(actor=false)",
        ]
    );
}

#[test]
fn restart_from_ended_subscriber_is_bounded() {
    let mut timers = ActionTimers::new();
    let resolver = FixedContext::of(WorldKind::Game);
    let mut action = Action::noop("loop", ActionSettings::default());
    let starts = Arc::new(Mutex::new(0usize));
    {
        let starts = starts.clone();
        action.subscribe(ActionEventKind::Started, move |_event, commands| {
            *starts.lock().unwrap() += 1;
            commands.end(true);
        });
    }
    action.subscribe(ActionEventKind::Ended, |_event, commands| {
        commands.start(None, None);
    });

    let mut host = ActionHost::new(&mut timers, &resolver);
    action.start(None, None, &mut host);

    let starts = *starts.lock().unwrap();
    assert!(starts > 1);
    assert!(starts < 1000);
}

#[test]
fn start_bound_does_not_duplicate_bindings() {
    let mut timers = ActionTimers::new();
    let resolver = FixedContext::of(WorldKind::Game);
    let mut action = Action::noop("bound", ActionSettings::default());
    let completions = Arc::new(Mutex::new(0usize));

    let mut host = ActionHost::new(&mut timers, &resolver);
    for _ in 0..3 {
        let completions = completions.clone();
        let bindings = ActionBindings::new("caller").on(
            ActionEventKind::Completed,
            move |_event, _commands| *completions.lock().unwrap() += 1,
        );
        action.start_bound(None, None, bindings, &mut host);
        action.finish(true, &mut host);
    }

    assert_eq!(action.delegates().len(ActionEventKind::Completed), 1);
    assert_eq!(*completions.lock().unwrap(), 3);

    assert_eq!(action.unsubscribe("caller"), 1);
    assert!(!action.delegates().is_bound(ActionEventKind::Completed));
}
