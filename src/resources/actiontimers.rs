//! One-shot timer service for actions.
//!
//! The [`ActionTimers`] resource holds every pending action timer. Timers are
//! scheduled with a delay in seconds and a [`TimerTarget`] describing who
//! receives the fire. Each frame the
//! [`update_action_timers`](crate::systems::actiontimers::update_action_timers)
//! system advances the service and pops due timers one at a time.
//!
//! # Guarantees
//!
//! - A handle fires at most once.
//! - Cancelling is immediate: a cancelled handle is removed and never fires,
//!   even when it was already due in the current frame.
//! - Due timers pop most-overdue first; ties pop in schedule order.
//!
//! # Example
//!
//! ```ignore
//! let handle = timers.schedule(2.0, TimerTarget::new(None, ActionTimerKind::StartDelay));
//! timers.advance(2.0);
//! while let Some(fired) = timers.pop_due() {
//!     // route `fired.handle` back to the owning action
//! }
//! ```

use bevy_ecs::prelude::{Entity, Resource};
use rustc_hash::FxHashMap;

/// Opaque identifier of a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Raw sequence number, mostly useful for logs.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// What an action timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionTimerKind {
    /// Runs the delayed start hook.
    StartDelay,
    /// Forces the action to finish successfully.
    Duration,
}

/// Routing information stored alongside a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTarget {
    /// Entity holding the action, if the action lives in the ECS world.
    pub owner: Option<Entity>,
    pub kind: ActionTimerKind,
}

impl TimerTarget {
    pub fn new(owner: Option<Entity>, kind: ActionTimerKind) -> Self {
        Self { owner, kind }
    }
}

/// A timer popped from the service after its delay elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    pub handle: TimerHandle,
    pub target: TimerTarget,
}

/// Scheduling interface used by actions.
///
/// The host provides the implementation; [`ActionTimers`] is the one the
/// engine uses.
pub trait TimerService {
    /// Schedule a one-shot fire `delay` seconds from now.
    ///
    /// A delay of zero or less fires on the next advance.
    fn schedule(&mut self, delay: f32, target: TimerTarget) -> TimerHandle;

    /// Cancel a pending timer. Unknown or already fired handles are ignored.
    fn cancel(&mut self, handle: TimerHandle);

    /// Seconds left before `handle` fires, or `0.0` when it is not pending.
    fn remaining(&self, handle: TimerHandle) -> f32;

    /// Whether `handle` still has time left to run.
    fn is_pending(&self, handle: TimerHandle) -> bool {
        self.remaining(handle) > 0.0
    }
}

/// Slack applied when comparing deadlines, absorbing the rounding of `f32`
/// frame deltas.
const DUE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    /// Absolute fire time on the service clock.
    deadline: f64,
    target: TimerTarget,
}

/// Frame-driven implementation of [`TimerService`].
///
/// The service keeps its own monotonic clock in `f64`. Timers store an
/// absolute deadline, so frame deltas never accumulate rounding error into
/// individual timers.
#[derive(Resource, Debug, Default)]
pub struct ActionTimers {
    pending: FxHashMap<TimerHandle, PendingTimer>,
    next_handle: u64,
    now: f64,
}

impl ActionTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timers that have not fired or been cancelled.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Whether the handle is still held by the service, due or not.
    pub fn contains(&self, handle: TimerHandle) -> bool {
        self.pending.contains_key(&handle)
    }

    /// Seconds the service clock has advanced.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Advance the service clock by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.now += f64::from(dt);
    }

    /// Remove and return the most overdue timer, if any is due.
    pub fn pop_due(&mut self) -> Option<FiredTimer> {
        let now = self.now;
        let handle = self
            .pending
            .iter()
            .filter(|(_, timer)| timer.deadline <= now + DUE_EPSILON)
            .min_by(|(ha, a), (hb, b)| a.deadline.total_cmp(&b.deadline).then(ha.cmp(hb)))
            .map(|(handle, _)| *handle)?;
        let timer = self.pending.remove(&handle)?;
        Some(FiredTimer {
            handle,
            target: timer.target,
        })
    }

    /// Drop every timer routed to `owner`. Returns how many were cancelled.
    pub fn cancel_owned_by(&mut self, owner: Entity) -> usize {
        self.cancel_owned_by_except(owner, |_| false)
    }

    /// Drop the timers routed to `owner` for which `keep` is false.
    pub fn cancel_owned_by_except(
        &mut self,
        owner: Entity,
        keep: impl Fn(TimerHandle) -> bool,
    ) -> usize {
        let before = self.pending.len();
        self.pending
            .retain(|handle, timer| timer.target.owner != Some(owner) || keep(*handle));
        before - self.pending.len()
    }
}

impl TimerService for ActionTimers {
    fn schedule(&mut self, delay: f32, target: TimerTarget) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.insert(
            handle,
            PendingTimer {
                deadline: self.now + f64::from(delay),
                target,
            },
        );
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.pending.remove(&handle);
    }

    fn remaining(&self, handle: TimerHandle) -> f32 {
        match self.pending.get(&handle) {
            Some(timer) if timer.deadline - self.now > DUE_EPSILON => {
                (timer.deadline - self.now) as f32
            }
            _ => 0.0,
        }
    }
}
