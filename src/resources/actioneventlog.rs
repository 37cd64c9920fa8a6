//! Shared trace of action lifecycle events.
//!
//! [`ActionEventLog`] hands out subscriber callbacks that append an
//! [`ActionEventRecord`] for every broadcast they see. The host stamps the
//! records with the simulation time when it drains them, so a record's `time`
//! is the elapsed time of the frame in which the event fired.

use std::sync::{Arc, Mutex};

use bevy_ecs::prelude::{Entity, Resource};
use serde::Serialize;

use crate::components::action::Action;
use crate::events::action::{ActionCommands, ActionEvent, ActionEventKind};

/// A broadcast as seen by the log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionEventRecord {
    /// Simulation time in seconds, set when drained.
    pub time: f32,
    pub action: String,
    pub event: ActionEventKind,
    pub success: bool,
    /// `Entity::to_bits` of the acting actor.
    pub acting_actor: Option<u64>,
    /// `Entity::to_bits` of the instigator.
    pub instigator: Option<u64>,
}

/// Cloneable handle to a shared record buffer.
#[derive(Resource, Debug, Clone, Default)]
pub struct ActionEventLog {
    records: Arc<Mutex<Vec<ActionEventRecord>>>,
}

impl ActionEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscriber callback appending to this log.
    pub fn recorder(
        &self,
    ) -> impl FnMut(&ActionEvent<'_>, &mut ActionCommands) + Send + Sync + use<> {
        let records = self.records.clone();
        move |event: &ActionEvent<'_>, _commands: &mut ActionCommands| {
            if let Ok(mut records) = records.lock() {
                records.push(ActionEventRecord {
                    time: 0.0,
                    action: event.action.to_string(),
                    event: event.kind,
                    success: event.success,
                    acting_actor: event.acting_actor.map(Entity::to_bits),
                    instigator: event.instigator.map(Entity::to_bits),
                });
            }
        }
    }

    /// Subscribe this log to every event kind of `action`.
    pub fn attach(&self, action: &mut Action) {
        for kind in ActionEventKind::ALL {
            action.subscribe_unique(kind, "action_event_log", self.recorder());
        }
    }

    /// Take every record gathered since the last drain, stamped with `time`.
    pub fn drain(&self, time: f32) -> Vec<ActionEventRecord> {
        match self.records.lock() {
            Ok(mut records) => records
                .drain(..)
                .map(|mut record| {
                    record.time = time;
                    record
                })
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
