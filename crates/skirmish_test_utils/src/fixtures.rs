//! Fixtures: canned units, worlds, connections, and morale gates.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use skirmish_core::prelude::*;

/// A unit with default stats at the given position.
#[must_use]
pub fn unit_at(id: UnitId, side: Side, x: f64, y: f64) -> Unit {
    Unit::new(id, side, Vec2::new(x, y))
}

/// A unit that starts acting the turn after its executor is created
/// (zero action delay), which keeps turn counts in tests small.
#[must_use]
pub fn prompt_unit(id: UnitId, side: Side, x: f64, y: f64) -> Unit {
    Unit::new(id, side, Vec2::new(x, y)).with_action_delay(0)
}

/// A world with one red unit at the origin facing +X and one blue unit
/// `gap` units down range facing back at it.
#[must_use]
pub fn facing_pair(gap: f64) -> World {
    let mut world = World::new();
    world.insert(prompt_unit(1, Side::Red, 0.0, 0.0));
    world.insert(prompt_unit(2, Side::Blue, gap, 0.0).with_facing(180.0));
    world
}

/// A connection that decodes every payload back into an [`Action`] and
/// records it. Clones share the same log.
#[derive(Default, Clone)]
pub struct RecordingConnection {
    log: Arc<Mutex<Vec<Action>>>,
}

impl RecordingConnection {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, in delivery order.
    ///
    /// # Panics
    ///
    /// Panics if the log mutex is poisoned.
    #[must_use]
    pub fn seen(&self) -> Vec<Action> {
        self.log.lock().unwrap().clone()
    }

    /// Recorded actions matching a predicate on their kind.
    ///
    /// # Panics
    ///
    /// Panics if the log mutex is poisoned.
    #[must_use]
    pub fn seen_where(&self, mut pred: impl FnMut(&ActionKind) -> bool) -> Vec<Action> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|a| pred(&a.kind))
            .cloned()
            .collect()
    }

    /// Forget everything recorded so far.
    ///
    /// # Panics
    ///
    /// Panics if the log mutex is poisoned.
    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }
}

impl Connection for RecordingConnection {
    fn send(&mut self, payload: &[u8]) -> Result<(), SessionError> {
        let action: Action =
            bincode::deserialize(payload).map_err(|e| SessionError::new(e.to_string()))?;
        self.log.lock().unwrap().push(action);
        Ok(())
    }
}

/// A connection that rejects every payload, for exercising the fatal
/// dispatch path.
pub struct FailingConnection;

impl Connection for FailingConnection {
    fn send(&mut self, _payload: &[u8]) -> Result<(), SessionError> {
        Err(SessionError::new("connection closed"))
    }
}

/// A connection that accepts and discards everything.
pub struct NullConnection;

impl Connection for NullConnection {
    fn send(&mut self, _payload: &[u8]) -> Result<(), SessionError> {
        Ok(())
    }
}

/// A dispatcher recording both sides, plus handles to each side's log.
#[must_use]
pub fn recording_pair() -> (ActionDispatcher, RecordingConnection, RecordingConnection) {
    let red = RecordingConnection::new();
    let blue = RecordingConnection::new();
    let dispatcher = ActionDispatcher::new(SessionRegistry::new(
        Box::new(red.clone()),
        Box::new(blue.clone()),
    ));
    (dispatcher, red, blue)
}

/// A morale gate with scripted outcomes.
///
/// Consumes one queued outcome per check; once the queue runs dry every
/// check returns the fallback. Tests use this to force a specific branch
/// (a failed advance gate, a lost melee) without touching the RNG.
pub struct ScriptedMorale {
    outcomes: VecDeque<bool>,
    fallback: bool,
}

impl ScriptedMorale {
    /// Every check returns `outcome`.
    #[must_use]
    pub fn always(outcome: bool) -> Self {
        Self {
            outcomes: VecDeque::new(),
            fallback: outcome,
        }
    }

    /// Play back `outcomes` in order, then fall back to `fallback`.
    #[must_use]
    pub fn sequence(outcomes: impl IntoIterator<Item = bool>, fallback: bool) -> Self {
        Self {
            outcomes: outcomes.into_iter().collect(),
            fallback,
        }
    }
}

impl MoraleCheck for ScriptedMorale {
    fn check(&mut self, _state: &MoraleState, _level: CheckLevel) -> bool {
        self.outcomes.pop_front().unwrap_or(self.fallback)
    }
}
