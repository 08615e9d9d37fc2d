//! Action delivery to player sessions.
//!
//! Transport is an external collaborator: anything implementing
//! [`Connection`] can back a side's session. The dispatcher serializes
//! each [`Action`] with `bincode` and writes it to every addressed side.
//! A delivery failure is the one fatal error class of the scheduler.

use std::collections::HashMap;

use crate::action::{Action, Recipient};
use crate::error::{DispatchError, SessionError};
use crate::units::Side;

/// A write-only, fire-and-forget session handle for one side.
pub trait Connection: Send {
    /// Deliver one serialized payload. May fail; there is no retry.
    fn send(&mut self, payload: &[u8]) -> Result<(), SessionError>;
}

/// Registry of per-side session handles.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<Side, Box<dyn Connection>>,
}

impl SessionRegistry {
    /// Create a registry with both sides connected.
    #[must_use]
    pub fn new(red: Box<dyn Connection>, blue: Box<dyn Connection>) -> Self {
        let mut sessions: HashMap<Side, Box<dyn Connection>> = HashMap::new();
        sessions.insert(Side::Red, red);
        sessions.insert(Side::Blue, blue);
        Self { sessions }
    }

    /// Register or replace one side's session.
    pub fn register(&mut self, side: Side, connection: Box<dyn Connection>) {
        self.sessions.insert(side, connection);
    }

    /// Look up one side's session.
    pub fn connection(&mut self, side: Side) -> Option<&mut dyn Connection> {
        // Unboxing in return position so the trait-object coercion works.
        match self.sessions.get_mut(&side) {
            Some(connection) => Some(connection.as_mut()),
            None => None,
        }
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sides", &self.sessions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Delivers actions to the sessions their recipient selector names.
#[derive(Debug)]
pub struct ActionDispatcher {
    sessions: SessionRegistry,
}

impl ActionDispatcher {
    /// Create a dispatcher over a session registry.
    #[must_use]
    pub fn new(sessions: SessionRegistry) -> Self {
        Self { sessions }
    }

    /// Serialize and deliver one action to every addressed side.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] if encoding fails, a side has no
    /// session, or a send fails. All of these are fatal to the game.
    pub fn dispatch(&mut self, action: &Action) -> Result<(), DispatchError> {
        let payload = bincode::serialize(action)?;
        match action.recipient {
            Recipient::Side(side) => self.send_to(side, &payload),
            Recipient::Both => {
                for side in Side::BOTH {
                    self.send_to(side, &payload)?;
                }
                Ok(())
            }
        }
    }

    /// Dispatch a batch in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Propagates the first [`DispatchError`]; already-delivered actions
    /// are not rolled back.
    pub fn dispatch_all(&mut self, actions: &[Action]) -> Result<usize, DispatchError> {
        for action in actions {
            self.dispatch(action)?;
        }
        Ok(actions.len())
    }

    fn send_to(&mut self, side: Side, payload: &[u8]) -> Result<(), DispatchError> {
        let connection = self
            .sessions
            .connection(side)
            .ok_or(DispatchError::NoSession { side })?;
        connection
            .send(payload)
            .map_err(|source| DispatchError::Send { side, source })
    }
}
