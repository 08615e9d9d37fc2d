//! Error types for the skirmish scheduler.

use thiserror::Error;

use crate::units::Side;

/// Result type alias defaulting to [`GameError`].
///
/// The error parameter stays overridable so code that imports this
/// through the prelude can still spell out `Result<T, SessionError>`
/// and friends.
pub type Result<T, E = GameError> = std::result::Result<T, E>;

/// Top-level error type for all scheduler errors.
///
/// Only [`GameError::Dispatch`] is fatal to a running game; every other
/// variant is caught at the turn boundary, logged, and skipped.
#[derive(Debug, Error)]
pub enum GameError {
    /// Referenced unit is not present in the world store.
    #[error("Unknown unit: {0}")]
    UnknownUnit(u64),

    /// A plan referenced a unit that exists but cannot accept it.
    #[error("Unit {unit} rejected plan {plan}: {reason}")]
    PlanRejected {
        /// Unit the plan was addressed to.
        unit: u64,
        /// Identity of the rejected plan.
        plan: u64,
        /// Why the plan could not be accepted.
        reason: String,
    },

    /// Invalid simulation state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// An AI module failed for this pass.
    #[error("AI module '{module}' failed: {message}")]
    ModuleFailed {
        /// Name of the failing module.
        module: &'static str,
        /// Error message.
        message: String,
    },

    /// Action delivery failed. Fatal: the game ends, the loop stops.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl GameError {
    /// Whether this error terminates the running game.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, GameError::Dispatch(_))
    }
}

/// Errors raised while delivering an [`Action`](crate::action::Action)
/// to player sessions.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The action could not be encoded for the wire.
    #[error("Failed to encode action: {0}")]
    Encode(#[from] bincode::Error),

    /// No session is registered for the addressed side.
    #[error("No session registered for side {side:?}")]
    NoSession {
        /// Side with no session.
        side: Side,
    },

    /// The session refused or lost the payload.
    #[error("Send to side {side:?} failed: {source}")]
    Send {
        /// Side whose session failed.
        side: Side,
        /// Underlying session error.
        source: SessionError,
    },
}

/// Error reported by a [`Connection`](crate::dispatch::Connection)
/// implementation when a payload cannot be delivered.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SessionError(pub String);

impl SessionError {
    /// Build a session error from any displayable cause.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        Self(err.to_string())
    }
}
