//! The world clock.

use serde::{Deserialize, Serialize};

/// Turn counter and elapsed simulation time.
///
/// Advanced exactly once per turn by the scheduler; turns are strictly
/// sequential and totally ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameClock {
    /// Completed turns.
    pub turn: u64,
    /// Elapsed simulation time in milliseconds.
    pub elapsed_ms: u64,
    /// Length of one turn in milliseconds.
    pub turn_ms: u64,
}

impl GameClock {
    /// Create a clock at turn zero.
    #[must_use]
    pub const fn new(turn_ms: u64) -> Self {
        Self {
            turn: 0,
            elapsed_ms: 0,
            turn_ms,
        }
    }

    /// Advance by one turn length.
    pub fn advance(&mut self) {
        self.turn += 1;
        self.elapsed_ms += self.turn_ms;
    }
}
