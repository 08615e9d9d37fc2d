//! The explicit simulation context.
//!
//! Everything that used to be ambient global state (turn counter, morale
//! RNG, plan-id sequence, configuration) lives in [`SimContext`], owned
//! by the scheduler and constructed and torn down with it.

use crate::clock::GameClock;
use crate::config::GameConfig;
use crate::morale::{MoraleCheck, MoraleModel};
use crate::plan::PlanIds;
use crate::world::World;

/// State owned by the scheduler that is not unit state.
pub struct SimContext {
    /// Game configuration.
    pub config: GameConfig,
    /// The world clock.
    pub clock: GameClock,
    /// The morale gate implementation.
    pub morale: Box<dyn MoraleCheck>,
    /// Shared plan identity allocator.
    pub plan_ids: PlanIds,
}

impl SimContext {
    /// Build a context from configuration, seeding the morale model from
    /// `config.morale_seed`.
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        let clock = GameClock::new(config.turn_ms);
        let morale = Box::new(MoraleModel::new(config.morale_seed));
        Self {
            config,
            clock,
            morale,
            plan_ids: PlanIds::new(),
        }
    }

    /// Replace the morale implementation (tests script outcomes this way).
    #[must_use]
    pub fn with_morale(mut self, morale: Box<dyn MoraleCheck>) -> Self {
        self.morale = morale;
        self
    }
}

impl std::fmt::Debug for SimContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimContext")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

/// Borrowed view handed to executors and AI modules for one step.
///
/// Grants mutable access to unit state and the morale gate, read access
/// to the clock and configuration. Everything an executor does beyond
/// mutating this view is returned as actions.
pub struct TickCtx<'a> {
    /// The unit store.
    pub world: &'a mut World,
    /// The world clock (read-only inside a turn).
    pub clock: &'a GameClock,
    /// Game configuration.
    pub config: &'a GameConfig,
    /// The morale gate.
    pub morale: &'a mut dyn MoraleCheck,
    /// Plan identity allocator, for synthesized plans.
    pub plan_ids: &'a PlanIds,
}
