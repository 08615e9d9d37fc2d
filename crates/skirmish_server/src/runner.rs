//! The game runner: a scenario played to completion.

use std::time::{Duration, Instant};

use tracing::info;

use skirmish_core::prelude::*;

use crate::scenario::{Scenario, ScenarioError};

/// Cap applied when a scenario sets no turn limit, so a stalemate cannot
/// run the process forever.
const FALLBACK_TURN_LIMIT: u64 = 10_000;

/// Result of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// How the game ended.
    pub outcome: GameOutcome,
    /// Turns played.
    pub turns: u64,
    /// Final authoritative state hash.
    pub state_hash: u64,
}

/// Owns a scheduler built from a scenario and drives it to completion.
pub struct GameRunner {
    scheduler: Scheduler,
    realtime: bool,
}

impl GameRunner {
    /// Build a runner from a validated scenario.
    ///
    /// # Errors
    ///
    /// Returns a [`ScenarioError`] if the scenario fails validation.
    pub fn new(scenario: &Scenario, dispatcher: ActionDispatcher) -> Result<Self, ScenarioError> {
        scenario.validate()?;

        let mut config = scenario.config.clone();
        if config.turn_limit.is_none() {
            config.turn_limit = Some(FALLBACK_TURN_LIMIT);
        }

        let world = scenario.build_world();
        let scheduler = Scheduler::new(world, SimContext::new(config), dispatcher);

        let inbox = scheduler.inbox();
        for plan in scenario.opening_plans(&scheduler.plan_ids()) {
            inbox.submit(plan);
        }

        info!(
            scenario = %scenario.name,
            units = scenario.units.len(),
            reinforcements = scenario.reinforcements.len(),
            "runner ready"
        );
        Ok(Self {
            scheduler,
            realtime: false,
        })
    }

    /// Pace turns against the wall clock at `turn_ms` per turn instead of
    /// running flat out.
    #[must_use]
    pub fn with_realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    /// The underlying scheduler, for wiring extra plan producers.
    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Play the game to its end.
    ///
    /// # Errors
    ///
    /// Propagates the fatal dispatch error if action delivery fails.
    pub fn run_to_completion(mut self) -> skirmish_core::error::Result<RunSummary> {
        let turn_duration = Duration::from_millis(self.scheduler.clock().turn_ms);
        let mut last_report = None;

        while !self.scheduler.is_ended() {
            let started = Instant::now();
            last_report = Some(self.scheduler.run_turn()?);
            if self.realtime {
                if let Some(remaining) = turn_duration.checked_sub(started.elapsed()) {
                    std::thread::sleep(remaining);
                }
            }
        }

        let outcome = self.scheduler.outcome().unwrap_or(GameOutcome::Aborted);
        let (turns, state_hash) = last_report
            .map_or((0, self.scheduler.world().state_hash()), |r| {
                (r.turn + 1, r.state_hash)
            });
        info!(?outcome, turns, "game over");
        Ok(RunSummary {
            outcome,
            turns,
            state_hash,
        })
    }
}
