//! Recovery executors: rallying routed units and resting idle ones.

use crate::action::Action;
use crate::context::TickCtx;
use crate::morale::CheckLevel;
use crate::plan::PlanId;
use crate::units::{UnitId, UnitMode};

use super::Progress;

/// Attempts a routed unit can make before its rally order gives up.
const MAX_RALLY_ATTEMPTS: u32 = 3;

/// Tries to recover a routed unit in place.
///
/// Rolls one rally check per tick. Success restores `Normal` mode and
/// finishes; after a bounded number of failed attempts the order gives up
/// and leaves the unit routed for the rally AI module to retry.
#[derive(Debug)]
pub struct RallyExecutor {
    unit: UnitId,
    plan: PlanId,
    attempts: u32,
}

impl RallyExecutor {
    /// Create a rally executor.
    #[must_use]
    pub const fn new(unit: UnitId, plan: PlanId) -> Self {
        Self {
            unit,
            plan,
            attempts: 0,
        }
    }

    /// Identity of the driven unit.
    #[must_use]
    pub const fn unit_id(&self) -> UnitId {
        self.unit
    }

    /// Identity of the wrapped plan.
    #[must_use]
    pub const fn plan_id(&self) -> PlanId {
        self.plan
    }

    /// Roll one rally attempt.
    pub fn step(&mut self, ctx: &mut TickCtx<'_>) -> (Progress, Vec<Action>) {
        let Some(unit) = ctx.world.get_mut(self.unit) else {
            return (Progress::Finished, Vec::new());
        };
        if !unit.alive || unit.mode != UnitMode::Routed {
            // Nothing to recover from.
            return (Progress::Finished, Vec::new());
        }

        let morale = unit.morale;
        if ctx.morale.check(&morale, CheckLevel::Rally) {
            unit.mode = UnitMode::Normal;
            unit.morale.shed(unit.morale.suppression / 2.0);
            return (
                Progress::Finished,
                vec![Action::mode_set(self.unit, UnitMode::Normal)],
            );
        }

        self.attempts += 1;
        if self.attempts >= MAX_RALLY_ATTEMPTS {
            (Progress::Finished, Vec::new())
        } else {
            (Progress::Continuing, Vec::new())
        }
    }
}

/// Holds a unit in place for a planned number of turns, shedding
/// suppression at the resting rate each tick.
#[derive(Debug)]
pub struct RestExecutor {
    unit: UnitId,
    plan: PlanId,
    remaining: u32,
}

impl RestExecutor {
    /// Create a rest executor holding for `turns` turns.
    #[must_use]
    pub const fn new(unit: UnitId, plan: PlanId, turns: u32) -> Self {
        Self {
            unit,
            plan,
            remaining: turns,
        }
    }

    /// Identity of the driven unit.
    #[must_use]
    pub const fn unit_id(&self) -> UnitId {
        self.unit
    }

    /// Identity of the wrapped plan.
    #[must_use]
    pub const fn plan_id(&self) -> PlanId {
        self.plan
    }

    /// Hold for one tick.
    pub fn step(&mut self, ctx: &mut TickCtx<'_>) -> (Progress, Vec<Action>) {
        let recovery = ctx.config.rest_recovery;
        let Some(unit) = ctx.world.get_mut(self.unit) else {
            return (Progress::Finished, Vec::new());
        };
        if !unit.alive {
            return (Progress::Finished, Vec::new());
        }

        unit.morale.shed(recovery);
        self.remaining = self.remaining.saturating_sub(1);

        if self.remaining == 0 {
            (Progress::Finished, Vec::new())
        } else {
            (Progress::Continuing, Vec::new())
        }
    }
}
