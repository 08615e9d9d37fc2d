//! Plan executors.
//!
//! An executor is the transient state machine advancing one active plan
//! by one tick. The set of variants is closed: the scheduler selects one
//! from the plan kind, steps it through the uniform
//! [`step`](PlanExecutor::step) contract, and destroys it on completion,
//! cancellation, or unit destruction. Every step returns a finite ordered
//! sequence of actions, possibly empty.

mod assault;
mod movement;
mod recovery;

pub use assault::AssaultExecutor;
pub use movement::{MoveExecutor, WithdrawExecutor, WithdrawKind};
pub use recovery::{RallyExecutor, RestExecutor};

use crate::action::{Action, ActionKind};
use crate::context::TickCtx;
use crate::geometry::{normalize_degrees, point_at};
use crate::plan::{Plan, PlanId, PlanKind};
use crate::units::UnitId;
use crate::world::World;

/// Alignment tolerance in degrees for "facing equals bearing" checks.
///
/// Rotation snaps exactly onto its target, but bearings recomputed after
/// a straight-line move can drift by float rounding; anything inside this
/// band counts as aligned.
pub(crate) const ALIGN_EPS: f64 = 1e-6;

/// Outcome of one executor step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// The order is still in progress; step again next turn.
    Continuing,
    /// The order is complete; the scheduler pops the wrapped plan and
    /// discards the executor.
    Finished,
}

/// The closed set of executor variants, keyed by plan kind.
#[derive(Debug)]
pub enum PlanExecutor {
    /// Marches to a destination.
    Move(MoveExecutor),
    /// The approach/suppress/melee assault machine.
    Assault(AssaultExecutor),
    /// Withdraws in good order.
    Retreat(WithdrawExecutor),
    /// Flees broken.
    Rout(WithdrawExecutor),
    /// Attempts to recover from a rout.
    Rally(RallyExecutor),
    /// Holds in place and sheds suppression.
    Rest(RestExecutor),
}

impl PlanExecutor {
    /// Build the executor for a plan.
    ///
    /// The world is consulted only for construction-time state (the
    /// assault bearing); an unresolvable assault target yields a
    /// degenerate executor that finishes as a no-op on its first step.
    #[must_use]
    pub fn for_plan(plan: &Plan, world: &World) -> Self {
        match &plan.kind {
            PlanKind::Move { dest } => Self::Move(MoveExecutor::new(plan.unit, plan.id, *dest)),
            PlanKind::Assault { target } => {
                Self::Assault(AssaultExecutor::new(plan.unit, plan.id, *target, world))
            }
            PlanKind::Retreat { dest } => Self::Retreat(WithdrawExecutor::new(
                plan.unit,
                plan.id,
                *dest,
                WithdrawKind::Retreat,
            )),
            PlanKind::Rout { dest } => Self::Rout(WithdrawExecutor::new(
                plan.unit,
                plan.id,
                *dest,
                WithdrawKind::Rout,
            )),
            PlanKind::Rally => Self::Rally(RallyExecutor::new(plan.unit, plan.id)),
            PlanKind::Rest { turns } => Self::Rest(RestExecutor::new(plan.unit, plan.id, *turns)),
        }
    }

    /// Identity of the unit this executor drives.
    #[must_use]
    pub fn unit_id(&self) -> UnitId {
        match self {
            Self::Move(e) => e.unit_id(),
            Self::Assault(e) => e.unit_id(),
            Self::Retreat(e) | Self::Rout(e) => e.unit_id(),
            Self::Rally(e) => e.unit_id(),
            Self::Rest(e) => e.unit_id(),
        }
    }

    /// Identity of the wrapped plan.
    #[must_use]
    pub fn plan_id(&self) -> PlanId {
        match self {
            Self::Move(e) => e.plan_id(),
            Self::Assault(e) => e.plan_id(),
            Self::Retreat(e) | Self::Rout(e) => e.plan_id(),
            Self::Rally(e) => e.plan_id(),
            Self::Rest(e) => e.plan_id(),
        }
    }

    /// Short variant name for logging.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Move(_) => "move",
            Self::Assault(_) => "assault",
            Self::Retreat(_) => "retreat",
            Self::Rout(_) => "rout",
            Self::Rally(_) => "rally",
            Self::Rest(_) => "rest",
        }
    }

    /// Advance the order by one tick.
    pub fn step(&mut self, ctx: &mut TickCtx<'_>) -> (Progress, Vec<Action>) {
        match self {
            Self::Move(e) => e.step(ctx),
            Self::Assault(e) => e.step(ctx),
            Self::Retreat(e) | Self::Rout(e) => e.step(ctx),
            Self::Rally(e) => e.step(ctx),
            Self::Rest(e) => e.step(ctx),
        }
    }
}

/// Break a unit off: clear its plan queue and install a single withdraw
/// plan whose destination lies the configured distance opposite the
/// unit's current facing.
///
/// Shared by the assault morale gates and the melee-resolution AI module.
/// Returns the `ClearPlans`/`PlanAdded` pair for the owning side, or
/// nothing if the unit is gone.
pub(crate) fn break_off(ctx: &mut TickCtx<'_>, unit_id: UnitId, kind: WithdrawKind) -> Vec<Action> {
    let distance = match kind {
        WithdrawKind::Retreat => ctx.config.retreat_distance,
        WithdrawKind::Rout => ctx.config.rout_distance,
    };
    let Some(unit) = ctx.world.get_mut(unit_id) else {
        return Vec::new();
    };

    let dest = point_at(unit.pos, normalize_degrees(unit.facing + 180.0), distance);
    let plan_kind = match kind {
        WithdrawKind::Retreat => PlanKind::Retreat { dest },
        WithdrawKind::Rout => PlanKind::Rout { dest },
    };
    let plan = Plan::new(ctx.plan_ids.next_id(), unit_id, plan_kind);
    let plan_id = plan.id;

    unit.clear_plans();
    unit.push_plan(plan);

    vec![
        Action::for_side(unit.side, ActionKind::ClearPlans { unit: unit_id }),
        Action::for_side(
            unit.side,
            ActionKind::PlanAdded {
                unit: unit_id,
                plan: plan_id,
            },
        ),
    ]
}
