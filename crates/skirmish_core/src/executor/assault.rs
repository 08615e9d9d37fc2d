//! The assault executor: approach, suppression, and melee engagement.
//!
//! The representative complex executor. It drives a unit against a target
//! over many turns: acquire the target, rotate onto the bearing taken at
//! construction, close to firing range, advance by its suppression
//! cadence under the advance morale gate, then commit to a final rush
//! under the harsher final-assault gate until close combat locks both
//! units into melee. This is the only path that produces the melee
//! transition.

use crate::action::{Action, ActionKind};
use crate::context::TickCtx;
use crate::geometry::{angle_delta, bearing_to, rotate_toward, step_toward, Vec2};
use crate::morale::CheckLevel;
use crate::plan::PlanId;
use crate::units::{CadenceStep, UnitId, UnitMode};

use super::{break_off, Progress, WithdrawKind, ALIGN_EPS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssaultState {
    Init,
    Approaching,
    Suppressing,
    FinalRush,
}

/// Per-(unit, plan) assault state machine.
///
/// The bearing to the target is computed once at construction and held
/// fixed for the executor's lifetime; the remembered target position is
/// refreshed only while the target is visible.
#[derive(Debug)]
pub struct AssaultExecutor {
    unit: UnitId,
    plan: PlanId,
    target: UnitId,
    state: AssaultState,
    bearing: f64,
    remembered: Vec2,
    cursor: usize,
    rushed: bool,
    degenerate: bool,
}

impl AssaultExecutor {
    /// Build an assault executor.
    ///
    /// If the target cannot be resolved at construction the executor is
    /// degenerate: its first step reports `Finished` as a no-op, which is
    /// a valid state rather than a combat outcome.
    #[must_use]
    pub fn new(
        unit: UnitId,
        plan: PlanId,
        target: UnitId,
        world: &crate::world::World,
    ) -> Self {
        let (degenerate, bearing, remembered) = match (world.get(unit), world.get(target)) {
            (Some(u), Some(t)) if t.alive => (false, bearing_to(u.pos, t.pos), t.pos),
            _ => (true, 0.0, Vec2::ZERO),
        };
        Self {
            unit,
            plan,
            target,
            state: AssaultState::Init,
            bearing,
            remembered,
            cursor: 0,
            rushed: false,
            degenerate,
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

    /// Advance the assault by one tick.
    #[allow(clippy::too_many_lines)]
    pub fn step(&mut self, ctx: &mut TickCtx<'_>) -> (Progress, Vec<Action>) {
        // Silent abort: degenerate construction, or either unit gone.
        if self.degenerate
            || !ctx.world.is_live(self.unit)
            || !ctx.world.is_live(self.target)
        {
            return (Progress::Finished, Vec::new());
        }

        let mut actions = Vec::new();

        // One-time effect: flip the unit into assault mode.
        if self.state == AssaultState::Init {
            if let Some(unit) = ctx.world.get_mut(self.unit) {
                unit.mode = UnitMode::Assault;
                actions.push(Action::mode_set(self.unit, UnitMode::Assault));
            }
            self.state = AssaultState::Approaching;
        }

        // Acquire the assault target, then wait a tick.
        {
            let Some(unit) = ctx.world.get_mut(self.unit) else {
                return (Progress::Finished, actions);
            };
            if unit.target != Some(self.target) {
                unit.target = Some(self.target);
                actions.push(Action::for_side(
                    unit.side,
                    ActionKind::SetTarget {
                        unit: self.unit,
                        target: Some(self.target),
                    },
                ));
                return (Progress::Continuing, actions);
            }
        }

        // Rotate onto the fixed construction-time bearing.
        {
            let Some(unit) = ctx.world.get_mut(self.unit) else {
                return (Progress::Finished, actions);
            };
            if angle_delta(unit.facing, self.bearing).abs() > ALIGN_EPS {
                unit.facing = rotate_toward(unit.facing, self.bearing, unit.turn_rate);
                actions.push(Action::rotated(self.unit, unit.facing));
                return (Progress::Continuing, actions);
            }
        }

        // Refresh the remembered target position while it is visible.
        // This never resets approach progress.
        let (pos, sight_range, firing_range, walk_speed, assault_speed, morale) = {
            let Some(unit) = ctx.world.get(self.unit) else {
                return (Progress::Finished, actions);
            };
            (
                unit.pos,
                unit.sight_range,
                unit.firing_range,
                unit.walk_speed,
                unit.assault_speed,
                unit.morale,
            )
        };
        if let Some(target) = ctx.world.get(self.target) {
            if pos.distance(target.pos) <= sight_range && target.pos != self.remembered {
                self.remembered = target.pos;
            }
        }

        let dist = pos.distance(self.remembered);

        // Out of firing range: close the distance.
        if dist > firing_range {
            let speed = if self.rushed { assault_speed } else { walk_speed };
            if let Some(unit) = ctx.world.get_mut(self.unit) {
                unit.pos = step_toward(unit.pos, self.remembered, speed);
                actions.push(Action::moved(self.unit, unit.pos));
            }
            return (Progress::Continuing, actions);
        }

        // In firing range but short of the melee-engage threshold: run the
        // suppression cadence, each entry gated by an advance check.
        if dist > ctx.config.melee_engage_range {
            self.state = AssaultState::Suppressing;

            if !ctx.morale.check(&morale, CheckLevel::Advance) {
                actions.extend(break_off(ctx, self.unit, WithdrawKind::Retreat));
                return (Progress::Finished, actions);
            }

            let entry = ctx.world.get(self.unit).map_or(CadenceStep::Move, |unit| {
                if unit.cadence.is_empty() {
                    CadenceStep::Move
                } else {
                    unit.cadence[self.cursor % unit.cadence.len()]
                }
            });
            self.cursor += 1;

            match entry {
                CadenceStep::Move => {
                    let speed = if self.rushed { assault_speed } else { walk_speed };
                    if let Some(unit) = ctx.world.get_mut(self.unit) {
                        unit.pos = step_toward(unit.pos, self.remembered, speed);
                        actions.push(Action::moved(self.unit, unit.pos));
                    }
                }
                CadenceStep::Fire => {
                    // Fire entries pace the advance and suppress the
                    // target; ballistic effects are out of scope.
                    let amount = ctx.config.fire_suppression;
                    if let Some(target) = ctx.world.get_mut(self.target) {
                        target.morale.suppress(amount);
                    }
                }
                CadenceStep::Pause | CadenceStep::Reload => {}
            }
            return (Progress::Continuing, actions);
        }

        // Inside the melee-engage threshold: final rush. The switch to
        // assault movement speed happens exactly once.
        self.state = AssaultState::FinalRush;
        self.rushed = true;

        if !ctx.morale.check(&morale, CheckLevel::FinalAssault) {
            actions.extend(break_off(ctx, self.unit, WithdrawKind::Rout));
            return (Progress::Finished, actions);
        }

        if dist <= ctx.config.close_combat_range {
            // Melee transition: both plan queues cleared, both modes set.
            for id in [self.unit, self.target] {
                if let Some(unit) = ctx.world.get_mut(id) {
                    unit.clear_plans();
                    actions.push(Action::for_side(
                        unit.side,
                        ActionKind::ClearPlans { unit: id },
                    ));
                }
            }
            for id in [self.unit, self.target] {
                if let Some(unit) = ctx.world.get_mut(id) {
                    unit.mode = UnitMode::Melee;
                    actions.push(Action::mode_set(id, UnitMode::Melee));
                }
            }
            return (Progress::Finished, actions);
        }

        if let Some(unit) = ctx.world.get_mut(self.unit) {
            unit.pos = step_toward(unit.pos, self.remembered, assault_speed);
            actions.push(Action::moved(self.unit, unit.pos));
        }
        (Progress::Continuing, actions)
    }
}
