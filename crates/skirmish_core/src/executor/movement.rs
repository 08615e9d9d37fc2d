//! Movement executors: ordinary marches and the shared withdraw machine.

use crate::action::Action;
use crate::context::TickCtx;
use crate::geometry::{angle_delta, bearing_to, rotate_toward, step_toward, Vec2};
use crate::plan::PlanId;
use crate::units::{UnitId, UnitMode};

use super::{Progress, ALIGN_EPS};

/// Marches a unit to a fixed destination.
///
/// Rotates toward the destination bearing at the unit's turn rate, then
/// advances at walk speed until within the arrival threshold.
#[derive(Debug)]
pub struct MoveExecutor {
    unit: UnitId,
    plan: PlanId,
    dest: Vec2,
}

impl MoveExecutor {
    /// Create an executor marching `unit` to `dest`.
    #[must_use]
    pub const fn new(unit: UnitId, plan: PlanId, dest: Vec2) -> Self {
        Self { unit, plan, dest }
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

    /// Advance the march by one tick.
    pub fn step(&mut self, ctx: &mut TickCtx<'_>) -> (Progress, Vec<Action>) {
        if !ctx.world.is_live(self.unit) {
            return (Progress::Finished, Vec::new());
        }
        let threshold = ctx.config.arrival_threshold;
        let Some(unit) = ctx.world.get_mut(self.unit) else {
            return (Progress::Finished, Vec::new());
        };

        if unit.pos.distance(self.dest) <= threshold {
            return (Progress::Finished, Vec::new());
        }

        let bearing = bearing_to(unit.pos, self.dest);
        if angle_delta(unit.facing, bearing).abs() > ALIGN_EPS {
            unit.facing = rotate_toward(unit.facing, bearing, unit.turn_rate);
            return (
                Progress::Continuing,
                vec![Action::rotated(unit.id, unit.facing)],
            );
        }

        unit.pos = step_toward(unit.pos, self.dest, unit.walk_speed);
        let arrived = unit.pos.distance(self.dest) <= threshold;
        let actions = vec![Action::moved(unit.id, unit.pos)];
        if arrived {
            (Progress::Finished, actions)
        } else {
            (Progress::Continuing, actions)
        }
    }
}

/// Severity of a withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawKind {
    /// Orderly fallback after a failed advance gate. The unit recovers
    /// `Normal` mode and walks.
    Retreat,
    /// Broken flight after a failed final-assault gate or a lost melee.
    /// The unit is `Routed` and runs at assault speed.
    Rout,
}

/// The shared retreat/rout machine synthesized by a failed morale gate.
///
/// Flips the unit's mode once at start, then heads for the synthesized
/// destination until arrival. Routed units stay routed on arrival; the
/// rally module takes it from there.
#[derive(Debug)]
pub struct WithdrawExecutor {
    unit: UnitId,
    plan: PlanId,
    dest: Vec2,
    kind: WithdrawKind,
    started: bool,
}

impl WithdrawExecutor {
    /// Create a withdraw executor of the given severity.
    #[must_use]
    pub const fn new(unit: UnitId, plan: PlanId, dest: Vec2, kind: WithdrawKind) -> Self {
        Self {
            unit,
            plan,
            dest,
            kind,
            started: false,
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

    /// Advance the withdrawal by one tick.
    pub fn step(&mut self, ctx: &mut TickCtx<'_>) -> (Progress, Vec<Action>) {
        if !ctx.world.is_live(self.unit) {
            return (Progress::Finished, Vec::new());
        }
        let threshold = ctx.config.arrival_threshold;
        let Some(unit) = ctx.world.get_mut(self.unit) else {
            return (Progress::Finished, Vec::new());
        };

        let mut actions = Vec::new();

        if !self.started {
            self.started = true;
            let mode = match self.kind {
                WithdrawKind::Retreat => UnitMode::Normal,
                WithdrawKind::Rout => UnitMode::Routed,
            };
            if unit.mode != mode {
                unit.mode = mode;
                actions.push(Action::mode_set(unit.id, mode));
            }
        }

        let speed = match self.kind {
            WithdrawKind::Retreat => unit.walk_speed,
            WithdrawKind::Rout => unit.assault_speed,
        };
        unit.pos = step_toward(unit.pos, self.dest, speed);
        actions.push(Action::moved(unit.id, unit.pos));

        if unit.pos.distance(self.dest) <= threshold {
            (Progress::Finished, actions)
        } else {
            (Progress::Continuing, actions)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::context::SimContext;
    use crate::units::{Side, Unit};
    use crate::world::World;

    fn ctx_parts() -> (World, SimContext) {
        (World::new(), SimContext::new(GameConfig::default()))
    }

    fn tick<'a>(world: &'a mut World, sim: &'a mut SimContext) -> TickCtx<'a> {
        TickCtx {
            world,
            clock: &sim.clock,
            config: &sim.config,
            morale: sim.morale.as_mut(),
            plan_ids: &sim.plan_ids,
        }
    }

    #[test]
    fn test_move_rotates_before_advancing() {
        let (mut world, mut sim) = ctx_parts();
        world.insert(
            Unit::new(1, Side::Red, Vec2::ZERO)
                .with_facing(180.0)
                .with_turn_rate(90.0),
        );

        let mut exec = MoveExecutor::new(1, 1, Vec2::new(100.0, 0.0));

        // Two 90-degree rotation ticks before the first move.
        let mut ctx = tick(&mut world, &mut sim);
        let (progress, actions) = exec.step(&mut ctx);
        assert_eq!(progress, Progress::Continuing);
        assert_eq!(actions.len(), 1);
        drop(ctx);
        assert!((world.get(1).unwrap().pos.x - 0.0).abs() < f64::EPSILON);

        let mut ctx = tick(&mut world, &mut sim);
        exec.step(&mut ctx);
        drop(ctx);
        assert!((world.get(1).unwrap().facing - 0.0).abs() < 1e-9);

        let mut ctx = tick(&mut world, &mut sim);
        exec.step(&mut ctx);
        drop(ctx);
        assert!(world.get(1).unwrap().pos.x > 0.0);
    }

    #[test]
    fn test_move_finishes_at_destination() {
        let (mut world, mut sim) = ctx_parts();
        world.insert(Unit::new(1, Side::Red, Vec2::ZERO).with_speeds(10.0, 15.0));

        let mut exec = MoveExecutor::new(1, 1, Vec2::new(25.0, 0.0));
        let mut last = Progress::Continuing;
        for _ in 0..10 {
            let mut ctx = tick(&mut world, &mut sim);
            let (progress, _) = exec.step(&mut ctx);
            last = progress;
            if last == Progress::Finished {
                break;
            }
        }
        assert_eq!(last, Progress::Finished);
        let unit = world.get(1).unwrap();
        assert!(unit.pos.distance(Vec2::new(25.0, 0.0)) <= sim.config.arrival_threshold);
    }

    #[test]
    fn test_move_for_dead_unit_finishes_silently() {
        let (mut world, mut sim) = ctx_parts();
        world.insert(Unit::new(1, Side::Red, Vec2::ZERO));
        world.kill(1);

        let mut exec = MoveExecutor::new(1, 1, Vec2::new(50.0, 0.0));
        let mut ctx = tick(&mut world, &mut sim);
        let (progress, actions) = exec.step(&mut ctx);
        assert_eq!(progress, Progress::Finished);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_rout_flees_at_assault_speed_and_sets_mode() {
        let (mut world, mut sim) = ctx_parts();
        world.insert(Unit::new(1, Side::Red, Vec2::ZERO).with_speeds(5.0, 20.0));

        let mut exec = WithdrawExecutor::new(1, 1, Vec2::new(300.0, 0.0), WithdrawKind::Rout);
        let mut ctx = tick(&mut world, &mut sim);
        let (_, actions) = exec.step(&mut ctx);
        drop(ctx);

        // Mode flip then the first move, in order.
        assert_eq!(actions.len(), 2);
        let unit = world.get(1).unwrap();
        assert_eq!(unit.mode, UnitMode::Routed);
        assert!((unit.pos.x - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_retreat_restores_normal_mode() {
        let (mut world, mut sim) = ctx_parts();
        let mut unit = Unit::new(1, Side::Red, Vec2::ZERO);
        unit.mode = UnitMode::Assault;
        world.insert(unit);

        let mut exec = WithdrawExecutor::new(1, 1, Vec2::new(50.0, 0.0), WithdrawKind::Retreat);
        let mut ctx = tick(&mut world, &mut sim);
        exec.step(&mut ctx);
        drop(ctx);
        assert_eq!(world.get(1).unwrap().mode, UnitMode::Normal);
    }
}
