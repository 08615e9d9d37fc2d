//! Roster maintenance: sweeping destroyed units and spawning arrivals.

use tracing::{info, warn};

use crate::action::{Action, ActionKind};
use crate::clock::GameClock;
use crate::context::TickCtx;
use crate::error::{GameError, Result};
use crate::plan::{Plan, PlanKind};
use crate::world::World;

use super::AiModule;

/// Sweeps destroyed units out of the store.
///
/// Runs after melee and recovery so anything those passes killed or
/// released is observed first. Stale target references to swept units are
/// cleared silently; the clearing module already announced the loss while
/// the corpse was still flagged dead.
pub struct DestroyedCleanup;

impl AiModule for DestroyedCleanup {
    fn name(&self) -> &'static str {
        "destroyed_cleanup"
    }

    fn ready(&self, _clock: &GameClock, world: &World) -> bool {
        world.units().any(|u| !u.alive)
    }

    fn execute(&mut self, ctx: &mut TickCtx<'_>, _out: &mut Vec<Action>) -> Result<()> {
        let dead: Vec<_> = ctx
            .world
            .units()
            .filter(|u| !u.alive)
            .map(|u| u.id)
            .collect();

        for id in &dead {
            ctx.world.remove(*id);
            info!(unit = id, "swept destroyed unit");
        }
        for id in ctx.world.sorted_ids() {
            if let Some(unit) = ctx.world.get_mut(id) {
                if unit.target.is_some_and(|t| dead.contains(&t)) {
                    unit.target = None;
                }
            }
        }
        Ok(())
    }
}

/// Spawns scheduled reinforcements when their turn comes.
///
/// Each arrival is inserted into the world with a single opening move
/// order toward its destination; the owning side learns of the new plan
/// through the action stream.
pub struct ReinforcementArrivals;

impl AiModule for ReinforcementArrivals {
    fn name(&self) -> &'static str {
        "reinforcements"
    }

    fn ready(&self, _clock: &GameClock, world: &World) -> bool {
        world.pending_reinforcements() > 0
    }

    fn execute(&mut self, ctx: &mut TickCtx<'_>, out: &mut Vec<Action>) -> Result<()> {
        let turn = ctx.clock.turn;
        for arrival in ctx.world.due_reinforcements(turn) {
            let id = arrival.unit.id;
            if ctx.world.get(id).is_some() {
                warn!(unit = id, "reinforcement id collides with existing unit");
                return Err(GameError::ModuleFailed {
                    module: self.name(),
                    message: format!("duplicate reinforcement id {id}"),
                });
            }

            let side = arrival.unit.side;
            let mut unit = arrival.unit;
            let plan = Plan::new(
                ctx.plan_ids.next_id(),
                id,
                PlanKind::Move {
                    dest: arrival.destination,
                },
            );
            let plan_id = plan.id;
            unit.push_plan(plan);
            ctx.world.insert(unit);

            info!(unit = id, ?side, turn, "reinforcement arrived");
            out.push(Action::for_side(
                side,
                ActionKind::PlanAdded {
                    unit: id,
                    plan: plan_id,
                },
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::context::SimContext;
    use crate::geometry::Vec2;
    use crate::units::{Side, Unit};
    use crate::world::Reinforcement;

    fn run(module: &mut dyn AiModule, world: &mut World, sim: &mut SimContext) -> Vec<Action> {
        let mut out = Vec::new();
        let mut ctx = TickCtx {
            world,
            clock: &sim.clock,
            config: &sim.config,
            morale: sim.morale.as_mut(),
            plan_ids: &sim.plan_ids,
        };
        module.execute(&mut ctx, &mut out).unwrap();
        out
    }

    #[test]
    fn test_cleanup_removes_dead_and_clears_references() {
        let mut world = World::new();
        world.insert(Unit::new(1, Side::Red, Vec2::ZERO));
        let mut hunter = Unit::new(2, Side::Blue, Vec2::ZERO);
        hunter.target = Some(1);
        world.insert(hunter);
        world.kill(1);
        let mut sim = SimContext::new(GameConfig::default());

        run(&mut DestroyedCleanup, &mut world, &mut sim);

        assert!(world.get(1).is_none());
        assert_eq!(world.get(2).unwrap().target, None);
    }

    #[test]
    fn test_reinforcement_arrives_with_opening_move() {
        let mut world = World::new();
        world.schedule_reinforcement(Reinforcement {
            turn: 0,
            unit: Unit::new(7, Side::Blue, Vec2::ZERO),
            destination: Vec2::new(150.0, 0.0),
        });
        let mut sim = SimContext::new(GameConfig::default());

        let out = run(&mut ReinforcementArrivals, &mut world, &mut sim);

        let unit = world.get(7).unwrap();
        assert_eq!(unit.plans.len(), 1);
        assert!(matches!(unit.plans[0].kind, PlanKind::Move { .. }));
        assert_eq!(out.len(), 1);
        assert!(matches!(
            out[0].kind,
            ActionKind::PlanAdded { unit: 7, plan: _ }
        ));
        assert_eq!(world.pending_reinforcements(), 0);
    }

    #[test]
    fn test_reinforcement_waits_for_its_turn() {
        let mut world = World::new();
        world.schedule_reinforcement(Reinforcement {
            turn: 5,
            unit: Unit::new(7, Side::Blue, Vec2::ZERO),
            destination: Vec2::ZERO,
        });
        let mut sim = SimContext::new(GameConfig::default());

        run(&mut ReinforcementArrivals, &mut world, &mut sim);
        assert!(world.get(7).is_none());
        assert_eq!(world.pending_reinforcements(), 1);
    }
}
