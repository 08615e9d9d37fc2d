//! Target acquisition, target hygiene, and line of sight.

use std::collections::BTreeSet;

use crate::action::{Action, ActionKind};
use crate::clock::GameClock;
use crate::context::TickCtx;
use crate::error::Result;
use crate::units::{Side, UnitMode};
use crate::world::World;

use super::AiModule;

/// Gives idle units the nearest spotted enemy as a target.
///
/// Runs every turn. Units already targeting something, locked in melee,
/// or routed are left alone.
pub struct TargetAssignment;

impl AiModule for TargetAssignment {
    fn name(&self) -> &'static str {
        "target_assignment"
    }

    fn ready(&self, _clock: &GameClock, _world: &World) -> bool {
        true
    }

    fn execute(&mut self, ctx: &mut TickCtx<'_>, out: &mut Vec<Action>) -> Result<()> {
        for id in ctx.world.sorted_ids() {
            let (side, pos) = match ctx.world.get(id) {
                Some(u)
                    if u.alive
                        && u.target.is_none()
                        && !matches!(u.mode, UnitMode::Melee | UnitMode::Routed) =>
                {
                    (u.side, u.pos)
                }
                _ => continue,
            };

            let mut best: Option<(f64, u64)> = None;
            let candidates: Vec<_> = ctx.world.spotted(side).iter().copied().collect();
            for tid in candidates {
                let Some(target) = ctx.world.get(tid) else {
                    continue;
                };
                if !target.alive || target.side == side {
                    continue;
                }
                let dist = pos.distance(target.pos);
                if dist <= ctx.config.acquisition_range && best.map_or(true, |(b, _)| dist < b) {
                    best = Some((dist, tid));
                }
            }

            if let Some((_, tid)) = best {
                if let Some(unit) = ctx.world.get_mut(id) {
                    unit.target = Some(tid);
                }
                out.push(Action::for_side(
                    side,
                    ActionKind::SetTarget {
                        unit: id,
                        target: Some(tid),
                    },
                ));
            }
        }
        Ok(())
    }
}

/// Drops targets whose unit is dead or gone.
///
/// Every dereference of a target identity revalidates it through the
/// store; this module is the hygiene pass that also tells the owning
/// side about the loss.
pub struct TargetClearing;

impl AiModule for TargetClearing {
    fn name(&self) -> &'static str {
        "target_clearing"
    }

    fn ready(&self, _clock: &GameClock, _world: &World) -> bool {
        true
    }

    fn execute(&mut self, ctx: &mut TickCtx<'_>, out: &mut Vec<Action>) -> Result<()> {
        for id in ctx.world.sorted_ids() {
            let stale = match ctx.world.get(id) {
                Some(u) if u.alive => match u.target {
                    Some(tid) => !ctx.world.is_live(tid),
                    None => false,
                },
                _ => false,
            };
            if !stale {
                continue;
            }
            if let Some(unit) = ctx.world.get_mut(id) {
                unit.target = None;
                out.push(Action::for_side(
                    unit.side,
                    ActionKind::SetTarget {
                        unit: id,
                        target: None,
                    },
                ));
            }
        }
        Ok(())
    }
}

/// Recomputes each side's spotted set from unit sight ranges.
///
/// Flat-world visibility: an enemy is spotted when any live friendly
/// unit has it within sight range. Terrain occlusion is out of scope.
pub struct LineOfSight;

impl AiModule for LineOfSight {
    fn name(&self) -> &'static str {
        "line_of_sight"
    }

    fn ready(&self, _clock: &GameClock, _world: &World) -> bool {
        true
    }

    fn execute(&mut self, ctx: &mut TickCtx<'_>, _out: &mut Vec<Action>) -> Result<()> {
        for side in Side::BOTH {
            let mut spotted = BTreeSet::new();
            for enemy in ctx.world.units() {
                if !enemy.alive || enemy.side == side {
                    continue;
                }
                let seen = ctx
                    .world
                    .units()
                    .filter(|u| u.alive && u.side == side)
                    .any(|u| u.pos.distance(enemy.pos) <= u.sight_range);
                if seen {
                    spotted.insert(enemy.id);
                }
            }
            ctx.world.set_spotted(side, spotted);
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
    use crate::units::Unit;

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
    fn test_los_then_acquisition_picks_nearest_enemy() {
        let mut world = World::new();
        world.insert(Unit::new(1, Side::Red, Vec2::ZERO));
        world.insert(Unit::new(2, Side::Blue, Vec2::new(200.0, 0.0)));
        world.insert(Unit::new(3, Side::Blue, Vec2::new(300.0, 0.0)));
        let mut sim = SimContext::new(GameConfig::default());

        let mut out = Vec::new();
        let mut ctx = tick(&mut world, &mut sim);
        LineOfSight.execute(&mut ctx, &mut out).unwrap();
        TargetAssignment.execute(&mut ctx, &mut out).unwrap();
        drop(ctx);

        assert_eq!(world.get(1).unwrap().target, Some(2));
        assert!(out
            .iter()
            .any(|a| matches!(a.kind, ActionKind::SetTarget { unit: 1, target: Some(2) })));
    }

    #[test]
    fn test_acquisition_ignores_unspotted_enemies() {
        let mut world = World::new();
        // Enemy beyond sight range is never spotted, so never acquired.
        world.insert(Unit::new(1, Side::Red, Vec2::ZERO).with_ranges(250.0, 300.0));
        world.insert(Unit::new(2, Side::Blue, Vec2::new(350.0, 0.0)));
        let mut sim = SimContext::new(GameConfig::default());

        let mut out = Vec::new();
        let mut ctx = tick(&mut world, &mut sim);
        LineOfSight.execute(&mut ctx, &mut out).unwrap();
        TargetAssignment.execute(&mut ctx, &mut out).unwrap();
        drop(ctx);

        assert_eq!(world.get(1).unwrap().target, None);
    }

    #[test]
    fn test_clearing_drops_dead_targets() {
        let mut world = World::new();
        let mut unit = Unit::new(1, Side::Red, Vec2::ZERO);
        unit.target = Some(2);
        world.insert(unit);
        world.insert(Unit::new(2, Side::Blue, Vec2::new(50.0, 0.0)));
        world.kill(2);
        let mut sim = SimContext::new(GameConfig::default());

        let mut out = Vec::new();
        let mut ctx = tick(&mut world, &mut sim);
        TargetClearing.execute(&mut ctx, &mut out).unwrap();
        drop(ctx);

        assert_eq!(world.get(1).unwrap().target, None);
        assert!(out
            .iter()
            .any(|a| matches!(a.kind, ActionKind::SetTarget { unit: 1, target: None })));
    }
}
