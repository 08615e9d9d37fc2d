//! Melee resolution.

use std::collections::HashSet;

use crate::action::{Action, ActionKind};
use crate::clock::GameClock;
use crate::context::TickCtx;
use crate::error::Result;
use crate::executor::{break_off, WithdrawKind};
use crate::morale::CheckLevel;
use crate::units::{UnitId, UnitMode};
use crate::world::World;

use super::AiModule;

/// Resolves locked melee pairs.
///
/// Each engaged pair rolls opposed melee checks once per turn, in sorted
/// order of the lower unit id. A loser breaks and routs; a winner reverts
/// to `Normal` and drops its target. Both holding keeps the pair locked
/// for another turn; both failing routs both.
pub struct MeleeResolution;

impl MeleeResolution {
    fn rout_loser(ctx: &mut TickCtx<'_>, id: UnitId, out: &mut Vec<Action>) {
        out.extend(break_off(ctx, id, WithdrawKind::Rout));
        if let Some(unit) = ctx.world.get_mut(id) {
            unit.mode = UnitMode::Routed;
            unit.target = None;
            let side = unit.side;
            out.push(Action::mode_set(id, UnitMode::Routed));
            out.push(Action::for_side(
                side,
                ActionKind::SetTarget {
                    unit: id,
                    target: None,
                },
            ));
        }
    }

    fn release_winner(ctx: &mut TickCtx<'_>, id: UnitId, out: &mut Vec<Action>) {
        if let Some(unit) = ctx.world.get_mut(id) {
            unit.mode = UnitMode::Normal;
            unit.target = None;
            let side = unit.side;
            out.push(Action::mode_set(id, UnitMode::Normal));
            out.push(Action::for_side(
                side,
                ActionKind::SetTarget {
                    unit: id,
                    target: None,
                },
            ));
        }
    }
}

impl AiModule for MeleeResolution {
    fn name(&self) -> &'static str {
        "melee_resolution"
    }

    fn ready(&self, _clock: &GameClock, world: &World) -> bool {
        world.units().any(|u| u.alive && u.mode == UnitMode::Melee)
    }

    fn execute(&mut self, ctx: &mut TickCtx<'_>, out: &mut Vec<Action>) -> Result<()> {
        let mut resolved: HashSet<UnitId> = HashSet::new();

        for id in ctx.world.sorted_ids() {
            if resolved.contains(&id) {
                continue;
            }
            let (foe, a_morale) = match ctx.world.get(id) {
                Some(u) if u.alive && u.mode == UnitMode::Melee => match u.target {
                    Some(tid) => (tid, u.morale),
                    None => continue,
                },
                _ => continue,
            };
            let b_morale = match ctx.world.get(foe) {
                Some(t) if t.alive && t.mode == UnitMode::Melee => t.morale,
                _ => continue,
            };
            resolved.insert(id);
            resolved.insert(foe);

            let a_holds = ctx.morale.check(&a_morale, CheckLevel::Melee);
            let b_holds = ctx.morale.check(&b_morale, CheckLevel::Melee);
            if a_holds && b_holds {
                // Still locked; resolve again next turn.
                continue;
            }

            if !a_holds {
                Self::rout_loser(ctx, id, out);
            }
            if !b_holds {
                Self::rout_loser(ctx, foe, out);
            }
            if a_holds {
                Self::release_winner(ctx, id, out);
            }
            if b_holds {
                Self::release_winner(ctx, foe, out);
            }
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
    use crate::morale::{MoraleCheck, MoraleState};
    use crate::plan::PlanKind;
    use crate::units::{Side, Unit};

    /// Replays a scripted sequence of check outcomes.
    struct Sequence(Vec<bool>, usize);

    impl MoraleCheck for Sequence {
        fn check(&mut self, _state: &MoraleState, _level: CheckLevel) -> bool {
            let out = self.0.get(self.1).copied().unwrap_or(true);
            self.1 += 1;
            out
        }
    }

    fn melee_pair() -> World {
        let mut world = World::new();
        let mut red = Unit::new(1, Side::Red, Vec2::ZERO);
        red.mode = UnitMode::Melee;
        red.target = Some(2);
        let mut blue = Unit::new(2, Side::Blue, Vec2::new(10.0, 0.0));
        blue.mode = UnitMode::Melee;
        blue.target = Some(1);
        world.insert(red);
        world.insert(blue);
        world
    }

    fn run(world: &mut World, outcomes: Vec<bool>) -> Vec<Action> {
        let mut sim = SimContext::new(GameConfig::default())
            .with_morale(Box::new(Sequence(outcomes, 0)));
        let mut out = Vec::new();
        let mut ctx = TickCtx {
            world,
            clock: &sim.clock,
            config: &sim.config,
            morale: sim.morale.as_mut(),
            plan_ids: &sim.plan_ids,
        };
        MeleeResolution.execute(&mut ctx, &mut out).unwrap();
        out
    }

    #[test]
    fn test_loser_routs_and_winner_reverts() {
        let mut world = melee_pair();
        let out = run(&mut world, vec![true, false]);

        let red = world.get(1).unwrap();
        assert_eq!(red.mode, UnitMode::Normal);
        assert_eq!(red.target, None);

        let blue = world.get(2).unwrap();
        assert_eq!(blue.mode, UnitMode::Routed);
        assert!(!blue.is_idle());
        assert!(matches!(blue.plans[0].kind, PlanKind::Rout { .. }));

        assert!(out
            .iter()
            .any(|a| matches!(a.kind, ActionKind::SetMode { unit: 2, mode: UnitMode::Routed })));
        assert!(out
            .iter()
            .any(|a| matches!(a.kind, ActionKind::SetMode { unit: 1, mode: UnitMode::Normal })));
    }

    #[test]
    fn test_both_holding_stay_locked() {
        let mut world = melee_pair();
        let out = run(&mut world, vec![true, true]);
        assert!(out.is_empty());
        assert_eq!(world.get(1).unwrap().mode, UnitMode::Melee);
        assert_eq!(world.get(2).unwrap().mode, UnitMode::Melee);
    }

    #[test]
    fn test_both_failing_rout_both() {
        let mut world = melee_pair();
        run(&mut world, vec![false, false]);
        assert_eq!(world.get(1).unwrap().mode, UnitMode::Routed);
        assert_eq!(world.get(2).unwrap().mode, UnitMode::Routed);
    }

    #[test]
    fn test_pair_resolved_once_per_turn() {
        let mut world = melee_pair();
        // Two outcomes consumed for one pair; a second resolution of the
        // same pair would consume more and default to holding.
        let out = run(&mut world, vec![false, true]);
        let routs = out
            .iter()
            .filter(|a| matches!(a.kind, ActionKind::SetMode { mode: UnitMode::Routed, .. }))
            .count();
        assert_eq!(routs, 1);
    }
}
