//! Background recovery: rallying, resting, and passive morale decay.

use crate::action::Action;
use crate::clock::GameClock;
use crate::context::TickCtx;
use crate::error::Result;
use crate::morale::CheckLevel;
use crate::units::UnitMode;
use crate::world::World;

use super::AiModule;

/// Tries to rally routed units that have come to rest.
///
/// Runs every second turn. Only idle routed units roll; a unit still
/// fleeing under a rout plan is left to finish its flight first. Success
/// restores `Normal` mode and sheds half the unit's suppression.
pub struct RallyModule;

impl AiModule for RallyModule {
    fn name(&self) -> &'static str {
        "rally"
    }

    fn ready(&self, clock: &GameClock, world: &World) -> bool {
        clock.turn % 2 == 0 && world.units().any(|u| u.alive && u.mode == UnitMode::Routed)
    }

    fn execute(&mut self, ctx: &mut TickCtx<'_>, out: &mut Vec<Action>) -> Result<()> {
        for id in ctx.world.sorted_ids() {
            let morale = match ctx.world.get(id) {
                Some(u) if u.alive && u.mode == UnitMode::Routed && u.is_idle() => u.morale,
                _ => continue,
            };
            if !ctx.morale.check(&morale, CheckLevel::Rally) {
                continue;
            }
            if let Some(unit) = ctx.world.get_mut(id) {
                unit.mode = UnitMode::Normal;
                unit.morale.shed(unit.morale.suppression / 2.0);
                out.push(Action::mode_set(id, UnitMode::Normal));
            }
        }
        Ok(())
    }
}

/// Lets idle units catch their breath.
///
/// Runs every second turn; idle `Normal` units shed suppression at the
/// resting rate. Purely internal, so no actions are emitted.
pub struct RestModule;

impl AiModule for RestModule {
    fn name(&self) -> &'static str {
        "rest"
    }

    fn ready(&self, clock: &GameClock, _world: &World) -> bool {
        clock.turn % 2 == 0
    }

    fn execute(&mut self, ctx: &mut TickCtx<'_>, _out: &mut Vec<Action>) -> Result<()> {
        let recovery = ctx.config.rest_recovery;
        for id in ctx.world.sorted_ids() {
            if let Some(unit) = ctx.world.get_mut(id) {
                if unit.alive && unit.mode == UnitMode::Normal && unit.is_idle() {
                    unit.morale.shed(recovery);
                }
            }
        }
        Ok(())
    }
}

/// Slow passive decay of suppression for everyone not locked in melee.
///
/// Runs every fourth turn.
pub struct MoraleDecay;

impl AiModule for MoraleDecay {
    fn name(&self) -> &'static str {
        "morale_decay"
    }

    fn ready(&self, clock: &GameClock, _world: &World) -> bool {
        clock.turn % 4 == 0
    }

    fn execute(&mut self, ctx: &mut TickCtx<'_>, _out: &mut Vec<Action>) -> Result<()> {
        let decay = ctx.config.suppression_decay;
        for id in ctx.world.sorted_ids() {
            if let Some(unit) = ctx.world.get_mut(id) {
                if unit.alive && unit.mode != UnitMode::Melee {
                    unit.morale.shed(decay);
                }
            }
        }
        Ok(())
    }
}
