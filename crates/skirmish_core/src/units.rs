//! Unit state and identity types.
//!
//! A [`Unit`] is the mutable entity the scheduler and executors act on.
//! Units are owned by the [`World`](crate::world::World) store; scheduler
//! code mutates them but never creates or destroys them directly.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;
use crate::morale::MoraleState;
use crate::plan::{Plan, PlanId};

/// Unique identifier for units.
pub type UnitId = u64;

/// The two player sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// Red player.
    Red,
    /// Blue player.
    Blue,
}

impl Side {
    /// The opposing side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Side::Red => Side::Blue,
            Side::Blue => Side::Red,
        }
    }

    /// Both sides, in fixed order.
    pub const BOTH: [Side; 2] = [Side::Red, Side::Blue];
}

/// Behavioral mode of a unit.
///
/// Mode transitions are driven by executors and AI modules: an assault
/// executor flips its unit to `Assault` when it starts and to `Melee` on
/// engagement; a failed morale gate or lost melee produces `Routed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitMode {
    /// Default steady state.
    #[default]
    Normal,
    /// Executing an assault order.
    Assault,
    /// Locked in close combat.
    Melee,
    /// Broken and fleeing.
    Routed,
}

/// One entry of a unit's suppression cadence.
///
/// While an assaulting unit is inside firing range but outside the
/// melee-engage threshold it cycles through its cadence list, one entry
/// per turn. Only `Move` entries advance the unit; the others pace it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CadenceStep {
    /// Advance one movement step toward the target.
    Move,
    /// Fire on the target, suppressing it.
    Fire,
    /// Hold position for a turn.
    Pause,
    /// Reload; holds position like `Pause`.
    Reload,
}

impl CadenceStep {
    /// The default four-beat advance-by-bounds cadence.
    pub const DEFAULT_CADENCE: [CadenceStep; 4] = [
        CadenceStep::Move,
        CadenceStep::Fire,
        CadenceStep::Pause,
        CadenceStep::Reload,
    ];
}

/// A single unit in the world.
///
/// Position and facing are authoritative `f64` accumulators; the action
/// stream quantizes positions to integers for the wire but the simulation
/// never reads those integers back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Unique identity.
    pub id: UnitId,
    /// Owning side.
    pub side: Side,
    /// World position.
    pub pos: Vec2,
    /// Facing in degrees, `[0, 360)`.
    pub facing: f64,
    /// Current behavioral mode.
    pub mode: UnitMode,
    /// Acquired target, revalidated through the world store on every use.
    pub target: Option<UnitId>,
    /// Ordered queue of pending plans. The head is the active order.
    pub plans: VecDeque<Plan>,
    /// Morale state (base level plus accumulated suppression).
    pub morale: MoraleState,
    /// Movement speed in distance units per turn.
    pub walk_speed: f64,
    /// Movement speed during a final rush, units per turn.
    pub assault_speed: f64,
    /// Maximum rotation in degrees per turn.
    pub turn_rate: f64,
    /// Effective firing range in distance units.
    pub firing_range: f64,
    /// Spotting range in distance units.
    pub sight_range: f64,
    /// Per-unit suppression cadence (cycled while suppressing).
    pub cadence: Vec<CadenceStep>,
    /// Delay in milliseconds before a freshly built executor first steps.
    pub action_delay_ms: u64,
    /// Existence flag. Dead units are swept by the cleanup AI module.
    pub alive: bool,
}

impl Unit {
    /// Create a unit with default stats at the given position.
    #[must_use]
    pub fn new(id: UnitId, side: Side, pos: Vec2) -> Self {
        Self {
            id,
            side,
            pos,
            facing: 0.0,
            mode: UnitMode::Normal,
            target: None,
            plans: VecDeque::new(),
            morale: MoraleState::default(),
            walk_speed: 10.0,
            assault_speed: 15.0,
            turn_rate: 30.0,
            firing_range: 250.0,
            sight_range: 400.0,
            cadence: CadenceStep::DEFAULT_CADENCE.to_vec(),
            action_delay_ms: 500,
            alive: true,
        }
    }

    /// Set the initial facing in degrees.
    #[must_use]
    pub fn with_facing(mut self, facing: f64) -> Self {
        self.facing = facing;
        self
    }

    /// Set the base morale level.
    #[must_use]
    pub fn with_morale(mut self, base: f64) -> Self {
        self.morale = MoraleState::new(base);
        self
    }

    /// Set walk and assault speeds (units per turn).
    #[must_use]
    pub fn with_speeds(mut self, walk: f64, assault: f64) -> Self {
        self.walk_speed = walk;
        self.assault_speed = assault;
        self
    }

    /// Set the turn rate in degrees per turn.
    #[must_use]
    pub fn with_turn_rate(mut self, turn_rate: f64) -> Self {
        self.turn_rate = turn_rate;
        self
    }

    /// Set firing and sight ranges.
    #[must_use]
    pub fn with_ranges(mut self, firing: f64, sight: f64) -> Self {
        self.firing_range = firing;
        self.sight_range = sight;
        self
    }

    /// Replace the suppression cadence list.
    #[must_use]
    pub fn with_cadence(mut self, cadence: Vec<CadenceStep>) -> Self {
        self.cadence = cadence;
        self
    }

    /// Set the base action delay in milliseconds.
    #[must_use]
    pub fn with_action_delay(mut self, delay_ms: u64) -> Self {
        self.action_delay_ms = delay_ms;
        self
    }

    /// Current movement speed for this mode.
    ///
    /// Routed units flee at assault speed; everything else walks unless an
    /// executor explicitly selects the rush speed.
    #[must_use]
    pub fn current_speed(&self) -> f64 {
        match self.mode {
            UnitMode::Routed => self.assault_speed,
            _ => self.walk_speed,
        }
    }

    /// Append a plan to the back of the queue.
    pub fn push_plan(&mut self, plan: Plan) {
        self.plans.push_back(plan);
    }

    /// Remove every queued plan.
    pub fn clear_plans(&mut self) {
        self.plans.clear();
    }

    /// Whether a plan with the given identity is still queued.
    #[must_use]
    pub fn has_plan(&self, id: PlanId) -> bool {
        self.plans.iter().any(|p| p.id == id)
    }

    /// Remove the plan with the given identity, if present.
    ///
    /// Per the scheduler invariant this is always the queue head, but the
    /// removal is by identity so a reordered queue cannot drop the wrong
    /// order.
    pub fn remove_plan(&mut self, id: PlanId) -> Option<Plan> {
        let idx = self.plans.iter().position(|p| p.id == id)?;
        self.plans.remove(idx)
    }

    /// Whether the unit has no queued plans.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.plans.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlanKind;

    fn plan(id: PlanId, unit: UnitId) -> Plan {
        Plan::new(id, unit, PlanKind::Rally)
    }

    #[test]
    fn test_opponent_is_involutive() {
        assert_eq!(Side::Red.opponent(), Side::Blue);
        assert_eq!(Side::Blue.opponent().opponent(), Side::Blue);
    }

    #[test]
    fn test_plan_queue_order_preserved() {
        let mut unit = Unit::new(1, Side::Red, Vec2::ZERO);
        unit.push_plan(plan(10, 1));
        unit.push_plan(plan(11, 1));
        unit.push_plan(plan(12, 1));

        let ids: Vec<_> = unit.plans.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
    }

    #[test]
    fn test_remove_plan_by_identity() {
        let mut unit = Unit::new(1, Side::Red, Vec2::ZERO);
        unit.push_plan(plan(10, 1));
        unit.push_plan(plan(11, 1));

        assert!(unit.has_plan(10));
        let removed = unit.remove_plan(10).unwrap();
        assert_eq!(removed.id, 10);
        assert!(!unit.has_plan(10));
        assert!(unit.has_plan(11));
        assert!(unit.remove_plan(10).is_none());
    }

    #[test]
    fn test_routed_unit_flees_at_assault_speed() {
        let mut unit = Unit::new(1, Side::Red, Vec2::ZERO).with_speeds(8.0, 14.0);
        assert!((unit.current_speed() - 8.0).abs() < f64::EPSILON);
        unit.mode = UnitMode::Routed;
        assert!((unit.current_speed() - 14.0).abs() < f64::EPSILON);
    }
}
