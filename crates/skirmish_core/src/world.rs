//! The in-memory unit store.
//!
//! The [`World`] owns every [`Unit`]. Scheduler code looks units up by
//! identity and iterates in sorted-id order so a turn's mutations are
//! observed deterministically by later entities in the same turn.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;
use crate::units::{Side, Unit, UnitId};

/// A scheduled arrival: the unit enters the world on the given turn and
/// receives an opening move order toward its destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reinforcement {
    /// Turn on which the unit arrives.
    pub turn: u64,
    /// The unit to insert.
    pub unit: Unit,
    /// Where the arrival should march to.
    pub destination: Vec2,
}

/// Store of all units plus per-side visibility and the reinforcement
/// schedule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    units: HashMap<UnitId, Unit>,
    /// Enemy units currently spotted, per side. Maintained by the
    /// line-of-sight AI module.
    spotted: HashMap<Side, BTreeSet<UnitId>>,
    reinforcements: Vec<Reinforcement>,
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a unit, keyed by its own identity.
    pub fn insert(&mut self, unit: Unit) {
        self.units.insert(unit.id, unit);
    }

    /// Remove a unit outright. Returns the removed unit, if any.
    pub fn remove(&mut self, id: UnitId) -> Option<Unit> {
        for set in self.spotted.values_mut() {
            set.remove(&id);
        }
        self.units.remove(&id)
    }

    /// Get a unit by identity.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Get a unit mutably by identity.
    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Whether a unit exists and is still alive.
    #[must_use]
    pub fn is_live(&self, id: UnitId) -> bool {
        self.units.get(&id).is_some_and(|u| u.alive)
    }

    /// Mark a unit destroyed. The cleanup AI module sweeps it out.
    pub fn kill(&mut self, id: UnitId) {
        if let Some(unit) = self.units.get_mut(&id) {
            unit.alive = false;
        }
    }

    /// Number of stored units (live or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Sorted unit identities for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<UnitId> {
        let mut ids: Vec<_> = self.units.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over all units (not in deterministic order).
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Number of live units on a side.
    #[must_use]
    pub fn live_count(&self, side: Side) -> usize {
        self.units
            .values()
            .filter(|u| u.alive && u.side == side)
            .count()
    }

    /// Whether a side has no live units left.
    #[must_use]
    pub fn side_eliminated(&self, side: Side) -> bool {
        self.live_count(side) == 0
    }

    /// The set of enemy units a side currently spots.
    #[must_use]
    pub fn spotted(&self, side: Side) -> &BTreeSet<UnitId> {
        static EMPTY: BTreeSet<UnitId> = BTreeSet::new();
        self.spotted.get(&side).unwrap_or(&EMPTY)
    }

    /// Replace a side's spotted set.
    pub fn set_spotted(&mut self, side: Side, set: BTreeSet<UnitId>) {
        self.spotted.insert(side, set);
    }

    /// Whether a side currently spots the given unit.
    #[must_use]
    pub fn is_spotted(&self, side: Side, id: UnitId) -> bool {
        self.spotted.get(&side).is_some_and(|s| s.contains(&id))
    }

    /// Schedule a reinforcement arrival.
    pub fn schedule_reinforcement(&mut self, arrival: Reinforcement) {
        self.reinforcements.push(arrival);
    }

    /// Take every reinforcement due on or before the given turn.
    #[must_use]
    pub fn due_reinforcements(&mut self, turn: u64) -> Vec<Reinforcement> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.reinforcements.len() {
            if self.reinforcements[i].turn <= turn {
                due.push(self.reinforcements.swap_remove(i));
            } else {
                i += 1;
            }
        }
        // swap_remove scrambles order; arrivals spawn in scheduled order.
        due.sort_by_key(|r| (r.turn, r.unit.id));
        due
    }

    /// Number of reinforcements still scheduled.
    #[must_use]
    pub fn pending_reinforcements(&self) -> usize {
        self.reinforcements.len()
    }

    /// Hash of the authoritative state, for desync checks in tests.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        let ids = self.sorted_ids();
        ids.len().hash(&mut hasher);
        for id in ids {
            if let Some(unit) = self.units.get(&id) {
                id.hash(&mut hasher);
                unit.pos.x.to_bits().hash(&mut hasher);
                unit.pos.y.to_bits().hash(&mut hasher);
                unit.facing.to_bits().hash(&mut hasher);
                std::mem::discriminant(&unit.mode).hash(&mut hasher);
                unit.target.hash(&mut hasher);
                unit.morale.suppression.to_bits().hash(&mut hasher);
                unit.alive.hash(&mut hasher);
                unit.plans.len().hash(&mut hasher);
                for plan in &unit.plans {
                    plan.id.hash(&mut hasher);
                }
            }
        }
        hasher.finish()
    }
}
