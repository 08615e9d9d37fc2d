//! Morale state and the seeded check model.
//!
//! Morale gates decide whether a unit presses an aggressive action or
//! breaks off. The model is a consumed collaborator of the executors and
//! AI modules: everything goes through the [`MoraleCheck`] trait so tests
//! can script outcomes deterministically.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Severity of a morale gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckLevel {
    /// Routine advance under fire. Failure produces a retreat.
    Advance,
    /// Committing to the final rush. Failure produces a rout.
    FinalAssault,
    /// Holding in close combat. Failure breaks the unit out of the melee.
    Melee,
    /// Recovering from a rout.
    Rally,
}

impl CheckLevel {
    /// Penalty subtracted from effective morale before the roll.
    ///
    /// Harsher situations demand more margin: a unit that would advance
    /// comfortably can still refuse the final rush.
    #[must_use]
    pub const fn penalty(self) -> f64 {
        match self {
            CheckLevel::Advance => 10.0,
            CheckLevel::Melee => 20.0,
            CheckLevel::FinalAssault => 25.0,
            CheckLevel::Rally => 40.0,
        }
    }
}

/// Per-unit morale state.
///
/// Effective morale is the base level minus accumulated suppression,
/// clamped to `[0, 100]`. Suppression is shed while resting or rallying.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoraleState {
    /// Base morale level, 0-100.
    pub base: f64,
    /// Accumulated suppression penalty.
    pub suppression: f64,
}

impl MoraleState {
    /// Create a state with the given base and no suppression.
    #[must_use]
    pub fn new(base: f64) -> Self {
        Self {
            base: base.clamp(0.0, 100.0),
            suppression: 0.0,
        }
    }

    /// Effective morale after suppression, clamped to `[0, 100]`.
    #[must_use]
    pub fn effective(&self) -> f64 {
        (self.base - self.suppression).clamp(0.0, 100.0)
    }

    /// Accumulate suppression.
    pub fn suppress(&mut self, amount: f64) {
        self.suppression += amount.max(0.0);
    }

    /// Shed suppression, never below zero.
    pub fn shed(&mut self, amount: f64) {
        self.suppression = (self.suppression - amount.max(0.0)).max(0.0);
    }
}

impl Default for MoraleState {
    fn default() -> Self {
        Self::new(70.0)
    }
}

/// The morale gate contract consumed by executors and AI modules.
pub trait MoraleCheck: Send {
    /// Roll a gate of the given severity against the unit's morale state.
    fn check(&mut self, state: &MoraleState, level: CheckLevel) -> bool;
}

/// Seeded morale model.
///
/// Rolls a uniform value in `[0, 100)` and passes when it falls below the
/// effective morale minus the level penalty. The RNG is seeded from game
/// configuration so a run can be reproduced.
#[derive(Debug)]
pub struct MoraleModel {
    rng: SmallRng,
}

impl MoraleModel {
    /// Create a model from an explicit seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl MoraleCheck for MoraleModel {
    fn check(&mut self, state: &MoraleState, level: CheckLevel) -> bool {
        let roll: f64 = self.rng.gen_range(0.0..100.0);
        roll < state.effective() - level.penalty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_clamps_suppression() {
        let mut state = MoraleState::new(60.0);
        state.suppress(80.0);
        assert!((state.effective() - 0.0).abs() < f64::EPSILON);

        state.shed(200.0);
        assert!((state.suppression - 0.0).abs() < f64::EPSILON);
        assert!((state.effective() - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_morale_never_passes() {
        let mut model = MoraleModel::new(42);
        let state = MoraleState::new(0.0);
        for _ in 0..100 {
            assert!(!model.check(&state, CheckLevel::Advance));
        }
    }

    #[test]
    fn test_same_seed_same_rolls() {
        let state = MoraleState::new(55.0);
        let mut a = MoraleModel::new(7);
        let mut b = MoraleModel::new(7);
        for _ in 0..50 {
            assert_eq!(
                a.check(&state, CheckLevel::Advance),
                b.check(&state, CheckLevel::Advance)
            );
        }
    }

    #[test]
    fn test_final_assault_is_harsher_than_advance() {
        // With identical rolls, the final-assault gate must fail at least
        // as often as the advance gate.
        let state = MoraleState::new(50.0);
        let mut advance_passes = 0u32;
        let mut rush_passes = 0u32;
        for seed in 0..200 {
            let mut model = MoraleModel::new(seed);
            if model.check(&state, CheckLevel::Advance) {
                advance_passes += 1;
            }
            let mut model = MoraleModel::new(seed);
            if model.check(&state, CheckLevel::FinalAssault) {
                rush_passes += 1;
            }
        }
        assert!(rush_passes <= advance_passes);
    }
}
