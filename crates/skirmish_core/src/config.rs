//! Game configuration.

use serde::{Deserialize, Serialize};

/// Tunable constants for one game.
///
/// Owned by the simulation context; there is no ambient global
/// configuration. The defaults are the reference values the executors and
/// AI modules were balanced against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Length of one turn in milliseconds.
    pub turn_ms: u64,
    /// Distance at which an assault switches to the final rush.
    pub melee_engage_range: f64,
    /// Distance at which a final rush becomes a melee.
    pub close_combat_range: f64,
    /// Withdrawal distance synthesized by a failed advance gate.
    pub retreat_distance: f64,
    /// Flight distance synthesized by a failed final-assault gate.
    pub rout_distance: f64,
    /// Distance at which movement executors consider a destination reached.
    pub arrival_threshold: f64,
    /// Range within which idle units acquire spotted enemies.
    pub acquisition_range: f64,
    /// Suppression added to a target by one cadence `Fire` entry.
    pub fire_suppression: f64,
    /// Suppression shed per turn while resting.
    pub rest_recovery: f64,
    /// Passive suppression decay applied by the morale AI module.
    pub suppression_decay: f64,
    /// Optional turn limit; `None` runs until elimination or abort.
    pub turn_limit: Option<u64>,
    /// Seed for the morale model.
    pub morale_seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            turn_ms: 250,
            melee_engage_range: 100.0,
            close_combat_range: 20.0,
            retreat_distance: 200.0,
            rout_distance: 300.0,
            arrival_threshold: 2.0,
            acquisition_range: 400.0,
            fire_suppression: 5.0,
            rest_recovery: 10.0,
            suppression_decay: 2.0,
            turn_limit: None,
            morale_seed: 0x5EED,
        }
    }
}
