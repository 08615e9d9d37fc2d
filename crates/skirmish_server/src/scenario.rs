//! Scenario files: the RON description of a game's starting state.
//!
//! A scenario names both rosters, optional opening plans, and any
//! reinforcement schedule. Everything else (speeds, ranges, cadences)
//! falls back to the unit defaults unless the file overrides it, so
//! small hand-written scenarios stay small.

use std::path::Path;

use serde::{Deserialize, Serialize};
use skirmish_core::prelude::*;
use thiserror::Error;

/// Errors raised while loading or validating a scenario file.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The scenario file does not exist.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),

    /// The file exists but could not be read.
    #[error("Failed to read scenario: {0}")]
    Read(#[from] std::io::Error),

    /// The file is not valid RON or does not match the schema.
    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// The scenario parsed but describes an unplayable game.
    #[error("Invalid scenario: {0}")]
    Invalid(String),
}

fn default_morale() -> f64 {
    70.0
}

fn default_action_delay() -> u64 {
    500
}

/// One unit's starting state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSetup {
    /// Unit identity, unique across both rosters and reinforcements.
    pub id: UnitId,
    /// Owning side.
    pub side: Side,
    /// Starting X position.
    pub x: f64,
    /// Starting Y position.
    pub y: f64,
    /// Starting facing in degrees.
    #[serde(default)]
    pub facing: f64,
    /// Base morale level.
    #[serde(default = "default_morale")]
    pub morale: f64,
    /// Delay before a freshly built executor first steps.
    #[serde(default = "default_action_delay")]
    pub action_delay_ms: u64,
}

impl UnitSetup {
    /// Materialize the unit this setup describes.
    #[must_use]
    pub fn build(&self) -> Unit {
        Unit::new(self.id, self.side, Vec2::new(self.x, self.y))
            .with_facing(self.facing)
            .with_morale(self.morale)
            .with_action_delay(self.action_delay_ms)
    }
}

/// A scheduled arrival: the unit enters the world on `turn` and marches
/// toward the given destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReinforcementSetup {
    /// Turn the unit arrives.
    pub turn: u64,
    /// The arriving unit.
    pub unit: UnitSetup,
    /// Destination X the arrival marches to.
    pub dest_x: f64,
    /// Destination Y the arrival marches to.
    pub dest_y: f64,
}

/// An order queued before the first turn runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanSetup {
    /// March a unit to a position.
    Move {
        /// Unit to order.
        unit: UnitId,
        /// Destination X.
        x: f64,
        /// Destination Y.
        y: f64,
    },
    /// Order a unit to assault another.
    Assault {
        /// Unit to order.
        unit: UnitId,
        /// Unit to assault.
        target: UnitId,
    },
    /// Hold a unit in place to shed suppression.
    Rest {
        /// Unit to order.
        unit: UnitId,
        /// Turns to hold.
        turns: u32,
    },
}

impl PlanSetup {
    /// The unit this opening order is addressed to.
    #[must_use]
    pub fn unit(&self) -> UnitId {
        match *self {
            PlanSetup::Move { unit, .. }
            | PlanSetup::Assault { unit, .. }
            | PlanSetup::Rest { unit, .. } => unit,
        }
    }

    fn kind(&self) -> PlanKind {
        match *self {
            PlanSetup::Move { x, y, .. } => PlanKind::Move {
                dest: Vec2::new(x, y),
            },
            PlanSetup::Assault { target, .. } => PlanKind::Assault { target },
            PlanSetup::Rest { turns, .. } => PlanKind::Rest { turns },
        }
    }
}

/// A complete scenario description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name, for logs.
    pub name: String,
    /// Optional free-form description.
    #[serde(default)]
    pub description: String,
    /// Game configuration; omitted fields take the reference defaults.
    #[serde(default)]
    pub config: GameConfig,
    /// Starting rosters for both sides.
    pub units: Vec<UnitSetup>,
    /// Scheduled arrivals.
    #[serde(default)]
    pub reinforcements: Vec<ReinforcementSetup>,
    /// Orders queued before the first turn.
    #[serde(default)]
    pub opening_plans: Vec<PlanSetup>,
}

impl Scenario {
    /// Load and validate a scenario from a RON file.
    ///
    /// # Errors
    ///
    /// Returns a [`ScenarioError`] if the file is missing, unreadable,
    /// malformed, or describes an unplayable game.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Parse and validate a scenario from RON text.
    ///
    /// # Errors
    ///
    /// Returns a [`ScenarioError`] if the text is malformed or the
    /// scenario is unplayable.
    pub fn from_ron_str(contents: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(contents)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Serialize to pretty RON, for scenario templates.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Invalid`] if serialization fails.
    pub fn to_ron_string(&self) -> Result<String, ScenarioError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ScenarioError::Invalid(e.to_string()))
    }

    /// Check that the scenario describes a playable game.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Invalid`] for empty rosters, duplicate
    /// unit identities, or opening plans that reference unknown units.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.units.is_empty() {
            return Err(ScenarioError::Invalid("no units".to_string()));
        }

        let mut ids: Vec<UnitId> = self
            .units
            .iter()
            .map(|u| u.id)
            .chain(self.reinforcements.iter().map(|r| r.unit.id))
            .collect();
        ids.sort_unstable();
        let before = ids.len();
        ids.dedup();
        if ids.len() != before {
            return Err(ScenarioError::Invalid("duplicate unit id".to_string()));
        }

        for plan in &self.opening_plans {
            let unit = plan.unit();
            if !self.units.iter().any(|u| u.id == unit) {
                return Err(ScenarioError::Invalid(format!(
                    "opening plan references unknown unit {unit}"
                )));
            }
            if let PlanSetup::Assault { target, .. } = *plan {
                if !self.units.iter().any(|u| u.id == target) {
                    return Err(ScenarioError::Invalid(format!(
                        "assault plan references unknown target {target}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Build the starting world, including the reinforcement schedule.
    #[must_use]
    pub fn build_world(&self) -> World {
        let mut world = World::new();
        for setup in &self.units {
            world.insert(setup.build());
        }
        for arrival in &self.reinforcements {
            world.schedule_reinforcement(Reinforcement {
                turn: arrival.turn,
                unit: arrival.unit.build(),
                destination: Vec2::new(arrival.dest_x, arrival.dest_y),
            });
        }
        world
    }

    /// Opening plans materialized against a plan-id allocator, in file
    /// order.
    #[must_use]
    pub fn opening_plans(&self, ids: &PlanIds) -> Vec<Plan> {
        self.opening_plans
            .iter()
            .map(|setup| Plan::new(ids.next_id(), setup.unit(), setup.kind()))
            .collect()
    }

    /// A built-in 1v1 meeting engagement: two units advancing into
    /// mutual acquisition range.
    #[must_use]
    pub fn meeting_engagement() -> Self {
        Self {
            name: "meeting_engagement".to_string(),
            description: "Two units advance toward the center until one breaks".to_string(),
            config: GameConfig {
                turn_limit: Some(2000),
                ..GameConfig::default()
            },
            units: vec![
                UnitSetup {
                    id: 1,
                    side: Side::Red,
                    x: -600.0,
                    y: 0.0,
                    facing: 0.0,
                    morale: default_morale(),
                    action_delay_ms: default_action_delay(),
                },
                UnitSetup {
                    id: 2,
                    side: Side::Blue,
                    x: 600.0,
                    y: 0.0,
                    facing: 180.0,
                    morale: default_morale(),
                    action_delay_ms: default_action_delay(),
                },
            ],
            reinforcements: Vec::new(),
            opening_plans: vec![
                PlanSetup::Move {
                    unit: 1,
                    x: -50.0,
                    y: 0.0,
                },
                PlanSetup::Move {
                    unit: 2,
                    x: 50.0,
                    y: 0.0,
                },
            ],
        }
    }
}
