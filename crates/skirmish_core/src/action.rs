//! Actions: immutable, dispatch-ready effect descriptors.
//!
//! Every observable effect a turn produces is returned as an [`Action`]
//! tagged with its recipients. Executors and AI modules never talk to the
//! network; the scheduler hands their actions to the
//! [`ActionDispatcher`](crate::dispatch::ActionDispatcher).

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;
use crate::plan::PlanId;
use crate::units::{Side, UnitId, UnitMode};

/// Who receives an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recipient {
    /// One side only (private information such as order changes).
    Side(Side),
    /// Both sides (publicly observable effects).
    Both,
}

impl Recipient {
    /// Whether the given side is addressed by this recipient.
    #[must_use]
    pub fn includes(self, side: Side) -> bool {
        match self {
            Recipient::Side(s) => s == side,
            Recipient::Both => true,
        }
    }
}

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    /// The configured turn limit expired.
    TurnLimit,
    /// One side lost every live unit.
    Victory(Side),
    /// Both sides were eliminated in the same turn.
    Draw,
    /// Dispatch failed; the game was terminated with no result.
    Aborted,
}

/// The effect an action describes.
///
/// Positions are quantized to integers here as a presentation-only step;
/// the authoritative `f64` state never round-trips through them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionKind {
    /// A unit moved to integer wire coordinates.
    Move {
        /// Unit that moved.
        unit: UnitId,
        /// Quantized X coordinate.
        x: i64,
        /// Quantized Y coordinate.
        y: i64,
    },
    /// A unit rotated to a new facing.
    Rotate {
        /// Unit that rotated.
        unit: UnitId,
        /// New facing in degrees.
        facing: f64,
    },
    /// A unit's acquired target changed.
    SetTarget {
        /// Unit whose target changed.
        unit: UnitId,
        /// New target, or `None` when cleared.
        target: Option<UnitId>,
    },
    /// A unit's plan queue was cleared.
    ClearPlans {
        /// Unit whose plans were cleared.
        unit: UnitId,
    },
    /// A plan was installed in a unit's queue.
    PlanAdded {
        /// Unit that received the plan.
        unit: UnitId,
        /// Identity of the new plan.
        plan: PlanId,
    },
    /// A unit's mode changed.
    SetMode {
        /// Unit whose mode changed.
        unit: UnitId,
        /// The new mode.
        mode: UnitMode,
    },
    /// The world clock advanced by one turn.
    TimeAdvance {
        /// Turn number just completed.
        turn: u64,
        /// Elapsed simulation time in milliseconds.
        clock_ms: u64,
    },
    /// The game ended; no further actions follow.
    GameOver {
        /// How the game ended.
        outcome: GameOutcome,
    },
}

/// An immutable effect descriptor plus its recipients.
///
/// Produced once by an executor, AI module, or the scheduler itself, and
/// consumed once by the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Who receives this action.
    pub recipient: Recipient,
    /// What happened.
    pub kind: ActionKind,
}

impl Action {
    /// Address an action to both sides.
    #[must_use]
    pub const fn broadcast(kind: ActionKind) -> Self {
        Self {
            recipient: Recipient::Both,
            kind,
        }
    }

    /// Address an action to one side.
    #[must_use]
    pub const fn for_side(side: Side, kind: ActionKind) -> Self {
        Self {
            recipient: Recipient::Side(side),
            kind,
        }
    }

    /// A publicly visible move to quantized coordinates.
    #[must_use]
    pub fn moved(unit: UnitId, pos: Vec2) -> Self {
        let (x, y) = pos.quantized();
        Self::broadcast(ActionKind::Move { unit, x, y })
    }

    /// A publicly visible rotation.
    #[must_use]
    pub fn rotated(unit: UnitId, facing: f64) -> Self {
        Self::broadcast(ActionKind::Rotate { unit, facing })
    }

    /// A publicly visible mode change.
    #[must_use]
    pub fn mode_set(unit: UnitId, mode: UnitMode) -> Self {
        Self::broadcast(ActionKind::SetMode { unit, mode })
    }
}
