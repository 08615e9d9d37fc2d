//! Plans (queued orders) and the inbound plan queue.
//!
//! A [`Plan`] describes one order for one unit. Plans arrive from the
//! network layer through the shared [`PlanQueue`], are appended to their
//! unit's queue by the scheduler's drain phase, and leave that queue
//! exactly once, when their executor finishes.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;
use crate::units::UnitId;

/// Unique identifier for plans.
pub type PlanId = u64;

/// The kind of order a plan carries, with per-kind parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanKind {
    /// March to a destination.
    Move {
        /// Destination position.
        dest: Vec2,
    },
    /// Assault a target unit through approach, suppression, and melee.
    Assault {
        /// Unit to assault.
        target: UnitId,
    },
    /// Withdraw in good order (synthesized by a failed advance gate).
    Retreat {
        /// Withdrawal destination.
        dest: Vec2,
    },
    /// Flee broken (synthesized by a failed final-assault gate).
    Rout {
        /// Flight destination.
        dest: Vec2,
    },
    /// Attempt to recover from a rout in place.
    Rally,
    /// Hold in place and shed suppression.
    Rest {
        /// Number of turns to hold.
        turns: u32,
    },
}

impl PlanKind {
    /// Short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            PlanKind::Move { .. } => "move",
            PlanKind::Assault { .. } => "assault",
            PlanKind::Retreat { .. } => "retreat",
            PlanKind::Rout { .. } => "rout",
            PlanKind::Rally => "rally",
            PlanKind::Rest { .. } => "rest",
        }
    }
}

/// A queued order for a single unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Unique identity.
    pub id: PlanId,
    /// Unit this plan is addressed to.
    pub unit: UnitId,
    /// The order itself.
    pub kind: PlanKind,
}

impl Plan {
    /// Create a plan.
    #[must_use]
    pub const fn new(id: PlanId, unit: UnitId, kind: PlanKind) -> Self {
        Self { id, unit, kind }
    }
}

/// Shared allocator for plan identities.
///
/// Cloned into the network layer and the simulation context so
/// player-submitted and morale-synthesized plans draw from one sequence
/// without ambient globals.
#[derive(Debug, Clone)]
pub struct PlanIds {
    next: Arc<AtomicU64>,
}

impl PlanIds {
    /// Create an allocator starting at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Allocate the next plan identity.
    #[must_use]
    pub fn next_id(&self) -> PlanId {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for PlanIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe inbound FIFO of player-submitted plans.
///
/// The sole concurrency boundary of the scheduler: network threads
/// [`submit`](Self::submit) into it, the scheduler [`drain`](Self::drain)s
/// it once per turn. The lock is held only for a push or a swap, so the
/// drain never stalls the tick loop.
#[derive(Debug, Clone, Default)]
pub struct PlanQueue {
    inner: Arc<Mutex<VecDeque<Plan>>>,
}

impl PlanQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a plan. Called from producer threads.
    pub fn submit(&self, plan: Plan) {
        self.lock().push_back(plan);
    }

    /// Take every queued plan, preserving submission order.
    #[must_use]
    pub fn drain(&self) -> Vec<Plan> {
        std::mem::take(&mut *self.lock()).into()
    }

    /// Number of plans currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Plan>> {
        // A poisoned queue still holds valid plans; recover the guard.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
