//! Authoritative turn scheduler for a two-sided skirmish simulation.
//!
//! The crate owns the full server-side game loop: players submit
//! [`Plan`](plan::Plan)s through a shared [`PlanQueue`](plan::PlanQueue),
//! the [`Scheduler`](scheduler::Scheduler) advances the world one turn at
//! a time, per-unit [executors](executor) carry orders out over many
//! turns, and a fixed pipeline of [AI modules](ai) runs the autonomous
//! behaviors. Every observable effect leaves the loop as an
//! [`Action`](action::Action) delivered through the
//! [`ActionDispatcher`](dispatch::ActionDispatcher).
//!
//! Determinism is a design constraint: unit iteration is in sorted-id
//! order, the morale RNG is seeded from configuration, and identical
//! inputs replay to identical [`state_hash`](world::World::state_hash)
//! values.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::float_cmp)]

pub mod action;
pub mod ai;
pub mod clock;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod geometry;
pub mod morale;
pub mod plan;
pub mod scheduler;
pub mod units;
pub mod world;

/// Commonly used types, re-exported for downstream crates.
pub mod prelude {
    pub use crate::action::{Action, ActionKind, GameOutcome, Recipient};
    pub use crate::ai::{standard_modules, AiModule};
    pub use crate::clock::GameClock;
    pub use crate::config::GameConfig;
    pub use crate::context::{SimContext, TickCtx};
    pub use crate::dispatch::{ActionDispatcher, Connection, SessionRegistry};
    pub use crate::error::{DispatchError, GameError, Result, SessionError};
    pub use crate::geometry::Vec2;
    pub use crate::morale::{CheckLevel, MoraleCheck, MoraleModel, MoraleState};
    pub use crate::plan::{Plan, PlanId, PlanIds, PlanKind, PlanQueue};
    pub use crate::scheduler::{Scheduler, TurnReport};
    pub use crate::units::{CadenceStep, Side, Unit, UnitId, UnitMode};
    pub use crate::world::{Reinforcement, World};
}
