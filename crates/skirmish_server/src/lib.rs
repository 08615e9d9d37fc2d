//! Headless dedicated skirmish server.
//!
//! Wraps `skirmish_core`'s scheduler in everything a standalone server
//! process needs: RON scenario files describing the initial world,
//! loopback [`Connection`](skirmish_core::dispatch::Connection) adapters
//! for observing the action stream, and a wall-clock game runner. Real
//! network transports implement the same connection trait elsewhere.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod runner;
pub mod scenario;
pub mod sessions;

pub use runner::{GameRunner, RunSummary};
pub use scenario::{PlanSetup, ReinforcementSetup, Scenario, ScenarioError, UnitSetup};
pub use sessions::{silent_dispatcher, JsonLinesConnection, SilentConnection};
