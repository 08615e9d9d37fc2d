//! Autonomous AI subsystems.
//!
//! A fixed, ordered list of independent modules runs after all executors
//! have stepped for the turn. Each module decides its own readiness (a
//! cadence or state predicate) and appends actions to one shared output
//! list, which the scheduler dispatches once per harness pass. Later
//! modules observe state already mutated earlier in the same pass.

mod melee;
mod recovery;
mod roster;
mod targeting;

pub use melee::MeleeResolution;
pub use recovery::{MoraleDecay, RallyModule, RestModule};
pub use roster::{DestroyedCleanup, ReinforcementArrivals};
pub use targeting::{LineOfSight, TargetAssignment, TargetClearing};

use crate::action::Action;
use crate::clock::GameClock;
use crate::context::TickCtx;
use crate::error::Result;
use crate::world::World;

/// One autonomous subsystem of the AI pipeline.
pub trait AiModule: Send {
    /// Module name, for logging.
    fn name(&self) -> &'static str;

    /// Whether the module should run this turn.
    fn ready(&self, clock: &GameClock, world: &World) -> bool;

    /// Run the module, appending any produced actions to `out`.
    ///
    /// # Errors
    ///
    /// A failing module is logged and skipped by the scheduler; its error
    /// never stops the turn.
    fn execute(&mut self, ctx: &mut TickCtx<'_>, out: &mut Vec<Action>) -> Result<()>;
}

/// The standard pipeline, in its fixed execution order.
#[must_use]
pub fn standard_modules() -> Vec<Box<dyn AiModule>> {
    vec![
        Box::new(TargetAssignment),
        Box::new(TargetClearing),
        Box::new(MeleeResolution),
        Box::new(RallyModule),
        Box::new(RestModule),
        Box::new(DestroyedCleanup),
        Box::new(MoraleDecay),
        Box::new(LineOfSight),
        Box::new(ReinforcementArrivals),
    ]
}
