//! Turn-running harness, action filters, and determinism checks.

use skirmish_core::prelude::*;

use crate::fixtures::{recording_pair, RecordingConnection};

/// A scheduler wired to recording connections on both sides.
#[must_use]
pub fn recording_scheduler(
    world: World,
    config: GameConfig,
) -> (Scheduler, RecordingConnection, RecordingConnection) {
    let (dispatcher, red, blue) = recording_pair();
    let scheduler = Scheduler::new(world, SimContext::new(config), dispatcher);
    (scheduler, red, blue)
}

/// Run up to `turns` turns, stopping early when the game ends.
///
/// # Panics
///
/// Panics if a turn fails; harness games are expected to dispatch
/// cleanly.
pub fn run_turns(scheduler: &mut Scheduler, turns: usize) -> Vec<TurnReport> {
    let mut reports = Vec::with_capacity(turns);
    for _ in 0..turns {
        if scheduler.is_ended() {
            break;
        }
        reports.push(scheduler.run_turn().expect("turn failed"));
    }
    reports
}

/// Submit a move plan through the scheduler's inbox and return its id.
pub fn submit_move(scheduler: &Scheduler, unit: UnitId, dest: Vec2) -> PlanId {
    let id = scheduler.plan_ids().next_id();
    scheduler
        .inbox()
        .submit(Plan::new(id, unit, PlanKind::Move { dest }));
    id
}

/// Submit an assault plan through the scheduler's inbox and return its id.
pub fn submit_assault(scheduler: &Scheduler, unit: UnitId, target: UnitId) -> PlanId {
    let id = scheduler.plan_ids().next_id();
    scheduler
        .inbox()
        .submit(Plan::new(id, unit, PlanKind::Assault { target }));
    id
}

/// Wire positions a unit was observed at, in delivery order.
#[must_use]
pub fn moves_of(actions: &[Action], unit: UnitId) -> Vec<(i64, i64)> {
    actions
        .iter()
        .filter_map(|a| match a.kind {
            ActionKind::Move { unit: u, x, y } if u == unit => Some((x, y)),
            _ => None,
        })
        .collect()
}

/// Modes a unit was observed switching to, in delivery order.
#[must_use]
pub fn modes_of(actions: &[Action], unit: UnitId) -> Vec<UnitMode> {
    actions
        .iter()
        .filter_map(|a| match a.kind {
            ActionKind::SetMode { unit: u, mode } if u == unit => Some(mode),
            _ => None,
        })
        .collect()
}

/// The game-over outcome, if one was delivered.
#[must_use]
pub fn outcome_of(actions: &[Action]) -> Option<GameOutcome> {
    actions.iter().find_map(|a| match a.kind {
        ActionKind::GameOver { outcome } => Some(outcome),
        _ => None,
    })
}

/// Run the same setup twice for `turns` turns and compare state hashes.
///
/// Catches non-determinism from map iteration order or unseeded
/// randomness; identical inputs must replay to identical hashes.
pub fn replays_identically<F>(setup: F, turns: usize) -> bool
where
    F: Fn() -> Scheduler,
{
    let run = |mut scheduler: Scheduler| {
        let mut hashes = Vec::with_capacity(turns);
        for _ in 0..turns {
            if scheduler.is_ended() {
                break;
            }
            match scheduler.run_turn() {
                Ok(report) => hashes.push(report.state_hash),
                Err(_) => break,
            }
        }
        hashes
    };
    run(setup()) == run(setup())
}

/// Proptest strategies for scheduler inputs.
pub mod strategies {
    use proptest::prelude::*;
    use skirmish_core::prelude::*;

    /// A position on a typical map.
    pub fn arb_position() -> impl Strategy<Value = Vec2> {
        (-5000.0f64..5000.0, -5000.0f64..5000.0).prop_map(|(x, y)| Vec2::new(x, y))
    }

    /// Either side.
    pub fn arb_side() -> impl Strategy<Value = Side> {
        prop_oneof![Just(Side::Red), Just(Side::Blue)]
    }

    /// A plan kind that references no other unit.
    pub fn arb_standalone_plan_kind() -> impl Strategy<Value = PlanKind> {
        prop_oneof![
            arb_position().prop_map(|dest| PlanKind::Move { dest }),
            arb_position().prop_map(|dest| PlanKind::Retreat { dest }),
            arb_position().prop_map(|dest| PlanKind::Rout { dest }),
            Just(PlanKind::Rally),
            (1u32..10).prop_map(|turns| PlanKind::Rest { turns }),
        ]
    }

    /// A base morale level that can plausibly pass or fail gates.
    pub fn arb_morale_base() -> impl Strategy<Value = f64> {
        20.0f64..100.0
    }
}
