//! End-to-end properties of the turn loop, driven through the public
//! scheduler surface the server wires up.

use skirmish_core::prelude::*;
use skirmish_test_utils::fixtures::{
    facing_pair, prompt_unit, FailingConnection, NullConnection, ScriptedMorale,
};
use skirmish_test_utils::harness::{
    modes_of, moves_of, recording_scheduler, run_turns, submit_assault, submit_move,
};

fn solo_world() -> World {
    let mut world = World::new();
    world.insert(prompt_unit(1, Side::Red, 0.0, 0.0));
    world.insert(prompt_unit(2, Side::Blue, 5000.0, 0.0).with_facing(180.0));
    world
}

#[test]
fn test_one_executor_per_unit_with_queued_backlog() {
    let (mut scheduler, _, _) = recording_scheduler(solo_world(), GameConfig::default());
    submit_move(&scheduler, 1, Vec2::new(100.0, 0.0));
    submit_move(&scheduler, 1, Vec2::new(0.0, 100.0));
    submit_move(&scheduler, 1, Vec2::new(100.0, 100.0));

    run_turns(&mut scheduler, 3);

    // Three plans queued, exactly one executor.
    assert!(scheduler.world().get(1).unwrap().plans.len() >= 2);
    assert_eq!(scheduler.executors().len(), 1);
    assert!(scheduler.executors().is_executing(1));
}

#[test]
fn test_cancelled_executor_removed_then_replaced_next_turn() {
    let (mut scheduler, _, _) = recording_scheduler(solo_world(), GameConfig::default());
    let first = submit_move(&scheduler, 1, Vec2::new(1000.0, 0.0));
    submit_move(&scheduler, 1, Vec2::new(0.0, 1000.0));

    run_turns(&mut scheduler, 2);
    assert!(scheduler.executors().is_executing(1));

    // Pull the active plan out from under its executor.
    scheduler.world_mut().get_mut(1).unwrap().remove_plan(first);

    // The stale executor is dropped and not replaced in the same turn.
    run_turns(&mut scheduler, 1);
    assert!(!scheduler.executors().is_executing(1));

    // The next queued plan gets its executor one turn later.
    run_turns(&mut scheduler, 1);
    assert!(scheduler.executors().is_executing(1));
}

#[test]
fn test_finished_executor_is_never_stepped_again() {
    let (mut scheduler, red, _) = recording_scheduler(solo_world(), GameConfig::default());
    submit_move(&scheduler, 1, Vec2::new(30.0, 0.0));

    run_turns(&mut scheduler, 10);
    assert!(scheduler.world().get(1).unwrap().is_idle());
    assert!(!scheduler.executors().is_executing(1));

    let moves_before = moves_of(&red.seen(), 1).len();
    run_turns(&mut scheduler, 5);
    assert_eq!(moves_of(&red.seen(), 1).len(), moves_before);
    assert!(!scheduler.executors().is_executing(1));
}

#[test]
fn test_drain_appends_in_submission_order() {
    let (mut scheduler, _, _) = recording_scheduler(solo_world(), GameConfig::default());
    let a = submit_move(&scheduler, 1, Vec2::new(100.0, 0.0));
    let b = submit_move(&scheduler, 1, Vec2::new(200.0, 0.0));
    let c = submit_move(&scheduler, 1, Vec2::new(300.0, 0.0));

    run_turns(&mut scheduler, 1);

    let ids: Vec<_> = scheduler
        .world()
        .get(1)
        .unwrap()
        .plans
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![a, b, c]);
}

#[test]
fn test_failed_advance_gate_installs_one_retreat_plan() {
    // Attacker inside firing range but outside the melee-engage
    // threshold, every morale check scripted to fail.
    let mut world = World::new();
    world.insert(prompt_unit(1, Side::Red, 0.0, 0.0));
    world.insert(prompt_unit(2, Side::Blue, 150.0, 0.0).with_facing(180.0));

    let (mut scheduler, _, _) = recording_scheduler(world, GameConfig::default());
    scheduler = scheduler.with_morale(Box::new(ScriptedMorale::always(false)));
    submit_assault(&scheduler, 1, 2);

    let mut broke_off = false;
    for _ in 0..10 {
        run_turns(&mut scheduler, 1);
        let unit = scheduler.world().get(1).unwrap();
        if let Some(plan) = unit.plans.front() {
            if let PlanKind::Retreat { dest } = plan.kind {
                assert_eq!(unit.plans.len(), 1);
                let distance = unit.pos.distance(dest);
                assert!(
                    (distance - 200.0).abs() < 1e-6,
                    "retreat distance was {distance}"
                );
                // Facing 0 degrees, so the withdrawal runs along -X.
                assert!(dest.x < unit.pos.x);
                broke_off = true;
                break;
            }
        }
    }
    assert!(broke_off, "advance gate never broke the assault off");
}

#[test]
fn test_close_combat_clears_both_queues_and_sets_melee() {
    let mut world = World::new();
    world.insert(prompt_unit(1, Side::Red, 0.0, 0.0));
    world.insert(prompt_unit(2, Side::Blue, 15.0, 0.0).with_facing(180.0));

    let (mut scheduler, _, blue) = recording_scheduler(world, GameConfig::default());
    scheduler = scheduler.with_morale(Box::new(ScriptedMorale::always(true)));
    submit_assault(&scheduler, 1, 2);
    // A queued order on the defender, to show the transition clears it.
    let inbox = scheduler.inbox();
    inbox.submit(Plan::new(
        scheduler.plan_ids().next_id(),
        2,
        PlanKind::Rest { turns: 5 },
    ));

    for _ in 0..10 {
        run_turns(&mut scheduler, 1);
        if scheduler.world().get(1).unwrap().mode == UnitMode::Melee {
            break;
        }
    }

    let world = scheduler.world();
    assert_eq!(world.get(1).unwrap().mode, UnitMode::Melee);
    assert_eq!(world.get(2).unwrap().mode, UnitMode::Melee);
    assert!(world.get(1).unwrap().is_idle());
    assert!(world.get(2).unwrap().is_idle());

    // The defender observed both mode flips.
    let modes = modes_of(&blue.seen(), 2);
    assert!(modes.contains(&UnitMode::Melee));
}

#[test]
fn test_long_assault_approach_is_monotonic_then_melee() {
    let (mut scheduler, red, _) = recording_scheduler(facing_pair(1000.0), GameConfig::default());
    scheduler = scheduler.with_morale(Box::new(ScriptedMorale::always(true)));
    submit_assault(&scheduler, 1, 2);

    for _ in 0..400 {
        run_turns(&mut scheduler, 1);
        if scheduler.world().get(1).unwrap().mode == UnitMode::Melee {
            break;
        }
    }

    // Every observed move closed on the defender's position; the
    // tolerance absorbs wire quantization.
    let target = Vec2::new(1000.0, 0.0);
    let mut last = f64::INFINITY;
    let moves = moves_of(&red.seen(), 1);
    assert!(!moves.is_empty());
    #[allow(clippy::cast_precision_loss)]
    for (x, y) in moves {
        let dist = Vec2::new(x as f64, y as f64).distance(target);
        assert!(dist <= last + 1.5, "move opened the distance: {dist}");
        last = dist;
    }

    assert_eq!(scheduler.world().get(1).unwrap().mode, UnitMode::Melee);
    assert_eq!(scheduler.world().get(2).unwrap().mode, UnitMode::Melee);
    assert!(modes_of(&red.seen(), 1).contains(&UnitMode::Melee));
    assert!(modes_of(&red.seen(), 2).contains(&UnitMode::Melee));
}

#[test]
fn test_plan_for_unknown_unit_is_dropped_silently() {
    let (mut scheduler, _, _) = recording_scheduler(solo_world(), GameConfig::default());
    submit_move(&scheduler, 99, Vec2::new(100.0, 0.0));

    let reports = run_turns(&mut scheduler, 1);
    assert_eq!(reports[0].plans_accepted, 0);
    assert!(scheduler.executors().is_empty());
    assert!(!scheduler.is_ended());
}

#[test]
fn test_dispatch_failure_ends_the_game() {
    let dispatcher = ActionDispatcher::new(SessionRegistry::new(
        Box::new(FailingConnection),
        Box::new(NullConnection),
    ));
    let mut scheduler = Scheduler::new(
        solo_world(),
        SimContext::new(GameConfig::default()),
        dispatcher,
    );

    // The close-phase time advance is undeliverable.
    let err = scheduler.run_turn().unwrap_err();
    assert!(err.is_fatal());
    assert!(scheduler.is_ended());
    assert_eq!(scheduler.outcome(), Some(GameOutcome::Aborted));

    // The loop refuses to continue a dead game.
    let err = scheduler.run_turn().unwrap_err();
    assert!(!err.is_fatal());
}

#[test]
fn test_full_game_replays_to_identical_hashes() {
    let play = || {
        let (scheduler, _, _) = recording_scheduler(
            facing_pair(1000.0),
            GameConfig {
                turn_limit: Some(300),
                ..GameConfig::default()
            },
        );
        submit_assault(&scheduler, 1, 2);
        scheduler
    };
    assert!(skirmish_test_utils::harness::replays_identically(play, 300));
}
