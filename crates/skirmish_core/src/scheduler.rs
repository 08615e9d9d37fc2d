//! The turn scheduler.
//!
//! One [`run_turn`](Scheduler::run_turn) call advances the whole game by
//! one turn, in fixed phase order:
//!
//! 1. drain the inbound plan queue into unit plan queues,
//! 2. step every unit's executor (creating, delaying, cancelling, and
//!    finishing them as the lifecycle demands),
//! 3. run the AI module pipeline,
//! 4. sweep executors orphaned by unit removal,
//! 5. advance the clock and evaluate end conditions.
//!
//! Each phase's actions are dispatched as one ordered batch before the
//! next phase runs. The scheduler is single-threaded; the plan queue is
//! its only concurrency boundary.

use std::collections::{HashMap, HashSet};

use tracing::{debug, error, info, warn};

use crate::action::{Action, ActionKind, GameOutcome};
use crate::ai::{standard_modules, AiModule};
use crate::context::{SimContext, TickCtx};
use crate::dispatch::ActionDispatcher;
use crate::error::{GameError, Result};
use crate::executor::{PlanExecutor, Progress};
use crate::morale::MoraleCheck;
use crate::plan::PlanQueue;
use crate::units::{Side, UnitId};
use crate::world::World;

/// Builds a [`TickCtx`] from disjoint scheduler fields without borrowing
/// the executor table or module list.
macro_rules! tick_ctx {
    ($self:ident) => {
        TickCtx {
            world: &mut $self.world,
            clock: &$self.ctx.clock,
            config: &$self.ctx.config,
            morale: $self.ctx.morale.as_mut(),
            plan_ids: &$self.ctx.plan_ids,
        }
    };
}

/// One unit's active executor plus its remaining start delay.
#[derive(Debug)]
struct ExecutorSlot {
    executor: PlanExecutor,
    /// Remaining delay before the first step, in milliseconds.
    delay_ms: u64,
}

/// At most one executor per unit, keyed by unit identity.
#[derive(Debug, Default)]
pub struct ExecutorTable {
    slots: HashMap<UnitId, ExecutorSlot>,
}

impl ExecutorTable {
    /// Number of live executors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no executor is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether a unit currently has an executor.
    #[must_use]
    pub fn is_executing(&self, unit: UnitId) -> bool {
        self.slots.contains_key(&unit)
    }
}

/// Summary of one completed turn, for callers that log or assert on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnReport {
    /// Turn number this report describes (pre-advance numbering).
    pub turn: u64,
    /// Plans accepted from the inbound queue.
    pub plans_accepted: usize,
    /// Executors stepped this turn.
    pub executors_stepped: usize,
    /// Actions delivered to sessions.
    pub actions_dispatched: usize,
    /// Hash of the authoritative state after the turn.
    pub state_hash: u64,
}

/// The authoritative game loop.
pub struct Scheduler {
    world: World,
    ctx: SimContext,
    inbox: PlanQueue,
    executors: ExecutorTable,
    modules: Vec<Box<dyn AiModule>>,
    dispatcher: ActionDispatcher,
    ended: bool,
    outcome: Option<GameOutcome>,
}

impl Scheduler {
    /// Create a scheduler over a prepared world with the standard AI
    /// pipeline.
    #[must_use]
    pub fn new(world: World, ctx: SimContext, dispatcher: ActionDispatcher) -> Self {
        Self {
            world,
            ctx,
            inbox: PlanQueue::new(),
            executors: ExecutorTable::default(),
            modules: standard_modules(),
            dispatcher,
            ended: false,
            outcome: None,
        }
    }

    /// Replace the morale implementation (tests script outcomes this way).
    #[must_use]
    pub fn with_morale(mut self, morale: Box<dyn MoraleCheck>) -> Self {
        self.ctx.morale = morale;
        self
    }

    /// Replace the AI pipeline.
    #[must_use]
    pub fn with_modules(mut self, modules: Vec<Box<dyn AiModule>>) -> Self {
        self.modules = modules;
        self
    }

    /// A cloneable handle for submitting plans from other threads.
    #[must_use]
    pub fn inbox(&self) -> PlanQueue {
        self.inbox.clone()
    }

    /// The shared plan identity allocator.
    #[must_use]
    pub fn plan_ids(&self) -> crate::plan::PlanIds {
        self.ctx.plan_ids.clone()
    }

    /// The unit store.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the unit store, for setup and tests.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The world clock.
    #[must_use]
    pub fn clock(&self) -> &crate::clock::GameClock {
        &self.ctx.clock
    }

    /// The executor table.
    #[must_use]
    pub fn executors(&self) -> &ExecutorTable {
        &self.executors
    }

    /// Whether the game has ended.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// How the game ended, once it has.
    #[must_use]
    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    /// Advance the game by one turn.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Dispatch`] when action delivery fails; the
    /// game is then marked ended with [`GameOutcome::Aborted`]. Calling
    /// after the game has ended yields [`GameError::InvalidState`].
    pub fn run_turn(&mut self) -> Result<TurnReport> {
        if self.ended {
            return Err(GameError::InvalidState("game already ended".to_string()));
        }
        let turn = self.ctx.clock.turn;
        let mut actions = Vec::new();
        let mut dispatched = 0;

        let plans_accepted = self.drain_phase(&mut actions);
        dispatched += self.flush(&mut actions)?;

        let executors_stepped = self.executor_phase(&mut actions);
        dispatched += self.flush(&mut actions)?;

        self.ai_phase(&mut actions);
        self.gc_executors();
        self.close_phase(&mut actions);
        dispatched += self.flush(&mut actions)?;

        debug!(
            turn,
            plans_accepted, executors_stepped, dispatched, "turn complete"
        );
        Ok(TurnReport {
            turn,
            plans_accepted,
            executors_stepped,
            actions_dispatched: dispatched,
            state_hash: self.world.state_hash(),
        })
    }

    /// Run turns until the game ends.
    ///
    /// # Errors
    ///
    /// Propagates the fatal dispatch error if delivery fails mid-game.
    pub fn run(&mut self) -> Result<GameOutcome> {
        while !self.ended {
            self.run_turn()?;
        }
        Ok(self.outcome.unwrap_or(GameOutcome::Aborted))
    }

    /// Phase 1: move inbound plans onto their unit queues.
    fn drain_phase(&mut self, actions: &mut Vec<Action>) -> usize {
        let mut accepted = 0;
        for plan in self.inbox.drain() {
            match self.world.get_mut(plan.unit) {
                Some(unit) if unit.alive => {
                    let side = unit.side;
                    let unit_id = plan.unit;
                    let plan_id = plan.id;
                    debug!(
                        unit = unit_id,
                        plan = plan_id,
                        kind = plan.kind.name(),
                        "plan accepted"
                    );
                    unit.push_plan(plan);
                    accepted += 1;
                    actions.push(Action::for_side(
                        side,
                        ActionKind::PlanAdded {
                            unit: unit_id,
                            plan: plan_id,
                        },
                    ));
                }
                _ => {
                    warn!(
                        unit = plan.unit,
                        plan = plan.id,
                        "dropped plan for unknown or dead unit"
                    );
                }
            }
        }
        accepted
    }

    /// Phase 2: advance every unit's executor through its lifecycle.
    ///
    /// Per unit, in sorted-id order: a stale executor (its plan is no
    /// longer the queue head) is cancelled and not replaced until next
    /// turn; a unit with a head plan and no executor gets one, delayed by
    /// its action delay and not stepped in its creation turn; an existing
    /// executor waits out its delay, then steps every turn until it
    /// finishes and pops its plan.
    fn executor_phase(&mut self, actions: &mut Vec<Action>) -> usize {
        let turn_ms = self.ctx.clock.turn_ms;
        let mut cancelled: HashSet<UnitId> = HashSet::new();
        let mut stepped = 0;

        for id in self.world.sorted_ids() {
            if let Some(slot) = self.executors.slots.get(&id) {
                let plan_id = slot.executor.plan_id();
                let valid = self.world.get(id).is_some_and(|u| {
                    u.alive && u.plans.front().is_some_and(|p| p.id == plan_id)
                });
                if !valid {
                    let slot = self.executors.slots.remove(&id);
                    if let Some(slot) = slot {
                        debug!(
                            unit = id,
                            plan = plan_id,
                            kind = slot.executor.kind_name(),
                            "executor cancelled"
                        );
                    }
                    cancelled.insert(id);
                    continue;
                }
            }

            if !self.executors.slots.contains_key(&id) {
                if cancelled.contains(&id) {
                    continue;
                }
                let head = self
                    .world
                    .get(id)
                    .filter(|u| u.alive)
                    .and_then(|u| u.plans.front().cloned().map(|p| (p, u.action_delay_ms)));
                if let Some((plan, delay_ms)) = head {
                    debug!(
                        unit = id,
                        plan = plan.id,
                        kind = plan.kind.name(),
                        delay_ms,
                        "executor created"
                    );
                    let executor = PlanExecutor::for_plan(&plan, &self.world);
                    self.executors
                        .slots
                        .insert(id, ExecutorSlot { executor, delay_ms });
                }
                // Freshly created executors first step next turn.
                continue;
            }

            if let Some(slot) = self.executors.slots.get_mut(&id) {
                if slot.delay_ms > 0 {
                    slot.delay_ms = slot.delay_ms.saturating_sub(turn_ms);
                    if slot.delay_ms > 0 {
                        continue;
                    }
                }
            }

            // Step with the slot taken out so the executor can borrow the
            // world freely.
            let Some(mut slot) = self.executors.slots.remove(&id) else {
                continue;
            };
            let mut ctx = tick_ctx!(self);
            let (progress, mut step_actions) = slot.executor.step(&mut ctx);
            stepped += 1;
            actions.append(&mut step_actions);

            match progress {
                Progress::Finished => {
                    let plan_id = slot.executor.plan_id();
                    debug!(
                        unit = id,
                        plan = plan_id,
                        kind = slot.executor.kind_name(),
                        "executor finished"
                    );
                    if let Some(unit) = self.world.get_mut(id) {
                        unit.remove_plan(plan_id);
                    }
                }
                Progress::Continuing => {
                    self.executors.slots.insert(id, slot);
                }
            }
        }
        stepped
    }

    /// Phase 3: the AI module pipeline, in fixed order.
    fn ai_phase(&mut self, actions: &mut Vec<Action>) {
        let mut modules = std::mem::take(&mut self.modules);
        for module in &mut modules {
            if !module.ready(&self.ctx.clock, &self.world) {
                continue;
            }
            let mut ctx = tick_ctx!(self);
            if let Err(err) = module.execute(&mut ctx, actions) {
                warn!(module = module.name(), error = %err, "AI module failed, skipping");
            }
        }
        self.modules = modules;
    }

    /// Phase 4: drop executors whose unit left the store or died.
    ///
    /// The executor phase only visits units still in the store, so a unit
    /// removed while its executor is live (cleanup sweep, external
    /// mutation) would otherwise leave an orphaned slot behind.
    fn gc_executors(&mut self) {
        let world = &self.world;
        self.executors.slots.retain(|id, slot| {
            let live = world.is_live(*id);
            if !live {
                debug!(
                    unit = id,
                    kind = slot.executor.kind_name(),
                    "executor swept with its unit"
                );
            }
            live
        });
    }

    /// Phase 5: advance the clock, announce it, and evaluate end
    /// conditions.
    fn close_phase(&mut self, actions: &mut Vec<Action>) {
        self.ctx.clock.advance();
        actions.push(Action::broadcast(ActionKind::TimeAdvance {
            turn: self.ctx.clock.turn,
            clock_ms: self.ctx.clock.elapsed_ms,
        }));

        if let Some(outcome) = self.end_condition() {
            self.ended = true;
            self.outcome = Some(outcome);
            info!(?outcome, turn = self.ctx.clock.turn, "game over");
            actions.push(Action::broadcast(ActionKind::GameOver { outcome }));
        }
    }

    fn end_condition(&self) -> Option<GameOutcome> {
        let red_out = self.world.side_eliminated(Side::Red);
        let blue_out = self.world.side_eliminated(Side::Blue);
        if red_out && blue_out {
            return Some(GameOutcome::Draw);
        }
        if red_out {
            return Some(GameOutcome::Victory(Side::Blue));
        }
        if blue_out {
            return Some(GameOutcome::Victory(Side::Red));
        }
        if self
            .ctx
            .config
            .turn_limit
            .is_some_and(|limit| self.ctx.clock.turn >= limit)
        {
            return Some(GameOutcome::TurnLimit);
        }
        None
    }

    /// Dispatch a phase's batch, converting a delivery failure into the
    /// fatal game abort.
    fn flush(&mut self, actions: &mut Vec<Action>) -> Result<usize> {
        let batch = std::mem::take(actions);
        match self.dispatcher.dispatch_all(&batch) {
            Ok(count) => Ok(count),
            Err(err) => {
                self.ended = true;
                self.outcome = Some(GameOutcome::Aborted);
                error!(error = %err, "action dispatch failed, aborting game");
                Err(GameError::Dispatch(err))
            }
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("clock", &self.ctx.clock)
            .field("units", &self.world.len())
            .field("executors", &self.executors.len())
            .field("ended", &self.ended)
            .finish_non_exhaustive()
    }
}
