#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turn scheduler that drives agents against the world.
//!
//! Agents move strictly one at a time in round-robin order. Each turn the
//! active agent observes the current snapshot and proposes a move, both under
//! the agent's [`TimeBudget`]. The move is validated and applied by
//! [`maze_chase_world::apply_action`], the display is updated and the rules
//! decide whether the game continues. Any agent fault ends the game with a
//! crash attributed to that agent.

use std::{
    fmt,
    sync::{Arc, Mutex},
    time::Duration,
};

use maze_chase_core::{AgentIndex, Direction, MoveRecord};
use maze_chase_world::{apply_action, query, TransitionError, WorldState};
use tracing::{debug, error, info, warn};

mod budget;
mod capture;
mod collaborators;
mod error;
mod invoke;
mod replay;

pub use budget::TimeBudget;
pub use capture::{CaptureWriter, OutputCapture};
pub use collaborators::{Agent, GameDisplay, NullDisplay, Rules, Verdict};
pub use error::{AgentFault, BudgetKind, Hook, SchedulerError};
pub use replay::ScriptedAgent;

use budget::AgentClock;
use invoke::{Isolation, SharedAgent};

/// How the scheduler treats a move that is not currently possible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IllegalActionPolicy {
    /// The agent crashes.
    #[default]
    Strict,
    /// The agent stops instead, or keeps its heading when it cannot stop.
    Lenient,
}

/// Scheduler settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    starting_index: AgentIndex,
    mute_agents: bool,
    fault_tolerant: bool,
    illegal_actions: IllegalActionPolicy,
}

impl SchedulerConfig {
    /// Fault-tolerant, strict configuration where agent 0 moves first.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            starting_index: AgentIndex::CONTROLLED,
            mute_agents: false,
            fault_tolerant: true,
            illegal_actions: IllegalActionPolicy::Strict,
        }
    }

    /// Sets the agent that takes the first turn.
    #[must_use]
    pub const fn with_starting_index(mut self, index: AgentIndex) -> Self {
        self.starting_index = index;
        self
    }

    /// Captures agent diagnostics into per-agent buffers.
    #[must_use]
    pub const fn with_mute_agents(mut self, mute: bool) -> Self {
        self.mute_agents = mute;
        self
    }

    /// Disabling fault tolerance runs hooks inline without time budgets and
    /// returns agent faults to the caller.
    #[must_use]
    pub const fn with_fault_tolerant(mut self, fault_tolerant: bool) -> Self {
        self.fault_tolerant = fault_tolerant;
        self
    }

    /// Sets the policy for impossible moves.
    #[must_use]
    pub const fn with_illegal_actions(mut self, policy: IllegalActionPolicy) -> Self {
        self.illegal_actions = policy;
        self
    }

    /// Agent that takes the first turn.
    #[must_use]
    pub const fn starting_index(&self) -> AgentIndex {
        self.starting_index
    }

    /// Whether agent diagnostics are captured.
    #[must_use]
    pub const fn mute_agents(&self) -> bool {
        self.mute_agents
    }

    /// Whether agent faults are contained.
    #[must_use]
    pub const fn fault_tolerant(&self) -> bool {
        self.fault_tolerant
    }

    /// Policy for impossible moves.
    #[must_use]
    pub const fn illegal_actions(&self) -> IllegalActionPolicy {
        self.illegal_actions
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle of a scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Not started yet.
    Idle,
    /// Agents are registering or taking turns.
    Running,
    /// The rules ended the game.
    Finished,
    /// An agent fault ended the game.
    Crashed {
        /// Agent the crash is attributed to.
        agent: AgentIndex,
    },
}

/// Read-only counters handed to the rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameProgress {
    agent_count: usize,
    moves: u64,
    cycles: u64,
    last_mover: Option<AgentIndex>,
}

impl GameProgress {
    /// Number of agents in the game.
    #[must_use]
    pub const fn agent_count(&self) -> usize {
        self.agent_count
    }

    /// Transitions applied so far.
    #[must_use]
    pub const fn moves(&self) -> u64 {
        self.moves
    }

    /// Completed rounds, counted when the highest agent index moves.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Agent whose move was applied last.
    #[must_use]
    pub const fn last_mover(&self) -> Option<AgentIndex> {
        self.last_mover
    }
}

/// Per-agent bookkeeping reported at the end of a game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentReport {
    /// Agent slot.
    pub index: AgentIndex,
    /// Observation and action time accumulated over all turns.
    pub think_time: Duration,
    /// Turns that ran past the warning threshold.
    pub warnings: u32,
    /// Diagnostics captured while the agent was muted.
    pub output: String,
}

/// Result of a completed or crashed game.
#[derive(Clone, Debug)]
pub struct GameOutcome {
    /// Terminal phase, either finished or crashed.
    pub status: Phase,
    /// Last successfully applied snapshot.
    pub final_state: Arc<WorldState>,
    /// Score of the final snapshot.
    pub score: i64,
    /// Completed rounds.
    pub cycles: u64,
    /// Applied moves in transition order.
    pub history: Vec<MoveRecord>,
    /// Per-agent bookkeeping in slot order.
    pub agents: Vec<AgentReport>,
    /// Fault that crashed the game, if any.
    pub crash: Option<AgentFault>,
    /// Agents whose finalization hook failed.
    pub finalization_failures: Vec<(AgentIndex, AgentFault)>,
    /// Whether the crash was caused by the clock.
    pub timed_out: bool,
}

struct AgentSlot {
    agent: SharedAgent,
    clock: AgentClock,
    capture: OutputCapture,
    budget: TimeBudget,
}

impl fmt::Debug for AgentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSlot")
            .field("clock", &self.clock)
            .field("budget", &self.budget)
            .finish_non_exhaustive()
    }
}

/// Round-robin game loop over a set of agents.
#[derive(Debug)]
pub struct Scheduler<R, D> {
    rules: R,
    display: D,
    agents: Vec<AgentSlot>,
    config: SchedulerConfig,
    phase: Phase,
    state: Option<Arc<WorldState>>,
    history: Vec<MoveRecord>,
    moves: u64,
    cycles: u64,
}

impl<R: Rules, D: GameDisplay> Scheduler<R, D> {
    /// Creates a scheduler; agent `i` occupies slot `i` of the snapshot.
    pub fn new(rules: R, display: D, agents: Vec<Box<dyn Agent>>, config: SchedulerConfig) -> Self {
        let agents = agents
            .into_iter()
            .map(|agent| AgentSlot {
                agent: Arc::new(Mutex::new(agent)),
                clock: AgentClock::default(),
                capture: OutputCapture::default(),
                budget: TimeBudget::unlimited(),
            })
            .collect();
        Self {
            rules,
            display,
            agents,
            config,
            phase: Phase::Idle,
            state: None,
            history: Vec::new(),
            moves: 0,
            cycles: 0,
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Latest snapshot, once the game has started.
    #[must_use]
    pub fn state(&self) -> Option<&Arc<WorldState>> {
        self.state.as_ref()
    }

    /// Moves applied so far.
    #[must_use]
    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    /// Completed rounds.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Rules collaborator.
    #[must_use]
    pub const fn rules(&self) -> &R {
        &self.rules
    }

    /// Display collaborator.
    #[must_use]
    pub const fn display(&self) -> &D {
        &self.display
    }

    /// Fraction of the game played: 1 once the game is over, otherwise the
    /// rules' estimate.
    #[must_use]
    pub fn progress(&self) -> f32 {
        match (self.phase, &self.state) {
            (Phase::Finished | Phase::Crashed { .. }, _) => 1.0,
            (_, Some(state)) => self.rules.progress(state, &self.counters()),
            (_, None) => 0.0,
        }
    }

    /// Plays the game to completion.
    ///
    /// In fault-tolerant mode agent faults end the game with a crash outcome.
    /// Otherwise they are returned as [`SchedulerError::Agent`].
    pub fn run(&mut self) -> Result<GameOutcome, SchedulerError> {
        if self.phase != Phase::Idle {
            return Err(SchedulerError::AlreadyRun);
        }
        let agent_count = self.agents.len();
        if self.config.starting_index.get() >= agent_count {
            return Err(SchedulerError::InvalidStartingIndex {
                index: self.config.starting_index,
                agent_count,
            });
        }

        let initial = self
            .rules
            .new_game(agent_count)
            .map_err(SchedulerError::NewGame)?;
        if initial.agent_count() != agent_count {
            return Err(SchedulerError::AgentCountMismatch {
                snapshot: initial.agent_count(),
                registered: agent_count,
            });
        }
        for (index, slot) in self.agents.iter_mut().enumerate() {
            slot.budget = self.rules.time_budget(AgentIndex::new(index));
        }

        let mut state = Arc::new(initial);
        self.state = Some(Arc::clone(&state));
        self.phase = Phase::Running;
        self.display.initialize(&state);
        info!(agents = agent_count, "game started");

        for index in 0..agent_count {
            let snapshot = Arc::clone(&state);
            let limit = self.budget(index).max_startup_time();
            let registered = self.call(index, Hook::Registration, limit, move |agent| {
                agent.register_initial_state(&snapshot)
            });
            if let Err(fault) = registered {
                return self.crash(index, fault, &state);
            }
        }

        let mut index = self.config.starting_index.get();
        loop {
            let direction = match self.take_turn(index, &state) {
                Ok(direction) => direction,
                Err(fault) => return self.crash(index, fault, &state),
            };
            let (next, applied) = match self.transition(index, &state, direction) {
                Ok(outcome) => outcome,
                Err(fault) => return self.crash(index, fault, &state),
            };

            self.history.push(MoveRecord::new(AgentIndex::new(index), applied));
            self.moves += 1;
            if index + 1 == agent_count {
                self.cycles += 1;
            }
            state = Arc::new(next);
            self.state = Some(Arc::clone(&state));
            self.display.update(&state);

            let progress = self.counters();
            let verdict = self.rules.process(&state, &progress);
            if verdict == Verdict::Over || query::is_terminal(&state) {
                break;
            }
            index = (index + 1) % agent_count;
        }

        self.finish(&state)
    }

    fn counters(&self) -> GameProgress {
        GameProgress {
            agent_count: self.agents.len(),
            moves: self.moves,
            cycles: self.cycles,
            last_mover: self.history.last().map(|record| record.agent),
        }
    }

    fn budget(&self, index: usize) -> TimeBudget {
        if self.config.fault_tolerant {
            self.agents[index].budget
        } else {
            TimeBudget::unlimited()
        }
    }

    fn call<T, F>(
        &self,
        index: usize,
        hook: Hook,
        limit: Option<Duration>,
        call: F,
    ) -> Result<(T, Duration), AgentFault>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn Agent) -> anyhow::Result<T> + Send + 'static,
    {
        let slot = &self.agents[index];
        let isolation = match (self.config.fault_tolerant, limit) {
            (false, _) => Isolation::Unguarded,
            (true, Some(limit)) => Isolation::Threaded(limit),
            (true, None) => Isolation::Inline,
        };
        let capture = self.config.mute_agents.then(|| slot.capture.clone());
        invoke::invoke(&slot.agent, hook, isolation, capture, call)
    }

    /// Observation then action for one agent, with the turn's time booked.
    fn take_turn(
        &mut self,
        index: usize,
        state: &Arc<WorldState>,
    ) -> Result<Direction, AgentFault> {
        let budget = self.budget(index);
        let timeout = budget.move_timeout();

        let snapshot = Arc::clone(state);
        let (observed, observing) =
            self.call(index, Hook::Observation, timeout, move |agent| {
                agent.observe(&snapshot)
            })?;

        let remaining = budget.action_allowance(observing)?;
        let (action, deciding) = self.call(index, Hook::Action, remaining, move |agent| {
            agent.get_action(&observed)
        })?;

        let turn = observing + deciding;
        let clock = &mut self.agents[index].clock;
        clock.charge(turn, &budget)?;
        if clock.check_turn(turn, &budget)? {
            warn!(
                agent = index,
                elapsed = ?turn,
                warnings = clock.warnings(),
                "agent exceeded the move warning time"
            );
        }

        Ok(action.unwrap_or(Direction::Stop))
    }

    /// Applies the agent's move, substituting a fallback under the lenient policy.
    fn transition(
        &self,
        index: usize,
        state: &WorldState,
        direction: Direction,
    ) -> Result<(WorldState, Direction), AgentFault> {
        let agent = AgentIndex::new(index);
        match apply_action(state, agent, direction) {
            Ok(next) => Ok((next, direction)),
            Err(TransitionError::IllegalAction { possible, .. })
                if self.config.illegal_actions == IllegalActionPolicy::Lenient =>
            {
                let fallback = if possible.contains(&Direction::Stop) {
                    Direction::Stop
                } else {
                    possible.first().copied().unwrap_or(Direction::Stop)
                };
                warn!(
                    agent = index,
                    requested = %direction,
                    applied = %fallback,
                    "illegal action replaced"
                );
                apply_action(state, agent, fallback)
                    .map(|next| (next, fallback))
                    .map_err(AgentFault::IllegalAction)
            }
            Err(error) => Err(AgentFault::IllegalAction(error)),
        }
    }

    fn crash(
        &mut self,
        index: usize,
        fault: AgentFault,
        state: &Arc<WorldState>,
    ) -> Result<GameOutcome, SchedulerError> {
        let agent = AgentIndex::new(index);
        self.phase = Phase::Crashed { agent };
        self.display.finish();
        if !self.config.fault_tolerant {
            return Err(SchedulerError::Agent { index: agent, fault });
        }

        error!(agent = index, %fault, "agent crashed");
        self.rules.agent_crash(agent, &fault);
        Ok(self.outcome(state, Some(fault), Vec::new()))
    }

    fn finish(&mut self, state: &Arc<WorldState>) -> Result<GameOutcome, SchedulerError> {
        self.phase = Phase::Finished;
        info!(
            score = state.score(),
            cycles = self.cycles,
            won = state.is_win(),
            "game finished"
        );

        let mut failures = Vec::new();
        for index in 0..self.agents.len() {
            let snapshot = Arc::clone(state);
            let limit = self.budget(index).max_startup_time();
            let finalized = self.call(index, Hook::Finalization, limit, move |agent| {
                agent.game_over(&snapshot)
            });
            let Err(fault) = finalized else {
                continue;
            };
            let agent = AgentIndex::new(index);
            if !self.config.fault_tolerant {
                self.display.finish();
                return Err(SchedulerError::Agent { index: agent, fault });
            }
            warn!(agent = index, %fault, "agent finalization failed");
            self.rules.agent_crash(agent, &fault);
            failures.push((agent, fault));
        }

        self.display.finish();
        Ok(self.outcome(state, None, failures))
    }

    fn outcome(
        &self,
        state: &Arc<WorldState>,
        crash: Option<AgentFault>,
        finalization_failures: Vec<(AgentIndex, AgentFault)>,
    ) -> GameOutcome {
        let agents = self
            .agents
            .iter()
            .enumerate()
            .map(|(index, slot)| AgentReport {
                index: AgentIndex::new(index),
                think_time: slot.clock.spent(),
                warnings: slot.clock.warnings(),
                output: slot.capture.contents(),
            })
            .collect();
        debug!(moves = self.moves, "outcome assembled");

        GameOutcome {
            status: self.phase,
            score: state.score(),
            final_state: Arc::clone(state),
            cycles: self.cycles,
            history: self.history.clone(),
            agents,
            timed_out: crash.as_ref().is_some_and(AgentFault::is_time_related),
            crash,
            finalization_failures,
        }
    }
}
