//! Fault taxonomy for agent hooks and scheduler runs.

use std::{fmt, time::Duration};

use maze_chase_core::AgentIndex;
use maze_chase_world::TransitionError;
use thiserror::Error;

/// Agent hook invoked by the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hook {
    /// One-time registration with the initial snapshot.
    Registration,
    /// Pre-processing of the snapshot before an action is requested.
    Observation,
    /// Action selection.
    Action,
    /// Notification with the terminal snapshot.
    Finalization,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Registration => "registration",
            Self::Observation => "observation",
            Self::Action => "action",
            Self::Finalization => "finalization",
        };
        f.write_str(name)
    }
}

/// Cumulative limit that an agent crossed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BudgetKind {
    /// Too many turns exceeded the warning threshold.
    Warnings {
        /// Warning count after the offending turn.
        count: u32,
        /// Largest tolerated count.
        limit: u32,
    },
    /// Total think time exceeded the game-wide budget.
    TotalTime {
        /// Think time accumulated so far.
        spent: Duration,
        /// Game-wide budget.
        limit: Duration,
    },
}

impl fmt::Display for BudgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warnings { count, limit } => {
                write!(f, "{count} time warnings (limit {limit})")
            }
            Self::TotalTime { spent, limit } => {
                write!(f, "{spent:?} total think time (limit {limit:?})")
            }
        }
    }
}

/// Fatal fault attributed to one agent.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum AgentFault {
    /// The agent requested a move that is not possible.
    #[error("illegal action: {0}")]
    IllegalAction(#[source] TransitionError),
    /// A single hook call ran past its budget.
    #[error("{hook} hook timed out after {budget:?}")]
    Timeout {
        /// Hook that was abandoned.
        hook: Hook,
        /// Budget it was given.
        budget: Duration,
    },
    /// A hook returned an error or panicked.
    #[error("{hook} hook failed: {message}")]
    Runtime {
        /// Hook that failed.
        hook: Hook,
        /// Rendered error chain or panic payload.
        message: String,
    },
    /// A cumulative limit was crossed.
    #[error("time budget exceeded: {kind}")]
    BudgetExceeded {
        /// Limit that was crossed.
        kind: BudgetKind,
    },
}

impl AgentFault {
    /// Reports whether the fault was caused by the clock rather than by agent logic.
    #[must_use]
    pub fn is_time_related(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::BudgetExceeded { .. })
    }
}

/// Errors surfaced by [`crate::Scheduler::run`].
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The scheduler was started twice.
    #[error("scheduler has already been run")]
    AlreadyRun,
    /// The rules collaborator could not build the initial snapshot.
    #[error("failed to create the initial snapshot")]
    NewGame(#[source] anyhow::Error),
    /// The rules collaborator built a snapshot whose agent count does not match.
    #[error("initial snapshot has {snapshot} agent slots but {registered} agents are registered")]
    AgentCountMismatch {
        /// Slots in the snapshot.
        snapshot: usize,
        /// Registered agents.
        registered: usize,
    },
    /// The configured starting index names no agent.
    #[error("starting index {index} is outside {agent_count} agents")]
    InvalidStartingIndex {
        /// Configured index.
        index: AgentIndex,
        /// Registered agents.
        agent_count: usize,
    },
    /// An agent fault, propagated because fault tolerance is disabled.
    #[error("agent {index} faulted: {fault}")]
    Agent {
        /// Offending agent.
        index: AgentIndex,
        /// What went wrong.
        fault: AgentFault,
    },
}
