//! Per-agent time budgets and think-time bookkeeping.

use std::time::Duration;

use crate::error::{AgentFault, BudgetKind, Hook};

/// Time limits applied to one agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeBudget {
    max_startup_time: Option<Duration>,
    move_timeout: Option<Duration>,
    move_warning_time: Option<Duration>,
    max_time_warnings: u32,
    max_total_time: Option<Duration>,
}

impl TimeBudget {
    /// Budget without any limits.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_startup_time: None,
            move_timeout: None,
            move_warning_time: None,
            max_time_warnings: u32::MAX,
            max_total_time: None,
        }
    }

    /// Tournament limits: 10 s startup, 3 s per move, warnings above 1 s with
    /// two tolerated, 30 s in total.
    #[must_use]
    pub const fn classic() -> Self {
        Self {
            max_startup_time: Some(Duration::from_secs(10)),
            move_timeout: Some(Duration::from_secs(3)),
            move_warning_time: Some(Duration::from_secs(1)),
            max_time_warnings: 2,
            max_total_time: Some(Duration::from_secs(30)),
        }
    }

    /// Limits registration and finalization calls.
    #[must_use]
    pub const fn with_max_startup_time(mut self, limit: Option<Duration>) -> Self {
        self.max_startup_time = limit;
        self
    }

    /// Limits the observation and action calls of a single turn.
    #[must_use]
    pub const fn with_move_timeout(mut self, limit: Option<Duration>) -> Self {
        self.move_timeout = limit;
        self
    }

    /// Sets the per-turn think time above which a warning is recorded.
    #[must_use]
    pub const fn with_move_warning_time(mut self, threshold: Option<Duration>) -> Self {
        self.move_warning_time = threshold;
        self
    }

    /// Sets how many warnings are tolerated.
    #[must_use]
    pub const fn with_max_time_warnings(mut self, limit: u32) -> Self {
        self.max_time_warnings = limit;
        self
    }

    /// Limits think time accumulated over the whole game.
    #[must_use]
    pub const fn with_max_total_time(mut self, limit: Option<Duration>) -> Self {
        self.max_total_time = limit;
        self
    }

    /// Limit for registration and finalization calls.
    #[must_use]
    pub const fn max_startup_time(&self) -> Option<Duration> {
        self.max_startup_time
    }

    /// Limit for one turn.
    #[must_use]
    pub const fn move_timeout(&self) -> Option<Duration> {
        self.move_timeout
    }

    /// Warning threshold for one turn.
    #[must_use]
    pub const fn move_warning_time(&self) -> Option<Duration> {
        self.move_warning_time
    }

    /// Tolerated warning count.
    #[must_use]
    pub const fn max_time_warnings(&self) -> u32 {
        self.max_time_warnings
    }

    /// Limit for the whole game.
    #[must_use]
    pub const fn max_total_time(&self) -> Option<Duration> {
        self.max_total_time
    }

    /// Move time left for the action call once observation took `observing`.
    ///
    /// `Ok(None)` means the move is not time-boxed. Nothing left is a timeout
    /// of the observation hook.
    pub(crate) fn action_allowance(
        &self,
        observing: Duration,
    ) -> Result<Option<Duration>, AgentFault> {
        let Some(limit) = self.move_timeout else {
            return Ok(None);
        };
        match limit.checked_sub(observing) {
            Some(left) if !left.is_zero() => Ok(Some(left)),
            _ => Err(AgentFault::Timeout {
                hook: Hook::Observation,
                budget: limit,
            }),
        }
    }
}

impl Default for TimeBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}

/// Think time and warnings accumulated by one agent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct AgentClock {
    spent: Duration,
    warnings: u32,
}

impl AgentClock {
    pub(crate) const fn spent(&self) -> Duration {
        self.spent
    }

    pub(crate) const fn warnings(&self) -> u32 {
        self.warnings
    }

    /// Books one hook call's elapsed time against the total budget.
    pub(crate) fn charge(
        &mut self,
        elapsed: Duration,
        budget: &TimeBudget,
    ) -> Result<(), AgentFault> {
        self.spent = self.spent.saturating_add(elapsed);
        match budget.max_total_time() {
            Some(limit) if self.spent > limit => Err(AgentFault::BudgetExceeded {
                kind: BudgetKind::TotalTime {
                    spent: self.spent,
                    limit,
                },
            }),
            _ => Ok(()),
        }
    }

    /// Records a warning when a turn ran past the warning threshold.
    ///
    /// Returns `Ok(true)` when a warning was recorded but is still tolerated.
    pub(crate) fn check_turn(
        &mut self,
        turn: Duration,
        budget: &TimeBudget,
    ) -> Result<bool, AgentFault> {
        let Some(threshold) = budget.move_warning_time() else {
            return Ok(false);
        };
        if turn <= threshold {
            return Ok(false);
        }
        self.warnings = self.warnings.saturating_add(1);
        if self.warnings > budget.max_time_warnings() {
            return Err(AgentFault::BudgetExceeded {
                kind: BudgetKind::Warnings {
                    count: self.warnings,
                    limit: budget.max_time_warnings(),
                },
            });
        }
        Ok(true)
    }
}
