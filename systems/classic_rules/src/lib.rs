#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Classic chase rules: clear the food without being caught.

use maze_chase_core::AgentIndex;
use maze_chase_system_scheduler::{AgentFault, GameProgress, Rules, TimeBudget, Verdict};
use maze_chase_world::{query, Layout, ScoreTable, WorldState};
use tracing::{info, warn};

/// Why a game governed by [`ClassicRules`] ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ending {
    /// Every food item was eaten.
    Won,
    /// The controlled agent was caught.
    Lost,
    /// The configured number of rounds was played.
    CycleLimit,
}

/// Rules that end the game on a win, a loss or an optional round limit.
#[derive(Clone, Debug)]
pub struct ClassicRules {
    layout: Layout,
    scoring: ScoreTable,
    budget: TimeBudget,
    cycle_limit: Option<u64>,
    ending: Option<Ending>,
    crashes: Vec<(AgentIndex, AgentFault)>,
}

impl ClassicRules {
    /// Creates rules for `layout` with classic scoring and time budgets.
    #[must_use]
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            scoring: ScoreTable::classic(),
            budget: TimeBudget::classic(),
            cycle_limit: None,
            ending: None,
            crashes: Vec::new(),
        }
    }

    /// Replaces the score table.
    #[must_use]
    pub fn with_scoring(mut self, scoring: ScoreTable) -> Self {
        self.scoring = scoring;
        self
    }

    /// Replaces the time budget given to every agent.
    #[must_use]
    pub fn with_time_budget(mut self, budget: TimeBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Ends the game after `cycles` complete rounds.
    #[must_use]
    pub fn with_cycle_limit(mut self, cycles: Option<u64>) -> Self {
        self.cycle_limit = cycles;
        self
    }

    /// Level the game is played on.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Why the game ended, once it has.
    #[must_use]
    pub fn ending(&self) -> Option<Ending> {
        self.ending
    }

    /// Faults reported by the scheduler, in the order they occurred.
    #[must_use]
    pub fn crashes(&self) -> &[(AgentIndex, AgentFault)] {
        &self.crashes
    }
}

impl Rules for ClassicRules {
    fn new_game(&mut self, agent_count: usize) -> anyhow::Result<WorldState> {
        let adversaries = agent_count.saturating_sub(1);
        anyhow::ensure!(agent_count > 0, "a game needs a controlled agent");
        anyhow::ensure!(
            adversaries <= self.layout.adversary_count(),
            "layout has {} adversary starts but {adversaries} adversary agents were registered",
            self.layout.adversary_count(),
        );
        self.ending = None;
        self.crashes.clear();
        Ok(WorldState::initial(&self.layout, adversaries, self.scoring))
    }

    fn process(&mut self, state: &WorldState, progress: &GameProgress) -> Verdict {
        let ending = if state.is_win() {
            Some(Ending::Won)
        } else if state.is_lose() {
            Some(Ending::Lost)
        } else if self
            .cycle_limit
            .is_some_and(|limit| progress.cycles() >= limit)
        {
            Some(Ending::CycleLimit)
        } else {
            None
        };

        match ending {
            Some(ending) => {
                info!(?ending, score = state.score(), "game over");
                self.ending = Some(ending);
                Verdict::Over
            }
            None => Verdict::Continue,
        }
    }

    fn agent_crash(&mut self, index: AgentIndex, fault: &AgentFault) {
        if index == AgentIndex::CONTROLLED {
            warn!(%fault, "controlled agent crashed");
        } else {
            warn!(agent = %index, %fault, "adversary crashed");
        }
        self.crashes.push((index, fault.clone()));
    }

    fn time_budget(&self, _index: AgentIndex) -> TimeBudget {
        self.budget
    }

    fn progress(&self, state: &WorldState, _progress: &GameProgress) -> f32 {
        let total = self.layout.total_food();
        if total == 0 {
            return 0.0;
        }
        let remaining = query::food_remaining(state);
        (total - remaining) as f32 / total as f32
    }
}
