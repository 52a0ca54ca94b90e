//! Point values and timers applied by the transition function.

/// Fixed values that transitions add to or subtract from the score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoreTable {
    food: i64,
    collectible: i64,
    adversary_capture: i64,
    win_bonus: i64,
    loss_penalty: i64,
    time_penalty: i64,
    scared_duration: u32,
}

impl ScoreTable {
    /// Classic values: food 10, collectibles 0, captures 200, win 500,
    /// loss 500, one point per controlled move, 40 scared moves.
    #[must_use]
    pub const fn classic() -> Self {
        Self {
            food: 10,
            collectible: 0,
            adversary_capture: 200,
            win_bonus: 500,
            loss_penalty: 500,
            time_penalty: 1,
            scared_duration: 40,
        }
    }

    /// Overrides the value of a food item.
    #[must_use]
    pub const fn with_food(mut self, value: i64) -> Self {
        self.food = value;
        self
    }

    /// Overrides the value of a collectible.
    #[must_use]
    pub const fn with_collectible(mut self, value: i64) -> Self {
        self.collectible = value;
        self
    }

    /// Overrides the reward for consuming a scared adversary.
    #[must_use]
    pub const fn with_adversary_capture(mut self, value: i64) -> Self {
        self.adversary_capture = value;
        self
    }

    /// Overrides the bonus for clearing every food item.
    #[must_use]
    pub const fn with_win_bonus(mut self, value: i64) -> Self {
        self.win_bonus = value;
        self
    }

    /// Overrides the penalty for being captured.
    #[must_use]
    pub const fn with_loss_penalty(mut self, value: i64) -> Self {
        self.loss_penalty = value;
        self
    }

    /// Overrides the cost charged for every controlled-agent move.
    #[must_use]
    pub const fn with_time_penalty(mut self, value: i64) -> Self {
        self.time_penalty = value;
        self
    }

    /// Overrides how many adversary moves a collectible keeps adversaries scared.
    #[must_use]
    pub const fn with_scared_duration(mut self, moves: u32) -> Self {
        self.scared_duration = moves;
        self
    }

    /// Value of a food item.
    #[must_use]
    pub const fn food(&self) -> i64 {
        self.food
    }

    /// Value of a collectible.
    #[must_use]
    pub const fn collectible(&self) -> i64 {
        self.collectible
    }

    /// Reward for consuming a scared adversary.
    #[must_use]
    pub const fn adversary_capture(&self) -> i64 {
        self.adversary_capture
    }

    /// Bonus for clearing every food item.
    #[must_use]
    pub const fn win_bonus(&self) -> i64 {
        self.win_bonus
    }

    /// Penalty for being captured.
    #[must_use]
    pub const fn loss_penalty(&self) -> i64 {
        self.loss_penalty
    }

    /// Cost of a controlled-agent move.
    #[must_use]
    pub const fn time_penalty(&self) -> i64 {
        self.time_penalty
    }

    /// Adversary moves a collectible keeps adversaries scared.
    #[must_use]
    pub const fn scared_duration(&self) -> u32 {
        self.scared_duration
    }
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self::classic()
    }
}
