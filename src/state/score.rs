/// Points awarded for a correct answer when nothing else is configured.
pub const DEFAULT_POINTS_PER_CORRECT: u32 = 10;

/// Running score of one play-through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreTracker {
    score: u32,
    reward: u32,
}

impl Default for ScoreTracker {
    fn default() -> Self {
        Self::new(DEFAULT_POINTS_PER_CORRECT)
    }
}

impl ScoreTracker {
    /// Tracker starting at zero that awards `reward` per correct answer.
    pub fn new(reward: u32) -> Self {
        Self { score: 0, reward }
    }

    /// Current total.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Points added by each correct answer.
    pub fn reward(&self) -> u32 {
        self.reward
    }

    /// Back to zero for a new game.
    pub fn reset(&mut self) {
        self.score = 0;
    }

    /// Add the per-answer reward and return the new total.
    pub fn add_correct(&mut self) -> u32 {
        self.score = self.score.saturating_add(self.reward);
        self.score
    }
}
