use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Registered player with the full history of final scores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Stable identifier handed out at registration.
    pub id: Uuid,
    /// Student name, lower-cased and trimmed.
    pub student_name: String,
    /// College name, lower-cased and trimmed.
    pub college_name: String,
    /// Every final score submitted, in submission order.
    pub scores: Vec<ScoreEntryEntity>,
    /// Registration time.
    pub created_at: SystemTime,
}

impl PlayerEntity {
    /// Build a freshly registered player without any score.
    pub fn new(student_name: String, college_name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_name,
            college_name,
            scores: Vec::new(),
            created_at: SystemTime::now(),
        }
    }

    /// Highest score with the earliest time it was reached.
    pub fn best_score(&self) -> Option<(u32, SystemTime)> {
        self.scores
            .iter()
            .fold(None, |best: Option<(u32, SystemTime)>, entry| match best {
                Some((value, at))
                    if value > entry.value || (value == entry.value && at <= entry.recorded_at) =>
                {
                    Some((value, at))
                }
                _ => Some((entry.value, entry.recorded_at)),
            })
    }
}

/// One submitted final score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEntryEntity {
    /// Final score of the play-through.
    pub value: u32,
    /// When the score was submitted.
    pub recorded_at: SystemTime,
}

/// Aggregated leaderboard row: one per player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntryEntity {
    /// Player the row belongs to.
    pub player_id: Uuid,
    /// Stored student name.
    pub student_name: String,
    /// Stored college name.
    pub college_name: String,
    /// Maximum of the player's scores.
    pub best_score: u32,
    /// Earliest submission of `best_score`.
    pub achieved_at: SystemTime,
}
