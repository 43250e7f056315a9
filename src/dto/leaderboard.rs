use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::persistence::LeaderboardEntry;

/// One leaderboard row as exposed over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntryResponse {
    /// Upper-cased student name.
    pub student_name: String,
    pub college_name: String,
    /// Best score recorded by the player.
    pub score: u32,
}

impl From<LeaderboardEntry> for LeaderboardEntryResponse {
    fn from(entry: LeaderboardEntry) -> Self {
        Self {
            student_name: entry.name,
            college_name: entry.college,
            score: entry.best_score,
        }
    }
}

impl From<LeaderboardEntryResponse> for LeaderboardEntry {
    fn from(entry: LeaderboardEntryResponse) -> Self {
        Self {
            name: entry.student_name,
            college: entry.college_name,
            best_score: entry.score,
        }
    }
}
