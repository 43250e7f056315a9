//! Interface the game session uses to reach the score backend, whichever side of the network
//! it lives on.

use futures::future::BoxFuture;
use thiserror::Error;
use uuid::Uuid;

/// One row of the leaderboard as the game sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// Display name of the player.
    pub name: String,
    /// College the player registered with.
    pub college: String,
    /// Best score ever recorded by the player.
    pub best_score: u32,
}

/// Failures while saving a score or fetching the leaderboard. Never fatal to the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    /// The session has no registered player to attribute the score to.
    #[error("no registered player for this session")]
    MissingPlayer,
    /// The backend does not know the player.
    #[error("player `{0}` is unknown to the score backend")]
    UnknownPlayer(Uuid),
    /// The backend could not be reached or is degraded.
    #[error("score backend unavailable: {0}")]
    Unavailable(String),
    /// The backend answered with an unexpected status.
    #[error("score backend rejected the request with status {status}: {message}")]
    Rejected {
        /// HTTP status code returned.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },
}

/// Score persistence and leaderboard aggregation as consumed by a game session.
pub trait ScoreService: Send + Sync {
    /// Append `score` to the player's history.
    fn record_score(
        &self,
        player_id: Uuid,
        score: u32,
    ) -> BoxFuture<'static, Result<(), PersistenceError>>;

    /// Fetch the top players by best score.
    fn leaderboard(&self) -> BoxFuture<'static, Result<Vec<LeaderboardEntry>, PersistenceError>>;
}
