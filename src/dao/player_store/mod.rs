pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::{LeaderboardEntryEntity, PlayerEntity},
    storage::StorageResult,
};

/// Abstraction over the persistence layer for players and their scores.
///
/// Names handed to the store are already normalised; the store only guarantees that a
/// `(student_name, college_name)` pair maps to exactly one player.
pub trait PlayerStore: Send + Sync {
    /// Return the player registered under the pair, creating it atomically when absent.
    fn register(
        &self,
        student_name: String,
        college_name: String,
    ) -> BoxFuture<'static, StorageResult<PlayerEntity>>;
    /// Append a score to the player's history. Resolves to `false` when the player is unknown.
    fn record_score(&self, id: Uuid, value: u32) -> BoxFuture<'static, StorageResult<bool>>;
    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    /// Players with at least one score, ranked by best score descending, then by the earliest
    /// time that best score was reached, then by id.
    fn leaderboard(
        &self,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<LeaderboardEntryEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
