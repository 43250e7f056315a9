use std::{
    collections::HashMap,
    sync::Arc,
    time::SystemTime,
};

use futures::future::BoxFuture;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::PlayerStore;
use crate::dao::{
    models::{LeaderboardEntryEntity, PlayerEntity, ScoreEntryEntity},
    storage::StorageResult,
};

/// Process-local [`PlayerStore`], used when no database is configured and in tests.
#[derive(Clone, Default)]
pub struct InMemoryPlayerStore {
    inner: Arc<RwLock<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    players: HashMap<Uuid, PlayerEntity>,
    by_identity: HashMap<(String, String), Uuid>,
}

impl InMemoryPlayerStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn register(&self, student_name: String, college_name: String) -> PlayerEntity {
        let mut state = self.inner.write().await;
        let key = (student_name, college_name);
        if let Some(player) = state
            .by_identity
            .get(&key)
            .and_then(|id| state.players.get(id))
        {
            return player.clone();
        }

        let (student_name, college_name) = key.clone();
        let player = PlayerEntity::new(student_name, college_name);
        state.by_identity.insert(key, player.id);
        state.players.insert(player.id, player.clone());
        player
    }

    async fn record_score(&self, id: Uuid, value: u32) -> bool {
        let mut state = self.inner.write().await;
        match state.players.get_mut(&id) {
            Some(player) => {
                player.scores.push(ScoreEntryEntity {
                    value,
                    recorded_at: SystemTime::now(),
                });
                true
            }
            None => false,
        }
    }

    async fn leaderboard(&self, limit: usize) -> Vec<LeaderboardEntryEntity> {
        let state = self.inner.read().await;
        let mut rows: Vec<LeaderboardEntryEntity> = state
            .players
            .values()
            .filter_map(|player| {
                let (best_score, achieved_at) = player.best_score()?;
                Some(LeaderboardEntryEntity {
                    player_id: player.id,
                    student_name: player.student_name.clone(),
                    college_name: player.college_name.clone(),
                    best_score,
                    achieved_at,
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            b.best_score
                .cmp(&a.best_score)
                .then(a.achieved_at.cmp(&b.achieved_at))
                .then(a.player_id.cmp(&b.player_id))
        });
        rows.truncate(limit);
        rows
    }
}

impl PlayerStore for InMemoryPlayerStore {
    fn register(
        &self,
        student_name: String,
        college_name: String,
    ) -> BoxFuture<'static, StorageResult<PlayerEntity>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.register(student_name, college_name).await) })
    }

    fn record_score(&self, id: Uuid, value: u32) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.record_score(id, value).await) })
    }

    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.read().await.players.get(&id).cloned()) })
    }

    fn leaderboard(
        &self,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<LeaderboardEntryEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.leaderboard(limit).await) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
