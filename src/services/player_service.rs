use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::models::PlayerEntity,
    error::ServiceError,
    state::{SharedState, persistence::LeaderboardEntry},
};

/// Register a player, or return the existing one for the same case-insensitive identity.
pub async fn register(
    state: &SharedState,
    student_name: &str,
    college_name: &str,
) -> Result<PlayerEntity, ServiceError> {
    let student_name = normalize_identity(student_name);
    let college_name = normalize_identity(college_name);
    if student_name.is_empty() || college_name.is_empty() {
        return Err(ServiceError::InvalidInput(
            "student and college names are required".into(),
        ));
    }

    let store = state.require_player_store().await?;
    let player = store.register(student_name, college_name).await?;
    info!(player_id = %player.id, "player logged in");
    Ok(player)
}

/// Append a final score to the player's history.
pub async fn record_score(
    state: &SharedState,
    player_id: Uuid,
    score: u32,
) -> Result<(), ServiceError> {
    let store = state.require_player_store().await?;
    if !store.record_score(player_id, score).await? {
        return Err(ServiceError::NotFound(format!("player `{player_id}`")));
    }
    debug!(%player_id, score, "score recorded");
    Ok(())
}

/// Top players by best score, display names upper-cased.
pub async fn leaderboard(state: &SharedState) -> Result<Vec<LeaderboardEntry>, ServiceError> {
    let store = state.require_player_store().await?;
    let rows = store.leaderboard(state.config().leaderboard_size()).await?;
    Ok(rows
        .into_iter()
        .map(|row| LeaderboardEntry {
            name: row.student_name.to_uppercase(),
            college: row.college_name,
            best_score: row.best_score,
        })
        .collect())
}

/// Stored record of a single player.
pub async fn find_player(state: &SharedState, player_id: Uuid) -> Result<PlayerEntity, ServiceError> {
    let store = state.require_player_store().await?;
    store
        .find_player(player_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("player `{player_id}`")))
}

fn normalize_identity(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::player_store::memory::InMemoryPlayerStore,
        state::AppState,
    };

    async fn state_with_memory_store() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .set_player_store(Arc::new(InMemoryPlayerStore::new()))
            .await;
        state
    }

    #[tokio::test]
    async fn login_ignores_case_and_surrounding_whitespace() {
        let state = state_with_memory_store().await;
        let first = register(&state, "Alice", "BIS").await.unwrap();
        let second = register(&state, "  alice ", "bis").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.student_name, "alice");
        assert_eq!(first.college_name, "bis");
    }

    #[tokio::test]
    async fn blank_identity_is_rejected() {
        let state = state_with_memory_store().await;
        let err = register(&state, "   ", "bis").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn leaderboard_upper_cases_names_only() {
        let state = state_with_memory_store().await;
        let alice = register(&state, "Alice", "BIS").await.unwrap();
        record_score(&state, alice.id, 40).await.unwrap();

        let rows = leaderboard(&state).await.unwrap();
        assert_eq!(
            rows,
            vec![LeaderboardEntry {
                name: "ALICE".into(),
                college: "bis".into(),
                best_score: 40,
            }]
        );
    }

    #[tokio::test]
    async fn unknown_player_score_is_not_found() {
        let state = state_with_memory_store().await;
        let err = record_score(&state, Uuid::new_v4(), 10).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn degraded_mode_refuses_backend_calls() {
        let state = AppState::new(AppConfig::default());
        let err = leaderboard(&state).await.unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
    }
}
