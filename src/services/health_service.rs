use tracing::warn;

use crate::{dto::health::HealthResponse, error::ServiceError, state::SharedState};

/// Probe the installed player store and report it with the live session count.
///
/// A failed probe is only reported here; the storage supervisor owns the degraded flag.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let reachable = match probe_storage(state).await {
        Ok(()) => true,
        Err(ServiceError::Degraded) => false,
        Err(err) => {
            warn!(error = %err, "player store probe failed");
            false
        }
    };

    HealthResponse::from_probe(reachable, state.sessions().len())
}

async fn probe_storage(state: &SharedState) -> Result<(), ServiceError> {
    let store = state.require_player_store().await?;
    store.health_check().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig, dao::player_store::memory::InMemoryPlayerStore,
        dto::health::HealthStatus, services::session_service, state::AppState,
    };

    #[tokio::test]
    async fn reports_degraded_without_a_store() {
        let state = AppState::new(AppConfig::default());
        let health = health_status(&state).await;
        assert_eq!(health.status, HealthStatus::Degraded);
        assert!(!health.storage_reachable);
        assert_eq!(health.active_sessions, 0);
    }

    #[tokio::test]
    async fn counts_live_sessions_when_storage_is_up() {
        let state = AppState::new(AppConfig::default());
        state
            .set_player_store(Arc::new(InMemoryPlayerStore::new()))
            .await;
        session_service::create_session(&state, None).await.unwrap();

        let health = health_status(&state).await;
        assert_eq!(health.status, HealthStatus::Ok);
        assert!(health.storage_reachable);
        assert_eq!(health.active_sessions, 1);
    }
}
