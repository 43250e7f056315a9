use serde::Serialize;
use utoipa::ToSchema;

/// Whether the backend can reach its player store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

/// Payload of the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: HealthStatus,
    /// Outcome of the live storage probe made for this request.
    pub storage_reachable: bool,
    /// Server-hosted sessions currently alive.
    pub active_sessions: usize,
}

impl HealthResponse {
    /// `Degraded` unless the storage probe succeeded.
    pub fn from_probe(storage_reachable: bool, active_sessions: usize) -> Self {
        let status = if storage_reachable {
            HealthStatus::Ok
        } else {
            HealthStatus::Degraded
        };
        Self {
            status,
            storage_reachable,
            active_sessions,
        }
    }
}
