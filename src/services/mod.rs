/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Player registration, scores and leaderboard.
pub mod player_service;
/// Server-hosted game sessions driven by one actor task each.
pub mod session_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
