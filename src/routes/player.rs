use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        leaderboard::LeaderboardEntryResponse,
        player::{PlayerProfile, RegisterRequest, RegisterResponse, ScoreRequest, SuccessResponse},
    },
    error::AppError,
    services::player_service,
    state::SharedState,
};

/// Player registration, score submission and leaderboard.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/register", post(register))
        .route("/api/score", post(submit_score))
        .route("/api/leaderboard", get(leaderboard))
        .route("/api/players/{id}", get(get_player))
}

/// Register a player or return the existing one (case-insensitive identity).
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "players",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Player registered or found", body = RegisterResponse),
        (status = 400, description = "Missing or blank identity field"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let player = player_service::register(
        &state,
        payload.student_name.as_deref().unwrap_or_default(),
        payload.college_name.as_deref().unwrap_or_default(),
    )
    .await?;
    Ok(Json(player.into()))
}

/// Alias of `/api/login`.
#[utoipa::path(
    post,
    path = "/api/register",
    tag = "players",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Player registered or found", body = RegisterResponse),
        (status = 400, description = "Missing or blank identity field"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn register(
    state: State<SharedState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, AppError> {
    login(state, payload).await
}

/// Append a final score to a player's history.
#[utoipa::path(
    post,
    path = "/api/score",
    tag = "players",
    request_body = ScoreRequest,
    responses(
        (status = 200, description = "Score recorded", body = SuccessResponse),
        (status = 400, description = "Missing or malformed field"),
        (status = 404, description = "Unknown player"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn submit_score(
    State(state): State<SharedState>,
    payload: Result<Json<ScoreRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let (Some(user_id), Some(score)) = (payload.user_id, payload.score) else {
        return Err(AppError::BadRequest("userId and score are required".into()));
    };
    player_service::record_score(&state, user_id, score).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Top players by best score.
#[utoipa::path(
    get,
    path = "/api/leaderboard",
    tag = "players",
    responses(
        (status = 200, description = "Leaderboard", body = [LeaderboardEntryResponse]),
        (status = 500, description = "Aggregation failed"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn leaderboard(
    State(state): State<SharedState>,
) -> Result<Json<Vec<LeaderboardEntryResponse>>, AppError> {
    let rows = player_service::leaderboard(&state).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// Stored record of a player with the full score history.
#[utoipa::path(
    get,
    path = "/api/players/{id}",
    tag = "players",
    params(("id" = String, Path, description = "Identifier returned at login")),
    responses(
        (status = 200, description = "Player", body = PlayerProfile),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn get_player(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerProfile>, AppError> {
    Ok(Json(player_service::find_player(&state, id).await?.into()))
}
