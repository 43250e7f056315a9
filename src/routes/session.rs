use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::session::{AnswerRequest, AnswerResponse, CreateSessionRequest, SessionView},
    error::AppError,
    services::session_service,
    state::SharedState,
};

/// Server-hosted play-throughs.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route(
            "/api/sessions/{id}",
            get(get_session).delete(delete_session),
        )
        .route("/api/sessions/{id}/answer", post(answer))
        .route("/api/sessions/{id}/start", post(restart))
}

/// Open a session and draw its first round.
#[utoipa::path(
    post,
    path = "/api/sessions",
    tag = "sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session started", body = SessionView),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn create_session(
    State(state): State<SharedState>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<Json<SessionView>, AppError> {
    let Json(payload) = payload?;
    Ok(Json(
        session_service::create_session(&state, payload.user_id).await?,
    ))
}

/// Current phase, score and round of a session.
#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Session", body = SessionView),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(session_service::session_view(&state, id).await?))
}

/// Submit the option picked for the open round.
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/answer",
    tag = "sessions",
    params(("id" = String, Path, description = "Session identifier")),
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer judged", body = AnswerResponse),
        (status = 400, description = "Option index out of range"),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "No round is waiting for an answer")
    )
)]
pub async fn answer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<AnswerRequest>, JsonRejection>,
) -> Result<Json<AnswerResponse>, AppError> {
    let Json(payload) = payload?;
    Ok(Json(
        session_service::answer(&state, id, payload.option_index).await?,
    ))
}

/// Restart a session from zero.
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/start",
    tag = "sessions",
    params(("id" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Session restarted", body = SessionView),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "A round is still open")
    )
)]
pub async fn restart(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(session_service::restart(&state, id).await?))
}

/// Drop a session.
#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Session identifier")),
    responses(
        (status = 204, description = "Session deleted"),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn delete_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    session_service::delete_session(&state, id)?;
    Ok(StatusCode::NO_CONTENT)
}
