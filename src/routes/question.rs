use axum::{Json, Router, extract::State, routing::get};

use crate::{dto::question::QuestionResponse, state::SharedState};

/// Question bank served to browser clients.
pub fn router() -> Router<SharedState> {
    Router::new().route("/api/questions", get(list_questions))
}

/// List the configured question bank.
#[utoipa::path(
    get,
    path = "/api/questions",
    tag = "questions",
    responses((status = 200, description = "Question bank", body = [QuestionResponse]))
)]
pub async fn list_questions(State(state): State<SharedState>) -> Json<Vec<QuestionResponse>> {
    Json(
        state
            .question_bank()
            .items()
            .iter()
            .map(QuestionResponse::from)
            .collect(),
    )
}
