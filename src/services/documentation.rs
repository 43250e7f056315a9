use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the fruit quiz backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::player::login,
        crate::routes::player::register,
        crate::routes::player::submit_score,
        crate::routes::player::leaderboard,
        crate::routes::player::get_player,
        crate::routes::question::list_questions,
        crate::routes::session::create_session,
        crate::routes::session::get_session,
        crate::routes::session::answer,
        crate::routes::session::restart,
        crate::routes::session::delete_session,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::player::RegisterRequest,
            crate::dto::player::RegisterResponse,
            crate::dto::player::ScoreRequest,
            crate::dto::player::SuccessResponse,
            crate::dto::player::PlayerProfile,
            crate::dto::player::ScoreEntryResponse,
            crate::dto::leaderboard::LeaderboardEntryResponse,
            crate::dto::question::QuestionResponse,
            crate::dto::session::CreateSessionRequest,
            crate::dto::session::AnswerRequest,
            crate::dto::session::AnswerResponse,
            crate::dto::session::GameOverView,
            crate::dto::session::RoundView,
            crate::dto::session::SessionView,
            crate::state::state_machine::SessionPhase,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "players", description = "Player registration, scores and leaderboard"),
        (name = "questions", description = "Question bank"),
        (name = "sessions", description = "Server-hosted play-throughs"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_api_path() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/api/login",
            "/api/register",
            "/api/score",
            "/api/leaderboard",
            "/api/players/{id}",
            "/api/questions",
            "/api/sessions",
            "/api/sessions/{id}",
            "/api/sessions/{id}/answer",
            "/api/sessions/{id}/start",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
