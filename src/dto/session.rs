use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::leaderboard::LeaderboardEntryResponse,
    state::{
        round::RoundState,
        session::{GameOverReport, GameSession},
        state_machine::SessionPhase,
    },
};

/// Body of `POST /api/sessions`.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    /// Registered player the final score is attributed to.
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

/// Body of `POST /api/sessions/{id}/answer`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    /// Index into the displayed options.
    pub option_index: usize,
}

/// Round as shown to the player. The correct index is only revealed once answered.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoundView {
    pub question: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answered_option_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option_index: Option<usize>,
}

impl From<&RoundState> for RoundView {
    fn from(round: &RoundState) -> Self {
        Self {
            question: round.question().text.clone(),
            options: round.displayed_options().to_vec(),
            answered_option_index: round.answered_option_index(),
            correct_option_index: round
                .is_answered()
                .then(|| round.correct_display_index()),
        }
    }
}

/// Current state of a server-hosted session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: Uuid,
    pub phase: SessionPhase,
    pub score: u32,
    pub is_over: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<RoundView>,
}

impl SessionView {
    pub fn from_session<R>(session_id: Uuid, session: &GameSession<R>) -> Self
    where
        R: rand::Rng,
    {
        Self {
            session_id,
            phase: session.phase(),
            score: session.score(),
            is_over: session.is_over(),
            player_id: session.player_id(),
            round: session.current_round().map(RoundView::from),
        }
    }
}

/// Summary returned with the answer that ended the game.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameOverView {
    pub final_score: u32,
    pub score_saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_error: Option<String>,
    pub leaderboard: Vec<LeaderboardEntryResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaderboard_error: Option<String>,
}

impl From<GameOverReport> for GameOverView {
    fn from(report: GameOverReport) -> Self {
        let (leaderboard, leaderboard_error) = match report.leaderboard {
            Ok(rows) => (rows.into_iter().map(Into::into).collect(), None),
            Err(err) => (Vec::new(), Some(err.to_string())),
        };
        Self {
            final_score: report.final_score,
            score_saved: report.score_saved.is_ok(),
            persistence_error: report.score_saved.err().map(|err| err.to_string()),
            leaderboard,
            leaderboard_error,
        }
    }
}

/// Verdict for a submitted answer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub correct: bool,
    pub score: u32,
    pub phase: SessionPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_over: Option<GameOverView>,
}
