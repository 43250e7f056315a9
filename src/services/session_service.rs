use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use futures::future::BoxFuture;
use tokio::{
    sync::{mpsc, oneshot},
    time::{sleep, timeout},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::SessionLifetime,
    dto::session::{AnswerResponse, GameOverView, SessionView},
    error::ServiceError,
    services::player_service,
    state::{
        AppState, SharedState,
        persistence::{LeaderboardEntry, PersistenceError, ScoreService},
        session::{AnswerOutcome, GameSession, RespawnTicket, SessionError},
        state_machine::SessionPhase,
    },
};

const COMMAND_BUFFER: usize = 16;

/// Cloneable address of a running session actor.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

enum SessionCommand {
    View {
        reply: oneshot::Sender<SessionView>,
    },
    Start {
        reply: oneshot::Sender<Result<SessionView, SessionError>>,
    },
    Answer {
        option_index: usize,
        reply: oneshot::Sender<Result<AnswerResponse, SessionError>>,
    },
    Respawn(RespawnTicket),
}

impl SessionHandle {
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| ServiceError::NotFound("session closed".into()))?;
        rx.await
            .map_err(|_| ServiceError::NotFound("session closed".into()))
    }
}

/// Score backend seen by server-hosted sessions: the installed player store.
pub struct StoreScoreService {
    state: Weak<AppState>,
}

impl StoreScoreService {
    /// Adapter that stops answering once `state` is dropped.
    pub fn new(state: &SharedState) -> Self {
        Self {
            state: Arc::downgrade(state),
        }
    }

    fn upgrade(&self) -> Result<SharedState, PersistenceError> {
        self.state
            .upgrade()
            .ok_or_else(|| PersistenceError::Unavailable("server shutting down".into()))
    }
}

impl ScoreService for StoreScoreService {
    fn record_score(
        &self,
        player_id: Uuid,
        score: u32,
    ) -> BoxFuture<'static, Result<(), PersistenceError>> {
        let state = self.upgrade();
        Box::pin(async move {
            player_service::record_score(&state?, player_id, score)
                .await
                .map_err(|err| match err {
                    ServiceError::NotFound(_) => PersistenceError::UnknownPlayer(player_id),
                    other => PersistenceError::Unavailable(other.to_string()),
                })
        })
    }

    fn leaderboard(&self) -> BoxFuture<'static, Result<Vec<LeaderboardEntry>, PersistenceError>> {
        let state = self.upgrade();
        Box::pin(async move {
            player_service::leaderboard(&state?)
                .await
                .map_err(|err| PersistenceError::Unavailable(err.to_string()))
        })
    }
}

/// Create a session, start its first round and spawn the actor driving it.
pub async fn create_session(
    state: &SharedState,
    player_id: Option<Uuid>,
) -> Result<SessionView, ServiceError> {
    if let (Some(id), Some(store)) = (player_id, state.player_store().await) {
        if !state.is_degraded() && store.find_player(id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("player `{id}`")));
        }
    }

    let mut session = GameSession::new(
        state.question_bank(),
        Arc::new(StoreScoreService::new(state)),
        state.config().game_settings(),
        player_id,
    );
    session.start()?;

    let session_id = Uuid::new_v4();
    let view = SessionView::from_session(session_id, &session);
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    let weak_tx = tx.downgrade();
    state.sessions().insert(session_id, SessionHandle { tx });
    tokio::spawn(run_session(
        SessionActor {
            session_id,
            state: Arc::downgrade(state),
            lifetime: state.config().session_lifetime(),
        },
        session,
        weak_tx,
        rx,
    ));

    info!(%session_id, ?player_id, "session created");
    Ok(view)
}

/// Current view of a session.
pub async fn session_view(state: &SharedState, id: Uuid) -> Result<SessionView, ServiceError> {
    handle(state, id)?
        .request(|reply| SessionCommand::View { reply })
        .await
}

/// Submit an answer for the session's open round.
pub async fn answer(
    state: &SharedState,
    id: Uuid,
    option_index: usize,
) -> Result<AnswerResponse, ServiceError> {
    let result = handle(state, id)?
        .request(|reply| SessionCommand::Answer {
            option_index,
            reply,
        })
        .await?;
    Ok(result?)
}

/// Restart the session from scratch.
pub async fn restart(state: &SharedState, id: Uuid) -> Result<SessionView, ServiceError> {
    let result = handle(state, id)?
        .request(|reply| SessionCommand::Start { reply })
        .await?;
    Ok(result?)
}

/// Forget the session; its actor stops once the last handle is gone.
pub fn delete_session(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    state
        .sessions()
        .remove(&id)
        .map(|_| debug!(session_id = %id, "session removed"))
        .ok_or_else(|| ServiceError::NotFound(format!("session `{id}`")))
}

fn handle(state: &SharedState, id: Uuid) -> Result<SessionHandle, ServiceError> {
    state
        .sessions()
        .get(&id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| ServiceError::NotFound(format!("session `{id}`")))
}

struct SessionActor {
    session_id: Uuid,
    state: Weak<AppState>,
    lifetime: SessionLifetime,
}

impl SessionActor {
    /// How long the actor waits for the next command before dropping the session.
    fn quiet_limit(&self, phase: SessionPhase) -> Duration {
        match phase {
            SessionPhase::GameOver => self.lifetime.finished_ttl,
            _ => self.lifetime.idle_timeout,
        }
    }

    fn expire(&self, quiet_limit: Duration) {
        if let Some(state) = self.state.upgrade() {
            state.sessions().remove(&self.session_id);
        }
        info!(
            session_id = %self.session_id,
            quiet_ms = quiet_limit.as_millis() as u64,
            "session expired"
        );
    }
}

async fn run_session(
    actor: SessionActor,
    mut session: GameSession,
    tx: mpsc::WeakSender<SessionCommand>,
    mut rx: mpsc::Receiver<SessionCommand>,
) {
    let session_id = actor.session_id;
    loop {
        let quiet_limit = actor.quiet_limit(session.phase());
        let command = match timeout(quiet_limit, rx.recv()).await {
            Ok(Some(command)) => command,
            Ok(None) => break,
            Err(_) => {
                actor.expire(quiet_limit);
                break;
            }
        };

        match command {
            SessionCommand::View { reply } => {
                let _ = reply.send(SessionView::from_session(session_id, &session));
            }
            SessionCommand::Start { reply } => {
                let result = session
                    .start()
                    .map(|_| ())
                    .map(|()| SessionView::from_session(session_id, &session));
                let _ = reply.send(result);
            }
            SessionCommand::Answer {
                option_index,
                reply,
            } => {
                let result = match session.answer(option_index).await {
                    Ok(AnswerOutcome::Correct { score, respawn }) => {
                        schedule_respawn(tx.clone(), respawn);
                        Ok(AnswerResponse {
                            correct: true,
                            score,
                            phase: session.phase(),
                            game_over: None,
                        })
                    }
                    Ok(AnswerOutcome::GameOver(report)) => {
                        info!(%session_id, final_score = report.final_score, "game over");
                        Ok(AnswerResponse {
                            correct: false,
                            score: report.final_score,
                            phase: session.phase(),
                            game_over: Some(GameOverView::from(report)),
                        })
                    }
                    Err(err) => Err(err),
                };
                let _ = reply.send(result);
            }
            SessionCommand::Respawn(ticket) => {
                if let Err(err) = session.advance(ticket) {
                    warn!(%session_id, error = %err, "failed to draw the next round");
                }
            }
        }
    }

    debug!(%session_id, "session actor stopped");
}

fn schedule_respawn(tx: mpsc::WeakSender<SessionCommand>, ticket: RespawnTicket) {
    tokio::spawn(async move {
        sleep(ticket.delay()).await;
        if let Some(tx) = tx.upgrade() {
            let _ = tx.send(SessionCommand::Respawn(ticket)).await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::player_store::{PlayerStore, memory::InMemoryPlayerStore},
    };

    async fn memory_state() -> SharedState {
        memory_state_with(AppConfig::default()).await
    }

    async fn memory_state_with(config: AppConfig) -> SharedState {
        let state = AppState::new(config);
        state
            .set_player_store(Arc::new(InMemoryPlayerStore::new()))
            .await;
        state
    }

    async fn correct_index(state: &SharedState, id: Uuid) -> usize {
        let view = session_view(state, id).await.unwrap();
        let round = view.round.unwrap();
        let question = state
            .question_bank()
            .items()
            .iter()
            .find(|item| item.text == round.question)
            .cloned()
            .unwrap();
        let correct = &question.options[question.correct_index];
        round.options.iter().position(|o| o == correct).unwrap()
    }

    #[tokio::test]
    async fn created_session_hides_the_answer() {
        let state = memory_state().await;
        let view = create_session(&state, None).await.unwrap();

        assert_eq!(view.phase, SessionPhase::InRound);
        let round = view.round.unwrap();
        assert!(round.correct_option_index.is_none());
        assert!(round.answered_option_index.is_none());
    }

    #[tokio::test]
    async fn wrong_answer_records_score_and_returns_leaderboard() {
        let state = memory_state().await;
        let player = player_service::register(&state, "Alice", "BIS").await.unwrap();
        let view = create_session(&state, Some(player.id)).await.unwrap();
        let id = view.session_id;

        let correct = correct_index(&state, id).await;
        let response = answer(&state, id, correct).await.unwrap();
        assert!(response.correct);
        assert_eq!(response.score, 10);
        assert_eq!(response.phase, SessionPhase::AwaitingNextRound);

        let err = answer(&state, id, correct).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        tokio::time::sleep(state.config().game_settings().respawn_delay + Duration::from_millis(200))
            .await;
        let view = session_view(&state, id).await.unwrap();
        assert_eq!(view.phase, SessionPhase::InRound);

        let correct = correct_index(&state, id).await;
        let options = view.round.unwrap().options.len();
        let wrong = (correct + 1) % options;
        let response = answer(&state, id, wrong).await.unwrap();
        let game_over = response.game_over.unwrap();
        assert!(!response.correct);
        assert_eq!(game_over.final_score, 10);
        assert!(game_over.score_saved);
        assert_eq!(game_over.leaderboard[0].student_name, "ALICE");
        assert_eq!(game_over.leaderboard[0].score, 10);

        let store = state.player_store().await.unwrap();
        let stored = store.find_player(player.id).await.unwrap().unwrap();
        assert_eq!(stored.scores.len(), 1);
    }

    #[tokio::test]
    async fn unknown_player_cannot_open_a_session() {
        let state = memory_state().await;
        let err = create_session(&state, Some(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn deleted_session_is_gone() {
        let state = memory_state().await;
        let id = create_session(&state, None).await.unwrap().session_id;

        delete_session(&state, id).unwrap();
        assert!(matches!(
            session_view(&state, id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            delete_session(&state, id),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn restart_is_refused_while_a_round_is_open() {
        let state = memory_state().await;
        let id = create_session(&state, None).await.unwrap().session_id;

        let err = restart(&state, id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let correct = correct_index(&state, id).await;
        answer(&state, id, correct).await.unwrap();
        let view = restart(&state, id).await.unwrap();
        assert_eq!(view.score, 0);
        assert_eq!(view.phase, SessionPhase::InRound);
    }

    #[tokio::test]
    async fn finished_session_is_dropped_after_its_grace_period() {
        let config =
            AppConfig::from_json(r#"{"finished_session_ttl_ms": 200}"#).unwrap();
        let state = memory_state_with(config).await;
        let id = create_session(&state, None).await.unwrap().session_id;

        let correct = correct_index(&state, id).await;
        let options = session_view(&state, id).await.unwrap().round.unwrap().options.len();
        let response = answer(&state, id, (correct + 1) % options).await.unwrap();
        assert_eq!(response.phase, SessionPhase::GameOver);

        let view = session_view(&state, id).await.unwrap();
        assert_eq!(view.phase, SessionPhase::GameOver);
        assert_eq!(state.sessions().len(), 1);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(state.sessions().is_empty());
        assert!(matches!(
            session_view(&state, id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn abandoned_session_is_dropped_after_idle_timeout() {
        let config =
            AppConfig::from_json(r#"{"session_idle_timeout_ms": 100}"#).unwrap();
        let state = memory_state_with(config).await;
        for _ in 0..3 {
            create_session(&state, None).await.unwrap();
        }
        assert_eq!(state.sessions().len(), 3);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(state.sessions().is_empty());
    }

    #[tokio::test]
    async fn active_session_outlives_idle_timeout() {
        let config =
            AppConfig::from_json(r#"{"session_idle_timeout_ms": 300}"#).unwrap();
        let state = memory_state_with(config).await;
        let id = create_session(&state, None).await.unwrap().session_id;

        for _ in 0..4 {
            tokio::time::sleep(Duration::from_millis(150)).await;
            session_view(&state, id).await.unwrap();
        }
        assert_eq!(state.sessions().len(), 1);
    }
}
