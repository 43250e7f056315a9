use std::{sync::Arc, time::Duration};

use rand::{Rng, SeedableRng, rngs::StdRng};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::state::{
    persistence::{LeaderboardEntry, PersistenceError, ScoreService},
    question::{QuestionBank, QuestionError},
    round::{AnswerResult, RoundError, RoundState, start_round, submit_answer},
    score::{DEFAULT_POINTS_PER_CORRECT, ScoreTracker},
    state_machine::{InvalidTransition, SessionEvent, SessionPhase, SessionStateMachine, Snapshot},
};

/// Delay between a correct answer and the next round when nothing else is configured.
pub const DEFAULT_RESPAWN_DELAY: Duration = Duration::from_millis(1_000);

/// Tunables for a play-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSettings {
    /// Points added per correct answer.
    pub points_per_correct: u32,
    /// Presentation delay before the next round is drawn.
    pub respawn_delay: Duration,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            points_per_correct: DEFAULT_POINTS_PER_CORRECT,
            respawn_delay: DEFAULT_RESPAWN_DELAY,
        }
    }
}

/// Errors returned by [`GameSession`] operations. None of them alter the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The requested transition is not valid from the current phase.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    /// No round is waiting for an answer.
    #[error("no round is waiting for an answer (phase {phase:?})")]
    NoActiveRound {
        /// Phase the session was in.
        phase: SessionPhase,
    },
    /// The bank produced a question that cannot be played.
    #[error(transparent)]
    Question(#[from] QuestionError),
    /// The answer was refused by the round.
    #[error(transparent)]
    Round(#[from] RoundError),
}

/// Permission to draw the next round once the presentation delay has elapsed.
///
/// Tickets go stale as soon as the session moves on (for instance after a restart), and
/// redeeming a stale ticket does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RespawnTicket {
    generation: u64,
    delay: Duration,
}

impl RespawnTicket {
    /// How long the caller should wait before redeeming the ticket.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Everything gathered when a game ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOverReport {
    /// Score reached before the wrong answer.
    pub final_score: u32,
    /// Whether the final score reached the backend.
    pub score_saved: Result<(), PersistenceError>,
    /// Leaderboard fetched after saving the score.
    pub leaderboard: Result<Vec<LeaderboardEntry>, PersistenceError>,
}

/// Result of [`GameSession::answer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Right answer: points were added and a new round is due after the ticket's delay.
    Correct {
        /// Score after the reward.
        score: u32,
        /// Ticket to redeem with [`GameSession::advance`].
        respawn: RespawnTicket,
    },
    /// Wrong answer: the game is over.
    GameOver(GameOverReport),
}

/// One play-through: owns the round, the score and the phase machine.
pub struct GameSession<R = StdRng> {
    bank: Arc<QuestionBank>,
    scores: Arc<dyn ScoreService>,
    settings: GameSettings,
    machine: SessionStateMachine,
    tracker: ScoreTracker,
    round: Option<RoundState>,
    player_id: Option<Uuid>,
    is_over: bool,
    rng: R,
}

impl GameSession<StdRng> {
    /// Session seeded from the operating system's entropy source.
    pub fn new(
        bank: Arc<QuestionBank>,
        scores: Arc<dyn ScoreService>,
        settings: GameSettings,
        player_id: Option<Uuid>,
    ) -> Self {
        Self::with_rng(bank, scores, settings, player_id, StdRng::from_os_rng())
    }
}

impl<R: Rng> GameSession<R> {
    /// Session drawing its randomness from `rng`.
    pub fn with_rng(
        bank: Arc<QuestionBank>,
        scores: Arc<dyn ScoreService>,
        settings: GameSettings,
        player_id: Option<Uuid>,
        rng: R,
    ) -> Self {
        Self {
            bank,
            scores,
            settings,
            machine: SessionStateMachine::new(),
            tracker: ScoreTracker::new(settings.points_per_correct),
            round: None,
            player_id,
            is_over: false,
            rng,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.machine.phase()
    }

    /// Phase and version of the underlying machine.
    pub fn snapshot(&self) -> Snapshot {
        self.machine.snapshot()
    }

    /// Score of the current play-through.
    pub fn score(&self) -> u32 {
        self.tracker.score()
    }

    /// True once a wrong answer ended the game.
    pub fn is_over(&self) -> bool {
        self.is_over
    }

    /// Round currently displayed, answered or not.
    pub fn current_round(&self) -> Option<&RoundState> {
        self.round.as_ref()
    }

    /// Player the final score is attributed to.
    pub fn player_id(&self) -> Option<Uuid> {
        self.player_id
    }

    /// Settings in use.
    pub fn settings(&self) -> GameSettings {
        self.settings
    }

    /// Begin a new play-through, discarding any pending respawn.
    pub fn start(&mut self) -> Result<&RoundState, SessionError> {
        self.machine.check(SessionEvent::Start)?;
        let round = start_round(&self.bank, &mut self.rng)?;

        self.machine.apply(SessionEvent::Start)?;
        self.tracker.reset();
        self.is_over = false;
        Ok(&*self.round.insert(round))
    }

    /// Judge the player's pick for the current round.
    ///
    /// A wrong answer ends the game, records the final score once and fetches the leaderboard
    /// once. Backend failures are reported in the [`GameOverReport`] and leave the session in
    /// its game-over state.
    pub async fn answer(&mut self, selected: usize) -> Result<AnswerOutcome, SessionError> {
        let phase = self.machine.phase();
        match phase {
            SessionPhase::InRound => {}
            SessionPhase::AwaitingNextRound => return Err(RoundError::AlreadyAnswered.into()),
            SessionPhase::NotStarted | SessionPhase::GameOver => {
                return Err(SessionError::NoActiveRound { phase });
            }
        }

        let round = self
            .round
            .as_mut()
            .ok_or(SessionError::NoActiveRound { phase })?;
        let AnswerResult { is_correct } = submit_answer(round, selected)?;

        if is_correct {
            self.machine.apply(SessionEvent::AnsweredCorrectly)?;
            let score = self.tracker.add_correct();
            return Ok(AnswerOutcome::Correct {
                score,
                respawn: RespawnTicket {
                    generation: self.machine.version(),
                    delay: self.settings.respawn_delay,
                },
            });
        }

        self.machine.apply(SessionEvent::AnsweredIncorrectly)?;
        self.is_over = true;

        let report = finish_game(
            Arc::clone(&self.scores),
            self.player_id,
            self.tracker.score(),
        )
        .await;
        Ok(AnswerOutcome::GameOver(report))
    }

    /// Draw the next round if `ticket` is still current. Stale tickets yield `Ok(None)`.
    pub fn advance(&mut self, ticket: RespawnTicket) -> Result<Option<&RoundState>, SessionError> {
        if ticket.generation != self.machine.version()
            || self.machine.phase() != SessionPhase::AwaitingNextRound
        {
            debug!(
                ticket = ticket.generation,
                current = self.machine.version(),
                "ignoring stale respawn"
            );
            return Ok(None);
        }

        let round = start_round(&self.bank, &mut self.rng)?;
        self.machine.apply(SessionEvent::NextRound)?;
        Ok(Some(&*self.round.insert(round)))
    }

    /// Sleep for the ticket's delay, then [`Self::advance`].
    pub async fn wait_and_advance(
        &mut self,
        ticket: RespawnTicket,
    ) -> Result<Option<&RoundState>, SessionError> {
        sleep(ticket.delay).await;
        self.advance(ticket)
    }
}

async fn finish_game(
    scores: Arc<dyn ScoreService>,
    player_id: Option<Uuid>,
    final_score: u32,
) -> GameOverReport {
    let score_saved = match player_id {
        Some(id) => scores.record_score(id, final_score).await,
        None => Err(PersistenceError::MissingPlayer),
    };
    if let Err(err) = &score_saved {
        warn!(error = %err, final_score, "final score was not recorded");
    }

    let leaderboard = scores.leaderboard().await;
    if let Err(err) = &leaderboard {
        warn!(error = %err, "leaderboard fetch failed");
    }

    GameOverReport {
        final_score,
        score_saved,
        leaderboard,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use futures::future::BoxFuture;

    use super::*;
    use crate::state::question::QuestionItem;

    #[derive(Default)]
    struct RecordingScores {
        recorded: Mutex<Vec<(Uuid, u32)>>,
        leaderboard_calls: AtomicUsize,
        offline: bool,
    }

    impl ScoreService for RecordingScores {
        fn record_score(
            &self,
            player_id: Uuid,
            score: u32,
        ) -> BoxFuture<'static, Result<(), PersistenceError>> {
            self.recorded.lock().unwrap().push((player_id, score));
            let offline = self.offline;
            Box::pin(async move {
                if offline {
                    Err(PersistenceError::Unavailable("connection refused".into()))
                } else {
                    Ok(())
                }
            })
        }

        fn leaderboard(
            &self,
        ) -> BoxFuture<'static, Result<Vec<LeaderboardEntry>, PersistenceError>> {
            self.leaderboard_calls.fetch_add(1, Ordering::SeqCst);
            let offline = self.offline;
            Box::pin(async move {
                if offline {
                    Err(PersistenceError::Unavailable("connection refused".into()))
                } else {
                    Ok(vec![LeaderboardEntry {
                        name: "ALICE".into(),
                        college: "x".into(),
                        best_score: 30,
                    }])
                }
            })
        }
    }

    fn one_question_bank() -> Arc<QuestionBank> {
        Arc::new(QuestionBank::new(vec![QuestionItem::new(
            "Q",
            ["A", "B"],
            0,
        )]))
    }

    fn session_with(
        scores: Arc<RecordingScores>,
        player_id: Option<Uuid>,
    ) -> GameSession<StdRng> {
        GameSession::with_rng(
            one_question_bank(),
            scores,
            GameSettings {
                points_per_correct: 10,
                respawn_delay: Duration::from_millis(5),
            },
            player_id,
            StdRng::seed_from_u64(42),
        )
    }

    fn correct_index(session: &GameSession) -> usize {
        session.current_round().unwrap().correct_display_index()
    }

    #[tokio::test]
    async fn correct_answer_scores_ten_then_wrong_answer_ends_game() {
        let scores = Arc::new(RecordingScores::default());
        let player = Uuid::new_v4();
        let mut session = session_with(scores.clone(), Some(player));

        let round = session.start().unwrap();
        let correct = round.correct_display_index();
        assert_eq!(
            round.displayed_options()[correct],
            round.question().options[0]
        );

        let outcome = session.answer(correct).await.unwrap();
        let AnswerOutcome::Correct { score, respawn } = outcome else {
            panic!("expected a correct answer");
        };
        assert_eq!(score, 10);
        assert_eq!(session.phase(), SessionPhase::AwaitingNextRound);

        assert!(session.advance(respawn).unwrap().is_some());
        assert_eq!(session.phase(), SessionPhase::InRound);

        let wrong = 1 - correct_index(&session);
        let outcome = session.answer(wrong).await.unwrap();
        let AnswerOutcome::GameOver(report) = outcome else {
            panic!("expected game over");
        };
        assert_eq!(report.final_score, 10);
        assert_eq!(report.score_saved, Ok(()));
        assert_eq!(report.leaderboard.unwrap().len(), 1);
        assert!(session.is_over());
        assert_eq!(session.phase(), SessionPhase::GameOver);

        assert_eq!(*scores.recorded.lock().unwrap(), vec![(player, 10)]);
        assert_eq!(scores.leaderboard_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn answering_after_game_over_triggers_no_more_backend_calls() {
        let scores = Arc::new(RecordingScores::default());
        let mut session = session_with(scores.clone(), Some(Uuid::new_v4()));
        session.start().unwrap();

        let wrong = 1 - correct_index(&session);
        session.answer(wrong).await.unwrap();

        let err = session.answer(0).await.unwrap_err();
        assert_eq!(
            err,
            SessionError::NoActiveRound {
                phase: SessionPhase::GameOver
            }
        );
        assert_eq!(scores.recorded.lock().unwrap().len(), 1);
        assert_eq!(scores.leaderboard_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn second_answer_on_the_same_round_is_refused_without_points() {
        let scores = Arc::new(RecordingScores::default());
        let mut session = session_with(scores, None);
        session.start().unwrap();
        let correct = correct_index(&session);

        session.answer(correct).await.unwrap();
        let err = session.answer(correct).await.unwrap_err();

        assert_eq!(err, SessionError::Round(RoundError::AlreadyAnswered));
        assert_eq!(session.score(), 10);
    }

    #[tokio::test]
    async fn invalid_selection_keeps_the_round_open() {
        let scores = Arc::new(RecordingScores::default());
        let mut session = session_with(scores, None);
        session.start().unwrap();

        let err = session.answer(9).await.unwrap_err();
        assert_eq!(
            err,
            SessionError::Round(RoundError::InvalidSelection { index: 9, len: 2 })
        );
        assert_eq!(session.phase(), SessionPhase::InRound);
        assert_eq!(session.score(), 0);
        assert!(!session.current_round().unwrap().is_answered());
    }

    #[tokio::test]
    async fn score_only_grows_by_the_reward() {
        let scores = Arc::new(RecordingScores::default());
        let mut session = session_with(scores, None);
        session.start().unwrap();

        let mut previous = session.score();
        for _ in 0..20 {
            let correct = correct_index(&session);
            let AnswerOutcome::Correct { score, respawn } =
                session.answer(correct).await.unwrap()
            else {
                panic!("expected a correct answer");
            };
            assert_eq!(score, previous + 10);
            previous = score;
            session.advance(respawn).unwrap();
        }
        assert_eq!(session.score(), 200);
    }

    #[tokio::test]
    async fn restart_invalidates_pending_respawn() {
        let scores = Arc::new(RecordingScores::default());
        let mut session = session_with(scores, None);
        session.start().unwrap();

        let AnswerOutcome::Correct { respawn, .. } =
            session.answer(correct_index(&session)).await.unwrap()
        else {
            panic!("expected a correct answer");
        };

        session.start().unwrap();
        assert_eq!(session.score(), 0);
        let version = session.snapshot().version;

        assert!(session.advance(respawn).unwrap().is_none());
        assert_eq!(session.snapshot().version, version);
        assert!(!session.current_round().unwrap().is_answered());
    }

    #[tokio::test]
    async fn start_is_rejected_while_a_round_is_open() {
        let scores = Arc::new(RecordingScores::default());
        let mut session = session_with(scores, None);
        session.start().unwrap();

        let err = session.start().unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition(_)));
        assert_eq!(session.phase(), SessionPhase::InRound);
    }

    #[tokio::test]
    async fn backend_failures_keep_local_game_over_state() {
        let scores = Arc::new(RecordingScores {
            offline: true,
            ..Default::default()
        });
        let mut session = session_with(scores.clone(), Some(Uuid::new_v4()));
        session.start().unwrap();

        let correct = correct_index(&session);
        let AnswerOutcome::Correct { respawn, .. } = session.answer(correct).await.unwrap() else {
            panic!("expected a correct answer");
        };
        session.wait_and_advance(respawn).await.unwrap();

        let wrong = 1 - correct_index(&session);
        let AnswerOutcome::GameOver(report) = session.answer(wrong).await.unwrap() else {
            panic!("expected game over");
        };

        assert_eq!(report.final_score, 10);
        assert!(matches!(
            report.score_saved,
            Err(PersistenceError::Unavailable(_))
        ));
        assert!(report.leaderboard.is_err());
        assert!(session.is_over());
        assert_eq!(session.score(), 10);
        assert_eq!(scores.leaderboard_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn game_over_without_player_still_fetches_leaderboard() {
        let scores = Arc::new(RecordingScores::default());
        let mut session = session_with(scores.clone(), None);
        session.start().unwrap();

        let wrong = 1 - correct_index(&session);
        let AnswerOutcome::GameOver(report) = session.answer(wrong).await.unwrap() else {
            panic!("expected game over");
        };

        assert_eq!(report.score_saved, Err(PersistenceError::MissingPlayer));
        assert!(scores.recorded.lock().unwrap().is_empty());
        assert_eq!(scores.leaderboard_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn broken_bank_leaves_session_untouched() {
        let scores = Arc::new(RecordingScores::default());
        let mut session = GameSession::with_rng(
            Arc::new(QuestionBank::default()),
            scores,
            GameSettings::default(),
            None,
            StdRng::seed_from_u64(1),
        );

        let err = session.start().unwrap_err();
        assert_eq!(err, SessionError::Question(QuestionError::EmptyBank));
        assert_eq!(session.phase(), SessionPhase::NotStarted);
        assert!(session.current_round().is_none());
    }
}
