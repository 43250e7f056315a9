// Integration tests for the reqwest client against a server bound to an ephemeral port.
#![cfg(feature = "http-client")]

use std::sync::Arc;

use fruit_quiz_back::{
    client::{HttpScoreClient, RegistrationError},
    config::AppConfig,
    dao::player_store::memory::InMemoryPlayerStore,
    routes,
    state::{
        AppState,
        persistence::{PersistenceError, ScoreService},
        question::{QuestionBank, QuestionItem},
        session::{AnswerOutcome, GameSession, GameSettings},
    },
};
use rand::{SeedableRng, rngs::StdRng};
use tokio::net::TcpListener;
use uuid::Uuid;

async fn spawn_server() -> String {
    let state = AppState::new(AppConfig::default());
    state
        .set_player_store(Arc::new(InMemoryPlayerStore::new()))
        .await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, routes::router(state)).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn register_rejects_blank_fields_before_calling_the_backend() {
    let client = HttpScoreClient::new("http://127.0.0.1:9").unwrap();
    let err = client.register("  ", "x").await.unwrap_err();
    assert!(matches!(err, RegistrationError::MissingField("studentName")));
}

#[tokio::test]
async fn client_records_scores_and_reads_the_leaderboard() {
    let client = HttpScoreClient::new(&spawn_server().await).unwrap();
    let player = client.register("Erin", "V").await.unwrap();
    assert_eq!(player.student_name, "erin");

    client.record_score(player.user_id, 50).await.unwrap();
    let rows = ScoreService::leaderboard(&client).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "ERIN");
    assert_eq!(rows[0].best_score, 50);

    let questions = client.questions().await.unwrap();
    assert!(!questions.is_empty());
}

#[tokio::test]
async fn unknown_player_is_reported_as_such() {
    let client = HttpScoreClient::new(&spawn_server().await).unwrap();
    let id = Uuid::new_v4();
    assert_eq!(
        client.record_score(id, 10).await,
        Err(PersistenceError::UnknownPlayer(id))
    );
}

#[tokio::test]
async fn unreachable_backend_does_not_break_the_local_game() {
    let client = Arc::new(HttpScoreClient::new("http://127.0.0.1:9").unwrap());
    let bank = Arc::new(QuestionBank::new(vec![QuestionItem::new("Q", ["A", "B"], 0)]));
    let mut session = GameSession::with_rng(
        bank,
        client,
        GameSettings::default(),
        Some(Uuid::new_v4()),
        StdRng::seed_from_u64(3),
    );

    let wrong = 1 - session.start().unwrap().correct_display_index();
    let AnswerOutcome::GameOver(report) = session.answer(wrong).await.unwrap() else {
        panic!("expected game over");
    };
    assert!(matches!(
        report.score_saved,
        Err(PersistenceError::Unavailable(_))
    ));
    assert!(report.leaderboard.is_err());
    assert!(session.is_over());
}

#[tokio::test]
async fn full_game_against_a_live_server() {
    let base_url = spawn_server().await;
    let client = Arc::new(HttpScoreClient::new(&base_url).unwrap());
    let player = client.register("frank", "u").await.unwrap();

    let bank = Arc::new(QuestionBank::new(vec![QuestionItem::new("Q", ["A", "B"], 1)]));
    let mut session = GameSession::with_rng(
        bank,
        client.clone(),
        GameSettings {
            points_per_correct: 10,
            respawn_delay: std::time::Duration::from_millis(1),
        },
        Some(player.user_id),
        StdRng::seed_from_u64(8),
    );

    let correct = session.start().unwrap().correct_display_index();
    let AnswerOutcome::Correct { respawn, .. } = session.answer(correct).await.unwrap() else {
        panic!("expected a correct answer");
    };
    let wrong = 1 - session
        .wait_and_advance(respawn)
        .await
        .unwrap()
        .unwrap()
        .correct_display_index();

    let AnswerOutcome::GameOver(report) = session.answer(wrong).await.unwrap() else {
        panic!("expected game over");
    };
    assert_eq!(report.score_saved, Ok(()));
    let leaderboard = report.leaderboard.unwrap();
    assert_eq!(leaderboard[0].name, "FRANK");
    assert_eq!(leaderboard[0].best_score, 10);
}
