//! Play the fruit quiz in a terminal against a running backend.
//!
//! Usage: `fruit-quiz-play [BASE_URL]` (defaults to `FRUIT_QUIZ_URL` or `http://localhost:3000`).

use std::{env, sync::Arc};

use anyhow::{Context, bail};
use fruit_quiz_back::{
    client::HttpScoreClient,
    state::{
        question::{QuestionBank, default_bank},
        round::RoundState,
        session::{AnswerOutcome, GameOverReport, GameSession, GameSettings},
    },
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin, stdin};
use tracing::warn;

const DEFAULT_BASE_URL: &str = "http://localhost:3000";

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let base_url = env::args()
        .nth(1)
        .or_else(|| env::var("FRUIT_QUIZ_URL").ok())
        .unwrap_or_else(|| DEFAULT_BASE_URL.into());
    let client = Arc::new(HttpScoreClient::new(&base_url).context("building HTTP client")?);
    let mut input = BufReader::new(stdin()).lines();

    let student_name = prompt(&mut input, "Student name: ").await?;
    let college_name = prompt(&mut input, "College name: ").await?;
    let player = client
        .register(&student_name, &college_name)
        .await
        .context("registering player")?;
    println!("Welcome {}!", player.student_name);

    let bank = match client.questions().await {
        Ok(items) => {
            let (bank, rejected) = QuestionBank::validated_or_default(items);
            for err in &rejected {
                warn!(error = %err, "skipping invalid question from server");
            }
            bank
        }
        Err(err) => {
            warn!(error = %err, "could not fetch questions; using built-in bank");
            default_bank()
        }
    };

    let mut session = GameSession::new(
        Arc::new(bank),
        client,
        GameSettings::default(),
        Some(player.user_id),
    );

    loop {
        let round = session.start().context("starting game")?;
        print_round(round);

        loop {
            let selected = read_choice(&mut input, session.current_round()).await?;
            match session.answer(selected).await {
                Ok(AnswerOutcome::Correct { score, respawn }) => {
                    println!("Correct! Score: {score}");
                    if let Some(round) = session.wait_and_advance(respawn).await? {
                        print_round(round);
                    }
                }
                Ok(AnswerOutcome::GameOver(report)) => {
                    print_game_over(&report);
                    break;
                }
                Err(err) => println!("{err}"),
            }
        }

        let again = prompt(&mut input, "Play again? [y/N] ").await?;
        if !again.eq_ignore_ascii_case("y") {
            return Ok(());
        }
    }
}

async fn prompt(input: &mut Input, label: &str) -> anyhow::Result<String> {
    print!("{label}");
    std::io::Write::flush(&mut std::io::stdout()).context("flushing stdout")?;
    match input.next_line().await.context("reading stdin")? {
        Some(line) => Ok(line.trim().to_owned()),
        None => bail!("stdin closed"),
    }
}

async fn read_choice(input: &mut Input, round: Option<&RoundState>) -> anyhow::Result<usize> {
    let len = round.map_or(0, |round| round.displayed_options().len());
    loop {
        let line = prompt(input, "Your pick: ").await?;
        match line.parse::<usize>() {
            Ok(choice) if (1..=len).contains(&choice) => return Ok(choice - 1),
            _ => println!("Enter a number between 1 and {len}."),
        }
    }
}

fn print_round(round: &RoundState) {
    println!();
    println!("{}", round.question().text);
    for (index, option) in round.displayed_options().iter().enumerate() {
        println!("  {}. {option}", index + 1);
    }
}

fn print_game_over(report: &GameOverReport) {
    println!("Wrong! Game over. Final score: {}", report.final_score);
    if let Err(err) = &report.score_saved {
        println!("(score not saved: {err})");
    }
    match &report.leaderboard {
        Ok(rows) => {
            println!("Leaderboard:");
            for (rank, row) in rows.iter().enumerate() {
                println!(
                    "  {}. {} ({}) {}",
                    rank + 1,
                    row.name,
                    row.college,
                    row.best_score
                );
            }
        }
        Err(err) => println!("(leaderboard unavailable: {err})"),
    }
}
