//! Application-level configuration loading: question bank and gameplay tunables.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::{
    question::{QuestionBank, QuestionItem, default_bank},
    score::DEFAULT_POINTS_PER_CORRECT,
    session::{DEFAULT_RESPAWN_DELAY, GameSettings},
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "FRUIT_QUIZ_CONFIG_PATH";
/// Number of players shown on the leaderboard.
pub const DEFAULT_LEADERBOARD_SIZE: usize = 5;
/// Server-hosted session left without commands for this long is dropped.
const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
/// Finished session kept around this long so its result can still be read.
const DEFAULT_FINISHED_SESSION_TTL: Duration = Duration::from_secs(30);

/// How long server-hosted sessions survive without activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLifetime {
    /// Quiet period after which a session that is still playable is dropped.
    pub idle_timeout: Duration,
    /// Quiet period after which a session in game over is dropped.
    pub finished_ttl: Duration,
}

impl Default for SessionLifetime {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_SESSION_IDLE_TIMEOUT,
            finished_ttl: DEFAULT_FINISHED_SESSION_TTL,
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    bank: QuestionBank,
    settings: GameSettings,
    leaderboard_size: usize,
    session_lifetime: SessionLifetime,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        questions = app_config.bank.len(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a configuration document.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Bank rounds are drawn from.
    pub fn question_bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Scoring and pacing used by new sessions.
    pub fn game_settings(&self) -> GameSettings {
        self.settings
    }

    /// Number of entries returned by the leaderboard.
    pub fn leaderboard_size(&self) -> usize {
        self.leaderboard_size
    }

    /// Expiry rules for server-hosted sessions.
    pub fn session_lifetime(&self) -> SessionLifetime {
        self.session_lifetime
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bank: default_bank(),
            settings: GameSettings::default(),
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
            session_lifetime: SessionLifetime::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    questions: Option<Vec<QuestionItem>>,
    #[serde(default = "default_points")]
    points_per_correct: u32,
    #[serde(default = "default_respawn_delay_ms")]
    respawn_delay_ms: u64,
    #[serde(default = "default_leaderboard_size")]
    leaderboard_size: usize,
    #[serde(default)]
    session_idle_timeout_ms: Option<u64>,
    #[serde(default)]
    finished_session_ttl_ms: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let bank = match value.questions {
            Some(items) => {
                let (bank, rejected) = QuestionBank::validated_or_default(items);
                for err in &rejected {
                    warn!(error = %err, "skipping invalid question");
                }
                bank
            }
            None => default_bank(),
        };

        Self {
            bank,
            settings: GameSettings {
                points_per_correct: value.points_per_correct,
                respawn_delay: Duration::from_millis(value.respawn_delay_ms),
            },
            leaderboard_size: value.leaderboard_size.clamp(1, DEFAULT_LEADERBOARD_SIZE),
            session_lifetime: SessionLifetime {
                idle_timeout: value
                    .session_idle_timeout_ms
                    .map_or(DEFAULT_SESSION_IDLE_TIMEOUT, Duration::from_millis),
                finished_ttl: value
                    .finished_session_ttl_ms
                    .map_or(DEFAULT_FINISHED_SESSION_TTL, Duration::from_millis),
            },
        }
    }
}

fn default_points() -> u32 {
    DEFAULT_POINTS_PER_CORRECT
}

fn default_respawn_delay_ms() -> u64 {
    DEFAULT_RESPAWN_DELAY.as_millis() as u64
}

fn default_leaderboard_size() -> usize {
    DEFAULT_LEADERBOARD_SIZE
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
