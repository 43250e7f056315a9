use std::{env, time::Duration};

use mongodb::options::ClientOptions;
use tracing::warn;

use super::{
    connection::ConnectRetry,
    error::{MongoDaoError, MongoResult},
};

/// Database used when `MONGO_DB` is not set.
const DEFAULT_DATABASE_NAME: &str = "fruit_quiz";
/// Server used when `MONGO_URI` is not set.
const DEFAULT_URI: &str = "mongodb://localhost:27017";

#[derive(Clone)]
pub struct MongoConfig {
    pub options: ClientOptions,
    pub database_name: String,
    pub retry: ConnectRetry,
}

impl MongoConfig {
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let database_name = db_name.unwrap_or(DEFAULT_DATABASE_NAME).to_owned();
        let options =
            ClientOptions::parse(uri)
                .await
                .map_err(|source| MongoDaoError::InvalidUri {
                    uri: uri.to_owned(),
                    source,
                })?;

        Ok(Self {
            options,
            database_name,
            retry: ConnectRetry::default(),
        })
    }

    /// Read `MONGO_URI`, `MONGO_DB`, `MONGO_CONNECT_ATTEMPTS` and `MONGO_CONNECT_BACKOFF_MS`, all optional.
    pub async fn from_env() -> MongoResult<Self> {
        let uri = env::var("MONGO_URI").unwrap_or_else(|_| DEFAULT_URI.into());
        let db = env::var("MONGO_DB")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let mut config = Self::from_uri(&uri, db.as_deref()).await?;
        config.retry = retry_from_vars(
            env::var("MONGO_CONNECT_ATTEMPTS").ok().as_deref(),
            env::var("MONGO_CONNECT_BACKOFF_MS").ok().as_deref(),
        );
        Ok(config)
    }
}

/// Apply the connection retry overrides on top of [`ConnectRetry::default`].
fn retry_from_vars(attempts: Option<&str>, backoff_ms: Option<&str>) -> ConnectRetry {
    let mut retry = ConnectRetry::default();

    if let Some(raw) = attempts {
        match raw.trim().parse::<u32>() {
            Ok(value) if value > 0 => retry.max_attempts = value,
            _ => warn!(value = raw, "ignoring invalid MONGO_CONNECT_ATTEMPTS"),
        }
    }
    if let Some(raw) = backoff_ms {
        match raw.trim().parse::<u64>() {
            Ok(value) => retry.initial_backoff = Duration::from_millis(value),
            Err(_) => warn!(value = raw, "ignoring invalid MONGO_CONNECT_BACKOFF_MS"),
        }
    }

    retry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_overrides_are_applied() {
        let retry = retry_from_vars(Some("3"), Some(" 40 "));
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.initial_backoff, Duration::from_millis(40));
        assert_eq!(retry.max_backoff, ConnectRetry::default().max_backoff);
    }

    #[test]
    fn invalid_retry_overrides_keep_defaults() {
        assert_eq!(retry_from_vars(Some("0"), Some("soon")), ConnectRetry::default());
        assert_eq!(retry_from_vars(None, None), ConnectRetry::default());
    }
}
