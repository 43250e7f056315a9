//! Opening the player database with a bounded ping retry.

use std::{iter, time::Duration};

use mongodb::{Client, Database, bson::doc};
use tokio::time::sleep;
use tracing::debug;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
};

/// Ping attempts made before giving up on the player database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectRetry {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for ConnectRetry {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl ConnectRetry {
    /// Pauses taken after each failed ping, doubling up to `max_backoff`.
    ///
    /// Yields one pause fewer than `max_attempts`: the last failure is final.
    pub fn backoffs(self) -> impl Iterator<Item = Duration> {
        let max = self.max_backoff;
        iter::successors(Some(self.initial_backoff.min(max)), move |delay| {
            Some(delay.saturating_mul(2).min(max))
        })
        .take(self.max_attempts.saturating_sub(1) as usize)
    }
}

/// Build a client for `config` and wait until the player database answers a ping.
pub(super) async fn open_database(config: &MongoConfig) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(config.options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&config.database_name);
    let mut backoffs = config.retry.backoffs();
    let mut attempts = 0;

    loop {
        attempts += 1;
        let source = match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => {
                debug!(database = %config.database_name, attempts, "player database reachable");
                return Ok((client, database));
            }
            Err(err) => err,
        };

        let Some(delay) = backoffs.next() else {
            return Err(MongoDaoError::InitialPing {
                database: config.database_name.clone(),
                attempts,
                source,
            });
        };
        debug!(
            database = %config.database_name,
            attempts,
            retry_in_ms = delay.as_millis() as u64,
            error = %source,
            "player database ping failed; retrying"
        );
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_saturates() {
        let retry = ConnectRetry {
            max_attempts: 6,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(500),
        };
        let delays: Vec<u128> = retry.backoffs().map(|d| d.as_millis()).collect();
        assert_eq!(delays, vec![100, 200, 400, 500, 500]);
    }

    #[test]
    fn single_attempt_never_sleeps() {
        let retry = ConnectRetry {
            max_attempts: 1,
            ..ConnectRetry::default()
        };
        assert_eq!(retry.backoffs().count(), 0);
    }
}
