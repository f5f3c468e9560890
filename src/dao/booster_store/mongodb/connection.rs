use std::time::Duration;

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;
use tracing::debug;

use super::error::{MongoDaoError, MongoResult};

const DEFAULT_DATABASE: &str = "boosters";
const APP_NAME: &str = "boosters-back";

/// Connection parameters for the MongoDB booster store.
#[derive(Clone)]
pub struct MongoConfig {
    /// Driver options parsed from the connection URI.
    pub options: ClientOptions,
    /// Database holding the `boosters` and `counters` collections.
    pub database_name: String,
    /// Backoff for the first ping.
    pub retry: PingRetry,
}

/// Backoff applied to the first ping of a fresh client.
#[derive(Debug, Clone, Copy)]
pub struct PingRetry {
    /// Pings attempted before giving up.
    pub max_attempts: u32,
    /// Delay after the first failure, doubled on each retry.
    pub initial_delay: Duration,
    /// Upper bound of the delay.
    pub max_delay: Duration,
}

impl Default for PingRetry {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl MongoConfig {
    /// Parse a connection URI; the database defaults to `boosters`.
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|source| MongoDaoError::InvalidUri {
                uri: uri.to_owned(),
                source,
            })?;
        options.app_name.get_or_insert_with(|| APP_NAME.to_owned());

        Ok(Self {
            options,
            database_name: db_name.unwrap_or(DEFAULT_DATABASE).to_owned(),
            retry: PingRetry::default(),
        })
    }

    /// Build a client and wait until the target database answers a ping.
    pub(super) async fn open(&self) -> MongoResult<(Client, Database)> {
        let client = Client::with_options(self.options.clone())
            .map_err(|source| MongoDaoError::ClientConstruction { source })?;
        let database = client.database(&self.database_name);

        let mut delay = self.retry.initial_delay;
        for attempt in 1..=self.retry.max_attempts {
            match database.run_command(doc! { "ping": 1 }).await {
                Ok(_) => return Ok((client, database)),
                Err(source) if attempt == self.retry.max_attempts => {
                    return Err(MongoDaoError::InitialPing {
                        attempts: attempt,
                        source,
                    });
                }
                Err(err) => {
                    debug!(attempt, ?delay, error = %err, "MongoDB ping failed; retrying");
                    sleep(delay).await;
                    delay = (delay * 2).min(self.retry.max_delay);
                }
            }
        }
        Err(MongoDaoError::NoPingAttempts)
    }
}
