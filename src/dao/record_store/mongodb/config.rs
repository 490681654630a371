use std::time::Duration;

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;
use tracing::warn;

use super::error::{MongoDaoError, MongoResult};

const PING_ATTEMPTS: u32 = 10;
const FIRST_PING_BACKOFF: Duration = Duration::from_millis(250);
const MAX_PING_BACKOFF: Duration = Duration::from_secs(5);

/// Parsed connection settings for [`super::MongoRecordStore`].
#[derive(Clone)]
pub struct MongoConfig {
    /// Driver options parsed from the connection URI.
    pub options: ClientOptions,
    /// Database holding the `games` and `reviews` collections.
    pub database_name: String,
}

impl MongoConfig {
    /// Parse `uri` and pair it with the database holding the games and reviews collections.
    pub async fn from_uri(uri: &str, database_name: &str) -> MongoResult<Self> {
        let mut options =
            ClientOptions::parse(uri)
                .await
                .map_err(|source| MongoDaoError::InvalidUri {
                    uri: uri.to_owned(),
                    source,
                })?;
        options
            .app_name
            .get_or_insert_with(|| env!("CARGO_PKG_NAME").to_owned());

        Ok(Self {
            options,
            database_name: database_name.to_owned(),
        })
    }

    /// Open a client and return it once the server answers `ping`.
    ///
    /// Gives up after [`PING_ATTEMPTS`] pings, doubling the pause between them.
    pub async fn open(&self) -> MongoResult<(Client, Database)> {
        let client = Client::with_options(self.options.clone())
            .map_err(|source| MongoDaoError::ClientConstruction { source })?;
        let database = client.database(&self.database_name);

        let mut backoff = FIRST_PING_BACKOFF;
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match database.run_command(doc! { "ping": 1 }).await {
                Ok(_) => return Ok((client, database)),
                Err(err) => err,
            };
            if attempt >= PING_ATTEMPTS {
                return Err(MongoDaoError::InitialPing {
                    attempts: attempt,
                    source: err,
                });
            }
            warn!(
                attempt,
                backoff_ms = backoff.as_millis() as u64,
                database = %self.database_name,
                error = %err,
                "MongoDB not answering yet"
            );
            sleep(backoff).await;
            backoff = (backoff * 2).min(MAX_PING_BACKOFF);
        }
    }
}
