use chrono::Duration;
use redis::aio::MultiplexedConnection;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use thiserror::Error;

use crate::{config::Config, error::Error, jwt::SessionKeys};

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Database unavailable: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Cache unavailable: {0}")]
    Cache(#[from] redis::RedisError),
    #[error("Session keys unavailable: {0}")]
    Session(#[from] Error),
}

/// Shared handles cloned into every request.
#[derive(Clone)]
pub struct State {
    pub pool: Pool<Postgres>,
    pub cache: Option<MultiplexedConnection>,
    pub keys: SessionKeys,
}

impl State {
    pub async fn new(config: &Config) -> Result<Self, StateError> {
        log::info!("Connecting to database...");
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        log::info!("Running migrations...");
        sqlx::migrate!("./migrations").run(&pool).await?;

        let cache = match &config.redis_url {
            Some(url) => {
                log::info!("Connecting to cache...");
                let client = redis::Client::open(url.as_str())?;
                Some(client.get_multiplexed_async_connection().await?)
            }
            None => {
                log::warn!("REDIS_URL not set, catalog caching disabled");
                None
            }
        };

        let keys = SessionKeys::new(
            config.secret_key.as_bytes(),
            Duration::hours(config.token_lifetime_hours),
        )?;

        Ok(Self::from_parts(pool, cache, keys))
    }

    pub fn from_parts(
        pool: Pool<Postgres>,
        cache: Option<MultiplexedConnection>,
        keys: SessionKeys,
    ) -> Self {
        Self { pool, cache, keys }
    }
}
