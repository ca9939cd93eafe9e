use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, Connection, PgPool};
use thiserror::Error;

pub mod posts;
pub mod schema;

pub use posts::{count_channel_posts, count_posts, get_post, save_item, PostRow};
pub use schema::{init_schema, POSTS_TABLE};

const DEFAULT_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_MIN_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Database every Postgres cluster ships with; used to create the target database.
const MAINTENANCE_DATABASE: &str = "postgres";

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &tgcollect_core::AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database URL does not name a database")]
    MissingDatabaseName,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DbError {
    /// True when the pool had no free connection within the acquire timeout.
    #[must_use]
    pub fn is_pool_timeout(&self) -> bool {
        matches!(self, DbError::Sqlx(sqlx::Error::PoolTimedOut))
    }
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// Writers that find the pool exhausted wait up to `acquire_timeout_secs`
/// for a connection before failing with [`sqlx::Error::PoolTimedOut`].
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Create the database named in `database_url` if it does not exist yet.
///
/// Connects to the `postgres` maintenance database on the same server with
/// the same credentials. Returns `true` when the database was created.
///
/// # Errors
///
/// Returns [`DbError::MissingDatabaseName`] if the URL has no database path,
/// or [`DbError::Sqlx`] if the server is unreachable or the role lacks the
/// `CREATEDB` privilege.
pub async fn ensure_database(database_url: &str) -> Result<bool, DbError> {
    let options = PgConnectOptions::from_str(database_url)?;
    let name = options
        .get_database()
        .map(str::to_owned)
        .ok_or(DbError::MissingDatabaseName)?;

    let mut conn = options.database(MAINTENANCE_DATABASE).connect().await?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(&name)
            .fetch_one(&mut conn)
            .await?;

    if !exists {
        // CREATE DATABASE cannot take a bind parameter; quote the identifier instead.
        let statement = format!("CREATE DATABASE {}", quote_ident(&name));
        sqlx::query(&statement).execute(&mut conn).await?;
        tracing::info!(database = %name, "database created");
    }

    conn.close().await?;
    Ok(!exists)
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// Run a full health check: ping the pool and return a typed error on failure.
///
/// # Errors
///
/// Returns [`DbError`] if the ping fails.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    ping(pool).await?;
    Ok(())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_config_has_sane_defaults() {
        let config = PoolConfig::default();

        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.min_connections, DEFAULT_MIN_CONNECTIONS);
        assert_eq!(config.acquire_timeout_secs, DEFAULT_ACQUIRE_TIMEOUT_SECS);
    }

    #[test]
    fn quote_ident_escapes_embedded_quotes() {
        assert_eq!(quote_ident("telegram_collector"), "\"telegram_collector\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn pool_timeout_is_recognized() {
        assert!(DbError::Sqlx(sqlx::Error::PoolTimedOut).is_pool_timeout());
        assert!(!DbError::MissingDatabaseName.is_pool_timeout());
    }
}
