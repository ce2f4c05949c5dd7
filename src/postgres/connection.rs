// PostgreSQL connection setup
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::PG_MAX_CONNECTIONS;
use crate::errors::MigrationError;

/// Connect to a PostgreSQL database and return a connection pool.
pub async fn connect(url: &str) -> Result<PgPool, MigrationError> {
    let pool = PgPoolOptions::new()
        .max_connections(PG_MAX_CONNECTIONS)
        .connect(url)
        .await?;

    Ok(pool)
}
