// Source relational store: schema introspection and row scans
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Column, PgPool, Row as _, TypeInfo};
use tracing::debug;

use crate::errors::MigrationError;
use crate::model::{Row, SqlValue};
use crate::stores::SourceStore;

/// Read-only view of the source relational database.
pub struct PostgresSource {
    pool: PgPool,
}

impl PostgresSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SourceStore for PostgresSource {
    async fn table_columns(&self, table: &str) -> Result<Vec<String>, MigrationError> {
        let rows = sqlx::query(
            "SELECT column_name FROM information_schema.columns \
             WHERE table_name = $1 ORDER BY ordinal_position",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| row.get::<String, _>("column_name"))
            .collect())
    }

    async fn read_rows(&self, table: &str) -> Result<Vec<Row>, MigrationError> {
        let rows = sqlx::query(&format!("SELECT * FROM {table}"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(decode_row).collect()
    }

    async fn commit(&self) -> Result<(), MigrationError> {
        // Read-only pool in autocommit mode; nothing to commit.
        debug!("source connection runs autocommit, commit is a no-op");
        Ok(())
    }

    async fn rollback(&self) -> Result<(), MigrationError> {
        debug!("source connection runs autocommit, rollback is a no-op");
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn decode_row(row: &PgRow) -> Result<Row, MigrationError> {
    let mut values = Vec::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        values.push(decode_value(row, idx, column.type_info().name())?);
    }
    Ok(values)
}

/// Decode one column by its runtime type. NULLs collapse to
/// `SqlValue::Null`; anything outside the supported set is fatal.
fn decode_value(row: &PgRow, idx: usize, type_name: &str) -> Result<SqlValue, MigrationError> {
    let value = match type_name {
        "INT2" => row
            .try_get::<Option<i16>, _>(idx)?
            .map(|v| SqlValue::Integer(v as i64)),
        "INT4" => row
            .try_get::<Option<i32>, _>(idx)?
            .map(|v| SqlValue::Integer(v as i64)),
        "INT8" => row
            .try_get::<Option<i64>, _>(idx)?
            .map(SqlValue::Integer),
        "NUMERIC" => row
            .try_get::<Option<BigDecimal>, _>(idx)?
            .map(SqlValue::Decimal),
        "VARCHAR" | "TEXT" | "CHAR" | "BPCHAR" | "NAME" => row
            .try_get::<Option<String>, _>(idx)?
            .map(SqlValue::Text),
        "BOOL" => row
            .try_get::<Option<bool>, _>(idx)?
            .map(SqlValue::Boolean),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(idx)?
            .map(SqlValue::Timestamp),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(idx)?
            .map(|v| SqlValue::Timestamp(v.naive_utc())),
        other => return Err(MigrationError::UnsupportedColumnType(other.to_string())),
    };

    Ok(value.unwrap_or(SqlValue::Null))
}
