// Target relational store: admin DDL and row loading
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgPool, Postgres};
use tracing::debug;

use crate::errors::MigrationError;
use crate::model::{Row, SqlValue, TableSpec, ValueKind};
use crate::postgres::connection;
use crate::stores::{AdminStore, TargetConnector, TargetStore};

/// Administrative connection, scoped to the maintenance database and
/// capable of `CREATE DATABASE` / `DROP DATABASE`.
pub struct PostgresAdmin {
    pool: PgPool,
}

impl PostgresAdmin {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminStore for PostgresAdmin {
    async fn database_exists(&self, name: &str) -> Result<bool, MigrationError> {
        let found = sqlx::query("SELECT 1 FROM pg_database WHERE datname = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn create_database(&self, name: &str) -> Result<(), MigrationError> {
        sqlx::query(&format!("CREATE DATABASE {name}"))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn drop_database(&self, name: &str) -> Result<(), MigrationError> {
        sqlx::query(&format!("DROP DATABASE IF EXISTS {name} WITH (FORCE)"))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn commit(&self) -> Result<(), MigrationError> {
        // Database-level DDL commits implicitly.
        debug!("admin connection runs autocommit, commit is a no-op");
        Ok(())
    }

    async fn rollback(&self) -> Result<(), MigrationError> {
        debug!("admin connection runs autocommit, rollback is a no-op");
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Connection scoped to the newly created target database.
pub struct PostgresTarget {
    pool: PgPool,
}

impl PostgresTarget {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TargetStore for PostgresTarget {
    async fn create_table(&self, ddl: &str) -> Result<(), MigrationError> {
        sqlx::query(ddl).execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_row(
        &self,
        table: &TableSpec,
        columns: &[String],
        row: &Row,
    ) -> Result<(), MigrationError> {
        let placeholders = (1..=row.len())
            .map(|i| format!("${i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.name,
            columns.join(", "),
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for (name, value) in columns.iter().zip(row.iter()) {
            query = bind_value(query, table, name, value);
        }
        query.execute(&self.pool).await?;
        Ok(())
    }

    async fn commit(&self) -> Result<(), MigrationError> {
        debug!("target connection runs autocommit, commit is a no-op");
        Ok(())
    }

    async fn rollback(&self) -> Result<(), MigrationError> {
        // Inserts autocommit per statement; compensation for this store is
        // the whole-database drop driven by the ledger.
        debug!("target connection runs autocommit, rollback is a no-op");
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Bind one value positionally. A NULL is bound with the type declared
/// for the column so the wire type matches the target column.
fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    table: &TableSpec,
    column: &str,
    value: &SqlValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        SqlValue::Integer(v) => query.bind(*v),
        SqlValue::Decimal(v) => query.bind(v.clone()),
        SqlValue::Text(v) => query.bind(v.clone()),
        SqlValue::Boolean(v) => query.bind(*v),
        SqlValue::Timestamp(v) => query.bind(*v),
        SqlValue::Null => {
            let kind = table
                .column(column)
                .map(|spec| spec.value_kind())
                .unwrap_or(ValueKind::Text);
            match kind {
                ValueKind::Integer => query.bind(Option::<i64>::None),
                ValueKind::Decimal => query.bind(Option::<BigDecimal>::None),
                ValueKind::Text => query.bind(Option::<String>::None),
                ValueKind::Boolean => query.bind(Option::<bool>::None),
                ValueKind::Timestamp => query.bind(Option::<NaiveDateTime>::None),
            }
        }
    }
}

/// Opens target-scoped sessions by rewriting the admin connection URL to
/// point at the freshly created database.
pub struct PostgresTargetConnector {
    admin_url: String,
}

impl PostgresTargetConnector {
    pub fn new(admin_url: String) -> Self {
        Self { admin_url }
    }
}

#[async_trait]
impl TargetConnector for PostgresTargetConnector {
    async fn connect(&self, database: &str) -> Result<Box<dyn TargetStore>, MigrationError> {
        let url = database_url(&self.admin_url, database);
        let pool = connection::connect(&url).await?;
        Ok(Box::new(PostgresTarget::new(pool)))
    }
}

/// Swap the database segment of a connection URL, preserving any query
/// parameters.
fn database_url(admin_url: &str, database: &str) -> String {
    let (base, query) = match admin_url.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (admin_url, None),
    };
    let base = base.rsplit_once('/').map(|(head, _)| head).unwrap_or(base);
    match query {
        Some(query) => format!("{base}/{database}?{query}"),
        None => format!("{base}/{database}"),
    }
}
