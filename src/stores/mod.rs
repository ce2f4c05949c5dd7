//! Store interfaces and the session bundle.
//!
//! Each of the four stores (plus the relational admin connection) is
//! reached through a trait so the coordinator can be exercised against
//! test doubles. All handles are owned, optional, and never shared across
//! threads; absence is a first-class state checked before every operation.
use crate::errors::MigrationError;
use crate::model::{Row, TableSpec};
use async_trait::async_trait;
use tracing::info;

/// Read-only access to the source relational store: schema introspection
/// plus an unfiltered row scan per table.
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Ordered column names of the given table, from the source schema.
    async fn table_columns(&self, table: &str) -> Result<Vec<String>, MigrationError>;

    /// Every row of the given table, values in column order.
    async fn read_rows(&self, table: &str) -> Result<Vec<Row>, MigrationError>;

    async fn commit(&self) -> Result<(), MigrationError>;
    async fn rollback(&self) -> Result<(), MigrationError>;
    async fn close(&self);
}

/// Write access to the newly provisioned target relational database.
#[async_trait]
pub trait TargetStore: Send + Sync {
    async fn create_table(&self, ddl: &str) -> Result<(), MigrationError>;

    /// Insert one row with positional parameter binding; never
    /// string-interpolated values.
    async fn insert_row(
        &self,
        table: &TableSpec,
        columns: &[String],
        row: &Row,
    ) -> Result<(), MigrationError>;

    async fn commit(&self) -> Result<(), MigrationError>;
    async fn rollback(&self) -> Result<(), MigrationError>;
    async fn close(&self);
}

/// Administrative relational connection: database-level DDL only.
#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn database_exists(&self, name: &str) -> Result<bool, MigrationError>;
    async fn create_database(&self, name: &str) -> Result<(), MigrationError>;
    async fn drop_database(&self, name: &str) -> Result<(), MigrationError>;

    async fn commit(&self) -> Result<(), MigrationError>;
    async fn rollback(&self) -> Result<(), MigrationError>;
    async fn close(&self);
}

/// Opens a session scoped to the target database once it exists. The
/// target handle cannot be opened up front: the database it points at is
/// created by the schema provisioning phase.
#[async_trait]
pub trait TargetConnector: Send + Sync {
    async fn connect(&self, database: &str) -> Result<Box<dyn TargetStore>, MigrationError>;
}

/// Graph store surface: write-transaction execution of a query string.
/// Each call runs as its own independent transaction.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Execute one write query and report how many records it returned.
    async fn execute_write(&self, query: &str) -> Result<u64, MigrationError>;

    async fn close(&self);
}

/// Document store surface: collection listing, creation, and
/// whole-database drop.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn collection_exists(&self, name: &str) -> Result<bool, MigrationError>;
    async fn create_collection(&self, name: &str) -> Result<(), MigrationError>;
    async fn drop_database(&self) -> Result<(), MigrationError>;

    async fn close(&self);
}

/// Owned bundle of every store session held for the duration of a run.
pub struct Sessions {
    pub admin: Option<Box<dyn AdminStore>>,
    pub source: Option<Box<dyn SourceStore>>,
    pub target: Option<Box<dyn TargetStore>>,
    pub graph: Option<Box<dyn GraphStore>>,
    pub document: Option<Box<dyn DocumentStore>>,
}

impl Sessions {
    pub fn admin(&self) -> Result<&dyn AdminStore, MigrationError> {
        self.admin
            .as_deref()
            .ok_or(MigrationError::SessionClosed("admin"))
    }

    pub fn source(&self) -> Result<&dyn SourceStore, MigrationError> {
        self.source
            .as_deref()
            .ok_or(MigrationError::SessionClosed("source"))
    }

    pub fn target(&self) -> Result<&dyn TargetStore, MigrationError> {
        self.target
            .as_deref()
            .ok_or(MigrationError::SessionClosed("target"))
    }

    pub fn graph(&self) -> Result<&dyn GraphStore, MigrationError> {
        self.graph
            .as_deref()
            .ok_or(MigrationError::SessionClosed("graph"))
    }

    pub fn document(&self) -> Result<&dyn DocumentStore, MigrationError> {
        self.document
            .as_deref()
            .ok_or(MigrationError::SessionClosed("document"))
    }

    /// Close every open handle in turn; an absent handle is skipped,
    /// never an error.
    pub async fn close_all(&mut self) {
        if let Some(admin) = self.admin.take() {
            admin.close().await;
            info!("✓ Closed admin connection");
        }
        if let Some(source) = self.source.take() {
            source.close().await;
            info!("✓ Closed source connection");
        }
        if let Some(target) = self.target.take() {
            target.close().await;
            info!("✓ Closed target connection");
        }
        if let Some(graph) = self.graph.take() {
            graph.close().await;
            info!("✓ Closed graph driver");
        }
        if let Some(document) = self.document.take() {
            document.close().await;
            info!("✓ Closed document client");
        }
    }
}
