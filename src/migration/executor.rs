// Migration coordinator - orchestrates the cross-store migration flow
use std::time::Instant;
use tracing::{error, info, warn};

use crate::cypher;
use crate::errors::MigrationError;
use crate::ledger::MigrationLedger;
use crate::migration::MigrationState;
use crate::model::{MigrationPlan, TableKind};
use crate::postgres::provisioner;
use crate::projector;
use crate::stores::{Sessions, TargetConnector};

/// End-of-run statistics, reported on success.
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationReport {
    pub tables_loaded: usize,
    pub rows_loaded: usize,
    pub nodes_created: usize,
    pub relationships_created: usize,
    pub collections_created: usize,
    pub elapsed_secs: f64,
}

/// Coordinates the whole run: schema provisioning, two-phase loading,
/// document provisioning, and ledger-driven compensation on failure.
///
/// Execution is strictly sequential; consistency across the three target
/// stores comes from ordering and compensation, not from locking.
pub struct MigrationCoordinator {
    plan: MigrationPlan,
    target_database: String,
    sessions: Sessions,
    connector: Box<dyn TargetConnector>,
    state: MigrationState,
    ledger: MigrationLedger,
    report: MigrationReport,
}

impl MigrationCoordinator {
    pub fn new(
        plan: MigrationPlan,
        target_database: String,
        sessions: Sessions,
        connector: Box<dyn TargetConnector>,
    ) -> Self {
        Self {
            plan,
            target_database,
            sessions,
            connector,
            state: MigrationState::Start,
            ledger: MigrationLedger::new(),
            report: MigrationReport::default(),
        }
    }

    pub fn state(&self) -> MigrationState {
        self.state
    }

    /// Execute the full migration. On success every session is committed
    /// and closed and the run ends `Committed`; on any failure the
    /// compensation path runs, every session is closed, the run ends
    /// `RolledBack`, and the original error is returned.
    pub async fn run(&mut self) -> Result<MigrationReport, MigrationError> {
        let started = Instant::now();

        match self.forward().await {
            Ok(()) => {
                self.sessions.close_all().await;
                self.state = MigrationState::Committed;
                self.report.elapsed_secs = started.elapsed().as_secs_f64();
                self.log_report();
                Ok(self.report)
            }
            Err(cause) => {
                self.state = MigrationState::Failed;
                error!("Migration failed: {cause}");
                self.compensate().await;
                Err(cause)
            }
        }
    }

    async fn forward(&mut self) -> Result<(), MigrationError> {
        info!("\n=== Provisioning target relational schema ===");
        self.provision_schema().await?;
        self.state = MigrationState::SchemaCreated;

        info!("\n=== Loading rows and graph entity nodes ===");
        self.load_entities().await?;
        self.state = MigrationState::RelationalLoaded;
        info!("✓ Loaded {} rows", self.report.rows_loaded);
        self.state = MigrationState::GraphNodesCreated;
        info!("✓ Created {} entity nodes", self.report.nodes_created);

        info!("\n=== Projecting join tables as graph relationships ===");
        self.load_relationships().await?;
        self.state = MigrationState::GraphRelationshipsCreated;
        info!(
            "✓ Created {} relationships",
            self.report.relationships_created
        );

        info!("\n=== Provisioning document collections ===");
        self.provision_documents().await?;
        self.state = MigrationState::DocumentsProvisioned;
        info!(
            "✓ Provisioned {} collections",
            self.report.collections_created
        );

        // Relational handles run autocommit; the explicit commit pass keeps
        // the success path uniform across connection modes.
        self.sessions.target()?.commit().await?;
        self.sessions.source()?.commit().await?;
        self.sessions.admin()?.commit().await?;

        Ok(())
    }

    /// Create the target database and its tables in dependency order.
    /// Failure here is fatal pre-flight: nothing has been written to any
    /// other store, so the (empty) ledger drives no compensation.
    async fn provision_schema(&mut self) -> Result<(), MigrationError> {
        if self
            .sessions
            .admin()?
            .database_exists(&self.target_database)
            .await?
        {
            return Err(MigrationError::TargetDatabaseExists(
                self.target_database.clone(),
            ));
        }

        self.sessions
            .admin()?
            .create_database(&self.target_database)
            .await?;
        self.ledger.record_target_database(&self.target_database);
        info!("✓ Created database {}", self.target_database);

        let target = self.connector.connect(&self.target_database).await?;
        self.sessions.target = Some(target);
        info!("✓ Connected to {}", self.target_database);

        for table in provisioner::creation_order(&self.plan.tables)? {
            let ddl = provisioner::create_table_ddl(table);
            self.sessions.target()?.create_table(&ddl).await?;
            self.ledger.record_table(&table.name);
            info!("✓ Created table {}", table.name);
        }

        Ok(())
    }

    /// Phase one of the two-phase loader: stream every non-join table
    /// into the target relational store, creating one labeled node per
    /// row for graph-entity tables as it goes. Must complete before any
    /// relationship pass so endpoint nodes exist to be matched.
    async fn load_entities(&mut self) -> Result<(), MigrationError> {
        let tables: Vec<_> = self
            .plan
            .tables
            .iter()
            .filter(|t| t.kind != TableKind::GraphJoin)
            .cloned()
            .collect();

        for table in &tables {
            let columns = self.sessions.source()?.table_columns(&table.name).await?;
            let rows = self.sessions.source()?.read_rows(&table.name).await?;
            info!("✓ Read {} rows from {}", rows.len(), table.name);

            for row in &rows {
                self.sessions
                    .target()?
                    .insert_row(table, &columns, row)
                    .await?;
                self.report.rows_loaded += 1;

                if table.kind == TableKind::GraphEntity {
                    let properties = projector::node_properties(&columns, row);
                    let query = cypher::create_node(&table.name, &properties);
                    self.sessions.graph()?.execute_write(&query).await?;
                    self.ledger.record_node_label(&table.name);
                    self.report.nodes_created += 1;
                }
            }

            self.report.tables_loaded += 1;
            info!("✓ Loaded {} into {}", table.name, self.target_database);
        }

        Ok(())
    }

    /// Phase two: project every join table as directed, typed graph
    /// relationships. Each write is its own transaction; an unmatched
    /// endpoint is surfaced, never skipped.
    async fn load_relationships(&mut self) -> Result<(), MigrationError> {
        let joins: Vec<_> = self
            .plan
            .tables
            .iter()
            .filter(|t| t.kind == TableKind::GraphJoin)
            .map(|t| t.name.clone())
            .collect();

        for table in &joins {
            let join = self.plan.joins.get(table).cloned().ok_or_else(|| {
                MigrationError::Config(format!("join table `{table}` has no join spec"))
            })?;

            let columns = self.sessions.source()?.table_columns(table).await?;
            let rows = self.sessions.source()?.read_rows(table).await?;
            info!("✓ Read {} rows from {}", rows.len(), table);

            for row in &rows {
                let write = projector::relationship_write(table, &join, &columns, row)?;
                let query = cypher::create_relationship(&write);
                let returned = self.sessions.graph()?.execute_write(&query).await?;

                if returned == 0 {
                    return Err(MigrationError::EndpointNotMatched {
                        table: table.clone(),
                        relationship: join.relationship.clone(),
                    });
                }

                self.ledger.record_relationship_type(&join.relationship);
                self.report.relationships_created += 1;
            }

            info!("✓ Projected {} as {} relationships", table, join.relationship);
        }

        Ok(())
    }

    /// Idempotent create of every document collection: a collection that
    /// already exists is skipped, never an error.
    async fn provision_documents(&mut self) -> Result<(), MigrationError> {
        let collections = self.plan.document_collections.clone();

        for name in &collections {
            if self.sessions.document()?.collection_exists(name).await? {
                info!("Collection {} already exists, skipping", name);
                continue;
            }
            self.sessions.document()?.create_collection(name).await?;
            self.ledger.record_collection(name);
            self.report.collections_created += 1;
            info!("✓ Created collection {}", name);
        }

        Ok(())
    }

    /// Compensating rollback, driven entirely by the ledger. Failures in
    /// here are logged and superseded by the original cause; every
    /// session is closed regardless.
    async fn compensate(&mut self) {
        info!("\n=== Rolling back ===");
        self.state = MigrationState::RollingBack;

        if let Some(target) = self.sessions.target.as_deref() {
            if let Err(e) = target.rollback().await {
                warn!("Target rollback failed: {e}");
            }
        }
        if let Some(source) = self.sessions.source.as_deref() {
            if let Err(e) = source.rollback().await {
                warn!("Source rollback failed: {e}");
            }
        }
        if let Some(admin) = self.sessions.admin.as_deref() {
            if let Err(e) = admin.rollback().await {
                warn!("Admin rollback failed: {e}");
            }
        }

        if let Some(database) = self.ledger.target_database() {
            match self.sessions.admin.as_deref() {
                Some(admin) => match admin.drop_database(database).await {
                    Ok(()) => info!("✓ Dropped database {database}"),
                    Err(e) => warn!("Failed to drop database {database}: {e}"),
                },
                None => warn!("Admin session closed, cannot drop database {database}"),
            }
        }

        // Relationships before nodes: nodes cannot be deleted while
        // still referenced.
        if let Some(graph) = self.sessions.graph.as_deref() {
            for relationship in self.ledger.relationship_types() {
                let query = cypher::delete_relationships(relationship);
                match graph.execute_write(&query).await {
                    Ok(_) => info!("✓ Deleted {relationship} relationships"),
                    Err(e) => warn!("Failed to delete {relationship} relationships: {e}"),
                }
            }
            for label in self.ledger.node_labels() {
                let query = cypher::delete_nodes(label);
                match graph.execute_write(&query).await {
                    Ok(_) => info!("✓ Deleted {label} nodes"),
                    Err(e) => warn!("Failed to delete {label} nodes: {e}"),
                }
            }
        }

        if !self.ledger.collections().is_empty() {
            match self.sessions.document.as_deref() {
                Some(document) => match document.drop_database().await {
                    Ok(()) => info!("✓ Dropped target document database"),
                    Err(e) => warn!("Failed to drop target document database: {e}"),
                },
                None => warn!("Document session closed, cannot drop target document database"),
            }
        }

        self.sessions.close_all().await;
        self.state = MigrationState::RolledBack;
    }

    fn log_report(&self) {
        info!("\n=== Migration Complete ===");
        info!("Total time: {:.2}s", self.report.elapsed_secs);
        info!("Tables: {}", self.report.tables_loaded);
        info!("Rows: {}", self.report.rows_loaded);
        info!("Entity nodes: {}", self.report.nodes_created);
        info!("Relationships: {}", self.report.relationships_created);
        info!("Collections: {}", self.report.collections_created);
    }
}
