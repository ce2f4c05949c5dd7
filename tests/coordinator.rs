//! Integration tests for the migration coordinator.
//!
//! These tests use the real MigrationCoordinator but mock all four store
//! sessions, recording every store operation in a shared journal so the
//! cross-store ordering guarantees can be asserted.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use polyglot_migrate::errors::MigrationError;
use polyglot_migrate::migration::{MigrationCoordinator, MigrationState};
use polyglot_migrate::model::{
    ColumnSpec, JoinSpec, MigrationPlan, Row, SqlValue, TableKind, TableSpec,
};
use polyglot_migrate::stores::{
    AdminStore, DocumentStore, GraphStore, Sessions, SourceStore, TargetConnector, TargetStore,
};

type Journal = Arc<Mutex<Vec<String>>>;

fn record(journal: &Journal, entry: impl Into<String>) {
    journal.lock().unwrap().push(entry.into());
}

fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

// Mock source store serving fixed tables
struct MockSource {
    tables: HashMap<String, (Vec<String>, Vec<Row>)>,
    journal: Journal,
}

#[async_trait::async_trait]
impl SourceStore for MockSource {
    async fn table_columns(&self, table: &str) -> Result<Vec<String>, MigrationError> {
        Ok(self.tables[table].0.clone())
    }

    async fn read_rows(&self, table: &str) -> Result<Vec<Row>, MigrationError> {
        Ok(self.tables[table].1.clone())
    }

    async fn commit(&self) -> Result<(), MigrationError> {
        record(&self.journal, "commit:source");
        Ok(())
    }

    async fn rollback(&self) -> Result<(), MigrationError> {
        record(&self.journal, "rollback:source");
        Ok(())
    }

    async fn close(&self) {
        record(&self.journal, "close:source");
    }
}

// Mock target store, optionally failing on table DDL or on the Nth
// insert of one table
struct MockTarget {
    journal: Journal,
    fail_ddl: bool,
    fail_on: Option<(String, usize)>,
    inserted: Mutex<HashMap<String, usize>>,
}

impl MockTarget {
    fn new(journal: Journal, fail_ddl: bool, fail_on: Option<(String, usize)>) -> Self {
        Self {
            journal,
            fail_ddl,
            fail_on,
            inserted: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl TargetStore for MockTarget {
    async fn create_table(&self, ddl: &str) -> Result<(), MigrationError> {
        if self.fail_ddl {
            return Err(MigrationError::Relational(
                "simulated create table failure".to_string(),
            ));
        }
        record(&self.journal, format!("ddl:{ddl}"));
        Ok(())
    }

    async fn insert_row(
        &self,
        table: &TableSpec,
        _columns: &[String],
        _row: &Row,
    ) -> Result<(), MigrationError> {
        let ordinal = {
            let mut inserted = self.inserted.lock().unwrap();
            let count = inserted.entry(table.name.clone()).or_insert(0);
            *count += 1;
            *count
        };
        if let Some((fail_table, fail_ordinal)) = &self.fail_on {
            if *fail_table == table.name && *fail_ordinal == ordinal {
                return Err(MigrationError::Relational(format!(
                    "simulated insert failure on {} row {}",
                    table.name, ordinal
                )));
            }
        }
        record(&self.journal, format!("insert:{}:{}", table.name, ordinal));
        Ok(())
    }

    async fn commit(&self) -> Result<(), MigrationError> {
        record(&self.journal, "commit:target");
        Ok(())
    }

    async fn rollback(&self) -> Result<(), MigrationError> {
        record(&self.journal, "rollback:target");
        Ok(())
    }

    async fn close(&self) {
        record(&self.journal, "close:target");
    }
}

struct MockAdmin {
    journal: Journal,
    target_exists: bool,
    fail_drop: bool,
}

#[async_trait::async_trait]
impl AdminStore for MockAdmin {
    async fn database_exists(&self, _name: &str) -> Result<bool, MigrationError> {
        Ok(self.target_exists)
    }

    async fn create_database(&self, name: &str) -> Result<(), MigrationError> {
        record(&self.journal, format!("create_db:{name}"));
        Ok(())
    }

    async fn drop_database(&self, name: &str) -> Result<(), MigrationError> {
        if self.fail_drop {
            return Err(MigrationError::Relational(
                "simulated drop database failure".to_string(),
            ));
        }
        record(&self.journal, format!("drop_db:{name}"));
        Ok(())
    }

    async fn commit(&self) -> Result<(), MigrationError> {
        record(&self.journal, "commit:admin");
        Ok(())
    }

    async fn rollback(&self) -> Result<(), MigrationError> {
        record(&self.journal, "rollback:admin");
        Ok(())
    }

    async fn close(&self) {
        record(&self.journal, "close:admin");
    }
}

/// Mock graph store. Relationship-create queries (the only ones ending in
/// `RETURN r`) report `relationship_matches` returned records; everything
/// else reports zero.
struct MockGraph {
    journal: Journal,
    relationship_matches: u64,
}

#[async_trait::async_trait]
impl GraphStore for MockGraph {
    async fn execute_write(&self, query: &str) -> Result<u64, MigrationError> {
        record(&self.journal, format!("graph:{query}"));
        if query.ends_with("RETURN r") {
            Ok(self.relationship_matches)
        } else {
            Ok(0)
        }
    }

    async fn close(&self) {
        record(&self.journal, "close:graph");
    }
}

struct MockDocument {
    journal: Journal,
    existing: Mutex<HashSet<String>>,
    fail_on_create: Option<String>,
}

impl MockDocument {
    fn new(journal: Journal, existing: &[&str], fail_on_create: Option<&str>) -> Self {
        Self {
            journal,
            existing: Mutex::new(existing.iter().map(|s| s.to_string()).collect()),
            fail_on_create: fail_on_create.map(|s| s.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl DocumentStore for MockDocument {
    async fn collection_exists(&self, name: &str) -> Result<bool, MigrationError> {
        Ok(self.existing.lock().unwrap().contains(name))
    }

    async fn create_collection(&self, name: &str) -> Result<(), MigrationError> {
        if self.fail_on_create.as_deref() == Some(name) {
            return Err(MigrationError::Document(format!(
                "simulated create failure for {name}"
            )));
        }
        self.existing.lock().unwrap().insert(name.to_string());
        record(&self.journal, format!("create_collection:{name}"));
        Ok(())
    }

    async fn drop_database(&self) -> Result<(), MigrationError> {
        record(&self.journal, "drop_document_db");
        Ok(())
    }

    async fn close(&self) {
        record(&self.journal, "close:document");
    }
}

/// Hands out the pre-built target session when the provisioning phase
/// asks for it.
struct MockConnector {
    target: Mutex<Option<Box<dyn TargetStore>>>,
}

#[async_trait::async_trait]
impl TargetConnector for MockConnector {
    async fn connect(&self, _database: &str) -> Result<Box<dyn TargetStore>, MigrationError> {
        self.target
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| MigrationError::Config("target session already taken".into()))
    }
}

// ============================================================================
// Fixtures: the Product / Category / ProductToCategory scenario
// ============================================================================

fn int_pk(name: &str) -> ColumnSpec {
    ColumnSpec {
        name: name.to_string(),
        sql_type: "INT".to_string(),
        not_null: false,
        primary_key: true,
        references: None,
    }
}

fn varchar(name: &str) -> ColumnSpec {
    ColumnSpec {
        name: name.to_string(),
        sql_type: "VARCHAR(100)".to_string(),
        not_null: true,
        primary_key: false,
        references: None,
    }
}

fn scenario_plan(collections: &[&str]) -> MigrationPlan {
    let mut joins = HashMap::new();
    joins.insert(
        "ProductToCategory".to_string(),
        JoinSpec {
            from_label: "Product".to_string(),
            to_label: "Category".to_string(),
            relationship: "HAS_CATEGORY".to_string(),
            from_column: "ProductId".to_string(),
            to_column: "CategoryId".to_string(),
            primary_key_column: "ProductToCategoryId".to_string(),
        },
    );

    MigrationPlan {
        tables: vec![
            TableSpec {
                name: "Product".to_string(),
                columns: vec![int_pk("ProductId"), varchar("Name")],
                kind: TableKind::GraphEntity,
            },
            TableSpec {
                name: "Category".to_string(),
                columns: vec![int_pk("CategoryId"), varchar("Name")],
                kind: TableKind::GraphEntity,
            },
            TableSpec {
                name: "ProductToCategory".to_string(),
                columns: vec![
                    int_pk("ProductToCategoryId"),
                    varchar("ProductId"),
                    varchar("CategoryId"),
                ],
                kind: TableKind::GraphJoin,
            },
        ],
        joins,
        document_collections: collections.iter().map(|s| s.to_string()).collect(),
    }
}

fn scenario_source(journal: Journal) -> MockSource {
    let mut tables = HashMap::new();
    tables.insert(
        "Product".to_string(),
        (
            vec!["ProductId".to_string(), "Name".to_string()],
            vec![vec![SqlValue::Integer(10), SqlValue::Text("Widget".into())]],
        ),
    );
    tables.insert(
        "Category".to_string(),
        (
            vec!["CategoryId".to_string(), "Name".to_string()],
            vec![
                vec![SqlValue::Integer(1), SqlValue::Text("Books".into())],
                vec![SqlValue::Integer(2), SqlValue::Text("Toys".into())],
            ],
        ),
    );
    tables.insert(
        "ProductToCategory".to_string(),
        (
            vec![
                "ProductToCategoryId".to_string(),
                "ProductId".to_string(),
                "CategoryId".to_string(),
            ],
            vec![vec![
                SqlValue::Integer(1),
                SqlValue::Integer(10),
                SqlValue::Integer(1),
            ]],
        ),
    );
    MockSource { tables, journal }
}

struct Fixture {
    journal: Journal,
    coordinator: MigrationCoordinator,
}

/// Knobs for one coordinator run; `new` gives the happy-path defaults.
struct FixtureOptions {
    plan: MigrationPlan,
    target_exists: bool,
    fail_ddl: bool,
    fail_insert: Option<(&'static str, usize)>,
    fail_drop_database: bool,
    relationship_matches: u64,
    existing_collections: &'static [&'static str],
    fail_collection: Option<&'static str>,
}

impl FixtureOptions {
    fn new(plan: MigrationPlan) -> Self {
        Self {
            plan,
            target_exists: false,
            fail_ddl: false,
            fail_insert: None,
            fail_drop_database: false,
            relationship_matches: 1,
            existing_collections: &[],
            fail_collection: None,
        }
    }
}

fn fixture(options: FixtureOptions) -> Fixture {
    let journal: Journal = Arc::new(Mutex::new(Vec::new()));

    let sessions = Sessions {
        admin: Some(Box::new(MockAdmin {
            journal: journal.clone(),
            target_exists: options.target_exists,
            fail_drop: options.fail_drop_database,
        })),
        source: Some(Box::new(scenario_source(journal.clone()))),
        target: None,
        graph: Some(Box::new(MockGraph {
            journal: journal.clone(),
            relationship_matches: options.relationship_matches,
        })),
        document: Some(Box::new(MockDocument::new(
            journal.clone(),
            options.existing_collections,
            options.fail_collection,
        ))),
    };
    let connector = Box::new(MockConnector {
        target: Mutex::new(Some(Box::new(MockTarget::new(
            journal.clone(),
            options.fail_ddl,
            options.fail_insert.map(|(t, n)| (t.to_string(), n)),
        )))),
    });

    let coordinator = MigrationCoordinator::new(
        options.plan,
        "EcommercePolyglot".to_string(),
        sessions,
        connector,
    );

    Fixture {
        journal,
        coordinator,
    }
}

fn position(log: &[String], needle: &str) -> usize {
    log.iter()
        .position(|e| e.contains(needle))
        .unwrap_or_else(|| panic!("journal entry containing `{needle}` not found"))
}

// ============================================================================
// Happy path
// ============================================================================

#[tokio::test]
async fn end_to_end_scenario_commits_all_three_stores() {
    let mut fx = fixture(FixtureOptions::new(scenario_plan(&["Review", "ProductImage"])));

    let report = fx.coordinator.run().await.unwrap();
    assert_eq!(fx.coordinator.state(), MigrationState::Committed);
    assert_eq!(report.tables_loaded, 2);
    assert_eq!(report.rows_loaded, 3);
    assert_eq!(report.nodes_created, 3);
    assert_eq!(report.relationships_created, 1);
    assert_eq!(report.collections_created, 2);

    let log = entries(&fx.journal);

    // Relationship derived purely from the join spec, no extra properties.
    let relationship = "graph:MATCH (a:Product { ProductId: 10 }), \
                        (b:Category { CategoryId: 1 }) \
                        CREATE (a)-[r:HAS_CATEGORY]->(b) RETURN r";
    let relationship_at = position(&log, relationship);

    // Every relational insert and every node creation precedes the
    // relationship pass.
    for needle in [
        "insert:Product:1",
        "insert:Category:1",
        "insert:Category:2",
        "graph:CREATE (n:Product { ProductId: 10, Name: \"Widget\" })",
        "graph:CREATE (n:Category { CategoryId: 1, Name: \"Books\" })",
        "graph:CREATE (n:Category { CategoryId: 2, Name: \"Toys\" })",
    ] {
        assert!(position(&log, needle) < relationship_at, "{needle} after relationship");
    }

    // Schema was provisioned before any load.
    assert!(position(&log, "create_db:EcommercePolyglot") < position(&log, "insert:Product:1"));
    assert!(position(&log, "ddl:CREATE TABLE Product") < position(&log, "insert:Product:1"));

    // Both collections created; nothing dropped or rolled back.
    assert!(log.iter().any(|e| e == "create_collection:Review"));
    assert!(log.iter().any(|e| e == "create_collection:ProductImage"));
    assert!(!log.iter().any(|e| e.starts_with("drop_")));
    assert!(!log.iter().any(|e| e.starts_with("rollback:")));

    // Every session handle was closed.
    for session in ["admin", "source", "target", "graph", "document"] {
        assert!(log.iter().any(|e| e == &format!("close:{session}")));
    }
}

// ============================================================================
// Failure paths
// ============================================================================

#[tokio::test]
async fn insert_failure_rolls_back_before_any_relationship_write() {
    let mut fx = fixture(FixtureOptions {
        fail_insert: Some(("Category", 2)),
        ..FixtureOptions::new(scenario_plan(&["Review"]))
    });

    let err = fx.coordinator.run().await.unwrap_err();
    assert!(matches!(err, MigrationError::Relational(_)));
    assert_eq!(fx.coordinator.state(), MigrationState::RolledBack);

    let log = entries(&fx.journal);

    // No relationship was ever written.
    assert!(!log.iter().any(|e| e.contains("RETURN r")));

    // Relational handles rolled back in order: target, source, admin.
    let target_at = position(&log, "rollback:target");
    let source_at = position(&log, "rollback:source");
    let admin_at = position(&log, "rollback:admin");
    assert!(target_at < source_at && source_at < admin_at);

    // Target relational database dropped outright.
    let drop_at = position(&log, "drop_db:EcommercePolyglot");
    assert!(admin_at < drop_at);

    // Ledger-recorded node labels deleted; Product first (first seen).
    let product_delete = position(&log, "graph:MATCH (n:Product) DELETE n");
    let category_delete = position(&log, "graph:MATCH (n:Category) DELETE n");
    assert!(drop_at < product_delete && product_delete < category_delete);

    // Documents were never provisioned, so the document database stays.
    assert!(!log.iter().any(|e| e == "drop_document_db"));

    for session in ["admin", "source", "target", "graph", "document"] {
        assert!(log.iter().any(|e| e == &format!("close:{session}")));
    }
}

#[tokio::test]
async fn ddl_failure_drops_the_half_created_database() {
    let mut fx = fixture(FixtureOptions {
        fail_ddl: true,
        ..FixtureOptions::new(scenario_plan(&["Review"]))
    });

    let err = fx.coordinator.run().await.unwrap_err();
    assert!(matches!(err, MigrationError::Relational(_)));
    assert_eq!(fx.coordinator.state(), MigrationState::RolledBack);

    let log = entries(&fx.journal);

    // The database itself had been created before the DDL was rejected,
    // so compensation drops it.
    let create_at = position(&log, "create_db:EcommercePolyglot");
    let drop_at = position(&log, "drop_db:EcommercePolyglot");
    assert!(create_at < drop_at);

    // No rows, graph writes or collections were ever attempted.
    assert!(!log.iter().any(|e| e.starts_with("insert:")));
    assert!(!log.iter().any(|e| e.starts_with("graph:")));
    assert!(!log.iter().any(|e| e.starts_with("create_collection:")));
    assert!(!log.iter().any(|e| e == "drop_document_db"));
}

#[tokio::test]
async fn compensation_failures_are_superseded_by_the_original_cause() {
    let mut fx = fixture(FixtureOptions {
        fail_insert: Some(("Category", 2)),
        fail_drop_database: true,
        ..FixtureOptions::new(scenario_plan(&["Review"]))
    });

    let err = fx.coordinator.run().await.unwrap_err();
    match err {
        MigrationError::Relational(msg) => assert!(msg.contains("simulated insert failure")),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fx.coordinator.state(), MigrationState::RolledBack);

    let log = entries(&fx.journal);

    // The database drop failed, so it never reached the journal.
    assert!(!log.iter().any(|e| e == "drop_db:EcommercePolyglot"));

    // Compensation still carried on to the graph cleanup and close pass.
    assert!(log.iter().any(|e| e == "graph:MATCH (n:Product) DELETE n"));
    assert!(log.iter().any(|e| e == "graph:MATCH (n:Category) DELETE n"));
    for session in ["admin", "source", "target", "graph", "document"] {
        assert!(log.iter().any(|e| e == &format!("close:{session}")));
    }
}

#[tokio::test]
async fn unmatched_endpoint_is_surfaced_and_rolled_back() {
    let mut fx = fixture(FixtureOptions {
        relationship_matches: 0,
        ..FixtureOptions::new(scenario_plan(&[]))
    });

    let err = fx.coordinator.run().await.unwrap_err();
    match err {
        MigrationError::EndpointNotMatched {
            table,
            relationship,
        } => {
            assert_eq!(table, "ProductToCategory");
            assert_eq!(relationship, "HAS_CATEGORY");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fx.coordinator.state(), MigrationState::RolledBack);

    let log = entries(&fx.journal);

    // Nothing was created, so no relationship delete runs; nodes and the
    // target relational database are cleaned up.
    assert!(!log.iter().any(|e| e.contains("]->() DELETE r")));
    assert!(log.iter().any(|e| e == "drop_db:EcommercePolyglot"));
    assert!(log.iter().any(|e| e == "graph:MATCH (n:Product) DELETE n"));
    assert!(log.iter().any(|e| e == "graph:MATCH (n:Category) DELETE n"));
}

#[tokio::test]
async fn document_failure_compensates_all_three_stores_in_order() {
    let mut fx = fixture(FixtureOptions {
        fail_collection: Some("ProductImage"),
        ..FixtureOptions::new(scenario_plan(&["Review", "ProductImage"]))
    });

    let err = fx.coordinator.run().await.unwrap_err();
    assert!(matches!(err, MigrationError::Document(_)));
    assert_eq!(fx.coordinator.state(), MigrationState::RolledBack);

    let log = entries(&fx.journal);

    // Relationships deleted before nodes.
    let relationship_delete = position(&log, "graph:MATCH ()-[r:HAS_CATEGORY]->() DELETE r");
    let node_delete = position(&log, "graph:MATCH (n:Product) DELETE n");
    assert!(relationship_delete < node_delete);

    // One collection had been created, so the whole document database is
    // dropped; the relational target is dropped too.
    assert!(log.iter().any(|e| e == "drop_document_db"));
    assert!(log.iter().any(|e| e == "drop_db:EcommercePolyglot"));
}

#[tokio::test]
async fn preexisting_target_database_is_fatal_with_no_compensation_writes() {
    let mut fx = fixture(FixtureOptions {
        target_exists: true,
        ..FixtureOptions::new(scenario_plan(&["Review"]))
    });

    let err = fx.coordinator.run().await.unwrap_err();
    match err {
        MigrationError::TargetDatabaseExists(name) => assert_eq!(name, "EcommercePolyglot"),
        other => panic!("unexpected error: {other}"),
    }

    let log = entries(&fx.journal);

    // Nothing was written anywhere, and nothing is deleted or dropped.
    assert!(!log.iter().any(|e| e.starts_with("create_db:")));
    assert!(!log.iter().any(|e| e.starts_with("insert:")));
    assert!(!log.iter().any(|e| e.starts_with("graph:")));
    assert!(!log.iter().any(|e| e.starts_with("drop_")));
    assert!(!log.iter().any(|e| e.starts_with("create_collection:")));
}

// ============================================================================
// Document provisioner idempotence
// ============================================================================

#[tokio::test]
async fn document_provisioning_is_idempotent() {
    // Same collection named twice in the plan: created exactly once.
    let mut fx = fixture(FixtureOptions::new(scenario_plan(&["Review", "Review"])));

    let report = fx.coordinator.run().await.unwrap();
    assert_eq!(report.collections_created, 1);

    let log = entries(&fx.journal);
    let creates = log
        .iter()
        .filter(|e| *e == "create_collection:Review")
        .count();
    assert_eq!(creates, 1);
}

#[tokio::test]
async fn existing_collections_are_skipped_not_errors() {
    let mut fx = fixture(FixtureOptions {
        existing_collections: &["Review"],
        ..FixtureOptions::new(scenario_plan(&["Review", "ProductImage"]))
    });

    let report = fx.coordinator.run().await.unwrap();
    assert_eq!(fx.coordinator.state(), MigrationState::Committed);
    assert_eq!(report.collections_created, 1);

    let log = entries(&fx.journal);
    assert!(!log.iter().any(|e| e == "create_collection:Review"));
    assert!(log.iter().any(|e| e == "create_collection:ProductImage"));
}
