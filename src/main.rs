use anyhow::Result;
use polyglot_migrate::migration::MigrationCoordinator;
use polyglot_migrate::stores::Sessions;
use polyglot_migrate::{config, mongo, neo4j, postgres};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_target(false)
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    info!("Starting polyglot schema migration");

    let settings = config::StoreSettings::from_env()?;
    let plan = config::load_plan(&settings.plan_path)?;
    info!(
        "✓ Loaded migration plan: {} tables, {} join tables, {} collections",
        plan.tables.len(),
        plan.joins.len(),
        plan.document_collections.len()
    );

    info!("Connecting to source PostgreSQL...");
    let source_pool = postgres::connect(&settings.source_url).await?;
    info!("✓ Connected to source");

    info!("Connecting to admin PostgreSQL...");
    let admin_pool = postgres::connect(&settings.admin_url).await?;
    info!("✓ Connected to admin");

    info!("Connecting to Neo4j...");
    let graph = neo4j::connect(
        &settings.neo4j_uri,
        &settings.neo4j_user,
        &settings.neo4j_password,
    )?;
    info!("✓ Connected to Neo4j");

    info!("Connecting to MongoDB...");
    let mongo_client = mongo::connect(&settings.mongodb_uri).await?;
    info!("✓ Connected to MongoDB");

    let sessions = Sessions {
        admin: Some(Box::new(postgres::PostgresAdmin::new(admin_pool))),
        source: Some(Box::new(postgres::PostgresSource::new(source_pool))),
        // Scoped to a database that does not exist yet; opened by the
        // schema provisioning phase.
        target: None,
        graph: Some(Box::new(neo4j::Neo4jStore::new(graph))),
        document: Some(Box::new(mongo::MongoStore::new(
            mongo_client,
            settings.mongodb_database.clone(),
        ))),
    };
    let connector = Box::new(postgres::PostgresTargetConnector::new(
        settings.admin_url.clone(),
    ));

    let mut coordinator =
        MigrationCoordinator::new(plan, settings.target_database.clone(), sessions, connector);
    coordinator.run().await?;

    Ok(())
}
