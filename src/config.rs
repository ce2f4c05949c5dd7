// Configuration constants and environment helpers
use anyhow::{Context, Result};

use crate::model::MigrationPlan;

// PostgreSQL connection pool configuration
pub const PG_MAX_CONNECTIONS: u32 = 5;

/// Connection settings for all four stores, read from the environment.
/// The migration plan itself is produced by an external config layer and
/// loaded from the file named by `MIGRATION_PLAN`.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub source_url: String,
    pub admin_url: String,
    pub target_database: String,
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub plan_path: String,
}

impl StoreSettings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            source_url: require("SOURCE_DATABASE_URL")?,
            admin_url: require("ADMIN_DATABASE_URL")?,
            target_database: require("TARGET_DATABASE")?,
            neo4j_uri: require("NEO4J_URI")?,
            neo4j_user: require("NEO4J_USER")?,
            neo4j_password: require("NEO4J_PASSWORD")?,
            mongodb_uri: require("MONGODB_URI")?,
            mongodb_database: require("MONGODB_DATABASE")?,
            plan_path: require("MIGRATION_PLAN")?,
        })
    }
}

fn require(name: &'static str) -> Result<String> {
    std::env::var(name).with_context(|| format!("{name} must be set"))
}

/// Load the migration plan from a JSON file. The plan is validated
/// upstream; only shape errors are caught here.
pub fn load_plan(path: &str) -> Result<MigrationPlan> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read migration plan {path}"))?;
    let plan = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse migration plan {path}"))?;
    Ok(plan)
}
