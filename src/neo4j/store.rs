// Neo4j write-transaction execution
use async_trait::async_trait;
use neo4rs::{Graph, Query};

use crate::errors::MigrationError;
use crate::stores::GraphStore;

/// Graph store backed by the Neo4j bolt driver. Every `execute_write`
/// call runs in its own auto-commit transaction, so a failure stops the
/// run cleanly between rows.
pub struct Neo4jStore {
    graph: Graph,
}

impl Neo4jStore {
    pub fn new(graph: Graph) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn execute_write(&self, query: &str) -> Result<u64, MigrationError> {
        let mut result = self.graph.execute(Query::new(query.to_string())).await?;

        let mut returned = 0u64;
        while result.next().await?.is_some() {
            returned += 1;
        }

        Ok(returned)
    }

    async fn close(&self) {
        // The bolt driver has no explicit close; connections are released
        // when the handle drops.
    }
}
