// Neo4j connection setup
use neo4rs::Graph;

use crate::errors::MigrationError;

/// Connect to Neo4j and return a Graph instance.
pub fn connect(uri: &str, user: &str, password: &str) -> Result<Graph, MigrationError> {
    let graph = Graph::new(uri, user, password)?;

    Ok(graph)
}
