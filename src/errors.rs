//! Error types for the migration engine.
//! Consolidates failure conditions across all four stores so the
//! coordinator can report a single originating cause.
use thiserror::Error;

/// Represents errors that can occur during a migration run.
///
/// Store-level variants carry the driver message as a string so that
/// test doubles can construct them without depending on driver types.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("target database `{0}` already exists")]
    TargetDatabaseExists(String),

    #[error("relational store error: {0}")]
    Relational(String),

    #[error("graph store error: {0}")]
    Graph(String),

    #[error("document store error: {0}")]
    Document(String),

    #[error("relationship `{relationship}` of join table `{table}` matched no endpoint nodes")]
    EndpointNotMatched { table: String, relationship: String },

    #[error("join table `{table}` has no column `{column}`")]
    MissingJoinColumn { table: String, column: String },

    #[error("table `{0}` is part of a foreign-key cycle")]
    DependencyCycle(String),

    #[error("unsupported source column type `{0}`")]
    UnsupportedColumnType(String),

    #[error("{0} session is not open")]
    SessionClosed(&'static str),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for MigrationError {
    fn from(err: sqlx::Error) -> Self {
        MigrationError::Relational(err.to_string())
    }
}

impl From<neo4rs::Error> for MigrationError {
    fn from(err: neo4rs::Error) -> Self {
        MigrationError::Graph(err.to_string())
    }
}

impl From<mongodb::error::Error> for MigrationError {
    fn from(err: mongodb::error::Error) -> Self {
        MigrationError::Document(err.to_string())
    }
}
