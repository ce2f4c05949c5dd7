pub mod bridge;
pub mod config;
pub mod cypher;
pub mod errors;
pub mod ledger;
pub mod migration;
pub mod model;
pub mod mongo;
pub mod neo4j;
pub mod postgres;
pub mod projector;
pub mod stores;
