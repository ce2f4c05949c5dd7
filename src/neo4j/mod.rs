// Neo4j module - database connection and write-transaction execution
pub mod connection;
pub mod store;

pub use connection::connect;
pub use store::Neo4jStore;
