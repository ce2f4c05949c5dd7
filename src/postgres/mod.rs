// PostgreSQL module - connections, source reading, target writing, schema DDL
pub mod connection;
pub mod provisioner;
pub mod source;
pub mod target;

pub use connection::connect;
pub use source::PostgresSource;
pub use target::{PostgresAdmin, PostgresTarget, PostgresTargetConnector};
