// MongoDB module - client connection and document store access
pub mod connection;
pub mod store;

pub use connection::connect;
pub use store::MongoStore;
