// Migration module - run state machine and coordinator
pub mod executor;
pub mod state;

pub use executor::{MigrationCoordinator, MigrationReport};
pub use state::MigrationState;
