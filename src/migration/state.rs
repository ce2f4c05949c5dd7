//! Run state machine.
//!
//! The forward path is strictly sequential with a single success route;
//! the compensation path is reachable from any non-terminal state.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    Start,
    SchemaCreated,
    RelationalLoaded,
    GraphNodesCreated,
    GraphRelationshipsCreated,
    DocumentsProvisioned,
    Committed,
    Failed,
    RollingBack,
    RolledBack,
}

impl MigrationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, MigrationState::Committed | MigrationState::RolledBack)
    }
}
