//! Append-only record of every target artifact created during a run.
//!
//! Compensation is a deterministic function of this ledger: how far the
//! forward path got is read from what was recorded, never from where the
//! failure unwound. Discarded on success.

#[derive(Debug, Default)]
pub struct MigrationLedger {
    target_database: Option<String>,
    tables: Vec<String>,
    node_labels: Vec<String>,
    relationship_types: Vec<String>,
    collections: Vec<String>,
}

impl MigrationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_target_database(&mut self, name: &str) {
        self.target_database = Some(name.to_string());
    }

    pub fn record_table(&mut self, name: &str) {
        self.tables.push(name.to_string());
    }

    /// Labels are recorded once, in first-seen order.
    pub fn record_node_label(&mut self, label: &str) {
        if !self.node_labels.iter().any(|l| l == label) {
            self.node_labels.push(label.to_string());
        }
    }

    /// Relationship types are recorded once, in first-seen order.
    pub fn record_relationship_type(&mut self, relationship: &str) {
        if !self.relationship_types.iter().any(|r| r == relationship) {
            self.relationship_types.push(relationship.to_string());
        }
    }

    pub fn record_collection(&mut self, name: &str) {
        self.collections.push(name.to_string());
    }

    pub fn target_database(&self) -> Option<&str> {
        self.target_database.as_deref()
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn node_labels(&self) -> &[String] {
        &self.node_labels
    }

    pub fn relationship_types(&self) -> &[String] {
        &self.relationship_types
    }

    pub fn collections(&self) -> &[String] {
        &self.collections
    }
}
