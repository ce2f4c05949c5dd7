// Data models for the migration plan and row values
use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::collections::HashMap;

/// A single column value read from the source store.
///
/// The set is closed: every value the source can hand us is one of these
/// variants, so downstream conversions are total by construction.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Integer(i64),
    Decimal(BigDecimal),
    Text(String),
    Boolean(bool),
    Timestamp(NaiveDateTime),
    Null,
}

/// One source row: values in the table's column order. The column names
/// themselves are held once per table, not repeated per row.
pub type Row = Vec<SqlValue>;

/// Coarse value category of a target column, used to pick the bind type
/// when a NULL has to be sent positionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Decimal,
    Text,
    Boolean,
    Timestamp,
}

/// How a table participates in the migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    /// Copied row-for-row into the target relational store only.
    Plain,
    /// Copied relationally and projected as one labeled graph node per row.
    GraphEntity,
    /// Many-to-many join table: projected as graph relationships only,
    /// never materialized in the target relational store.
    GraphJoin,
}

/// Foreign-key reference carried by a column definition.
#[derive(Debug, Clone, Deserialize)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
}

/// A column definition for the target schema.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    /// SQL type text as it should appear in the CREATE TABLE statement.
    pub sql_type: String,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub references: Option<ForeignKey>,
}

impl ColumnSpec {
    /// Value category derived from the declared SQL type.
    pub fn value_kind(&self) -> ValueKind {
        let ty = self.sql_type.to_ascii_uppercase();
        if ty.starts_with("INT") || ty.starts_with("BIGINT") || ty.starts_with("SMALLINT") {
            ValueKind::Integer
        } else if ty.starts_with("DECIMAL") || ty.starts_with("NUMERIC") {
            ValueKind::Decimal
        } else if ty.starts_with("BOOL") || ty.starts_with("BIT") {
            ValueKind::Boolean
        } else if ty.starts_with("TIMESTAMP") || ty.starts_with("DATETIME") {
            ValueKind::Timestamp
        } else {
            ValueKind::Text
        }
    }
}

/// A table to migrate: name, ordered columns, and its designation.
/// Loaded once from configuration and immutable for the whole run.
#[derive(Debug, Clone, Deserialize)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
    #[serde(default = "TableSpec::default_kind")]
    pub kind: TableKind,
}

impl TableSpec {
    fn default_kind() -> TableKind {
        TableKind::Plain
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Projection rule for a many-to-many join table.
///
/// The two foreign-key columns and the primary-key column are always
/// excluded from the property set projected onto the relationship.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinSpec {
    pub from_label: String,
    pub to_label: String,
    pub relationship: String,
    pub from_column: String,
    pub to_column: String,
    pub primary_key_column: String,
}

/// The full migration plan, provided by the config-loading layer and
/// treated as validated input. Table order respects foreign-key
/// dependencies; join tables are looked up in `joins` by name.
#[derive(Debug, Clone, Deserialize)]
pub struct MigrationPlan {
    pub tables: Vec<TableSpec>,
    #[serde(default)]
    pub joins: HashMap<String, JoinSpec>,
    #[serde(default)]
    pub document_collections: Vec<String>,
}
