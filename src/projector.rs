//! Graph projector: derives node and relationship writes from source rows.
//!
//! Derivation is pure and positional: column names are resolved to indices
//! once per row against the join spec, and values are picked by position.
use crate::cypher::RelationshipWrite;
use crate::errors::MigrationError;
use crate::model::{JoinSpec, Row, SqlValue};

/// Property map for a node: the row's columns zipped with its values,
/// in declaration order.
pub fn node_properties<'a>(columns: &'a [String], row: &'a Row) -> Vec<(&'a str, &'a SqlValue)> {
    columns
        .iter()
        .map(String::as_str)
        .zip(row.iter())
        .collect()
}

/// Derive a relationship write from one join-table row.
///
/// The source and target endpoints are identified by the values in the
/// join spec's foreign-key columns. Every remaining column except the
/// primary key is carried as a relationship property; when nothing
/// remains, the relationship carries no properties.
pub fn relationship_write<'a>(
    table: &str,
    join: &'a JoinSpec,
    columns: &'a [String],
    row: &'a Row,
) -> Result<RelationshipWrite<'a>, MigrationError> {
    if row.len() != columns.len() {
        return Err(MigrationError::Config(format!(
            "join table `{table}` row carries {} values for {} columns",
            row.len(),
            columns.len()
        )));
    }

    let from_idx = column_index(table, columns, &join.from_column)?;
    let to_idx = column_index(table, columns, &join.to_column)?;
    let pk_idx = column_index(table, columns, &join.primary_key_column)?;

    let properties = columns
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != from_idx && *idx != to_idx && *idx != pk_idx)
        .map(|(idx, name)| (name.as_str(), &row[idx]))
        .collect();

    Ok(RelationshipWrite {
        from_label: &join.from_label,
        to_label: &join.to_label,
        relationship: &join.relationship,
        from_key: (&join.from_column, &row[from_idx]),
        to_key: (&join.to_column, &row[to_idx]),
        properties,
    })
}

fn column_index(table: &str, columns: &[String], name: &str) -> Result<usize, MigrationError> {
    columns
        .iter()
        .position(|c| c == name)
        .ok_or_else(|| MigrationError::MissingJoinColumn {
            table: table.to_string(),
            column: name.to_string(),
        })
}
