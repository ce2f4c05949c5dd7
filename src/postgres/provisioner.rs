//! Schema provisioner: dependency-ordered DDL for the target database.
//!
//! A table referencing another via foreign key is always created after
//! the table it references, regardless of declaration order. Join tables
//! are never provisioned relationally; they live on only as graph
//! relationships.
use crate::errors::MigrationError;
use crate::model::{TableKind, TableSpec};

/// Order the relational tables for creation: referenced tables first,
/// declaration order preserved among independent tables. A reference
/// cycle is a fatal configuration error.
pub fn creation_order(tables: &[TableSpec]) -> Result<Vec<&TableSpec>, MigrationError> {
    let relational: Vec<&TableSpec> = tables
        .iter()
        .filter(|t| t.kind != TableKind::GraphJoin)
        .collect();

    let mut ordered: Vec<&TableSpec> = Vec::with_capacity(relational.len());
    let mut remaining: Vec<&TableSpec> = relational.clone();

    while !remaining.is_empty() {
        let emitted: Vec<&str> = ordered.iter().map(|t| t.name.as_str()).collect();
        let position = remaining.iter().position(|table| {
            table.columns.iter().all(|column| match &column.references {
                Some(fk) => {
                    emitted.contains(&fk.table.as_str())
                        || fk.table == table.name
                        || !relational.iter().any(|t| t.name == fk.table)
                }
                None => true,
            })
        });

        match position {
            Some(idx) => ordered.push(remaining.remove(idx)),
            None => {
                return Err(MigrationError::DependencyCycle(
                    remaining[0].name.clone(),
                ))
            }
        }
    }

    Ok(ordered)
}

/// Render the CREATE TABLE statement for one table spec.
pub fn create_table_ddl(table: &TableSpec) -> String {
    let mut clauses: Vec<String> = Vec::with_capacity(table.columns.len());

    for column in &table.columns {
        let mut clause = format!("{} {}", column.name, column.sql_type);
        if column.primary_key {
            clause.push_str(" PRIMARY KEY");
        } else if column.not_null {
            clause.push_str(" NOT NULL");
        }
        clauses.push(clause);
    }

    for column in &table.columns {
        if let Some(fk) = &column.references {
            clauses.push(format!(
                "FOREIGN KEY ({}) REFERENCES {}({})",
                column.name, fk.table, fk.column
            ));
        }
    }

    format!("CREATE TABLE {} ({})", table.name, clauses.join(", "))
}
