//! Cypher query builders.
//!
//! All graph query text is assembled here and nowhere else: labels,
//! relationship types and property names come from the validated plan,
//! and every value goes through the type bridge, so literal construction
//! stays auditable in one place. One builder per operation mirrors the
//! four writes the engine performs (node create, relationship create,
//! relationship delete, node delete).
use crate::bridge::graph_literal;
use crate::model::SqlValue;

/// A fully derived relationship write: endpoints identified by one
/// property each, plus the residual property map (possibly empty).
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipWrite<'a> {
    pub from_label: &'a str,
    pub to_label: &'a str,
    pub relationship: &'a str,
    pub from_key: (&'a str, &'a SqlValue),
    pub to_key: (&'a str, &'a SqlValue),
    pub properties: Vec<(&'a str, &'a SqlValue)>,
}

fn property_map(properties: &[(&str, &SqlValue)]) -> String {
    properties
        .iter()
        .map(|(name, value)| format!("{}: {}", name, graph_literal(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `CREATE (n:Label { col: literal, ... })`
pub fn create_node(label: &str, properties: &[(&str, &SqlValue)]) -> String {
    format!("CREATE (n:{} {{ {} }})", label, property_map(properties))
}

/// Match both endpoint nodes by their identifying property and create a
/// single directed, typed relationship between them. The trailing
/// `RETURN r` lets the caller observe whether the endpoints matched:
/// zero returned records means the relationship was not created.
pub fn create_relationship(write: &RelationshipWrite<'_>) -> String {
    let from = format!(
        "{}: {}",
        write.from_key.0,
        graph_literal(write.from_key.1)
    );
    let to = format!("{}: {}", write.to_key.0, graph_literal(write.to_key.1));

    if write.properties.is_empty() {
        format!(
            "MATCH (a:{} {{ {} }}), (b:{} {{ {} }}) CREATE (a)-[r:{}]->(b) RETURN r",
            write.from_label, from, write.to_label, to, write.relationship
        )
    } else {
        format!(
            "MATCH (a:{} {{ {} }}), (b:{} {{ {} }}) CREATE (a)-[r:{} {{ {} }}]->(b) RETURN r",
            write.from_label,
            from,
            write.to_label,
            to,
            write.relationship,
            property_map(&write.properties)
        )
    }
}

/// Delete every relationship of the given type. Run before node deletes,
/// since nodes cannot be deleted while still referenced.
pub fn delete_relationships(relationship: &str) -> String {
    format!("MATCH ()-[r:{}]->() DELETE r", relationship)
}

/// Delete every node carrying the given label.
pub fn delete_nodes(label: &str) -> String {
    format!("MATCH (n:{}) DELETE n", label)
}
