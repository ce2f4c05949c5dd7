// Type bridge: renders source values as graph query literals
use crate::model::SqlValue;

/// Render a source value as a Cypher literal.
///
/// Strings and timestamps are double-quoted (with `\` and `"` escaped so a
/// value can never break out of its literal); integers, decimals and
/// booleans pass through bare; NULL becomes the `null` literal. Total over
/// the supported value set.
pub fn graph_literal(value: &SqlValue) -> String {
    match value {
        SqlValue::Integer(v) => v.to_string(),
        SqlValue::Decimal(v) => v.to_string(),
        SqlValue::Boolean(v) => v.to_string(),
        SqlValue::Text(v) => quote(v),
        SqlValue::Timestamp(v) => quote(&v.format("%Y-%m-%d %H:%M:%S").to_string()),
        SqlValue::Null => "null".to_string(),
    }
}

fn quote(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}
