pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Flatten nested objects into dotted `field.sub_field` pairs.
///
/// Arrays of objects are returned separately under their dotted path so
/// formatters can render them as their own tables.
pub fn flatten(map: &Map<String, Value>) -> (Vec<(String, Value)>, Vec<(String, Vec<Value>)>) {
    let mut scalars = Vec::new();
    let mut tables = Vec::new();
    flatten_into("", map, &mut scalars, &mut tables);
    (scalars, tables)
}

fn flatten_into(
    prefix: &str,
    map: &Map<String, Value>,
    scalars: &mut Vec<(String, Value)>,
    tables: &mut Vec<(String, Vec<Value>)>,
) {
    for (key, val) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => flatten_into(&path, inner, scalars, tables),
            Value::Array(items) if items.first().is_some_and(Value::is_object) => {
                tables.push((path, items.clone()));
            }
            _ => scalars.push((path, val.clone())),
        }
    }
}

/// Render a scalar (or array of scalars) as plain text.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested_result() {
        let value = json!({
            "lp_returns": { "irr": "12.5", "cash_flows": ["-100", "150"] },
            "yearly_projections": [{ "year": 1 }, { "year": 2 }],
            "total_noi_over_hold": "1000"
        });
        let (scalars, tables) = flatten(value.as_object().unwrap());

        let keys: Vec<&str> = scalars.iter().map(|(k, _)| k.as_str()).collect();
        assert!(keys.contains(&"lp_returns.irr"));
        assert!(keys.contains(&"lp_returns.cash_flows"));
        assert!(keys.contains(&"total_noi_over_hold"));
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].0, "yearly_projections");
        assert_eq!(tables[0].1.len(), 2);
    }

    #[test]
    fn test_format_value_joins_arrays() {
        assert_eq!(format_value(&json!(["-100", "150"])), "-100, 150");
        assert_eq!(format_value(&Value::Null), "");
    }
}
