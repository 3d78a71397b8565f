use serde_json::Value;

use super::format_value;

/// Headline figure for each command, as JSON pointers into the result.
const HEADLINE_POINTERS: [&str; 4] = [
    "/lp_returns/irr",
    "/irr",
    "/monthly_payment",
    "/results/0/lp_irr",
];

/// Print just the headline value from the output.
///
/// Looks for well-known result fields in order of priority, then falls back
/// to the first field in the result object.
pub fn print_minimal(value: &Value) {
    println!("{}", headline(value));
}

fn headline(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    for pointer in HEADLINE_POINTERS {
        if let Some(val) = result_obj.pointer(pointer).or_else(|| value.pointer(pointer)) {
            if !val.is_null() {
                return format_value(val);
            }
        }
    }

    match result_obj {
        Value::Object(map) => map
            .iter()
            .next()
            .map(|(key, val)| format!("{key}: {}", format_value(val)))
            .unwrap_or_default(),
        other => format_value(other),
    }
}
