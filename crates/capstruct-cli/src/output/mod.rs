pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

/// The `result` object of an output envelope, or the value itself.
pub(crate) fn result_object(value: &Value) -> Option<&Map<String, Value>> {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
        .as_object()
}

/// Scalar fields of a result as `(field, value)` rows. Nested objects are
/// flattened with dotted keys; arrays (the claims curve) are skipped.
pub(crate) fn scalar_rows(result: &Map<String, Value>) -> Vec<(String, String)> {
    let mut rows = Vec::new();
    collect_rows("", result, &mut rows);
    rows
}

fn collect_rows(prefix: &str, map: &Map<String, Value>, rows: &mut Vec<(String, String)>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => collect_rows(&name, inner, rows),
            Value::Array(_) => {}
            _ => rows.push((name, format_scalar(val))),
        }
    }
}

/// Rows of the claims curve: header from the first point, then one row per
/// cash-flow level.
pub(crate) fn curve_rows(result: &Map<String, Value>) -> Option<(Vec<String>, Vec<Vec<String>>)> {
    let points = result.get("curve")?.as_array()?;
    let first = points.first()?.as_object()?;
    let headers: Vec<String> = first.keys().cloned().collect();
    let rows = points
        .iter()
        .filter_map(|pt| pt.as_object())
        .map(|pt| {
            headers
                .iter()
                .map(|h| pt.get(h).map(format_scalar).unwrap_or_default())
                .collect()
        })
        .collect();
    Some((headers, rows))
}

pub(crate) fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
