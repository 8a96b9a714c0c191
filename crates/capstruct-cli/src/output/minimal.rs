use serde_json::Value;

use super::{format_scalar, result_object};

/// Print just the key answer value from the output.
///
/// Looks for well-known result fields in order of priority, then falls back
/// to the first field in the result object.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_answer(value));
}

fn minimal_answer(value: &Value) -> String {
    let priority_keys = ["coupon", "firm_value", "renegotiation_boundary", "debt"];

    let Some(map) = result_object(value) else {
        return format_scalar(value);
    };

    for key in &priority_keys {
        if let Some(val) = map.get(*key) {
            if !val.is_null() {
                return format_scalar(val);
            }
        }
    }

    match map.iter().next() {
        Some((key, val)) => format!("{}: {}", key, format_scalar(val)),
        None => String::new(),
    }
}
