use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{curve_rows, result_object, scalar_rows};

/// Format output as tables using the tabled crate: the scalar results first,
/// then the claims curve if present.
pub fn print_table(value: &Value) {
    let Some(result) = result_object(value) else {
        println!("{}", value);
        return;
    };

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in scalar_rows(result) {
        builder.push_record([key, val]);
    }
    println!("{}", Table::from(builder));

    if let Some((headers, rows)) = curve_rows(result) {
        let mut builder = Builder::default();
        builder.push_record(headers);
        for row in rows {
            builder.push_record(row);
        }
        println!("\nClaims curve:");
        println!("{}", Table::from(builder));
    }

    if let Some(Value::Array(warnings)) = value.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = value.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
