use serde_json::Value;
use std::io;

use super::{curve_rows, format_scalar, result_object, scalar_rows};

/// Write output as CSV to stdout. A result carrying a claims curve is written
/// as one row per cash-flow level; otherwise as `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match result_object(value) {
        Some(result) => {
            if let Some((headers, rows)) = curve_rows(result) {
                let _ = wtr.write_record(&headers);
                for row in rows {
                    let _ = wtr.write_record(&row);
                }
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in scalar_rows(result) {
                    let _ = wtr.write_record([key, val]);
                }
            }
        }
        None => {
            let _ = wtr.write_record([format_scalar(value)]);
        }
    }

    let _ = wtr.flush();
}
