use serde_json::{Map, Value};
use std::io;

use super::{result_of, tabular_rows};

/// Write output as CSV to stdout.
///
/// Schedules export one row per month; a comparison exports its cumulative
/// payment series; anything else becomes a two-column field/value listing.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = result_of(value);
    match (tabular_rows(result), result) {
        (Some(rows), _) => write_array_csv(&mut wtr, rows),
        (None, Value::Object(map)) => {
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in map {
                let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
            }
        }
        (None, Value::Array(arr)) => write_array_csv(&mut wtr, arr),
        (None, other) => {
            let _ = wtr.write_record([&format_csv_value(other)]);
        }
    }

    let _ = wtr.flush();
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    let rows: Vec<Map<String, Value>> = arr
        .iter()
        .filter_map(Value::as_object)
        .map(flatten_row)
        .collect();

    if rows.is_empty() {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
        return;
    }

    // Headers come from the widest row; months without a breakdown stay blank
    let mut headers: Vec<String> = rows
        .iter()
        .max_by_key(|r| r.len())
        .map(|r| r.keys().cloned().collect())
        .unwrap_or_default();
    if let Some(pos) = headers.iter().position(|h| h == "month") {
        let month = headers.remove(pos);
        headers.insert(0, month);
    }
    let _ = wtr.write_record(&headers);

    for row in &rows {
        let record: Vec<String> = headers
            .iter()
            .map(|h| row.get(h).map(format_csv_value).unwrap_or_default())
            .collect();
        let _ = wtr.write_record(&record);
    }
}

/// `breakdown: {interest: ..}` becomes a `breakdown.interest` column.
fn flatten_row(map: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, val) in map {
        match val {
            Value::Object(inner) => {
                for (k, v) in inner {
                    out.insert(format!("{}.{}", key, k), v.clone());
                }
            }
            other => {
                out.insert(key.clone(), other.clone());
            }
        }
    }
    out
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
