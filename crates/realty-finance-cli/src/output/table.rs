use realty_finance_core::format::{brl, percent_br};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;
use tabled::{builder::Builder, Table};

use crate::Locale;

/// Arrays longer than this are summarised instead of listed.
const INLINE_ARRAY_LIMIT: usize = 6;

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value, locale: Locale) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map, locale);
            } else {
                print_rows(flatten(map, locale));
            }
        }
        Value::Array(arr) => print_array_table(arr, locale),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>, locale: Locale) {
    match result {
        Value::Object(res_map) => print_rows(flatten(res_map, locale)),
        other => println!("{}", format_value("result", other, locale)),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_rows(rows: Vec<(String, String)>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in rows {
        builder.push_record([key, val]);
    }
    println!("{}", Table::from(builder));
}

/// Nested objects become dotted field names; schedules collapse to their length.
fn flatten(map: &Map<String, Value>, locale: Locale) -> Vec<(String, String)> {
    let mut rows = Vec::new();
    flatten_into(&mut rows, "", map, locale);
    rows
}

fn flatten_into(
    rows: &mut Vec<(String, String)>,
    prefix: &str,
    map: &Map<String, Value>,
    locale: Locale,
) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match val {
            Value::Object(inner) => match inner.get("entries").and_then(Value::as_array) {
                Some(entries) => rows.push((name, format!("{} months", entries.len()))),
                None => flatten_into(rows, &name, inner, locale),
            },
            other => rows.push((name.clone(), format_value(&name, other, locale))),
        }
    }
}

fn print_array_table(arr: &[Value], locale: Locale) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        map.get(h.as_str())
                            .map(|v| format_value(h, v, locale))
                            .unwrap_or_default()
                    })
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value("", item, locale));
        }
    }
}

fn format_value(key: &str, value: &Value, locale: Locale) -> String {
    match value {
        Value::String(s) => localize(key, s, locale),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) if arr.len() > INLINE_ARRAY_LIMIT => format!("[{} items]", arr.len()),
        Value::Array(arr) => arr
            .iter()
            .map(|v| format_value(key, v, locale))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Decimal strings render as reais or percentages under the `br` locale.
fn localize(key: &str, text: &str, locale: Locale) -> String {
    if locale == Locale::Plain {
        return text.to_string();
    }
    match Decimal::from_str(text) {
        Ok(d) if is_rate_field(key) => percent_br(d, 4),
        Ok(d) => brl(d),
        Err(_) => text.to_string(),
    }
}

fn is_rate_field(key: &str) -> bool {
    let field = key.rsplit('.').next().unwrap_or(key);
    field.contains("rate") || field.contains("yield")
}
