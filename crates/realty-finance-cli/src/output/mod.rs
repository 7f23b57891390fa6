pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::{Locale, OutputFormat};
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, locale: Locale, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value, locale),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Result object of a computation envelope, or the value itself.
pub fn result_of(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

/// Rows worth exporting: a schedule's months or a cumulative series.
pub fn tabular_rows(result: &Value) -> Option<&Vec<Value>> {
    result
        .pointer("/schedule/entries")
        .or_else(|| result.get("cumulative_payments"))
        .and_then(Value::as_array)
}
