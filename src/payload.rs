use crate::errors::MetricsError;
use crate::models::{BreakdownEntry, DayTotals, Record};
use serde_json::{Map, Value};
use tracing::warn;

pub fn parse_payload(text: &str) -> Result<Vec<Record>, MetricsError> {
    let value: Value = serde_json::from_str(text)?;
    Ok(parse_records(&value))
}

/// Reads the usage payload leniently: a bad or missing field falls back to
/// 0 / "" and never drops the rest of the batch.
pub fn parse_records(value: &Value) -> Vec<Record> {
    let Some(items) = value.as_array() else {
        warn!("usage payload is not an array; treating as empty");
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match item.as_object() {
            Some(obj) => Some(parse_record(obj)),
            None => {
                warn!("skipping non-object day entry at index {index}");
                None
            }
        })
        .collect()
}

fn parse_record(obj: &Map<String, Value>) -> Record {
    let totals = DayTotals {
        total_suggestions_count: count(obj, "total_suggestions_count"),
        total_acceptances_count: count(obj, "total_acceptances_count"),
        total_lines_suggested: count(obj, "total_lines_suggested"),
        total_lines_accepted: count(obj, "total_lines_accepted"),
        total_active_users: count(obj, "total_active_users"),
        total_chat_acceptances: count(obj, "total_chat_acceptances"),
        total_chat_turns: count(obj, "total_chat_turns"),
        total_active_chat_users: count(obj, "total_active_chat_users"),
    };

    let raw: Vec<Value> = obj
        .get("breakdown")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter(|entry| entry.is_object()).cloned().collect())
        .unwrap_or_default();

    let breakdown = raw
        .iter()
        .filter_map(Value::as_object)
        .map(parse_breakdown)
        .collect();

    Record {
        day: text(obj, "day"),
        totals,
        breakdown,
        raw_breakdown: Some(raw),
    }
}

pub fn parse_breakdown(obj: &Map<String, Value>) -> BreakdownEntry {
    BreakdownEntry {
        language: text(obj, "language"),
        editor: text(obj, "editor"),
        suggestions_count: count(obj, "suggestions_count"),
        acceptances_count: count(obj, "acceptances_count"),
        lines_suggested: count(obj, "lines_suggested"),
        lines_accepted: count(obj, "lines_accepted"),
        active_users: count(obj, "active_users"),
    }
}

fn count(obj: &Map<String, Value>, key: &str) -> u64 {
    match obj.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn text(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}
