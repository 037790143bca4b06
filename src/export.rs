use crate::errors::MetricsError;
use crate::models::{FlatRow, Record};
use chrono::NaiveDate;
use std::path::Path;
use tokio::fs;
use tracing::info;

pub const CSV_HEADER: &str = "day,language,editor,suggestions_count,acceptances_count,lines_suggested,lines_accepted,active_users";

/// One row per breakdown entry; a day without entries yields no rows.
pub fn flatten(records: &[Record]) -> Vec<FlatRow> {
    records
        .iter()
        .flat_map(|record| {
            record.breakdown.iter().map(|entry| FlatRow {
                day: record.day.clone(),
                entry: entry.clone(),
            })
        })
        .collect()
}

pub fn build_csv(rows: &[FlatRow]) -> String {
    let mut csv = String::with_capacity(CSV_HEADER.len() + 1 + rows.len() * 64);
    csv.push_str(CSV_HEADER);
    csv.push('\n');

    for row in rows {
        let entry = &row.entry;
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            escape_csv_field(&row.day),
            escape_csv_field(&entry.language),
            escape_csv_field(&entry.editor),
            entry.suggestions_count,
            entry.acceptances_count,
            entry.lines_suggested,
            entry.lines_accepted,
            entry.active_users,
        ));
    }

    csv
}

pub fn csv_filename(org: &str, date: NaiveDate) -> String {
    format!("{}_{}.csv", org, date.format("%Y%m%d"))
}

/// Overwrites `path` with the flattened batch. Returns the data row count.
pub async fn write_csv(path: &Path, records: &[Record]) -> Result<usize, MetricsError> {
    let rows = flatten(records);
    fs::write(path, build_csv(&rows)).await?;
    info!("CSV file '{}' has been created ({} rows)", path.display(), rows.len());
    Ok(rows.len())
}

/// RFC 4180: quote fields containing separators, quotes or line breaks.
fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
