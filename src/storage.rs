use crate::config::Config;
use crate::errors::MetricsError;
use crate::models::{DayTotals, Record, StoredBreakdown, StoredRecord};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Narrow persistence seam used by the relational sink and the dashboard.
pub trait MetricsStore {
    fn table_exists(&self) -> Result<bool, MetricsError>;
    fn ensure_table_exists(&self) -> Result<(), MetricsError>;
    /// Insert-or-replace keyed by `day`; every non-key column is overwritten.
    fn upsert(&self, record: &Record) -> Result<(), MetricsError>;
    /// All stored days, most recent first.
    fn fetch_all(&self) -> Result<Vec<StoredRecord>, MetricsError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpsertReport {
    pub written: usize,
    pub failed: usize,
}

/// Best-effort batch: each row commits on its own and a failing row does not
/// stop the rest. The table is created lazily on first write.
pub fn upsert_all(store: &dyn MetricsStore, records: &[Record]) -> Result<UpsertReport, MetricsError> {
    if !store.table_exists()? {
        store.ensure_table_exists()?;
    }

    let mut report = UpsertReport::default();
    for record in records {
        match store.upsert(record) {
            Ok(()) => report.written += 1,
            Err(err) => {
                error!("failed to insert/update day {}: {err}", record.day);
                report.failed += 1;
            }
        }
    }

    info!(
        "upserted {} day(s), {} failed",
        report.written, report.failed
    );
    Ok(report)
}

pub struct SqliteStore {
    conn: Connection,
    table: String,
}

impl SqliteStore {
    pub fn open(path: &Path, table: &str) -> Result<Self, MetricsError> {
        validate_table_name(table)?;
        let conn = Connection::open(path)?;
        Ok(Self {
            conn,
            table: table.to_string(),
        })
    }

    pub fn open_in_memory(table: &str) -> Result<Self, MetricsError> {
        validate_table_name(table)?;
        Ok(Self {
            conn: Connection::open_in_memory()?,
            table: table.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, MetricsError> {
        if config.dbhost.is_some() || config.dbuser.is_some() || config.dbpass.is_some() {
            debug!("dbhost/dbuser/dbpass are not used by the embedded sqlite store");
        }
        let name = config
            .dbname
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| MetricsError::Config("dbname is required for database access".into()))?;

        if name == ":memory:" {
            return Self::open_in_memory(&config.dbtable);
        }
        Self::open(Path::new(name), &config.dbtable)
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl MetricsStore for SqliteStore {
    fn table_exists(&self) -> Result<bool, MetricsError> {
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![self.table],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn ensure_table_exists(&self) -> Result<(), MetricsError> {
        self.conn.execute_batch(&format!(
            r#"
CREATE TABLE IF NOT EXISTS "{table}" (
  day TEXT PRIMARY KEY,
  breakdown TEXT NOT NULL,
  total_suggestions_count INTEGER NOT NULL DEFAULT 0,
  total_acceptances_count INTEGER NOT NULL DEFAULT 0,
  total_lines_suggested INTEGER NOT NULL DEFAULT 0,
  total_lines_accepted INTEGER NOT NULL DEFAULT 0,
  total_active_users INTEGER NOT NULL DEFAULT 0,
  total_chat_acceptances INTEGER NOT NULL DEFAULT 0,
  total_chat_turns INTEGER NOT NULL DEFAULT 0,
  total_active_chat_users INTEGER NOT NULL DEFAULT 0
);
"#,
            table = self.table
        ))?;
        info!("table '{}' is ready", self.table);
        Ok(())
    }

    fn upsert(&self, record: &Record) -> Result<(), MetricsError> {
        let breakdown = match &record.raw_breakdown {
            Some(raw) => serde_json::to_string(raw)?,
            None => serde_json::to_string(&record.breakdown)?,
        };
        let totals = &record.totals;
        let sql = format!(
            r#"
INSERT INTO "{table}" (
  day, breakdown,
  total_suggestions_count, total_acceptances_count,
  total_lines_suggested, total_lines_accepted,
  total_active_users, total_chat_acceptances,
  total_chat_turns, total_active_chat_users
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
ON CONFLICT(day) DO UPDATE SET
  breakdown = excluded.breakdown,
  total_suggestions_count = excluded.total_suggestions_count,
  total_acceptances_count = excluded.total_acceptances_count,
  total_lines_suggested = excluded.total_lines_suggested,
  total_lines_accepted = excluded.total_lines_accepted,
  total_active_users = excluded.total_active_users,
  total_chat_acceptances = excluded.total_chat_acceptances,
  total_chat_turns = excluded.total_chat_turns,
  total_active_chat_users = excluded.total_active_chat_users
"#,
            table = self.table
        );

        let mut stmt = self.conn.prepare_cached(&sql)?;
        stmt.execute(params![
            record.day,
            breakdown,
            to_sql_int(totals.total_suggestions_count),
            to_sql_int(totals.total_acceptances_count),
            to_sql_int(totals.total_lines_suggested),
            to_sql_int(totals.total_lines_accepted),
            to_sql_int(totals.total_active_users),
            to_sql_int(totals.total_chat_acceptances),
            to_sql_int(totals.total_chat_turns),
            to_sql_int(totals.total_active_chat_users),
        ])?;
        Ok(())
    }

    fn fetch_all(&self) -> Result<Vec<StoredRecord>, MetricsError> {
        let sql = format!(
            r#"
SELECT day, breakdown,
       total_suggestions_count, total_acceptances_count,
       total_lines_suggested, total_lines_accepted,
       total_active_users, total_chat_acceptances,
       total_chat_turns, total_active_chat_users
FROM "{table}"
ORDER BY day DESC
"#,
            table = self.table
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            let day: String = row.get(0)?;
            let blob: Option<String> = row.get(1)?;
            let totals = DayTotals {
                total_suggestions_count: from_sql_int(row.get(2)?),
                total_acceptances_count: from_sql_int(row.get(3)?),
                total_lines_suggested: from_sql_int(row.get(4)?),
                total_lines_accepted: from_sql_int(row.get(5)?),
                total_active_users: from_sql_int(row.get(6)?),
                total_chat_acceptances: from_sql_int(row.get(7)?),
                total_chat_turns: from_sql_int(row.get(8)?),
                total_active_chat_users: from_sql_int(row.get(9)?),
            };
            Ok((day, blob, totals))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (day, blob, totals) = row?;
            let breakdown = parse_blob(&day, blob.as_deref());
            records.push(StoredRecord {
                day,
                totals,
                breakdown,
            });
        }
        Ok(records)
    }
}

fn parse_blob(day: &str, blob: Option<&str>) -> Vec<StoredBreakdown> {
    let Some(blob) = blob else {
        return Vec::new();
    };
    let entries: Vec<Value> = match serde_json::from_str(blob) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("unreadable breakdown for {day}: {err}");
            return Vec::new();
        }
    };

    // Per-field reads: a wrong-typed detail shows as absent, not a lost day.
    entries
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| {
            let text = |key: &str| obj.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
            let count = |key: &str| obj.get(key).and_then(Value::as_u64);
            StoredBreakdown {
                language: text("language"),
                editor: text("editor"),
                lines_accepted: count("lines_accepted"),
                lines_suggested: count("lines_suggested"),
                active_users: count("active_users"),
            }
        })
        .collect()
}

fn validate_table_name(table: &str) -> Result<(), MetricsError> {
    let mut chars = table.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(MetricsError::InvalidTable(table.to_string()))
    }
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_sql_int(value: Option<i64>) -> u64 {
    value.and_then(|v| u64::try_from(v).ok()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BreakdownEntry;
    use crate::payload::parse_records;
    use serde_json::json;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory("copilot_usage").unwrap()
    }

    fn sample() -> Vec<Record> {
        parse_records(&json!([
            {
                "day": "2024-01-01",
                "total_suggestions_count": 10,
                "total_active_users": 2,
                "breakdown": [{ "language": "go", "editor": "vscode", "suggestions_count": 10, "acceptances_count": 4 }]
            },
            { "day": "2024-01-02", "total_suggestions_count": 3, "breakdown": [] }
        ]))
    }

    fn row_count(store: &SqliteStore) -> i64 {
        store
            .conn
            .query_row("SELECT COUNT(*) FROM copilot_usage", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn table_is_created_lazily_on_first_write() {
        let store = store();
        assert!(!store.table_exists().unwrap());
        let report = upsert_all(&store, &sample()).unwrap();
        assert!(store.table_exists().unwrap());
        assert_eq!(report, UpsertReport { written: 2, failed: 0 });
    }

    #[test]
    fn ensure_table_is_idempotent() {
        let store = store();
        store.ensure_table_exists().unwrap();
        store.ensure_table_exists().unwrap();
        assert!(store.table_exists().unwrap());
    }

    #[test]
    fn empty_breakdown_still_writes_one_row() {
        let store = store();
        upsert_all(&store, &sample()).unwrap();
        assert_eq!(row_count(&store), 2);
        let stored = store.fetch_all().unwrap();
        assert_eq!(stored[0].day, "2024-01-02");
        assert!(stored[0].breakdown.is_empty());
    }

    #[test]
    fn applying_the_same_batch_twice_is_idempotent() {
        let store = store();
        upsert_all(&store, &sample()).unwrap();
        let once = store.fetch_all().unwrap();
        upsert_all(&store, &sample()).unwrap();
        let twice = store.fetch_all().unwrap();
        assert_eq!(row_count(&store), 2);
        assert_eq!(once, twice);
    }

    #[test]
    fn duplicate_day_keeps_the_last_write() {
        let store = store();
        let mut first = Record {
            day: "2024-01-01".to_string(),
            ..Record::default()
        };
        first.totals.total_suggestions_count = 5;
        first.totals.total_chat_turns = 9;
        first.breakdown.push(BreakdownEntry {
            language: "go".to_string(),
            ..BreakdownEntry::default()
        });

        let mut second = Record {
            day: "2024-01-01".to_string(),
            ..Record::default()
        };
        second.totals.total_suggestions_count = 42;

        upsert_all(&store, &[first]).unwrap();
        upsert_all(&store, &[second]).unwrap();

        let stored = store.fetch_all().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].totals.total_suggestions_count, 42);
        assert_eq!(stored[0].totals.total_chat_turns, 0);
        assert!(stored[0].breakdown.is_empty());
    }

    #[test]
    fn fetch_all_orders_most_recent_first_and_keeps_blob_fields() {
        let store = store();
        upsert_all(&store, &sample()).unwrap();
        let stored = store.fetch_all().unwrap();
        let days: Vec<&str> = stored.iter().map(|r| r.day.as_str()).collect();
        assert_eq!(days, vec!["2024-01-02", "2024-01-01"]);
        assert_eq!(stored[1].totals.total_active_users, 2);
        assert_eq!(stored[1].breakdown[0].language, "go");
        assert_eq!(stored[1].breakdown[0].lines_accepted, None);
    }

    #[test]
    fn fields_missing_from_the_payload_render_as_not_available() {
        let store = store();
        let records = parse_records(&json!([{
            "day": "2024-01-01",
            "breakdown": [{ "language": "go", "editor": "vscode", "suggestions_count": 8, "active_users": 0 }]
        }]));
        upsert_all(&store, &records).unwrap();

        let stored = store.fetch_all().unwrap();
        let entry = &stored[0].breakdown[0];
        assert_eq!(entry.lines_accepted, None);
        assert_eq!(entry.lines_suggested, None);
        assert_eq!(entry.active_users, Some(0));

        let html = crate::ui::render_dashboard(&stored);
        assert!(html.contains("<tr><td>vscode</td><td>go</td><td>N/A</td><td>N/A</td><td>0</td></tr>"));
    }

    #[test]
    fn records_built_in_code_store_their_parsed_breakdown() {
        let store = store();
        let record = Record {
            day: "2024-01-05".to_string(),
            breakdown: vec![BreakdownEntry {
                language: "rust".to_string(),
                lines_accepted: 3,
                ..BreakdownEntry::default()
            }],
            ..Record::default()
        };
        upsert_all(&store, &[record]).unwrap();
        let stored = store.fetch_all().unwrap();
        assert_eq!(stored[0].breakdown[0].lines_accepted, Some(3));
    }

    #[test]
    fn wrong_typed_blob_fields_read_as_absent() {
        let entries = parse_blob(
            "2024-04-01",
            Some(r#"[{"language":null,"editor":"vim","lines_accepted":"7","lines_suggested":-1,"active_users":2}, 5]"#),
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].language, "");
        assert_eq!(entries[0].editor, "vim");
        assert_eq!(entries[0].lines_accepted, None);
        assert_eq!(entries[0].lines_suggested, None);
        assert_eq!(entries[0].active_users, Some(2));
    }

    #[test]
    fn sparse_blobs_read_back_as_absent_fields() {
        let store = store();
        store.ensure_table_exists().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO copilot_usage (day, breakdown) VALUES ('2024-03-01', ?1)",
                params![r#"[{"language":"rust","editor":"vim","lines_accepted":7}]"#],
            )
            .unwrap();
        store
            .conn
            .execute(
                "INSERT INTO copilot_usage (day, breakdown) VALUES ('2024-03-02', 'not json')",
                [],
            )
            .unwrap();

        let stored = store.fetch_all().unwrap();
        assert!(stored[0].breakdown.is_empty());
        let entry = &stored[1].breakdown[0];
        assert_eq!(entry.lines_accepted, Some(7));
        assert_eq!(entry.lines_suggested, None);
        assert_eq!(entry.active_users, None);
    }

    #[test]
    fn row_failures_do_not_abort_the_batch() {
        struct Flaky(SqliteStore);

        impl MetricsStore for Flaky {
            fn table_exists(&self) -> Result<bool, MetricsError> {
                self.0.table_exists()
            }
            fn ensure_table_exists(&self) -> Result<(), MetricsError> {
                self.0.ensure_table_exists()
            }
            fn upsert(&self, record: &Record) -> Result<(), MetricsError> {
                if record.day == "2024-01-01" {
                    return Err(MetricsError::Config("simulated failure".into()));
                }
                self.0.upsert(record)
            }
            fn fetch_all(&self) -> Result<Vec<StoredRecord>, MetricsError> {
                self.0.fetch_all()
            }
        }

        let flaky = Flaky(store());
        let report = upsert_all(&flaky, &sample()).unwrap();
        assert_eq!(report, UpsertReport { written: 1, failed: 1 });
        assert_eq!(flaky.fetch_all().unwrap().len(), 1);
    }

    #[test]
    fn rejects_unsafe_table_names() {
        assert!(validate_table_name("copilot_usage").is_ok());
        assert!(validate_table_name("_t1").is_ok());
        assert!(matches!(
            SqliteStore::open_in_memory("usage; DROP TABLE x"),
            Err(MetricsError::InvalidTable(_))
        ));
        assert!(validate_table_name("1abc").is_err());
        assert!(validate_table_name("").is_err());
    }
}
