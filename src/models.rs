use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The eight day-level totals reported for a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DayTotals {
    pub total_suggestions_count: u64,
    pub total_acceptances_count: u64,
    pub total_lines_suggested: u64,
    pub total_lines_accepted: u64,
    pub total_active_users: u64,
    pub total_chat_acceptances: u64,
    pub total_chat_turns: u64,
    pub total_active_chat_users: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BreakdownEntry {
    pub language: String,
    pub editor: String,
    pub suggestions_count: u64,
    pub acceptances_count: u64,
    pub lines_suggested: u64,
    pub lines_accepted: u64,
    pub active_users: u64,
}

impl BreakdownEntry {
    pub fn label(&self) -> String {
        format!("{}/{}", self.language, self.editor)
    }
}

/// One calendar day of usage metrics. `day` is an ISO `YYYY-MM-DD` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Record {
    pub day: String,
    #[serde(flatten)]
    pub totals: DayTotals,
    pub breakdown: Vec<BreakdownEntry>,
    /// Breakdown objects exactly as received, kept for the stored blob so
    /// fields the API omitted stay absent there.
    #[serde(skip)]
    pub raw_breakdown: Option<Vec<Value>>,
}

/// Breakdown entry as read back from the stored blob. The detail counts stay
/// optional so the dashboard can tell "absent" apart from zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StoredBreakdown {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub editor: String,
    #[serde(default)]
    pub lines_accepted: Option<u64>,
    #[serde(default)]
    pub lines_suggested: Option<u64>,
    #[serde(default)]
    pub active_users: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StoredRecord {
    pub day: String,
    #[serde(flatten)]
    pub totals: DayTotals,
    pub breakdown: Vec<StoredBreakdown>,
}

/// One exploded CSV row: a breakdown entry with its owning day copied on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatRow {
    pub day: String,
    #[serde(flatten)]
    pub entry: BreakdownEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartBar {
    pub day: String,
    pub label: String,
    pub tag: String,
    pub suggestions: u64,
    pub acceptances: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ChartGroup {
    pub days: Vec<String>,
    pub bars: Vec<ChartBar>,
    pub suggestions: Vec<u64>,
    pub acceptances: Vec<u64>,
}

impl ChartGroup {
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.bars.iter().map(|bar| bar.tag.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct BatchSummary {
    pub days: usize,
    pub suggestions: u64,
    pub acceptances: u64,
    pub acceptance_rate: f64,
}
