use crate::models::Record;
use std::fmt::Write;

/// Plain-text dump of every record in arrival order. Days without a
/// breakdown still print their totals.
pub fn render_metrics(records: &[Record]) -> String {
    let mut out = String::new();
    for record in records {
        let totals = &record.totals;
        let _ = writeln!(out, "Date: {}", record.day);
        let _ = writeln!(out, "Total Suggestions Count: {}", totals.total_suggestions_count);
        let _ = writeln!(out, "Total Acceptances Count: {}", totals.total_acceptances_count);
        let _ = writeln!(out, "Total Lines Suggested: {}", totals.total_lines_suggested);
        let _ = writeln!(out, "Total Lines Accepted: {}", totals.total_lines_accepted);
        let _ = writeln!(out, "Total Active Users: {}", totals.total_active_users);
        let _ = writeln!(out, "Total Chat Acceptances: {}", totals.total_chat_acceptances);
        let _ = writeln!(out, "Total Chat Turns: {}", totals.total_chat_turns);
        let _ = writeln!(out, "Total Active Chat Users: {}", totals.total_active_chat_users);

        for entry in &record.breakdown {
            let _ = writeln!(out, "  Language: {}", entry.language);
            let _ = writeln!(out, "  Editor: {}", entry.editor);
            let _ = writeln!(out, "  Suggestions Count: {}", entry.suggestions_count);
            let _ = writeln!(out, "  Acceptances Count: {}", entry.acceptances_count);
            let _ = writeln!(out, "  Lines Suggested: {}", entry.lines_suggested);
            let _ = writeln!(out, "  Lines Accepted: {}", entry.lines_accepted);
            let _ = writeln!(out, "  Active Users: {}", entry.active_users);
        }
    }
    out
}
