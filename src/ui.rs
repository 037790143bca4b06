use crate::models::{StoredBreakdown, StoredRecord};
use std::fmt::Write;

const NOT_AVAILABLE: &str = "N/A";

pub fn render_dashboard(records: &[StoredRecord]) -> String {
    let mut rows = String::new();
    for (index, record) in records.iter().enumerate() {
        let totals = &record.totals;
        let _ = write!(
            rows,
            r#"
          <tr class="summary">
            <td>{day}</td>
            <td>{suggestions}</td>
            <td>{acceptances}</td>
            <td>{active}</td>
            <td>{chat}</td>
            <td><button type="button" class="toggle" onclick="toggleDetails('details-{index}')">View Details</button></td>
          </tr>
          <tr id="details-{index}" class="details" style="display: none;">
            <td colspan="6">{details}</td>
          </tr>"#,
            day = escape_markup(&record.day),
            suggestions = totals.total_suggestions_count,
            acceptances = totals.total_acceptances_count,
            active = totals.total_active_users,
            chat = totals.total_active_chat_users,
            details = render_details(&record.breakdown),
        );
    }

    let empty = if records.is_empty() {
        r#"<p class="empty">No metrics stored yet.</p>"#
    } else {
        ""
    };

    DASHBOARD_HTML
        .replace("{{COUNT}}", &records.len().to_string())
        .replace("{{ROWS}}", &rows)
        .replace("{{EMPTY}}", empty)
}

fn render_details(breakdown: &[StoredBreakdown]) -> String {
    let mut body = String::new();
    for item in breakdown {
        let _ = write!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_markup(&item.editor),
            escape_markup(&item.language),
            optional(item.lines_accepted),
            optional(item.lines_suggested),
            optional(item.active_users),
        );
    }

    format!(
        "<table class=\"inner\"><thead><tr><th>Editor</th><th>Language</th><th>Lines Accepted</th>\
         <th>Lines Suggested</th><th>Active Users</th></tr></thead><tbody>{body}</tbody></table>"
    )
}

fn optional(value: Option<u64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string())
}

pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>GitHub Copilot Metrics Dashboard</title>
  <style>
    :root {
      --bg: #f6f8fa;
      --ink: #1f2328;
      --muted: #59636e;
      --line: #d1d9e0;
      --accent: #0969da;
      --card: #ffffff;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif;
      padding: 32px 18px 48px;
    }

    .container {
      width: min(1080px, 100%);
      margin: 0 auto;
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 12px;
      padding: 28px;
    }

    h1 {
      margin: 0 0 4px;
      font-size: 1.8rem;
    }

    .subtitle {
      margin: 0 0 20px;
      color: var(--muted);
    }

    table {
      width: 100%;
      border-collapse: collapse;
    }

    th,
    td {
      border: 1px solid var(--line);
      padding: 8px 10px;
      text-align: left;
    }

    thead th {
      background: var(--bg);
    }

    .inner th {
      font-weight: 500;
      color: var(--muted);
    }

    .toggle {
      border: none;
      background: none;
      color: var(--accent);
      cursor: pointer;
      padding: 0;
      font: inherit;
    }

    .toggle:hover {
      text-decoration: underline;
    }

    .empty {
      color: var(--muted);
    }
  </style>
  <script>
    function toggleDetails(id) {
      var element = document.getElementById(id);
      element.style.display = element.style.display === 'none' ? 'table-row' : 'none';
    }
  </script>
</head>
<body>
  <div class="container">
    <h1>GitHub Copilot Metrics Dashboard</h1>
    <p class="subtitle">{{COUNT}} day(s) stored, most recent first.</p>
    <table>
      <thead>
        <tr>
          <th>Day</th>
          <th>Suggestions</th>
          <th>Acceptances</th>
          <th>Active Users</th>
          <th>Active Chat Users</th>
          <th>Details</th>
        </tr>
      </thead>
      <tbody>{{ROWS}}
      </tbody>
    </table>
    {{EMPTY}}
  </div>
</body>
</html>
"#;
