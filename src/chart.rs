use crate::errors::MetricsError;
use crate::models::ChartGroup;
use crate::ui::escape_markup;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

const PX_PER_INCH: f64 = 100.0;
const MIN_WIDTH_IN: f64 = 20.0;
const INCHES_PER_TAG: f64 = 0.5;
const HEIGHT_IN: f64 = 10.0;
const BAR_WIDTH: f64 = 0.35;
const ROTATE_AFTER: usize = 10;

const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_TOP: f64 = 80.0;
const MARGIN_BOTTOM: f64 = 220.0;
const Y_TICKS: u64 = 5;

const SUGGESTIONS_COLOR: &str = "#1f77b4";
const ACCEPTANCES_COLOR: &str = "#ff7f0e";

pub fn chart_width(tag_count: usize) -> f64 {
    MIN_WIDTH_IN.max(tag_count as f64 * INCHES_PER_TAG) * PX_PER_INCH
}

pub fn label_rotation(tag_count: usize) -> i32 {
    if tag_count > ROTATE_AFTER { 45 } else { 0 }
}

/// Overlaid (not stacked) suggestion/acceptance bars for one day group.
pub fn render_group_svg(group: &ChartGroup) -> String {
    let count = group.bars.len();
    let width = chart_width(count);
    let height = HEIGHT_IN * PX_PER_INCH;
    let plot_w = width - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = height - MARGIN_TOP - MARGIN_BOTTOM;
    let baseline = MARGIN_TOP + plot_h;

    let peak = group
        .suggestions
        .iter()
        .chain(group.acceptances.iter())
        .copied()
        .max()
        .unwrap_or(0);
    let y_max = nice_ceiling(peak);
    let scale_y = |value: u64| baseline - value as f64 / y_max as f64 * plot_h;

    let slot = if count == 0 { plot_w } else { plot_w / count as f64 };
    let bar_w = slot * BAR_WIDTH;
    let center = |index: usize| MARGIN_LEFT + slot * (index as f64 + 0.5);

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="sans-serif">"#
    );
    let _ = write!(svg, r#"<rect width="{width}" height="{height}" fill="white" />"#);

    let title = format!("Suggestions and Acceptances Count for {}", group.days.join(", "));
    let _ = write!(
        svg,
        r#"<text x="{}" y="40" font-size="20" text-anchor="middle">{}</text>"#,
        width / 2.0,
        escape_markup(&title)
    );

    let step = y_max / Y_TICKS;
    for tick in 0..=Y_TICKS {
        let value = step * tick;
        let y = scale_y(value);
        let _ = write!(
            svg,
            r##"<line x1="{MARGIN_LEFT}" y1="{y:.2}" x2="{:.2}" y2="{y:.2}" stroke="#e5e5e5" />"##,
            MARGIN_LEFT + plot_w
        );
        let _ = write!(
            svg,
            r#"<text x="{:.2}" y="{:.2}" font-size="12" text-anchor="end">{value}</text>"#,
            MARGIN_LEFT - 8.0,
            y + 4.0
        );
    }

    for (index, bar) in group.bars.iter().enumerate() {
        let x = center(index) - bar_w / 2.0;
        for (value, color) in [(bar.suggestions, SUGGESTIONS_COLOR), (bar.acceptances, ACCEPTANCES_COLOR)] {
            let top = scale_y(value);
            let _ = write!(
                svg,
                r#"<rect x="{x:.2}" y="{top:.2}" width="{bar_w:.2}" height="{:.2}" fill="{color}" />"#,
                baseline - top
            );
        }
    }

    let _ = write!(
        svg,
        r#"<line x1="{MARGIN_LEFT}" y1="{baseline}" x2="{:.2}" y2="{baseline}" stroke="black" />"#,
        MARGIN_LEFT + plot_w
    );
    let _ = write!(
        svg,
        r#"<line x1="{MARGIN_LEFT}" y1="{MARGIN_TOP}" x2="{MARGIN_LEFT}" y2="{baseline}" stroke="black" />"#
    );

    let angle = -label_rotation(count);
    let anchor = if angle == 0 { "middle" } else { "end" };
    for (index, tag) in group.tags().enumerate() {
        let x = center(index);
        let y = baseline + 18.0;
        let _ = write!(
            svg,
            r#"<text x="{x:.2}" y="{y:.2}" font-size="10" text-anchor="{anchor}" transform="rotate({angle} {x:.2} {y:.2})">"#
        );
        for (line, text) in tag.split('\n').enumerate() {
            let dy = if line == 0 { "0" } else { "1.2em" };
            let _ = write!(
                svg,
                r#"<tspan x="{x:.2}" dy="{dy}">{}</tspan>"#,
                escape_markup(text)
            );
        }
        svg.push_str("</text>");
    }

    let _ = write!(
        svg,
        r#"<text x="{:.2}" y="{:.2}" font-size="14" text-anchor="middle">Day / Language/Editor</text>"#,
        MARGIN_LEFT + plot_w / 2.0,
        height - 20.0
    );
    let _ = write!(
        svg,
        r#"<text x="24" y="{:.2}" font-size="14" text-anchor="middle" transform="rotate(-90 24 {:.2})">Count</text>"#,
        MARGIN_TOP + plot_h / 2.0,
        MARGIN_TOP + plot_h / 2.0
    );

    let legend_x = MARGIN_LEFT + plot_w - 180.0;
    for (row, (name, color)) in [
        ("Suggestions Count", SUGGESTIONS_COLOR),
        ("Acceptances Count", ACCEPTANCES_COLOR),
    ]
    .into_iter()
    .enumerate()
    {
        let y = MARGIN_TOP + 10.0 + row as f64 * 22.0;
        let _ = write!(
            svg,
            r#"<rect x="{legend_x:.2}" y="{y:.2}" width="16" height="12" fill="{color}" /><text x="{:.2}" y="{:.2}" font-size="13">{name}</text>"#,
            legend_x + 22.0,
            y + 11.0
        );
    }

    svg.push_str("</svg>\n");
    svg
}

/// Writes one `{prefix}_chart_{n}.svg` per group, numbered from 1.
pub async fn write_charts(
    dir: &Path,
    prefix: &str,
    groups: &[ChartGroup],
) -> Result<Vec<PathBuf>, MetricsError> {
    if groups.is_empty() {
        return Ok(Vec::new());
    }

    fs::create_dir_all(dir).await?;
    let mut written = Vec::with_capacity(groups.len());
    for (index, group) in groups.iter().enumerate() {
        let path = dir.join(format!("{prefix}_chart_{}.svg", index + 1));
        fs::write(&path, render_group_svg(group)).await?;
        info!(
            "chart for {} written to {} ({} bars)",
            group.days.join(", "),
            path.display(),
            group.bars.len()
        );
        written.push(path);
    }
    Ok(written)
}

fn nice_ceiling(peak: u64) -> u64 {
    if peak == 0 {
        return Y_TICKS;
    }
    let raw_step = peak.div_ceil(Y_TICKS);
    let magnitude = 10u64.pow(raw_step.ilog10());
    let step = [1u64, 2, 5, 10]
        .into_iter()
        .filter_map(|m| m.checked_mul(magnitude))
        .find(|candidate| *candidate >= raw_step)
        .unwrap_or(raw_step);
    // Near u64::MAX the rounded axis no longer fits; use the peak itself.
    step.checked_mul(Y_TICKS).unwrap_or(peak)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::build_chart_groups;
    use crate::models::{BreakdownEntry, Record};

    fn group_with(tags: usize) -> ChartGroup {
        let breakdown = (0..tags)
            .map(|i| BreakdownEntry {
                language: format!("lang{i:02}"),
                editor: "vscode".to_string(),
                suggestions_count: 10 + i as u64,
                acceptances_count: 4,
                ..BreakdownEntry::default()
            })
            .collect();
        let records = vec![Record {
            day: "2024-01-01".to_string(),
            breakdown,
            ..Record::default()
        }];
        build_chart_groups(&records).remove(0)
    }

    #[test]
    fn width_has_a_floor_and_scales_with_tags() {
        assert_eq!(chart_width(0), 2000.0);
        assert_eq!(chart_width(40), 2000.0);
        assert_eq!(chart_width(60), 3000.0);
    }

    #[test]
    fn labels_rotate_only_past_ten_tags() {
        assert_eq!(label_rotation(10), 0);
        assert_eq!(label_rotation(11), 45);

        let flat = render_group_svg(&group_with(10));
        assert!(flat.contains("rotate(0 "));
        let slanted = render_group_svg(&group_with(11));
        assert!(slanted.contains("rotate(-45 "));
    }

    #[test]
    fn svg_draws_two_bars_per_tag_with_two_line_labels() {
        let svg = render_group_svg(&group_with(2));
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Suggestions and Acceptances Count for 2024-01-01"));
        assert_eq!(svg.matches(&format!(r#"fill="{SUGGESTIONS_COLOR}" />"#)).count(), 3);
        assert_eq!(svg.matches(&format!(r#"fill="{ACCEPTANCES_COLOR}" />"#)).count(), 3);
        assert!(svg.contains(r#"dy="0">2024-01-01</tspan>"#));
        assert!(svg.contains(r#"dy="1.2em">lang00/vscode</tspan>"#));
    }

    #[test]
    fn y_axis_ceiling_is_rounded() {
        assert_eq!(nice_ceiling(0), 5);
        assert_eq!(nice_ceiling(10), 10);
        assert_eq!(nice_ceiling(11), 25);
        assert_eq!(nice_ceiling(437), 500);
        assert_eq!(nice_ceiling(12_000_000_000_000_000_000), 12_000_000_000_000_000_000);
        assert_eq!(nice_ceiling(u64::MAX), u64::MAX);
    }

    #[test]
    fn huge_counts_render_without_overflow() {
        let records = vec![Record {
            day: "2024-01-01".to_string(),
            breakdown: vec![BreakdownEntry {
                language: "go".to_string(),
                editor: "vscode".to_string(),
                suggestions_count: u64::MAX - 1,
                acceptances_count: 12_000_000_000_000_000_000,
                ..BreakdownEntry::default()
            }],
            ..Record::default()
        }];
        let group = build_chart_groups(&records).remove(0);
        let svg = render_group_svg(&group);
        assert!(svg.contains("go/vscode"));
        let top_tick = (u64::MAX - 1) / Y_TICKS * Y_TICKS;
        assert!(svg.contains(&format!(">{top_tick}</text>")));
    }

    #[tokio::test]
    async fn one_file_per_group() {
        let mut dir = std::env::temp_dir();
        dir.push(format!("copilot_metrics_charts_{}", std::process::id()));

        assert!(write_charts(&dir, "acme", &[]).await.unwrap().is_empty());

        let groups = vec![group_with(1), group_with(3)];
        let paths = write_charts(&dir, "acme", &groups).await.unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[1].ends_with("acme_chart_2.svg"));
        assert!(paths.iter().all(|path| path.exists()));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
