use crate::models::{BatchSummary, ChartBar, ChartGroup, Record};
use std::collections::{BTreeMap, BTreeSet};

pub const DAYS_PER_GROUP: usize = 3;

pub fn sorted_days(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|record| record.day.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Positional chunks over the sorted day list; calendar gaps are ignored.
pub fn group_days(days: &[String], size: usize) -> Vec<Vec<String>> {
    days.chunks(size.max(1)).map(<[String]>::to_vec).collect()
}

pub fn build_chart_groups(records: &[Record]) -> Vec<ChartGroup> {
    build_chart_groups_with(records, DAYS_PER_GROUP)
}

pub fn build_chart_groups_with(records: &[Record], size: usize) -> Vec<ChartGroup> {
    let mut sums: BTreeMap<(String, String), (u64, u64)> = BTreeMap::new();
    for record in records {
        for entry in &record.breakdown {
            let slot = sums.entry((record.day.clone(), entry.label())).or_default();
            slot.0 = slot.0.saturating_add(entry.suggestions_count);
            slot.1 = slot.1.saturating_add(entry.acceptances_count);
        }
    }

    group_days(&sorted_days(records), size)
        .into_iter()
        .map(|days| {
            let labels: BTreeSet<&str> = sums
                .keys()
                .filter(|(day, _)| days.contains(day))
                .map(|(_, label)| label.as_str())
                .collect();

            let mut group = ChartGroup {
                days: days.clone(),
                ..ChartGroup::default()
            };

            for day in &days {
                for label in &labels {
                    let Some(&(suggestions, acceptances)) =
                        sums.get(&(day.clone(), (*label).to_string()))
                    else {
                        continue;
                    };
                    if suggestions == 0 && acceptances == 0 {
                        continue;
                    }
                    group.suggestions.push(suggestions);
                    group.acceptances.push(acceptances);
                    group.bars.push(ChartBar {
                        day: day.clone(),
                        label: (*label).to_string(),
                        tag: format!("{day}\n{label}"),
                        suggestions,
                        acceptances,
                    });
                }
            }

            group
        })
        .collect()
}

pub fn summarize(records: &[Record]) -> BatchSummary {
    let mut suggestions = 0u64;
    let mut acceptances = 0u64;
    for record in records {
        suggestions = suggestions.saturating_add(record.totals.total_suggestions_count);
        acceptances = acceptances.saturating_add(record.totals.total_acceptances_count);
    }

    let acceptance_rate = if suggestions == 0 {
        0.0
    } else {
        acceptances as f64 / suggestions as f64
    };

    BatchSummary {
        days: sorted_days(records).len(),
        suggestions,
        acceptances,
        acceptance_rate,
    }
}
