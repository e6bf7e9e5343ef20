//! Group-and-sum aggregation over long records.
//!
//! ```text
//! Long input (flat records)        →  Aggregated output
//! ┌──────────────────────────┐       ┌──────────────────┐
//! │ France  2020  10.0       │       │ 2020  15.0       │
//! │ Chile   2020   5.0       │  →    │ 2021  20.0       │
//! │ France  2021  20.0       │       └──────────────────┘
//! │ Chile   2021  null       │
//! └──────────────────────────┘
//! ```
//!
//! Grouping is stable: keys appear in first-seen record order, which for a
//! freshly reshaped table is the wide table's period-column order. Nothing
//! here ever sorts implicitly: a lexicographic sort would misorder
//! non-zero-padded period labels, so reordering is a separate, explicit
//! step ([`sort_points_by_year`]).

use std::collections::HashMap;

use crate::models::{AggregatedPoint, LongRecord};

/// The record field to group by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupKey {
    /// Group by period label (the per-year totals behind the bar charts).
    Period,
    /// Group by entity (per-country, per-issuer-type, per-category totals).
    Entity,
    /// Group by a pass-through descriptive field; records missing the
    /// field are skipped.
    Attr(String),
}

impl GroupKey {
    fn of(&self, record: &LongRecord) -> Option<String> {
        match self {
            GroupKey::Period => Some(record.period.clone()),
            GroupKey::Entity => Some(record.entity.clone()),
            GroupKey::Attr(name) => record.attr(name).map(String::from),
        }
    }
}

/// Sum values per group, null counted as 0.
///
/// Totals are order-independent (summation commutes); the emitted group
/// order is the first-seen order of keys in the input.
pub fn aggregate_sum(records: &[LongRecord], key: &GroupKey) -> Vec<AggregatedPoint> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut points: Vec<AggregatedPoint> = Vec::new();

    for record in records {
        let Some(group) = key.of(record) else {
            continue;
        };
        let value = record.value.unwrap_or(0.0);

        match index.get(&group) {
            Some(&i) => points[i].total += value,
            None => {
                index.insert(group.clone(), points.len());
                points.push(AggregatedPoint {
                    key: group,
                    total: value,
                });
            }
        }
    }

    points
}

/// Sort aggregated points by numeric year, in place.
///
/// Explicit opt-in for callers that grouped by period and want a
/// chronological axis regardless of input order. Non-year keys sort after
/// the years, keeping their relative order.
pub fn sort_points_by_year(points: &mut [AggregatedPoint]) {
    points.sort_by_key(|p| p.key.trim().parse::<i64>().unwrap_or(i64::MAX));
}

/// Sort aggregated points by descending total, in place.
///
/// The ranked horizontal bar charts ("issuance by country") want largest
/// first; ties keep their first-seen order.
pub fn sort_points_by_total_desc(points: &mut [AggregatedPoint]) {
    points.sort_by(|a, b| b.total.total_cmp(&a.total));
}
