//! Wide-to-long reshape (melt) and record filters.
//!
//! Every chart in the dashboard starts the same way: melt a wide table into
//! long records, then narrow them down: by period, by a descriptive field
//! (region, indicator, category), by entity, and finally by dropping the
//! null/zero values that would plot as meaningless bars.
//!
//! ```text
//! Wide input                       →  Long output
//! ┌──────────────────────────┐       ┌───────────────────────────────┐
//! │ Country  2021   2022     │       │ France  2021  30.1            │
//! │ France   30.1   51.9     │  →    │ France  2022  51.9            │
//! │ Norway    3.5   null     │       │ Norway  2021   3.5            │
//! └──────────────────────────┘       │ Norway  2022  null            │
//!                                    └───────────────────────────────┘
//! ```
//!
//! All functions are pure: they read their inputs and build fresh vectors.

use std::collections::BTreeMap;

use crate::error::SchemaResult;
use crate::models::{LongRecord, Period, WideTable};
use crate::validation::check_reshape_columns;

/// Melt a wide table into long records.
///
/// For each row and each period column, emits one [`LongRecord`] carrying
/// the first id column as `entity`, the remaining id columns as
/// pass-through attrs, the period column's header as `period`, and the
/// cell's numeric value (null when the cell is missing or non-numeric).
///
/// Output order is row-major, then period-column order as given. Exactly
/// `rows × period_columns` records come out, except that rows whose first
/// id cell is null are skipped: a row with no identity cannot be charted,
/// and keeping it would mint a nameless group under entity grouping.
///
/// Fails with a schema error when a named column is absent, when the two
/// column sets overlap, or when either set is empty.
pub fn reshape(
    table: &WideTable,
    id_columns: &[String],
    period_columns: &[String],
) -> SchemaResult<Vec<LongRecord>> {
    check_reshape_columns(table, id_columns, period_columns)?;

    // Indices exist after the column check.
    let id_idx: Vec<usize> = id_columns
        .iter()
        .filter_map(|c| table.column_index(c))
        .collect();
    let period_idx: Vec<usize> = period_columns
        .iter()
        .filter_map(|c| table.column_index(c))
        .collect();

    let mut records = Vec::with_capacity(table.row_count() * period_columns.len());

    for row in &table.rows {
        let Some(entity) = row[id_idx[0]].as_text() else {
            continue;
        };

        let mut attrs = BTreeMap::new();
        for (&idx, name) in id_idx[1..].iter().zip(&id_columns[1..]) {
            if let Some(text) = row[idx].as_text() {
                attrs.insert(name.clone(), text);
            }
        }

        for (&idx, period) in period_idx.iter().zip(period_columns) {
            records.push(LongRecord {
                entity: entity.clone(),
                period: period.clone(),
                value: row[idx].as_number(),
                attrs: attrs.clone(),
            });
        }
    }

    Ok(records)
}

/// Keep records whose period equals the canonical year selector.
///
/// An empty result is not an error; the caller renders an empty state.
pub fn filter_by_period(records: &[LongRecord], period: &Period) -> Vec<LongRecord> {
    records
        .iter()
        .filter(|r| r.period == period.as_str())
        .cloned()
        .collect()
}

/// Keep records whose named pass-through field equals `value`.
/// Records without the field are dropped.
pub fn filter_by_attr(records: &[LongRecord], name: &str, value: &str) -> Vec<LongRecord> {
    records
        .iter()
        .filter(|r| r.attr(name) == Some(value))
        .cloned()
        .collect()
}

/// Drop records that are missing the named pass-through field, e.g. rows
/// with a null `Region` ahead of the by-region charts.
pub fn drop_missing_attr(records: &[LongRecord], name: &str) -> Vec<LongRecord> {
    records
        .iter()
        .filter(|r| r.attr(name).is_some())
        .cloned()
        .collect()
}

/// Keep records for one entity (a single country, issuer type, ...).
pub fn filter_by_entity(records: &[LongRecord], entity: &str) -> Vec<LongRecord> {
    records
        .iter()
        .filter(|r| r.entity == entity)
        .cloned()
        .collect()
}

/// Drop records whose value is null or exactly zero.
///
/// Applied before every visualization that would otherwise plot zero-valued
/// bars or points. Idempotent.
pub fn filter_non_zero_non_null(records: &[LongRecord]) -> Vec<LongRecord> {
    records
        .iter()
        .filter(|r| matches!(r.value, Some(v) if v != 0.0))
        .cloned()
        .collect()
}

/// Distinct entities, in first-seen order.
pub fn distinct_entities(records: &[LongRecord]) -> Vec<String> {
    let mut seen = Vec::new();
    for record in records {
        if !seen.contains(&record.entity) {
            seen.push(record.entity.clone());
        }
    }
    seen
}
