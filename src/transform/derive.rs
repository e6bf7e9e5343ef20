//! Derived metrics: percent change, percent share, and series summaries.
//!
//! These feed the dashboard's metric tiles and pie/tooltip annotations:
//! the year-over-year headline ("Total in 2022, +x% vs 2021"), the
//! per-category share pies, and the total/max/min tiles under each chart.
//!
//! Division by zero is not a crash here. A zero previous total makes the
//! percent change undefined (`None`), matching the tolerant nature of
//! exploratory analytics; only a zero-sum *partition* is an error, and a
//! recoverable one; the caller omits that chart.

use crate::error::{TransformError, TransformResult};
use crate::models::{AggregatedPoint, ChangePoint, LongRecord, SeriesSummary, SharePoint};

/// Period-over-period percent change across an aggregated series.
///
/// The first period has no defined change (`None`, never zero), and any
/// period whose predecessor totals zero is likewise undefined.
pub fn percent_change(series: &[AggregatedPoint]) -> Vec<ChangePoint> {
    series
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let change = if i == 0 {
                None
            } else {
                let previous = series[i - 1].total;
                if previous == 0.0 {
                    None
                } else {
                    Some((point.total - previous) / previous * 100.0)
                }
            };
            ChangePoint {
                period: point.key.clone(),
                change,
            }
        })
        .collect()
}

/// Percentage share of each record within one partition.
///
/// The caller passes the records of a single partition (e.g. all issuer
/// types for one year) plus a label for error messages. Null values are
/// excluded entirely; zero values stay and get share 0.
///
/// Fails with an empty-partition error when nothing remains or the
/// partition sums to zero; the caller handles it by omitting the chart,
/// not by propagating a failure to the whole render.
pub fn percent_share(records: &[LongRecord], partition: &str) -> TransformResult<Vec<SharePoint>> {
    let kept: Vec<(&LongRecord, f64)> = records
        .iter()
        .filter_map(|r| r.value.map(|v| (r, v)))
        .collect();

    let total: f64 = kept.iter().map(|(_, v)| v).sum();
    if kept.is_empty() || total == 0.0 {
        return Err(TransformError::EmptyPartition(partition.to_string()));
    }

    Ok(kept
        .into_iter()
        .map(|(record, value)| SharePoint {
            entity: record.entity.clone(),
            value,
            share: value / total * 100.0,
        })
        .collect())
}

/// Share of each group within an aggregated series.
///
/// Same contract as [`percent_share`], for callers that already summed per
/// group (the use-of-proceeds category pie).
pub fn percent_share_of_points(
    points: &[AggregatedPoint],
    partition: &str,
) -> TransformResult<Vec<SharePoint>> {
    let total: f64 = points.iter().map(|p| p.total).sum();
    if points.is_empty() || total == 0.0 {
        return Err(TransformError::EmptyPartition(partition.to_string()));
    }

    Ok(points
        .iter()
        .map(|p| SharePoint {
            entity: p.key.clone(),
            value: p.total,
            share: p.total / total * 100.0,
        })
        .collect())
}

/// Total/max/min/count metrics over a record set.
///
/// Nulls count 0 toward the total but are excluded from max and min, so a
/// sparse series never reports a spurious minimum of zero.
pub fn series_summary(records: &[LongRecord]) -> SeriesSummary {
    let values: Vec<f64> = records.iter().filter_map(|r| r.value).collect();

    SeriesSummary {
        total: values.iter().sum(),
        max: values.iter().copied().reduce(f64::max),
        min: values.iter().copied().reduce(f64::min),
        count: records.len(),
        non_null: values.len(),
    }
}

/// The dashboard's headline metric: the last period's total and its percent
/// change versus the period before it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Headline {
    pub period: String,
    pub total: f64,
    /// `None` with fewer than two periods or a zero prior total.
    pub change: Option<f64>,
}

/// Headline for an aggregated series, taken from its last two points.
/// `None` for an empty series.
pub fn headline(series: &[AggregatedPoint]) -> Option<Headline> {
    let last = series.last()?;
    let change = percent_change(series).last()?.change;
    Some(Headline {
        period: last.key.clone(),
        total: last.total,
        change,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn point(key: &str, total: f64) -> AggregatedPoint {
        AggregatedPoint {
            key: key.to_string(),
            total,
        }
    }

    fn record(entity: &str, value: Option<f64>) -> LongRecord {
        LongRecord {
            entity: entity.to_string(),
            period: "2022".to_string(),
            value,
            attrs: BTreeMap::new(),
        }
    }

    #[test]
    fn test_percent_change_first_period_undefined() {
        let changes = percent_change(&[point("2020", 15.0), point("2021", 20.0)]);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].change, None);
        let c = changes[1].change.unwrap();
        assert!((c - 33.333333333333336).abs() < 1e-9);
    }

    #[test]
    fn test_percent_change_zero_previous_is_undefined() {
        let changes = percent_change(&[point("2019", 0.0), point("2020", 4.0)]);
        assert_eq!(changes[1].change, None);
    }

    #[test]
    fn test_percent_change_empty_series() {
        assert!(percent_change(&[]).is_empty());
    }

    #[test]
    fn test_share_sums_to_hundred() {
        let records = vec![
            record("Banks", Some(30.0)),
            record("Sovereign", Some(50.0)),
            record("Other", Some(20.0)),
        ];
        let shares = percent_share(&records, "2022").unwrap();
        let sum: f64 = shares.iter().map(|s| s.share).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_share_zero_member_of_nonzero_partition() {
        let records = vec![record("A", Some(30.0)), record("B", Some(0.0))];
        let shares = percent_share(&records, "2022").unwrap();
        assert_eq!(shares[0].share, 100.0);
        assert_eq!(shares[1].share, 0.0);
    }

    #[test]
    fn test_share_excludes_nulls() {
        let records = vec![record("A", Some(40.0)), record("B", None)];
        let shares = percent_share(&records, "2022").unwrap();
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].share, 100.0);
    }

    #[test]
    fn test_share_empty_partition_errors() {
        assert!(matches!(
            percent_share(&[], "2012"),
            Err(TransformError::EmptyPartition(p)) if p == "2012"
        ));
        let zeros = vec![record("A", Some(0.0)), record("B", None)];
        assert!(percent_share(&zeros, "2012").is_err());
    }

    #[test]
    fn test_share_of_points() {
        let points = vec![point("Energy", 75.0), point("Climate", 25.0)];
        let shares = percent_share_of_points(&points, "2022").unwrap();
        assert_eq!(shares[0].share, 75.0);
        assert_eq!(shares[1].entity, "Climate");
        assert!(percent_share_of_points(&[], "2022").is_err());
    }

    #[test]
    fn test_series_summary_null_policy() {
        let records = vec![
            record("A", Some(10.0)),
            record("B", Some(2.5)),
            record("C", None),
        ];
        let summary = series_summary(&records);
        assert_eq!(summary.total, 12.5);
        assert_eq!(summary.max, Some(10.0));
        // Null is not a minimum of zero.
        assert_eq!(summary.min, Some(2.5));
        assert_eq!(summary.count, 3);
        assert_eq!(summary.non_null, 2);
    }

    #[test]
    fn test_series_summary_empty() {
        let summary = series_summary(&[]);
        assert_eq!(summary.total, 0.0);
        assert_eq!(summary.max, None);
        assert_eq!(summary.min, None);
    }

    #[test]
    fn test_headline_last_two_periods() {
        let series = vec![point("2021", 10.0), point("2022", 15.0)];
        let h = headline(&series).unwrap();
        assert_eq!(h.period, "2022");
        assert_eq!(h.total, 15.0);
        assert!((h.change.unwrap() - 50.0).abs() < 1e-9);

        let single = headline(&[point("2022", 15.0)]).unwrap();
        assert_eq!(single.change, None);
        assert_eq!(headline(&[]), None);
    }
}
