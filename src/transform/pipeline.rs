//! High-level pipeline API: one parameterized entry point per chart.
//!
//! Every visual in the dashboard is the same sequence with different
//! arguments: reshape a table, narrow the records, aggregate, derive. A
//! [`ChartRequest`] captures those arguments as a configuration object so
//! chart code never hand-rolls its own reshape/filter/aggregate chain.
//!
//! # Example
//!
//! ```rust,ignore
//! use greendash::transform::{ChartRequest, GroupKey, run_chart};
//! use greendash::source::DatasetId;
//!
//! let request = ChartRequest::new(DatasetId::IssuerByYear)
//!     .group_by(GroupKey::Period)
//!     .with_change();
//! let series = run_chart(&table, &request)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::api::logs::{log_info, log_success, log_warning};
use crate::error::{PipelineError, PipelineResult, SchemaError};
use crate::models::{
    AggregatedPoint, ChangePoint, LongRecord, Period, ProceedsCategory, RegionFilter,
    SeriesSummary, SharePoint, WideTable,
};
use crate::source::DatasetId;
use crate::validation::{detect_period_columns, validate_table};

use super::derive::{
    headline, percent_change, percent_share, percent_share_of_points, series_summary, Headline,
};
use super::grouper::{aggregate_sum, sort_points_by_total_desc, sort_points_by_year, GroupKey};
use super::reshape::{
    distinct_entities, drop_missing_attr, filter_by_attr, filter_by_entity, filter_by_period,
    filter_non_zero_non_null, reshape,
};

// =============================================================================
// Chart Request
// =============================================================================

/// Configuration object for one chart's pipeline run.
///
/// Defaults reproduce the plain reshape: dataset id columns, auto-detected
/// period columns, no filters, no aggregation, no derived metrics.
#[derive(Debug, Clone)]
pub struct ChartRequest {
    pub dataset: DatasetId,
    /// Identifier columns; empty means the dataset's defaults.
    pub id_columns: Vec<String>,
    /// Columns to unpivot; empty means the dataset's fixed measure columns
    /// or, failing that, auto-detected year columns.
    pub value_columns: Vec<String>,
    /// Keep one period only.
    pub period: Option<Period>,
    /// Region handling: `None` leaves null-region rows alone; `Some(All)`
    /// drops them; `Some(Only(_))` drops them and keeps one region.
    pub region: Option<RegionFilter>,
    /// Keep one entity (a single country or issuer type).
    pub entity: Option<String>,
    /// Keep one use-of-proceeds category.
    pub category: Option<ProceedsCategory>,
    /// Drop null and exactly-zero values before aggregation.
    pub drop_zero: bool,
    /// Sum per group after filtering.
    pub group_by: Option<GroupKey>,
    /// Re-sort grouped points chronologically (numeric year order).
    pub chronological: bool,
    /// Re-sort grouped points by descending total (ranked bar charts).
    pub ranked: bool,
    /// Derive period-over-period percent change and the headline metric.
    pub change: bool,
    /// Derive percentage shares within the filtered partition.
    pub share: bool,
}

impl ChartRequest {
    pub fn new(dataset: DatasetId) -> Self {
        Self {
            dataset,
            id_columns: Vec::new(),
            value_columns: Vec::new(),
            period: None,
            region: None,
            entity: None,
            category: None,
            drop_zero: false,
            group_by: None,
            chronological: false,
            ranked: false,
            change: false,
            share: false,
        }
    }

    pub fn id_columns<I: IntoIterator<Item = S>, S: Into<String>>(mut self, columns: I) -> Self {
        self.id_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn value_columns<I: IntoIterator<Item = S>, S: Into<String>>(mut self, columns: I) -> Self {
        self.value_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    pub fn region(mut self, region: RegionFilter) -> Self {
        self.region = Some(region);
        self
    }

    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn category(mut self, category: ProceedsCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn drop_zero(mut self) -> Self {
        self.drop_zero = true;
        self
    }

    pub fn group_by(mut self, key: GroupKey) -> Self {
        self.group_by = Some(key);
        self
    }

    pub fn chronological(mut self) -> Self {
        self.chronological = true;
        self
    }

    pub fn ranked(mut self) -> Self {
        self.ranked = true;
        self
    }

    pub fn with_change(mut self) -> Self {
        self.change = true;
        self
    }

    pub fn with_share(mut self) -> Self {
        self.share = true;
        self
    }

    fn resolved_id_columns(&self) -> Vec<String> {
        if self.id_columns.is_empty() {
            self.dataset
                .default_id_columns()
                .iter()
                .map(|s| s.to_string())
                .collect()
        } else {
            self.id_columns.clone()
        }
    }

    fn resolved_value_columns(&self, table: &WideTable) -> Vec<String> {
        if !self.value_columns.is_empty() {
            return self.value_columns.clone();
        }
        if let Some(fixed) = self.dataset.fixed_value_columns() {
            return fixed.iter().map(|s| s.to_string()).collect();
        }
        detect_period_columns(table)
    }
}

// =============================================================================
// Chart Series
// =============================================================================

/// Everything the rendering collaborator needs for one chart: the filtered
/// long records, optional aggregation and derived metrics, and the summary
/// tiles. Recomputed in full on every request; nothing is cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub dataset: String,
    pub records: Vec<LongRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<AggregatedPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<Vec<ChangePoint>>,
    /// `None` when shares were not requested *or* the partition was empty;
    /// the renderer omits the pie either way.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares: Option<Vec<SharePoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<Headline>,
    pub summary: SeriesSummary,
    /// Distinct entities after filtering (the "67 countries" style tiles).
    pub entity_count: usize,
}

// =============================================================================
// Orchestration
// =============================================================================

/// Run one chart's reshape/filter/aggregate/derive sequence over a table.
///
/// Pure with respect to its inputs; a failed run leaves nothing behind.
pub fn run_chart(table: &WideTable, request: &ChartRequest) -> PipelineResult<ChartSeries> {
    if let Err(violations) = validate_table(table) {
        return Err(SchemaError::Malformed(violations.join("; ")).into());
    }
    if table.rows.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let id_columns = request.resolved_id_columns();
    let value_columns = request.resolved_value_columns(table);
    if value_columns.is_empty() {
        return Err(PipelineError::NoPeriods);
    }

    let mut records = reshape(table, &id_columns, &value_columns)?;
    log_info(format!(
        "Reshaped {} rows x {} columns into {} records",
        table.row_count(),
        value_columns.len(),
        records.len()
    ));

    if let Some(region) = request.region {
        records = drop_missing_attr(&records, "Region");
        if let RegionFilter::Only(only) = region {
            records = filter_by_attr(&records, "Region", only.label());
        }
    }
    if let Some(category) = request.category {
        records = filter_by_attr(&records, "Category", category.label());
    }
    if let Some(ref entity) = request.entity {
        records = filter_by_entity(&records, entity);
    }
    if let Some(ref period) = request.period {
        records = filter_by_period(&records, period);
    }
    if request.drop_zero {
        records = filter_non_zero_non_null(&records);
    }

    if records.is_empty() {
        // Empty after filtering is an empty state, not a failure.
        log_warning(format!(
            "No records left for '{}' after filtering",
            request.dataset.slug()
        ));
    }

    let summary = series_summary(&records);
    let entity_count = distinct_entities(&records).len();

    let points = request.group_by.as_ref().map(|key| {
        let mut points = aggregate_sum(&records, key);
        if request.chronological {
            sort_points_by_year(&mut points);
        }
        if request.ranked {
            sort_points_by_total_desc(&mut points);
        }
        points
    });

    let (changes, series_headline) = if request.change {
        match &points {
            Some(points) => (Some(percent_change(points)), headline(points)),
            None => (None, None),
        }
    } else {
        (None, None)
    };

    let shares = if request.share {
        let partition = request
            .period
            .as_ref()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| request.dataset.slug().to_string());
        let result = match &points {
            Some(points) => percent_share_of_points(points, &partition),
            None => percent_share(&records, &partition),
        };
        match result {
            Ok(shares) => Some(shares),
            Err(err) => {
                // Recoverable: the renderer omits the chart.
                log_warning(err.to_string());
                None
            }
        }
    } else {
        None
    };

    log_success(format!(
        "Series ready: {} records, {} entities",
        records.len(),
        entity_count
    ));

    Ok(ChartSeries {
        dataset: request.dataset.slug().to_string(),
        records,
        points,
        changes,
        shares,
        headline: series_headline,
        summary,
        entity_count,
    })
}

/// CSV parsing metadata surfaced alongside a series.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

/// A series plus the metadata of the table it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetReport {
    pub series: ChartSeries,
    pub csv_info: CsvInfo,
}

/// Fetch the request's dataset from a source and run the chart over it.
///
/// One fetch per render cycle; a fetch failure is fatal for this cycle and
/// is surfaced, never retried.
pub async fn run_on_source(
    source: &crate::source::Source,
    request: &ChartRequest,
) -> PipelineResult<DatasetReport> {
    log_info(format!(
        "Fetching '{}' from {}",
        request.dataset.slug(),
        source.location(request.dataset)
    ));
    let parsed = source.fetch(request.dataset).await?;
    log_success(format!(
        "Fetched {} rows ({}; delimiter '{}')",
        parsed.table.row_count(),
        parsed.encoding,
        parsed.delimiter
    ));

    let csv_info = CsvInfo {
        encoding: parsed.encoding,
        delimiter: parsed.delimiter.to_string(),
        row_count: parsed.table.row_count(),
        columns: parsed.table.columns.clone(),
    };

    let series = run_chart(&parsed.table, request)?;
    Ok(DatasetReport { series, csv_info })
}
