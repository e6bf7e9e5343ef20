//! # Greendash - green-finance statistics pipeline
//!
//! Greendash is the data core of a dashboard presenting green-bond
//! issuance, environmental-protection expenditure and GDP statistics. It
//! loads published-spreadsheet CSV exports, reshapes them from wide to
//! long form, and aggregates and derives the series every chart needs.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV export │────▶│   Parser    │────▶│  Transform  │────▶│ JSON series │
//! │ (remote/file│     │  (auto-enc) │     │ (reshape +  │     │ (chart-     │
//! │  per render)│     │             │     │  aggregate) │     │  ready)     │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! Every user interaction is one full, independent pipeline run over a
//! freshly fetched table: no shared state, no cache, no background work.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use greendash::source::{DatasetId, RemoteSource, Source};
//! use greendash::transform::{ChartRequest, GroupKey, run_on_source};
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = Source::Remote(RemoteSource::from_env());
//!     let request = ChartRequest::new(DatasetId::IssuerByYear)
//!         .group_by(GroupKey::Period)
//!         .with_change();
//!     let report = run_on_source(&source, &request).await.unwrap();
//!     println!("{} records", report.series.records.len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (WideTable, LongRecord, Period, Region)
//! - [`parser`] - CSV parsing with auto-detection
//! - [`source`] - Dataset identities and fetching
//! - [`validation`] - Table and reshape-request checks
//! - [`transform`] - Reshape, aggregation, derived metrics, pipeline
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Dataset sources
pub mod source;

// Validation
pub mod validation;

// Transformation
pub mod transform;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CsvError, PipelineError, SchemaError, ServerError, SourceError, TransformError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    AggregatedPoint, CellValue, ChangePoint, LongRecord, Period, ProceedsCategory, Region,
    RegionFilter, SeriesSummary, SharePoint, WideTable,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_cell,
    parse_file_auto, parse_str, ParsedTable,
};

// =============================================================================
// Re-exports - Sources
// =============================================================================

pub use source::{DatasetId, FileSource, RemoteSource, Source};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{
    check_reshape_columns, detect_period_columns, is_valid_table, is_year_label, validate_table,
};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    aggregate_sum, distinct_entities, drop_missing_attr, filter_by_attr, filter_by_entity,
    filter_by_period, filter_non_zero_non_null, headline, percent_change, percent_share,
    percent_share_of_points, reshape, run_chart, run_on_source, series_summary,
    sort_points_by_total_desc, sort_points_by_year, ChartRequest, ChartSeries, CsvInfo,
    DatasetReport, GroupKey, Headline,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, DatasetInfo, SeriesQuery, SeriesResponse};

// Server
pub mod server {
    pub use crate::api::server::{start_server, AppState};
}
