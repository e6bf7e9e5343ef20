//! Error types for the Greendash data pipeline.
//!
//! This module defines a hierarchy of error types, one per layer:
//!
//! - [`CsvError`] - CSV parsing errors
//! - [`SchemaError`] - malformed or mismatched table shape
//! - [`TransformError`] - reshape/aggregate/derive errors
//! - [`SourceError`] - dataset fetching errors
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP surface errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries. Every error is local to a
//! single render cycle: the pipeline holds no state, so a failed run can
//! never leak into the next interaction.

use thiserror::Error;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors during CSV parsing.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode bytes in the detected encoding.
    #[error("Failed to decode content: {0}")]
    EncodingError(String),

    /// Invalid CSV format.
    #[error("Invalid CSV at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

// =============================================================================
// Schema Errors
// =============================================================================

/// Malformed or mismatched table shape.
///
/// Fatal for the render cycle that hit it: the caller must surface the
/// message instead of silently producing an empty chart.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A requested column is absent from the table.
    #[error("Column '{0}' not found in table")]
    MissingColumn(String),

    /// A column was named both as identifier and as period.
    #[error("Column '{0}' is both an id column and a period column")]
    OverlappingColumn(String),

    /// Reshape needs at least one identifier column.
    #[error("No id columns given")]
    NoIdColumns,

    /// Reshape needs at least one period column.
    #[error("No period columns given")]
    NoPeriodColumns,

    /// A table must have a header row.
    #[error("Table has no columns")]
    NoColumns,

    /// A row does not match the header width.
    #[error("Row {row} has {found} cells, expected {expected} columns")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A year selector was not a 4-digit year.
    #[error("Invalid period '{0}': expected a 4-digit year")]
    InvalidPeriod(String),

    /// The table broke the data-source contract (duplicate headers,
    /// ragged rows, ...); carries the first violation found.
    #[error("Malformed table: {0}")]
    Malformed(String),
}

// =============================================================================
// Transform Errors
// =============================================================================

/// Errors during reshape/aggregate/derive.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Table shape did not match the request.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A percentage share was requested over a partition that is empty or
    /// sums to zero. Recoverable: callers omit the chart or metric.
    #[error("Partition '{0}' is empty or sums to zero")]
    EmptyPartition(String),
}

// =============================================================================
// Source Errors
// =============================================================================

/// Errors while fetching a dataset.
///
/// Fetching is one blocking read-to-completion per render cycle; a failure
/// here is fatal for that cycle and is never retried automatically.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Non-success HTTP status.
    #[error("Dataset fetch returned status {0}")]
    Status(u16),

    /// Local file read failed.
    #[error("Failed to read dataset file: {0}")]
    IoError(#[from] std::io::Error),

    /// The fetched bytes did not parse as CSV.
    #[error("Fetched dataset is not valid CSV: {0}")]
    Csv(#[from] CsvError),

    /// Unknown dataset selector.
    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by
/// [`crate::transform::pipeline::run_chart`]. It wraps all lower-level
/// errors and adds pipeline-specific variants.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Table shape error.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Transform error.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Dataset fetch error.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// The table had rows but no usable period columns.
    #[error("No period columns detected in table")]
    NoPeriods,

    /// The table had no data rows at all.
    #[error("Table has no rows")]
    EmptyInput,
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for schema checks.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for transform operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for dataset fetching.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
