//! Domain models for the Greendash reshape/aggregate pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`WideTable`] - A rectangular table in wide form (one column per year)
//! - [`LongRecord`] - A single observation after reshape (entity × period)
//! - [`AggregatedPoint`] - One group's summed value after aggregation
//! - [`Period`] - Canonical, string-backed 4-digit year selector
//! - [`Region`] / [`RegionFilter`] - Continent selectors with an `All` wildcard
//! - [`ProceedsCategory`] - Use-of-proceeds categories for green bonds

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::SchemaError;

// =============================================================================
// Period
// =============================================================================

/// Canonical year selector for period filtering.
///
/// The source datasets label period columns with 4-digit years ("2012"
/// through "2022" for the green-bond tables). Year filters arrive sometimes
/// as integers (sliders) and sometimes as strings (select boxes); both
/// canonicalize through this type so period comparison is always done on
/// the same string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(String);

impl Period {
    /// Parse a period from a string, validating the 4-digit-year shape.
    pub fn new(label: impl Into<String>) -> Result<Self, SchemaError> {
        let label = label.into();
        let trimmed = label.trim();
        if trimmed.len() == 4 && trimmed.chars().all(|c| c.is_ascii_digit()) {
            Ok(Period(trimmed.to_string()))
        } else {
            Err(SchemaError::InvalidPeriod(label))
        }
    }

    /// Canonicalize an integer year (e.g. from a year slider).
    pub fn from_year(year: i32) -> Result<Self, SchemaError> {
        Self::new(year.to_string())
    }

    /// The canonical string form, as it appears in column headers.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The year as an integer, for numeric ordering.
    pub fn year(&self) -> i32 {
        // Validated to be 4 ASCII digits on construction.
        self.0.parse().unwrap_or(0)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Period {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::new(s)
    }
}

// =============================================================================
// Region
// =============================================================================

/// Continent of a bond-issuing country, as labelled in the country dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    Africa,
    Asia,
    Europe,
    NorthAmerica,
    Oceania,
    SouthAmerica,
}

impl Region {
    /// All regions, in the dataset's display order.
    pub const ALL: [Region; 6] = [
        Region::Africa,
        Region::Asia,
        Region::Europe,
        Region::NorthAmerica,
        Region::Oceania,
        Region::SouthAmerica,
    ];

    /// Parse a region from its dataset label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Africa" => Some(Region::Africa),
            "Asia" => Some(Region::Asia),
            "Europe" => Some(Region::Europe),
            "North America" => Some(Region::NorthAmerica),
            "Oceania" => Some(Region::Oceania),
            "South America" => Some(Region::SouthAmerica),
            _ => None,
        }
    }

    /// The label used in the dataset's `Region` column.
    pub fn label(&self) -> &'static str {
        match self {
            Region::Africa => "Africa",
            Region::Asia => "Asia",
            Region::Europe => "Europe",
            Region::NorthAmerica => "North America",
            Region::Oceania => "Oceania",
            Region::SouthAmerica => "South America",
        }
    }
}

/// Region selection for country charts: a single region or the `All` wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegionFilter {
    /// Keep every region (rows with a null region are still dropped).
    #[default]
    All,
    /// Keep only countries in one region.
    Only(Region),
}

impl RegionFilter {
    /// Parse a selection string; "All" (any case) is the wildcard.
    pub fn from_label(label: &str) -> Option<Self> {
        if label.trim().eq_ignore_ascii_case("all") {
            Some(RegionFilter::All)
        } else {
            Region::from_label(label).map(RegionFilter::Only)
        }
    }
}

// =============================================================================
// Use-of-Proceeds Category
// =============================================================================

/// Category of a green-bond use-of-proceeds entry (IMF classification).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProceedsCategory {
    ClimateChange,
    SustainableEnergy,
    Environmental,
    Financial,
    Infrastructure,
    Social,
}

impl ProceedsCategory {
    /// All categories, in the dataset's display order.
    pub const ALL: [ProceedsCategory; 6] = [
        ProceedsCategory::ClimateChange,
        ProceedsCategory::SustainableEnergy,
        ProceedsCategory::Environmental,
        ProceedsCategory::Financial,
        ProceedsCategory::Infrastructure,
        ProceedsCategory::Social,
    ];

    /// Parse a category from its dataset label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Climate Change Mitigation & Adaptation" => Some(Self::ClimateChange),
            "Sustainable Energy & Transportation" => Some(Self::SustainableEnergy),
            "Environmental & Conservation Projects" => Some(Self::Environmental),
            "Financial & Economic Development" => Some(Self::Financial),
            "Infrastructure Development" => Some(Self::Infrastructure),
            "Social & Community Development" => Some(Self::Social),
            _ => None,
        }
    }

    /// The label used in the dataset's `Category` column.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ClimateChange => "Climate Change Mitigation & Adaptation",
            Self::SustainableEnergy => "Sustainable Energy & Transportation",
            Self::Environmental => "Environmental & Conservation Projects",
            Self::Financial => "Financial & Economic Development",
            Self::Infrastructure => "Infrastructure Development",
            Self::Social => "Social & Community Development",
        }
    }
}

// =============================================================================
// Wide Table
// =============================================================================

/// A single cell of a wide table.
///
/// Identifier columns hold text (country, issuer type, category); measure
/// columns hold numbers or null. The parser decides per cell: empty and
/// not-available markers become `Null`, parseable numbers become `Number`,
/// everything else stays `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// The cell as a measure value; text cells are not measures.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The cell as identifier text. Whole numbers format without a decimal
    /// point so a numeric-looking identifier still round-trips.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// A rectangular dataset in wide form: one row per entity, one column per
/// period or category. Identifier values are not required to be unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideTable {
    /// Column headers, in source order.
    pub columns: Vec<String>,
    /// Row-major cell grid; every row has `columns.len()` cells.
    pub rows: Vec<Vec<CellValue>>,
}

impl WideTable {
    /// Build a table, checking that every row matches the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return Err(SchemaError::NoColumns);
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(SchemaError::RowWidth {
                    row: i,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }
        Ok(WideTable { columns, rows })
    }

    /// Index of a column by header name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Whether the table has a column with this header.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

// =============================================================================
// Long Records
// =============================================================================

/// One observation after reshape: an entity, a period label, and a measure
/// value, plus any pass-through descriptive fields (region, unit, indicator)
/// copied from the source row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongRecord {
    /// Primary identifier (first id column: country, issuer type, ...).
    pub entity: String,
    /// The unpivoted column's header, e.g. "2022".
    pub period: String,
    /// Measure value; `None` for missing cells.
    pub value: Option<f64>,
    /// Remaining id columns carried through, keyed by header name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
}

impl LongRecord {
    /// A pass-through descriptive field by column name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

// =============================================================================
// Aggregated and Derived Points
// =============================================================================

/// One group's summed value after [`crate::transform::aggregate_sum`].
/// Groups appear in first-seen order, never re-sorted implicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedPoint {
    /// The grouping value (typically a period label).
    pub key: String,
    /// Sum of values in the group; nulls contribute 0.
    pub total: f64,
}

/// Period-over-period percent change for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePoint {
    pub period: String,
    /// `None` for the first period and whenever the previous total is zero.
    pub change: Option<f64>,
}

/// Percentage share of one entity within a partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharePoint {
    pub entity: String,
    pub value: f64,
    /// `value / partition_total * 100`.
    pub share: f64,
}

/// Headline metrics for a record set, feeding the dashboard's metric tiles.
/// `max`/`min` ignore null values; `total` treats them as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSummary {
    pub total: f64,
    pub max: Option<f64>,
    pub min: Option<f64>,
    /// Number of records, nulls included.
    pub count: usize,
    /// Number of records with a non-null value.
    pub non_null: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_from_string_and_year() {
        let p = Period::new("2022").unwrap();
        assert_eq!(p.as_str(), "2022");
        assert_eq!(p.year(), 2022);
        assert_eq!(Period::from_year(2022).unwrap(), p);
    }

    #[test]
    fn test_period_trims_whitespace() {
        assert_eq!(Period::new(" 2015 ").unwrap().as_str(), "2015");
    }

    #[test]
    fn test_period_rejects_non_year() {
        assert!(Period::new("22").is_err());
        assert!(Period::new("20 22").is_err());
        assert!(Period::new("year").is_err());
        assert!(Period::new("").is_err());
    }

    #[test]
    fn test_region_labels_round_trip() {
        for region in Region::ALL {
            assert_eq!(Region::from_label(region.label()), Some(region));
        }
    }

    #[test]
    fn test_region_filter_wildcard() {
        assert_eq!(RegionFilter::from_label("All"), Some(RegionFilter::All));
        assert_eq!(RegionFilter::from_label("all"), Some(RegionFilter::All));
        assert_eq!(
            RegionFilter::from_label("Europe"),
            Some(RegionFilter::Only(Region::Europe))
        );
        assert_eq!(RegionFilter::from_label("Atlantis"), None);
    }

    #[test]
    fn test_category_labels_round_trip() {
        for cat in ProceedsCategory::ALL {
            assert_eq!(ProceedsCategory::from_label(cat.label()), Some(cat));
        }
    }

    #[test]
    fn test_cell_value_accessors() {
        assert_eq!(CellValue::Number(1.5).as_number(), Some(1.5));
        assert_eq!(CellValue::Text("France".into()).as_number(), None);
        assert_eq!(CellValue::Null.as_number(), None);
        assert_eq!(CellValue::Number(2022.0).as_text().as_deref(), Some("2022"));
        assert_eq!(CellValue::Null.as_text(), None);
    }

    #[test]
    fn test_wide_table_rejects_ragged_rows() {
        let err = WideTable::new(
            vec!["Country".into(), "2022".into()],
            vec![vec![CellValue::Text("France".into())]],
        )
        .unwrap_err();
        assert!(err.to_string().contains("2 columns"));
    }

    #[test]
    fn test_wide_table_column_lookup() {
        let table = WideTable::new(
            vec!["Country".into(), "2022".into()],
            vec![vec![
                CellValue::Text("France".into()),
                CellValue::Number(51.0),
            ]],
        )
        .unwrap();
        assert_eq!(table.column_index("2022"), Some(1));
        assert!(table.has_column("Country"));
        assert!(!table.has_column("2023"));
        assert_eq!(table.row_count(), 1);
    }
}
