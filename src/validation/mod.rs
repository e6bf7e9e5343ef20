//! Structural validation for wide tables and reshape requests.
//!
//! Two kinds of checks live here:
//!
//! - **Table checks** ([`validate_table`] / [`is_valid_table`]): the
//!   data-source contract: a stable header row, unique non-empty headers,
//!   a rectangular grid. Violations are fatal for the render cycle.
//! - **Request checks** ([`check_reshape_columns`]): the reshape contract:
//!   id and period columns must exist, be disjoint, and be non-empty.
//!
//! [`detect_period_columns`] finds year-shaped headers ("2012", "2022") so
//! callers can unpivot a table without spelling out every year column.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{SchemaError, SchemaResult};
use crate::models::WideTable;

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").expect("valid year regex"));

/// Whether a header looks like a 4-digit year.
pub fn is_year_label(label: &str) -> bool {
    YEAR_RE.is_match(label.trim())
}

/// Headers that look like years, in source column order.
///
/// Source order matters: the aggregated series must keep period columns in
/// insertion order, and 4-digit years also happen to sort the same way
/// numerically and lexicographically. Nothing downstream may rely on that
/// coincidence; explicit ordering goes through
/// [`crate::transform::sort_points_by_year`].
pub fn detect_period_columns(table: &WideTable) -> Vec<String> {
    table
        .columns
        .iter()
        .filter(|c| is_year_label(c))
        .cloned()
        .collect()
}

/// Validate a table against the data-source contract.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with every violation found
pub fn validate_table(table: &WideTable) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if table.columns.is_empty() {
        errors.push("table has no columns".to_string());
    }

    for (i, col) in table.columns.iter().enumerate() {
        if col.trim().is_empty() {
            errors.push(format!("column {} has an empty header", i + 1));
        }
    }

    for (i, col) in table.columns.iter().enumerate() {
        if table.columns[..i].contains(col) {
            errors.push(format!("duplicate column header '{}'", col));
        }
    }

    for (i, row) in table.rows.iter().enumerate() {
        if row.len() != table.columns.len() {
            errors.push(format!(
                "row {} has {} cells, expected {}",
                i + 1,
                row.len(),
                table.columns.len()
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Whether a table satisfies the data-source contract.
pub fn is_valid_table(table: &WideTable) -> bool {
    validate_table(table).is_ok()
}

/// Check a reshape request against a table's columns.
///
/// Fails on the first violation: empty id/period sets, a named column that
/// is absent, or a column named on both sides.
pub fn check_reshape_columns(
    table: &WideTable,
    id_columns: &[String],
    period_columns: &[String],
) -> SchemaResult<()> {
    if id_columns.is_empty() {
        return Err(SchemaError::NoIdColumns);
    }
    if period_columns.is_empty() {
        return Err(SchemaError::NoPeriodColumns);
    }

    for col in id_columns.iter().chain(period_columns) {
        if !table.has_column(col) {
            return Err(SchemaError::MissingColumn(col.clone()));
        }
    }

    for col in id_columns {
        if period_columns.contains(col) {
            return Err(SchemaError::OverlappingColumn(col.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;

    fn bond_table() -> WideTable {
        WideTable::new(
            vec![
                "Country".into(),
                "Region".into(),
                "2021".into(),
                "2022".into(),
            ],
            vec![vec![
                CellValue::Text("France".into()),
                CellValue::Text("Europe".into()),
                CellValue::Number(30.1),
                CellValue::Number(51.9),
            ]],
        )
        .unwrap()
    }

    #[test]
    fn test_year_label_detection() {
        assert!(is_year_label("2022"));
        assert!(is_year_label(" 2012 "));
        assert!(!is_year_label("Country"));
        assert!(!is_year_label("202"));
        assert!(!is_year_label("20221"));
    }

    #[test]
    fn test_detect_period_columns_keeps_source_order() {
        let table = bond_table();
        assert_eq!(detect_period_columns(&table), vec!["2021", "2022"]);
    }

    #[test]
    fn test_valid_table_passes() {
        assert!(is_valid_table(&bond_table()));
    }

    #[test]
    fn test_duplicate_headers_rejected() {
        let table = WideTable {
            columns: vec!["Country".into(), "Country".into()],
            rows: vec![],
        };
        let errors = validate_table(&table).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("duplicate")));
    }

    #[test]
    fn test_empty_header_rejected() {
        let table = WideTable {
            columns: vec!["Country".into(), "  ".into()],
            rows: vec![],
        };
        let errors = validate_table(&table).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("empty header")));
    }

    #[test]
    fn test_check_columns_missing() {
        let table = bond_table();
        let err = check_reshape_columns(&table, &["Issuer".to_string()], &["2022".to_string()])
            .unwrap_err();
        assert!(matches!(err, SchemaError::MissingColumn(c) if c == "Issuer"));
    }

    #[test]
    fn test_check_columns_overlap() {
        let table = bond_table();
        let err = check_reshape_columns(
            &table,
            &["Country".to_string(), "2022".to_string()],
            &["2022".to_string()],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::OverlappingColumn(c) if c == "2022"));
    }

    #[test]
    fn test_check_columns_empty_sets() {
        let table = bond_table();
        assert!(matches!(
            check_reshape_columns(&table, &[], &["2022".to_string()]),
            Err(SchemaError::NoIdColumns)
        ));
        assert!(matches!(
            check_reshape_columns(&table, &["Country".to_string()], &[]),
            Err(SchemaError::NoPeriodColumns)
        ));
    }
}
