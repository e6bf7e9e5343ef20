//! CSV to [`WideTable`] parser with encoding and delimiter auto-detection.
//!
//! Published-spreadsheet exports arrive with unpredictable encodings and
//! separators, so both are detected before the `csv` reader runs. Cells are
//! typed on the way in: empty and not-available markers become null,
//! parseable numbers become measures, everything else stays text.

use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::{CellValue, WideTable};

/// Result of parsing with metadata.
#[derive(Debug, Clone)]
pub struct ParsedTable {
    /// The typed table.
    pub table: WideTable,
    /// Detected or used encoding.
    pub encoding: String,
    /// Detected or used delimiter.
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => Ok(String::from_utf8_lossy(bytes).to_string()),
        // windows-1252 is the superset decoder for latin-1 text; latin-9
        // would remap eight code points (0xA4 is "¤" in latin-1, not "€").
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.to_string())
        }
        other if other.is_empty() => Err(CsvError::EncodingError(
            "could not detect an encoding".to_string(),
        )),
        // Fallback: UTF-8 with lossy conversion
        _ => Ok(String::from_utf8_lossy(bytes).to_string()),
    }
}

/// Detect the delimiter by counting occurrences in the first line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Type a raw cell string.
///
/// Empty strings and the usual not-available markers become `Null`; values
/// that parse as f64 become `Number`; the rest stays `Text`.
pub fn parse_cell(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CellValue::Null;
    }
    match trimmed {
        "NA" | "N/A" | "n/a" | "null" | "NULL" | "-" | ".." => return CellValue::Null,
        _ => {}
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => CellValue::Number(n),
        _ => CellValue::Text(trimmed.to_string()),
    }
}

/// Parse CSV text with an explicit delimiter into a typed table.
pub fn parse_str(content: &str, delimiter: char) -> CsvResult<WideTable> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| CsvError::ParseError {
            line: 1,
            message: e.to_string(),
        })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| CsvError::ParseError {
            line: i + 2,
            message: e.to_string(),
        })?;

        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        // Short rows pad with nulls, long rows drop the extras, so the
        // grid always matches the header width.
        let mut cells = Vec::with_capacity(columns.len());
        for col_idx in 0..columns.len() {
            cells.push(record.get(col_idx).map(parse_cell).unwrap_or(CellValue::Null));
        }
        rows.push(cells);
    }

    WideTable::new(columns, rows).map_err(|e| CsvError::ParseError {
        line: 0,
        message: e.to_string(),
    })
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParsedTable> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    let table = parse_str(&content, delimiter)?;

    Ok(ParsedTable {
        table,
        encoding,
        delimiter,
    })
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
pub fn parse_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<ParsedTable> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let csv = "Country,2021,2022\nFrance,30.1,51.9\nGermany,74.4,83.8";
        let table = parse_str(csv, ',').unwrap();

        assert_eq!(table.columns, vec!["Country", "2021", "2022"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0][0], CellValue::Text("France".into()));
        assert_eq!(table.rows[1][2], CellValue::Number(83.8));
    }

    #[test]
    fn test_missing_cells_become_null() {
        let csv = "Country,2021,2022\nFrance,,51.9";
        let table = parse_str(csv, ',').unwrap();
        assert!(table.rows[0][1].is_null());
    }

    #[test]
    fn test_na_markers_become_null() {
        for marker in ["NA", "N/A", "null", "-", ".."] {
            assert!(parse_cell(marker).is_null(), "marker {:?}", marker);
        }
    }

    #[test]
    fn test_short_rows_padded() {
        let csv = "Country,2021,2022\nFrance,30.1";
        let table = parse_str(csv, ',').unwrap();
        assert_eq!(table.rows[0].len(), 3);
        assert!(table.rows[0][2].is_null());
    }

    #[test]
    fn test_empty_lines_skipped() {
        let csv = "a,b\n1,2\n\n3,4\n";
        let table = parse_str(csv, ',').unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(parse_str("", ','), Err(CsvError::EmptyFile)));
        assert!(matches!(parse_bytes_auto(b""), Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter_comma() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
    }

    #[test]
    fn test_detect_delimiter_tab() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
    }

    #[test]
    fn test_auto_parse() {
        let csv = "Type_of_Issuer,2021,2022\nSovereign,95.3,106.9";
        let parsed = parse_bytes_auto(csv.as_bytes()).unwrap();

        assert_eq!(parsed.delimiter, ',');
        assert_eq!(parsed.encoding, "utf-8");
        assert_eq!(parsed.table.row_count(), 1);
        assert_eq!(parsed.table.rows[0][1], CellValue::Number(95.3));
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_latin1_currency_sign_is_not_remapped() {
        // 0xA4 is "¤" in latin-1; a latin-9 decode would turn it into "€".
        let decoded = decode_content(&[0xA4], "iso-8859-1").unwrap();
        assert_eq!(decoded, "¤");
    }

    #[test]
    fn test_quoted_values() {
        let csv = "Category,Value\n\"Climate Change Mitigation & Adaptation\",177.4";
        let table = parse_str(csv, ',').unwrap();
        assert_eq!(
            table.rows[0][0],
            CellValue::Text("Climate Change Mitigation & Adaptation".into())
        );
    }
}
