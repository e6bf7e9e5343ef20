//! Dataset source collaborator: where the wide tables come from.
//!
//! The pipeline never reaches for ambient state; every run is handed a
//! table that some [`Source`] fetched for it. A source is one of:
//!
//! - [`RemoteSource`] - published-spreadsheet CSV exports over HTTP
//! - [`FileSource`] - local CSV files, one per dataset slug
//!
//! Fetching is one read-to-completion GET per render cycle: no retry, no
//! cache. A failed fetch is fatal for that cycle only.

use std::path::PathBuf;

use crate::error::{SourceError, SourceResult};
use crate::parser::{parse_bytes_auto, parse_file_auto, ParsedTable};

/// Environment variable overriding the dataset host, for tests and mirrors.
pub const BASE_URL_ENV: &str = "GREENDASH_BASE_URL";

// =============================================================================
// Dataset Identity
// =============================================================================

/// The five logical datasets behind the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetId {
    /// Green-bond issuance by issuer type, one column per year.
    IssuerByYear,
    /// Green-bond issuance by country and region, one column per year.
    BondsByCountry,
    /// Cumulative 2022 issuance by use of proceeds (already long: one
    /// `Value` measure column).
    UseOfProceeds,
    /// Environmental-protection expenditure by country and indicator, in
    /// percent of GDP, one column per year.
    ExpenditureByCountry,
    /// Annual gross domestic product by country, one column per year.
    GdpByCountry,
}

impl DatasetId {
    /// Every dataset, in dashboard order.
    pub const ALL: [DatasetId; 5] = [
        DatasetId::IssuerByYear,
        DatasetId::BondsByCountry,
        DatasetId::UseOfProceeds,
        DatasetId::ExpenditureByCountry,
        DatasetId::GdpByCountry,
    ];

    /// Stable selector used in URLs, file names and the API.
    pub fn slug(&self) -> &'static str {
        match self {
            DatasetId::IssuerByYear => "issuer-by-year",
            DatasetId::BondsByCountry => "bonds-by-country",
            DatasetId::UseOfProceeds => "use-of-proceeds",
            DatasetId::ExpenditureByCountry => "expenditure",
            DatasetId::GdpByCountry => "gdp",
        }
    }

    /// Parse a selector; the inverse of [`DatasetId::slug`].
    pub fn from_slug(slug: &str) -> SourceResult<Self> {
        DatasetId::ALL
            .into_iter()
            .find(|d| d.slug() == slug.trim())
            .ok_or_else(|| SourceError::UnknownDataset(slug.to_string()))
    }

    /// Published CSV export URL for the dataset.
    pub fn default_url(&self) -> &'static str {
        match self {
            DatasetId::IssuerByYear => "https://docs.google.com/spreadsheets/d/e/2PACX-1vQ3FXcBVHwZ7e4ynMx8ptDEmR2UoiAcjxiJIf4lj-NJk1GdAXzvMt6vENKNW9hRnUZ34cKtcyoedA2C/pub?gid=193532952&single=true&output=csv",
            DatasetId::BondsByCountry => "https://docs.google.com/spreadsheets/d/e/2PACX-1vS9E4_uHhawLaAkcSPxbilVAbxYjmZ8W0-5hP5lmuaMimayMH9QMej2CQbTL46tv0Cy1mneKkS00Cw_/pub?gid=2046901806&single=true&output=csv",
            DatasetId::UseOfProceeds => "https://docs.google.com/spreadsheets/d/e/2PACX-1vSLqvhg_bECvhbg9yLA7NoGX9VLOZNTMQcguN4jUtN3NHiCyI3weK2MQVLewEE-ghKeBJNDb8mvuI99/pub?gid=187166788&single=true&output=csv",
            DatasetId::ExpenditureByCountry => "https://docs.google.com/spreadsheets/d/e/2PACX-1vTdVY5KdcjHeaYhhpeVVeNnhqI7YVd-UlIs88oWtulNJsnzdtFdpZQuN32zW_4fxtLRbTUpS7qaf5JZ/pub?gid=402589920&single=true&output=csv",
            DatasetId::GdpByCountry => "https://docs.google.com/spreadsheets/d/e/2PACX-1vRc9gb_MCustazRQfq8Ue5AB-Ko8BKCpXJFCBVZXJUrziR--zeLgCuGR9ifvkwYCe8g1H4lfp3kA01c/pub?gid=731874032&single=true&output=csv",
        }
    }

    /// Identifier columns to keep through a reshape of this dataset.
    ///
    /// Non-measure metadata columns (`ObjectId`, ISO codes, CTS descriptors
    /// in the expenditure export) are dropped by not being selected.
    pub fn default_id_columns(&self) -> &'static [&'static str] {
        match self {
            DatasetId::IssuerByYear => &["Type_of_Issuer"],
            DatasetId::BondsByCountry => &["Country", "Region"],
            DatasetId::UseOfProceeds => &["Use_of_Proceed", "Category", "Amount"],
            DatasetId::ExpenditureByCountry => &["Country", "Indicator", "Unit"],
            DatasetId::GdpByCountry => &["Country"],
        }
    }

    /// Measure columns for datasets that are not wide-by-year.
    /// `None` means year columns are auto-detected from the headers.
    pub fn fixed_value_columns(&self) -> Option<&'static [&'static str]> {
        match self {
            DatasetId::UseOfProceeds => Some(&["Value"]),
            _ => None,
        }
    }
}

// =============================================================================
// Sources
// =============================================================================

/// Fetches published CSV exports over HTTP.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    client: reqwest::Client,
    /// Overrides the dataset host: `{base_url}/{slug}.csv`.
    base_url: Option<String>,
}

impl RemoteSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: None,
        }
    }

    /// Honors `GREENDASH_BASE_URL` when set.
    pub fn from_env() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: std::env::var(BASE_URL_ENV).ok(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// The URL this source would fetch for a dataset.
    pub fn url(&self, id: DatasetId) -> String {
        match &self.base_url {
            Some(base) => format!("{}/{}.csv", base.trim_end_matches('/'), id.slug()),
            None => id.default_url().to_string(),
        }
    }

    pub async fn fetch(&self, id: DatasetId) -> SourceResult<ParsedTable> {
        let url = self.url(id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        Ok(parse_bytes_auto(&bytes)?)
    }
}

impl Default for RemoteSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads datasets from local CSV files named `{slug}.csv`.
#[derive(Debug, Clone)]
pub struct FileSource {
    dir: PathBuf,
}

impl FileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The path this source would read for a dataset.
    pub fn path(&self, id: DatasetId) -> PathBuf {
        self.dir.join(format!("{}.csv", id.slug()))
    }

    pub fn fetch(&self, id: DatasetId) -> SourceResult<ParsedTable> {
        let path = self.path(id);
        parse_file_auto(&path).map_err(|e| match e {
            // A missing or unreadable file is an I/O problem, not a CSV one.
            crate::error::CsvError::IoError(io) => SourceError::IoError(io),
            other => SourceError::Csv(other),
        })
    }
}

/// The injected data-source collaborator.
#[derive(Debug, Clone)]
pub enum Source {
    Remote(RemoteSource),
    File(FileSource),
}

impl Source {
    /// Fetch and parse one dataset. One attempt, no cache.
    pub async fn fetch(&self, id: DatasetId) -> SourceResult<ParsedTable> {
        match self {
            Source::Remote(remote) => remote.fetch(id).await,
            Source::File(file) => file.fetch(id),
        }
    }

    /// Where this source reads a dataset from, for display.
    pub fn location(&self, id: DatasetId) -> String {
        match self {
            Source::Remote(remote) => remote.url(id),
            Source::File(file) => file.path(id).display().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_slug_round_trip() {
        for id in DatasetId::ALL {
            assert_eq!(DatasetId::from_slug(id.slug()).unwrap(), id);
        }
        assert!(matches!(
            DatasetId::from_slug("nope"),
            Err(SourceError::UnknownDataset(_))
        ));
    }

    #[test]
    fn test_remote_url_override() {
        let source = RemoteSource::new().with_base_url("http://localhost:9000/data/");
        assert_eq!(
            source.url(DatasetId::GdpByCountry),
            "http://localhost:9000/data/gdp.csv"
        );

        let default = RemoteSource::new();
        assert!(default
            .url(DatasetId::IssuerByYear)
            .starts_with("https://docs.google.com/"));
    }

    #[test]
    fn test_file_source_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gdp.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Country,2021,2022").unwrap();
        writeln!(file, "France,2957.0,2779.0").unwrap();

        let source = FileSource::new(dir.path());
        let parsed = source.fetch(DatasetId::GdpByCountry).unwrap();
        assert_eq!(parsed.table.row_count(), 1);
        assert_eq!(parsed.table.columns[0], "Country");
    }

    #[test]
    fn test_file_source_empty_file_is_csv_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::File::create(dir.path().join("gdp.csv")).unwrap();

        let source = FileSource::new(dir.path());
        let err = source.fetch(DatasetId::GdpByCountry).unwrap_err();
        assert!(matches!(
            err,
            SourceError::Csv(crate::error::CsvError::EmptyFile)
        ));
        assert!(!err.to_string().contains("HTTP"));
    }

    #[test]
    fn test_file_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path());
        assert!(matches!(
            source.fetch(DatasetId::GdpByCountry),
            Err(SourceError::IoError(_))
        ));
    }

    #[test]
    fn test_fixed_value_columns() {
        assert_eq!(
            DatasetId::UseOfProceeds.fixed_value_columns(),
            Some(&["Value"][..])
        );
        assert_eq!(DatasetId::BondsByCountry.fixed_value_columns(), None);
    }
}
