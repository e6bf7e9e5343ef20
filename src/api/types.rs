//! REST API types for the rendering frontend.
//!
//! The series endpoint returns chart-ready output directly: long records,
//! aggregated points and derived metrics in the exact shape the charts
//! consume, so the frontend never re-derives anything.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ServerError;
use crate::models::{Period, ProceedsCategory, RegionFilter};
use crate::source::DatasetId;
use crate::transform::{ChartRequest, DatasetReport, GroupKey};

/// Response for `GET /api/series`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesResponse {
    /// Unique request identifier.
    pub request_id: String,

    /// "ready" when records came back, "empty" when the filter selection
    /// matched nothing (the frontend shows a neutral placeholder).
    pub status: String,

    /// The chart series plus CSV metadata.
    #[serde(flatten)]
    pub report: DatasetReport,
}

impl From<DatasetReport> for SeriesResponse {
    fn from(report: DatasetReport) -> Self {
        let status = if report.series.records.is_empty() {
            "empty"
        } else {
            "ready"
        };
        SeriesResponse {
            request_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            report,
        }
    }
}

/// One entry of `GET /api/datasets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetInfo {
    pub slug: String,
    pub location: String,
    pub id_columns: Vec<String>,
    /// Fixed measure columns, or `None` when year columns are auto-detected.
    pub value_columns: Option<Vec<String>>,
}

/// Query parameters for `GET /api/series`.
///
/// All selectors arrive as opaque strings and are validated here; an
/// unknown dataset, year, region or category is a 400, never a silent
/// empty chart.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesQuery {
    pub dataset: String,
    pub year: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub category: Option<String>,
    /// "period", "entity", or a pass-through column name.
    pub group_by: Option<String>,
    #[serde(default)]
    pub chronological: bool,
    #[serde(default)]
    pub ranked: bool,
    #[serde(default)]
    pub drop_zero: bool,
    #[serde(default)]
    pub change: bool,
    #[serde(default)]
    pub share: bool,
}

impl TryFrom<SeriesQuery> for ChartRequest {
    type Error = ServerError;

    fn try_from(query: SeriesQuery) -> Result<Self, Self::Error> {
        let dataset = DatasetId::from_slug(&query.dataset)
            .map_err(|e| ServerError::BadRequest(e.to_string()))?;

        let mut request = ChartRequest::new(dataset);

        if let Some(year) = query.year {
            let period =
                Period::new(year).map_err(|e| ServerError::BadRequest(e.to_string()))?;
            request = request.period(period);
        }

        if let Some(ref region) = query.region {
            let filter = RegionFilter::from_label(region)
                .ok_or_else(|| ServerError::BadRequest(format!("Unknown region: {}", region)))?;
            request = request.region(filter);
        }

        if let Some(country) = query.country {
            request = request.entity(country);
        }

        if let Some(ref category) = query.category {
            let category = ProceedsCategory::from_label(category).ok_or_else(|| {
                ServerError::BadRequest(format!("Unknown category: {}", category))
            })?;
            request = request.category(category);
        }

        if let Some(ref key) = query.group_by {
            let key = match key.as_str() {
                "period" => GroupKey::Period,
                "entity" => GroupKey::Entity,
                attr => GroupKey::Attr(attr.to_string()),
            };
            request = request.group_by(key);
        }

        request.chronological = query.chronological;
        request.ranked = query.ranked;
        request.drop_zero = query.drop_zero;
        request.change = query.change;
        request.share = query.share;

        Ok(request)
    }
}

/// Create an error response body.
pub fn error_response(error: &str) -> Value {
    json!({
        "requestId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Region;

    #[test]
    fn test_query_to_request() {
        let query = SeriesQuery {
            dataset: "bonds-by-country".to_string(),
            year: Some("2022".to_string()),
            region: Some("Europe".to_string()),
            group_by: Some("entity".to_string()),
            drop_zero: true,
            ranked: true,
            ..Default::default()
        };

        let request = ChartRequest::try_from(query).unwrap();
        assert_eq!(request.dataset, DatasetId::BondsByCountry);
        assert_eq!(request.period.as_ref().unwrap().as_str(), "2022");
        assert_eq!(request.region, Some(RegionFilter::Only(Region::Europe)));
        assert_eq!(request.group_by, Some(GroupKey::Entity));
        assert!(request.drop_zero);
        assert!(request.ranked);
        assert!(!request.change);
    }

    #[test]
    fn test_query_rejects_unknown_dataset() {
        let query = SeriesQuery {
            dataset: "bitcoin".to_string(),
            ..Default::default()
        };
        let err = ChartRequest::try_from(query).unwrap_err();
        assert!(err.to_string().contains("bitcoin"));
    }

    #[test]
    fn test_query_rejects_bad_year_and_region() {
        let bad_year = SeriesQuery {
            dataset: "gdp".to_string(),
            year: Some("22".to_string()),
            ..Default::default()
        };
        assert!(ChartRequest::try_from(bad_year).is_err());

        let bad_region = SeriesQuery {
            dataset: "bonds-by-country".to_string(),
            region: Some("Atlantis".to_string()),
            ..Default::default()
        };
        assert!(ChartRequest::try_from(bad_region).is_err());
    }

    #[test]
    fn test_group_by_attr_passthrough() {
        let query = SeriesQuery {
            dataset: "expenditure".to_string(),
            group_by: Some("Indicator".to_string()),
            ..Default::default()
        };
        let request = ChartRequest::try_from(query).unwrap();
        assert_eq!(request.group_by, Some(GroupKey::Attr("Indicator".into())));
    }

    #[test]
    fn test_error_response_shape() {
        let body = error_response("boom");
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "boom");
        assert!(body["requestId"].is_string());
    }
}
