//! HTTP server for the rendering frontend.
//!
//! # API Endpoints
//!
//! | Method | Path            | Description                              |
//! |--------|-----------------|------------------------------------------|
//! | GET    | `/health`       | Health check                             |
//! | GET    | `/api/datasets` | List the known datasets                  |
//! | GET    | `/api/series`   | Run the pipeline for one chart           |
//! | GET    | `/api/logs`     | SSE stream for real-time pipeline logs   |
//!
//! Each `/api/series` call is one full render cycle: fetch the dataset,
//! reshape, filter, aggregate, derive, respond. Nothing is kept between
//! calls.

use axum::{
    extract::{Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, LOG_BROADCASTER};
use super::types::{error_response, DatasetInfo, SeriesQuery, SeriesResponse};
use crate::error::{PipelineError, SourceError};
use crate::source::{DatasetId, Source};
use crate::transform::{run_on_source, ChartRequest};

/// Shared server state: the injected dataset source.
#[derive(Clone)]
pub struct AppState {
    pub source: Source,
}

/// Start the HTTP server with a dataset source.
pub async fn start_server(port: u16, source: Source) -> Result<(), Box<dyn std::error::Error>> {
    // Permissive CORS: the frontend runs on its own origin in development.
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/datasets", get(list_datasets))
        .route("/api/series", get(get_series))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(AppState { source });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("Greendash server running on http://localhost:{}", port);
    println!("   GET /api/datasets - List datasets");
    println!("   GET /api/series   - Run the chart pipeline");
    println!("   GET /api/logs     - SSE log stream");
    println!("   GET /health       - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "greendash",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "datasets": "GET /api/datasets",
            "series": "GET /api/series",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// List the known datasets and how this server would fetch them.
async fn list_datasets(State(state): State<AppState>) -> Json<Vec<DatasetInfo>> {
    let datasets = DatasetId::ALL
        .into_iter()
        .map(|id| DatasetInfo {
            slug: id.slug().to_string(),
            location: state.source.location(id),
            id_columns: id
                .default_id_columns()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            value_columns: id
                .fixed_value_columns()
                .map(|cols| cols.iter().map(|s| s.to_string()).collect()),
        })
        .collect();
    Json(datasets)
}

/// Run the pipeline for one chart request.
async fn get_series(
    State(state): State<AppState>,
    Query(query): Query<SeriesQuery>,
) -> Result<Json<SeriesResponse>, (StatusCode, Json<Value>)> {
    let request = ChartRequest::try_from(query)
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(error_response(&e.to_string()))))?;

    let report = run_on_source(&state.source, &request).await.map_err(|e| {
        log_error(e.to_string());
        (status_for(&e), Json(error_response(&e.to_string())))
    })?;

    Ok(Json(SeriesResponse::from(report)))
}

/// Map a pipeline failure to an HTTP status.
fn status_for(error: &PipelineError) -> StatusCode {
    match error {
        // A fetched-but-malformed export is malformed input, not a gateway
        // failure.
        PipelineError::Source(SourceError::Csv(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        // The upstream spreadsheet, not this request, is the problem.
        PipelineError::Source(_) => StatusCode::BAD_GATEWAY,
        PipelineError::Csv(_) | PipelineError::Schema(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::EmptyInput | PipelineError::NoPeriods => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::Transform(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// SSE endpoint for real-time log streaming.
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CsvError, TransformError};

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&PipelineError::Source(SourceError::Status(404))),
            StatusCode::BAD_GATEWAY
        );
        // A dataset that fetched fine but did not parse is a 422, not a 502.
        assert_eq!(
            status_for(&PipelineError::Source(SourceError::Csv(CsvError::EmptyFile))),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&PipelineError::Csv(CsvError::EmptyFile)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&PipelineError::EmptyInput),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&PipelineError::Transform(TransformError::EmptyPartition(
                "2012".into()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
