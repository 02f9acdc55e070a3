//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::domain::StationSummary;
use crate::search::SearchError;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/stations", get(search_stations))
        .route("/api/search", get(search_trains))
        .route("/api/trains/:number/schedule", get(train_schedule))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Autocomplete stations by code prefix or name.
async fn search_stations(
    State(state): State<AppState>,
    Query(req): Query<StationSearchRequest>,
) -> Result<Json<Vec<StationSummary>>, AppError> {
    let stations = state.engine.autocomplete(&req.q).await?;
    Ok(Json(stations))
}

/// Search trains between two stations.
async fn search_trains(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<TrainResult>>, AppError> {
    let query = TrainSearchRequest::from_pairs(pairs).into_query()?;
    let result = state.engine.search(&query).await?;

    let trains = result
        .trains
        .iter()
        .map(|train| TrainResult::from(train.as_ref()))
        .collect();
    Ok(Json(trains))
}

/// Stops of one train.
async fn train_schedule(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<Json<Vec<ScheduleStopResult>>, AppError> {
    let stops = state.engine.schedule(&number).await?;
    Ok(Json(stops.iter().map(ScheduleStopResult::from).collect()))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Unavailable { message: String },
}

impl From<SearchError> for AppError {
    fn from(e: SearchError) -> Self {
        let message = e.to_string();
        match e {
            SearchError::InvalidQuery(_)
            | SearchError::InvalidTicketClass(_)
            | SearchError::InvalidSlot(_) => AppError::BadRequest { message },
            SearchError::StationNotFound { .. } | SearchError::TrainNotFound(_) => {
                AppError::NotFound { message }
            }
            SearchError::CatalogUnavailable(_) => AppError::Unavailable { message },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Unavailable { message } => (StatusCode::SERVICE_UNAVAILABLE, message),
        };

        warn!(status = status.as_u16(), %message, "request failed");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
