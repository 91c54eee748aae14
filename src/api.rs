//! JSON API over the shared navigator state

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::warn;

use crate::NavigatorError;
use crate::filter::DaySelection;
use crate::models::{ExtremaSnapshot, WeatherRecord};
use crate::navigator::{ConditionsNavigator, Extent, FilterToggle, Marker};

pub type SharedNavigator = Arc<RwLock<ConditionsNavigator>>;

#[derive(Serialize)]
pub struct MountainDetail {
    #[serde(flatten)]
    pub marker: Marker,
    pub record: Option<WeatherRecord>,
    pub extrema: ExtremaSnapshot,
}

#[derive(Deserialize)]
pub struct FilterRequest {
    pub days: Vec<usize>,
}

#[derive(Deserialize)]
pub struct SelectionRequest {
    pub name: Option<String>,
}

fn status_for(error: &NavigatorError) -> StatusCode {
    match error {
        NavigatorError::Validation { .. } => StatusCode::BAD_REQUEST,
        NavigatorError::NotFound { .. } => StatusCode::NOT_FOUND,
        NavigatorError::InsufficientForecastData { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn router(navigator: SharedNavigator) -> Router {
    Router::new()
        .route("/mountains", get(get_mountains))
        .route("/mountains/{name}", get(get_mountain))
        .route(
            "/filters",
            get(get_filters).put(apply_filter).delete(clear_filter),
        )
        .route("/viewport", get(get_viewport))
        .route("/selection", put(select_mountain))
        .with_state(navigator)
}

async fn get_mountains(State(navigator): State<SharedNavigator>) -> Json<Vec<Marker>> {
    Json(navigator.read().await.markers())
}

async fn get_mountain(
    State(navigator): State<SharedNavigator>,
    Path(name): Path<String>,
) -> Result<Json<MountainDetail>, StatusCode> {
    let navigator = navigator.read().await;
    let entry = navigator.entry(&name).ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(MountainDetail {
        marker: Marker::from(entry),
        record: entry.record.clone(),
        extrema: navigator.extrema().snapshot(),
    }))
}

async fn get_filters(State(navigator): State<SharedNavigator>) -> Json<Vec<FilterToggle>> {
    Json(navigator.read().await.toggles().to_vec())
}

async fn apply_filter(
    State(navigator): State<SharedNavigator>,
    Json(payload): Json<FilterRequest>,
) -> Result<Json<Vec<Marker>>, StatusCode> {
    let selection = DaySelection::new(payload.days).map_err(|e| status_for(&e))?;

    let mut navigator = navigator.write().await;
    navigator.apply_filter(&selection).map_err(|e| {
        warn!("Filter could not be applied: {}", e);
        status_for(&e)
    })?;

    Ok(Json(navigator.markers()))
}

async fn clear_filter(State(navigator): State<SharedNavigator>) -> Json<Vec<Marker>> {
    let mut navigator = navigator.write().await;
    navigator.clear_current_filter();
    Json(navigator.markers())
}

async fn get_viewport(
    State(navigator): State<SharedNavigator>,
) -> Result<Json<Extent>, StatusCode> {
    navigator
        .read()
        .await
        .initial_viewport()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn select_mountain(
    State(navigator): State<SharedNavigator>,
    Json(payload): Json<SelectionRequest>,
) -> Json<Option<Marker>> {
    let mut navigator = navigator.write().await;
    Json(navigator.select_mountain(payload.name.as_deref()).map(Marker::from))
}
