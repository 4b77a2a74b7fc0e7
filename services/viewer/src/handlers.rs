//! HTTP handlers for the viewer API.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use layer_manager::{Checkbox, LoadState, ViewSettings};
use wmts_common::{BoundingBox, DateFilter, TileCoord, ViewerError};

use crate::state::AppState;

// ============================================================================
// Error Response
// ============================================================================

/// A `ViewerError` rendered as JSON with its HTTP status.
pub struct ApiError(pub ViewerError);

impl From<ViewerError> for ApiError {
    fn from(err: ViewerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        debug!(status = status.as_u16(), error = %self.0, "Request failed");
        (
            status,
            Json(serde_json::json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct LayersResponse {
    pub state: LoadState,
    pub checkboxes: Vec<Checkbox>,
}

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub checked: bool,
}

#[derive(Debug, Serialize)]
pub struct OrderEntry {
    pub id: String,
    pub kind: &'static str,
    pub visible: bool,
}

#[derive(Debug, Deserialize)]
pub struct DateRequest {
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct DateResponse {
    pub time: String,
}

#[derive(Debug, Serialize)]
pub struct UrlResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub bbox: String,
    pub width: u32,
    pub height: u32,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /map - View settings
pub async fn map_handler(Extension(state): Extension<Arc<AppState>>) -> Json<ViewSettings> {
    Json(state.view.clone())
}

/// GET /layers - Checkbox list and capabilities load state
pub async fn layers_handler(Extension(state): Extension<Arc<AppState>>) -> Json<LayersResponse> {
    let load = state.load_state.read().await.clone();
    let manager = state.manager.read().await;
    Json(LayersResponse {
        state: load,
        checkboxes: manager.panel().checkboxes().to_vec(),
    })
}

/// POST /layers/:id - Checkbox change
pub async fn check_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CheckRequest>,
) -> ApiResult<Vec<OrderEntry>> {
    let mut manager = state.manager.write().await;
    manager.set_checked(&id, req.checked)?;
    Ok(Json(order_entries(&manager)))
}

/// GET /order - Draw order, bottom first
pub async fn order_handler(Extension(state): Extension<Arc<AppState>>) -> Json<Vec<OrderEntry>> {
    let manager = state.manager.read().await;
    Json(order_entries(&manager))
}

/// GET /date - Active TIME value
pub async fn get_date_handler(Extension(state): Extension<Arc<AppState>>) -> Json<DateResponse> {
    let manager = state.manager.read().await;
    Json(DateResponse {
        time: manager.date().as_param().to_string(),
    })
}

/// POST /date - Date picker change
pub async fn set_date_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(req): Json<DateRequest>,
) -> ApiResult<DateResponse> {
    let filter = DateFilter::parse_picker(&req.date).map_err(ViewerError::from)?;
    let time = filter.as_param().to_string();
    state.manager.write().await.set_date(filter);
    Ok(Json(DateResponse { time }))
}

/// DELETE /date - Back to the server default time
pub async fn clear_date_handler(Extension(state): Extension<Arc<AppState>>) -> Json<DateResponse> {
    let mut manager = state.manager.write().await;
    manager.clear_date();
    Json(DateResponse {
        time: manager.date().as_param().to_string(),
    })
}

/// GET /tiles/:id/:z/:x/:y - Decorated tile fetch URL
pub async fn tile_url_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((id, z, x, y)): Path<(String, u32, u32, u32)>,
) -> ApiResult<UrlResponse> {
    let manager = state.manager.read().await;
    let url = manager.tile_url(&id, &TileCoord::new(z, x, y))?;
    Ok(Json(UrlResponse { url }))
}

/// GET /images/:id?bbox=&width=&height= - Decorated GetMap URL
pub async fn image_url_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ImageQuery>,
) -> ApiResult<UrlResponse> {
    let bbox = BoundingBox::from_wms_string(&query.bbox).map_err(|e| {
        ViewerError::InvalidParameter {
            param: "bbox".to_string(),
            message: e.to_string(),
        }
    })?;
    let manager = state.manager.read().await;
    let url = manager.image_url(&id, &bbox, query.width, query.height)?;
    Ok(Json(UrlResponse { url }))
}

/// GET /health - Liveness check
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

fn order_entries(manager: &layer_manager::LayerManager) -> Vec<OrderEntry> {
    manager
        .entries()
        .iter()
        .map(|e| OrderEntry {
            id: e.id.clone(),
            kind: e.source.kind(),
            visible: e.visible,
        })
        .collect()
}
