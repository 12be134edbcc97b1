//! Routes for a maintainer's current maintenance list.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{delete, get, post, put},
};
use db::models::maintenance_list::MaintenanceList;
use serde::{Deserialize, Serialize};
use services::services::identity::MAINTENANCE_ROLES;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SetStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SetNotesRequest {
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SetIntervalRequest {
    pub service_interval_days: i64,
}

/// The owner's current open list, reconciled against the catalog. Generates
/// a new list when none is open.
pub async fn get_current_list(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<MaintenanceList>>, ApiError> {
    state.identity.require(user_id, MAINTENANCE_ROLES).await?;
    let list = state.maintenance.get_or_create_current_list(user_id).await?;
    Ok(ResponseJson(ApiResponse::success(list)))
}

/// Discard the current items and draw a fresh window.
pub async fn regenerate_list(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<MaintenanceList>>, ApiError> {
    state.identity.require(user_id, MAINTENANCE_ROLES).await?;
    let current = state.maintenance.get_or_create_current_list(user_id).await?;
    let list = state.maintenance.regenerate(current.id).await?;
    Ok(ResponseJson(ApiResponse::success(list)))
}

/// Submit the completed round and receive the next list.
pub async fn submit_list(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<MaintenanceList>>, ApiError> {
    state.identity.require(user_id, MAINTENANCE_ROLES).await?;
    let current = state.maintenance.get_or_create_current_list(user_id).await?;
    let next = state.maintenance.submit(current.id).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        next,
        "maintenance list submitted",
    )))
}

pub async fn set_item_status(
    State(state): State<AppState>,
    Path((user_id, item_id)): Path<(Uuid, Uuid)>,
    axum::Json(payload): axum::Json<SetStatusRequest>,
) -> Result<ResponseJson<ApiResponse<MaintenanceList>>, ApiError> {
    state.identity.require(user_id, MAINTENANCE_ROLES).await?;
    let current = state.maintenance.get_or_create_current_list(user_id).await?;
    let list = state
        .maintenance
        .set_item_status(current.id, item_id, payload.status)
        .await?;
    Ok(ResponseJson(ApiResponse::success(list)))
}

pub async fn set_item_notes(
    State(state): State<AppState>,
    Path((user_id, item_id)): Path<(Uuid, Uuid)>,
    axum::Json(payload): axum::Json<SetNotesRequest>,
) -> Result<ResponseJson<ApiResponse<MaintenanceList>>, ApiError> {
    state.identity.require(user_id, MAINTENANCE_ROLES).await?;
    let current = state.maintenance.get_or_create_current_list(user_id).await?;
    let list = state
        .maintenance
        .set_item_notes(current.id, item_id, payload.notes)
        .await?;
    Ok(ResponseJson(ApiResponse::success(list)))
}

pub async fn set_item_interval(
    State(state): State<AppState>,
    Path((user_id, item_id)): Path<(Uuid, Uuid)>,
    axum::Json(payload): axum::Json<SetIntervalRequest>,
) -> Result<ResponseJson<ApiResponse<MaintenanceList>>, ApiError> {
    state.identity.require(user_id, MAINTENANCE_ROLES).await?;
    let current = state.maintenance.get_or_create_current_list(user_id).await?;
    let list = state
        .maintenance
        .set_item_interval(current.id, item_id, payload.service_interval_days)
        .await?;
    Ok(ResponseJson(ApiResponse::success(list)))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path((user_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<MaintenanceList>>, ApiError> {
    state.identity.require(user_id, MAINTENANCE_ROLES).await?;
    let current = state.maintenance.get_or_create_current_list(user_id).await?;
    let list = state.maintenance.delete_item(current.id, item_id).await?;
    Ok(ResponseJson(ApiResponse::success(list)))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/users/{user_id}/maintenance/list",
        Router::new()
            .route("/", get(get_current_list))
            .route("/regenerate", post(regenerate_list))
            .route("/submit", post(submit_list))
            .route("/items/{item_id}", delete(delete_item))
            .route("/items/{item_id}/status", put(set_item_status))
            .route("/items/{item_id}/notes", put(set_item_notes))
            .route("/items/{item_id}/interval", put(set_item_interval)),
    )
}
