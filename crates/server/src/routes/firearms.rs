//! Routes for the firearm catalog (list, add, remove).

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{delete, get},
};
use db::models::firearm::{CreateFirearm, Firearm};
use services::services::identity::{CATALOG_ADMIN_ROLES, MAINTENANCE_ROLES};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Full catalog, oldest service first.
pub async fn list_firearms(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Firearm>>>, ApiError> {
    state.identity.require(user_id, MAINTENANCE_ROLES).await?;
    let firearms = Firearm::list_all(&state.db.pool).await?;
    Ok(ResponseJson(ApiResponse::success(firearms)))
}

/// Add a firearm to the catalog (admins only).
pub async fn create_firearm(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    axum::Json(payload): axum::Json<CreateFirearm>,
) -> Result<ResponseJson<ApiResponse<Firearm>>, ApiError> {
    state.identity.require(user_id, CATALOG_ADMIN_ROLES).await?;
    let firearm = state.maintenance.add_firearm(&payload).await?;
    Ok(ResponseJson(ApiResponse::success(firearm)))
}

/// Remove a firearm from the catalog (admins only).
pub async fn delete_firearm(
    State(state): State<AppState>,
    Path((user_id, firearm_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.identity.require(user_id, CATALOG_ADMIN_ROLES).await?;
    state.maintenance.remove_firearm(firearm_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/users/{user_id}/firearms",
        Router::new()
            .route("/", get(list_firearms).post(create_firearm))
            .route("/{firearm_id}", delete(delete_firearm)),
    )
}
