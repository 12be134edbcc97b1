use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{identity::IdentityError, maintenance::MaintenanceError};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Maintenance(#[from] MaintenanceError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Maintenance(error) => match error {
                MaintenanceError::ListNotFound(_) | MaintenanceError::ItemNotInList { .. } => {
                    StatusCode::NOT_FOUND
                }
                MaintenanceError::IncompleteSubmission(_) => StatusCode::UNPROCESSABLE_ENTITY,
                MaintenanceError::ConcurrentListCreation(_)
                | MaintenanceError::ListCompleted(_)
                | MaintenanceError::Rotation(_) => StatusCode::CONFLICT,
                MaintenanceError::InvalidInterval(_) => StatusCode::BAD_REQUEST,
                MaintenanceError::CatalogUnavailable(_)
                | MaintenanceError::WriteFailed { .. }
                | MaintenanceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Identity(error) => match error {
                IdentityError::UnknownUser(_) => StatusCode::NOT_FOUND,
                IdentityError::Forbidden { .. } => StatusCode::FORBIDDEN,
                IdentityError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}
