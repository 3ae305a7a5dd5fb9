//! HTTP handlers

pub mod countries;
pub mod meta;

use atlas_core::AtlasError;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

/// Structured JSON error body used by every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

pub fn upstream_unavailable() -> ApiError {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorBody {
            error: "External data source unavailable".to_string(),
            message: None,
            details: Some("Could not fetch data from one or both APIs".to_string()),
        }),
    )
}

pub fn not_found(name: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "Country not found".to_string(),
            message: Some(AtlasError::NotFound(name.to_string()).to_string()),
            details: None,
        }),
    )
}

pub fn image_not_found() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "Summary image not found. Run POST /countries/refresh first.".to_string(),
            message: None,
            details: None,
        }),
    )
}

pub fn internal_error(err: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: "Internal Server Error".to_string(),
            message: None,
            details: Some(err.to_string()),
        }),
    )
}
