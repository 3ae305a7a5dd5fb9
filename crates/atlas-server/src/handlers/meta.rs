//! Liveness, schema init, and status handlers

use crate::handlers::{internal_error, ApiError};
use crate::AppState;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

pub async fn home() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the Country Currency & Exchange API"
    }))
}

pub async fn init_db(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    match state.store.ensure_schema().await {
        Ok(()) => Ok(Json(json!({
            "message": "Database initialized successfully"
        }))),
        Err(e) => {
            tracing::error!("Failed to initialize database: {}", e);
            Err(internal_error(e))
        }
    }
}

pub async fn status(State(state): State<AppState>) -> Json<Value> {
    // A probe failure never propagates to the caller; it only
    // degrades the database field.
    let database = match state.store.probe().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::error!("Database connection error: {}", e);
            "disconnected"
        }
    };

    Json(json!({
        "status": "ok",
        "database": database,
        "message": "Country API is working smoothly"
    }))
}
