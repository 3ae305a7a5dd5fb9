//! Country collection handlers

use crate::handlers::{
    image_not_found, internal_error, not_found, upstream_unavailable, ApiError,
};
use crate::AppState;
use atlas_core::{AtlasError, Country, ListFilter, SortKey};
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    region: Option<String>,
    currency: Option<String>,
    sort: Option<String>,
}

pub async fn refresh(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let (countries, rates) = match state.upstream.fetch().await {
        Ok(data) => data,
        Err(AtlasError::UpstreamUnavailable) => return Err(upstream_unavailable()),
        Err(e) => {
            tracing::error!("Refresh failed before reconciliation: {}", e);
            return Err(internal_error(e));
        }
    };

    let outcome = match state.reconciler.reconcile(countries, &rates).await {
        Ok(outcome) => outcome,
        Err(e) => {
            // The store transaction has already rolled back.
            tracing::error!("Refresh failed: {}", e);
            return Err(internal_error(e));
        }
    };

    let total = state.store.count().await.map_err(internal_error)?;

    Ok(Json(json!({
        "message": "Countries refreshed and summary image generated successfully",
        "total_countries": total,
        "last_refreshed_at": outcome.refreshed_at,
    })))
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Country>>, ApiError> {
    let filter = ListFilter {
        region: params.region,
        currency: params.currency,
        sort: params.sort.as_deref().and_then(SortKey::parse),
    };

    match state.store.list(&filter).await {
        Ok(countries) => Ok(Json(countries)),
        Err(e) => {
            tracing::error!("Failed to list countries: {}", e);
            Err(internal_error(e))
        }
    }
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Country>, ApiError> {
    match state.store.get(&name).await {
        Ok(Some(country)) => Ok(Json(country)),
        Ok(None) => Err(not_found(&name)),
        Err(e) => {
            tracing::error!("Failed to get country: {}", e);
            Err(internal_error(e))
        }
    }
}

pub async fn delete(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match state.store.delete(&name).await {
        Ok(true) => Ok(Json(json!({
            "message": format!("Country {name} has been deleted successfully")
        }))),
        Ok(false) => Err(not_found(&name)),
        Err(e) => {
            tracing::error!("Failed to delete country: {}", e);
            Err(internal_error(e))
        }
    }
}

pub async fn image(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    match tokio::fs::read(&state.image_path).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, "image/png")], bytes)),
        Err(_) => Err(image_not_found()),
    }
}
