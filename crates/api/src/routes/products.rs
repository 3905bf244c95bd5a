//! Product catalog endpoints with wholesaler enrichment.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use domain::CatalogEntry;
use order_store::OrderStore;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::routes::orders::AppState;

/// GET /produkte — the raw catalog, no enrichment.
#[tracing::instrument(skip(state))]
pub async fn list<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<Vec<CatalogEntry>> {
    Json(state.catalog.entries().to_vec())
}

/// GET /produkte/:id — one catalog entry overlaid with live wholesaler
/// content and availability data.
///
/// Enrichment is best effort: when the wholesaler is unreachable or the
/// entry has no EAN, the response carries the catalog fields plus the
/// `n/a` placeholders the storefront expects.
#[tracing::instrument(skip(state))]
pub async fn detail<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let entry = state
        .catalog
        .get(id)
        .ok_or_else(|| ApiError::NotFound(format!("unknown product: {id}")))?;

    let mut view = to_object(entry)?;

    if let Some(ean) = entry.ean.as_deref() {
        if let Some(content) = state.wholesaler.fetch_content(ean).await {
            overlay(&mut view, to_object(&content)?);
        }
        if let Some(availability) = state.wholesaler.fetch_availability(ean).await {
            overlay(&mut view, to_object(&availability)?);
        }
    }

    for (key, placeholder) in [
        ("bestand", json!("n/a")),
        ("handling_zeit", json!("n/a")),
        ("erfuellungsrate", json!("n/a")),
    ] {
        view.entry(key.to_string()).or_insert(placeholder);
    }

    Ok(Json(Value::Object(view)))
}

fn to_object<T: serde::Serialize>(value: &T) -> Result<serde_json::Map<String, Value>, ApiError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::Internal("expected a JSON object".to_string())),
        Err(err) => Err(ApiError::Internal(err.to_string())),
    }
}

/// Shallow merge: overlay keys win.
fn overlay(target: &mut serde_json::Map<String, Value>, source: serde_json::Map<String, Value>) {
    for (key, value) in source {
        target.insert(key, value);
    }
}
