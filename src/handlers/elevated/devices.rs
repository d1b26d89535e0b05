use axum::{extract::State, Form};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::app::AppState;
use crate::database::Collection;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// POST /devices - register a device. `name` is required; other form
/// fields are stored as given.
pub async fn device_create(State(state): State<AppState>, Form(form): Form<BTreeMap<String, String>>) -> ApiResult<Value> {
    let name = form.get("name").map(|n| n.trim()).unwrap_or_default();
    if name.is_empty() {
        return Err(ApiError::field_error("name", "Device name is required"));
    }

    let document: Map<String, Value> = form
        .into_iter()
        .map(|(k, v)| (k, Value::String(v.trim().to_string())))
        .collect();

    let device = state.records.insert(Collection::Devices, Value::Object(document)).await?;
    tracing::info!(device = %device["id"], "device registered");
    Ok(ApiResponse::created(device))
}
