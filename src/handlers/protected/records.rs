// Shaped list endpoints: GET /patients, GET /devices
use axum::extract::{Query, State};
use serde_json::Value;

use crate::app::AppState;
use crate::database::Collection;
use crate::filter::BaseQuery;
use crate::middleware::{ApiResponse, ApiResult};

pub type RawQuery = Query<Vec<(String, String)>>;

/// Shape the raw query string onto `base` and run it
pub(crate) async fn shaped_list(state: &AppState, params: Vec<(String, String)>, base: BaseQuery) -> ApiResult<Vec<Value>> {
    let records = state.shaper.shape(params, base).execute(state.records.as_ref()).await?;
    Ok(ApiResponse::success(records))
}

pub async fn patients_list(State(state): State<AppState>, Query(params): RawQuery) -> ApiResult<Vec<Value>> {
    shaped_list(&state, params, BaseQuery::all(Collection::Patients)).await
}

pub async fn devices_list(State(state): State<AppState>, Query(params): RawQuery) -> ApiResult<Vec<Value>> {
    shaped_list(&state, params, BaseQuery::all(Collection::Devices)).await
}
