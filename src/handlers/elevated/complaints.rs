use axum::extract::{Query, State};
use serde_json::Value;

use crate::app::AppState;
use crate::database::Collection;
use crate::filter::BaseQuery;
use crate::handlers::protected::records::{shaped_list, RawQuery};
use crate::middleware::ApiResult;

pub async fn complaints_list(State(state): State<AppState>, Query(params): RawQuery) -> ApiResult<Vec<Value>> {
    shaped_list(&state, params, BaseQuery::all(Collection::Complaints)).await
}
