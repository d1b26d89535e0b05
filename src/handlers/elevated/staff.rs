use axum::extract::{Query, State};
use serde_json::Value;

use crate::app::AppState;
use crate::auth::Role;
use crate::database::Collection;
use crate::filter::BaseQuery;
use crate::handlers::protected::records::{shaped_list, RawQuery};
use crate::middleware::ApiResult;

/// Staff partition narrowed to one role
fn staff_with_role(role: Role) -> BaseQuery {
    BaseQuery::all(Collection::Staff).with_filter("role", role.as_str())
}

pub async fn doctors_list(State(state): State<AppState>, Query(params): RawQuery) -> ApiResult<Vec<Value>> {
    shaped_list(&state, params, staff_with_role(Role::Doctor)).await
}

pub async fn technicians_list(State(state): State<AppState>, Query(params): RawQuery) -> ApiResult<Vec<Value>> {
    shaped_list(&state, params, staff_with_role(Role::Technician)).await
}
