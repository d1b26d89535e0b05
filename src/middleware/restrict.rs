use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{authorize, Identity, RoleSet};
use crate::error::ApiError;

/// Role gate. The allowed set is bound once, when the route group is built:
///
/// ```ignore
/// .route_layer(middleware::from_fn_with_state(RoleSet::of(&[Role::Admin]), restrict_to))
/// ```
///
/// Must run inside [`require_session`](super::require_session).
pub async fn restrict_to(State(allowed): State<RoleSet>, request: Request, next: Next) -> Result<Response, ApiError> {
    let identity = request
        .extensions()
        .get::<Identity>()
        .ok_or_else(|| ApiError::unauthorized("no session"))?;

    if let Err(e) = authorize(identity, allowed) {
        tracing::warn!(id = %identity.id, role = %identity.role, allowed = %allowed, "access denied");
        return Err(e.into());
    }

    Ok(next.run(request).await)
}
