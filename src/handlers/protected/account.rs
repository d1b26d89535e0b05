use axum::{extract::State, Extension, Form};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::Identity;
use crate::middleware::{session_cookie, ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    #[serde(default)]
    pub password_current: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

/// GET /home - the signed-in identity
pub async fn home_get(Extension(identity): Extension<Identity>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "identity": identity,
        "landing": identity.role.landing(),
    })))
}

/// POST /password - replace the password; earlier sessions stop working,
/// this one gets a fresh cookie
pub async fn password_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
    Form(form): Form<PasswordForm>,
) -> Result<(CookieJar, ApiResponse<Value>), crate::error::ApiError> {
    let updated = state
        .credentials
        .change_password(&identity, &form.password_current, &form.password, &form.password_confirm)
        .await?;
    let token = state.credentials.issue_token(&updated)?;

    let jar = jar.add(session_cookie(token.value, state.cookie_secure));
    Ok((
        jar,
        ApiResponse::success(json!({
            "message": "Password updated",
            "password_changed_at": updated.password_changed_at,
        })),
    ))
}
