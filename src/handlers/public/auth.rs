// handlers/public/auth.rs - POST /login, POST /signup
use axum::{extract::State, response::Redirect, Form};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::{Role, Signup};
use crate::error::ApiError;
use crate::middleware::session_cookie;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
    #[serde(default)]
    pub role: String,
}

/// POST /login - check credentials, set the session cookie, 303 to the role's landing page
pub async fn login_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect), ApiError> {
    // an unknown role is indistinguishable from bad credentials
    let role: Role = form.role.parse().map_err(|_| ApiError::InvalidCredentials)?;

    let identity = state.credentials.authenticate(&form.email, &form.password, role).await?;
    let token = state.credentials.issue_token(&identity)?;

    let jar = jar.add(session_cookie(token.value, state.cookie_secure));
    Ok((jar, Redirect::to(identity.role.landing())))
}

/// POST /signup - register a Patient, Doctor or Technician and sign them in
pub async fn signup_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<(CookieJar, Redirect), ApiError> {
    let role: Role = form
        .role
        .parse()
        .map_err(|e: crate::auth::UnknownRole| ApiError::field_error("role", e.to_string()))?;

    let identity = state
        .credentials
        .register(Signup {
            name: form.name,
            email: form.email,
            password: form.password,
            password_confirm: form.password_confirm,
            role,
        })
        .await?;
    let token = state.credentials.issue_token(&identity)?;

    let jar = jar.add(session_cookie(token.value, state.cookie_secure));
    Ok((jar, Redirect::to(identity.role.landing())))
}
