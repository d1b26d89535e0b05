use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::app::AppState;
use crate::error::ApiError;

/// Name of the HttpOnly cookie carrying the session token
pub const SESSION_COOKIE: &str = "jwt";

/// Session authentication: resolves the presented token into an
/// [`Identity`](crate::auth::Identity) and stores it in the request extensions.
///
/// The `jwt` cookie wins; `Authorization: Bearer` is read only when no cookie is sent.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(&jar, request.headers());
    let identity = state.credentials.resolve_session(token.as_deref()).await?;

    tracing::debug!(id = %identity.id, role = %identity.role, "session resolved");
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Token from the session cookie, falling back to a Bearer header
pub fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

/// Build the session cookie set on login, signup and password change
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(secure);
    cookie.set_same_site(SameSite::Lax);
    cookie
}
