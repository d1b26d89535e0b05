use axum::{extract::State, Extension, Form};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::Identity;
use crate::database::Collection;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub message: String,
    pub visit_date: Option<String>,
}

/// POST /contact - a patient files a complaint, attributed to their own email
pub async fn contact_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Form(form): Form<ContactForm>,
) -> ApiResult<Value> {
    let message = form.message.trim();
    if message.is_empty() {
        return Err(ApiError::field_error("message", "Message is required"));
    }

    let complaint = state
        .records
        .insert(
            Collection::Complaints,
            json!({
                "patient": identity.email,
                "complaint": message,
                "visit_date": form.visit_date.filter(|d| !d.trim().is_empty()),
            }),
        )
        .await?;

    tracing::info!(patient = %identity.id, "complaint filed");
    Ok(ApiResponse::created(complaint))
}
