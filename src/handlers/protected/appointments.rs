use axum::{extract::State, Extension, Form};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::{Identity, Role};
use crate::database::Collection;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct AppointmentForm {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub visit_date: String,
    #[serde(default)]
    pub visit_time: String,
    #[serde(default)]
    pub scan_type: String,
}

fn required(field: &str, value: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::field_error(field, format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// POST /appointments - book a scan. Patients book for themselves;
/// an Admin books on behalf of the named patient.
pub async fn appointment_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Form(form): Form<AppointmentForm>,
) -> ApiResult<Value> {
    let (name, email) = match identity.role {
        Role::Patient => (identity.name.clone(), identity.email.clone()),
        _ => (
            required("name", form.name.as_deref().unwrap_or_default())?,
            required("email", form.email.as_deref().unwrap_or_default())?,
        ),
    };

    let appointment = state
        .records
        .insert(
            Collection::Appointments,
            json!({
                "patient_name": name,
                "patient_email": email,
                "admission_date": required("visit_date", &form.visit_date)?,
                "admission_time": required("visit_time", &form.visit_time)?,
                "scan_type": required("scan_type", &form.scan_type)?,
                "booked_by": identity.id,
            }),
        )
        .await?;

    if let Err(e) = state.notifier.appointment_booked(&appointment).await {
        tracing::warn!("appointment stored but notification failed: {}", e);
    }

    Ok(ApiResponse::created(appointment))
}
