// Appointment notifications
//
// Delivery is best-effort: the booking is already stored when the notifier
// runs, so a failed delivery is logged by the caller and never rolls it back.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait AppointmentNotifier: Send + Sync {
    /// Announce a newly stored appointment document
    async fn appointment_booked(&self, appointment: &Value) -> Result<(), NotifyError>;
}

/// Writes the notification to the tracing log instead of sending mail
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl AppointmentNotifier for LogNotifier {
    async fn appointment_booked(&self, appointment: &Value) -> Result<(), NotifyError> {
        let field = |name: &str| appointment.get(name).and_then(Value::as_str).unwrap_or("-").to_string();

        tracing::info!(
            target: "notifications",
            appointment = %field("id"),
            patient = %field("patient_email"),
            date = %field("admission_date"),
            time = %field("admission_time"),
            scan = %field("scan_type"),
            "appointment booked"
        );
        Ok(())
    }
}
