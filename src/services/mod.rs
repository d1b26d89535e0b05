pub mod notifier;

pub use notifier::{AppointmentNotifier, LogNotifier, NotifyError};
