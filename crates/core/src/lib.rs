//! # Appointment Core
//!
//! Core scheduling logic for the appointment management system.
//!
//! This crate contains pure operations over an in-memory working set:
//! - Synthetic schedule generation over a fixed daily slot grid
//! - Conflict detection on identical `(date, start_time, end_time)` slots
//! - Next-day reminder rendering and hand-off to a notification sink
//! - Cancel and reschedule of individual appointments
//!
//! **No API concerns**: HTTP servers and command-line handling belong in `api-rest` and
//! `appointment-cli`. Nothing here persists data or reads the environment.

pub mod appointment;
pub mod config;
pub mod conflicts;
pub mod constants;
pub mod error;
pub mod generator;
pub mod mutator;
pub mod notification;
pub mod reminders;
pub mod session;

pub use appointment::{Appointment, AppointmentId, PatientId};
pub use appointment_types::{EmailAddress, NonEmptyText, PhoneNumber, TextError};
pub use config::{CoreConfig, MissingIdPolicy};
pub use conflicts::{conflict_groups, detect_conflicts, ConflictGroup};
pub use error::{AppointmentError, AppointmentResult};
pub use generator::{generate, generate_sampled, GenerationParams, Slot};
pub use mutator::{cancel, reschedule};
pub use notification::{
    dispatch_reminders, Contact, DeliveryError, DispatchSummary, NotificationSink, TracingSink,
};
pub use reminders::{generate_reminders, Reminder};
pub use session::Session;

/// The current date on the local clock.
///
/// Engine functions take "today" explicitly; binaries call this once per request.
pub fn local_today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
