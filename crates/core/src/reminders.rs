//! Next-day reminder rendering.
//!
//! Reminders are a read-only view over the working set: nothing here mutates appointments or
//! sends anything. Delivery is handled by [`crate::notification`].

use crate::appointment::{Appointment, AppointmentId, PatientId};
use crate::constants::{
    DATE_PLACEHOLDER, REMINDER_DATE_FORMAT, REMINDER_LEAD_DAYS, REMINDER_TIME_FORMAT,
    TIME_PLACEHOLDER,
};
use chrono::{Days, NaiveDate};
use serde::Serialize;

/// A rendered reminder for one appointment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Reminder {
    pub appointment_id: AppointmentId,
    pub patient_id: PatientId,
    pub message: String,
}

/// Fills `{date}` and `{time}` in `template` for `appointment`.
///
/// Dates render as `YYYY-MM-DD` and times on a 12-hour clock (`09:00 AM`).
pub fn render_reminder(template: &str, appointment: &Appointment) -> String {
    let date = appointment.date().format(REMINDER_DATE_FORMAT).to_string();
    let time = appointment
        .start_time()
        .format(REMINDER_TIME_FORMAT)
        .to_string();
    template
        .replace(DATE_PLACEHOLDER, &date)
        .replace(TIME_PLACEHOLDER, &time)
}

/// Renders one reminder per appointment dated the day after `reference_date`.
///
/// An empty result means there is nothing to remind about; it is not an error.
pub fn generate_reminders(
    appointments: &[Appointment],
    reference_date: NaiveDate,
    template: &str,
) -> Vec<Reminder> {
    let Some(target) = reference_date.checked_add_days(Days::new(REMINDER_LEAD_DAYS)) else {
        return Vec::new();
    };

    let reminders: Vec<Reminder> = appointments
        .iter()
        .filter(|appt| appt.date() == target)
        .map(|appt| Reminder {
            appointment_id: appt.id(),
            patient_id: appt.patient_id().clone(),
            message: render_reminder(template, appt),
        })
        .collect();

    tracing::debug!(%target, count = reminders.len(), "rendered reminders");

    reminders
}
