//! Constants used throughout the appointment core crate.
//!
//! Defaults for the slot grid and reminder rendering live here so the config layer, the CLI and
//! the REST surface all agree on them.

/// Default first candidate slot start of the day (`HH:MM`).
pub const DEFAULT_DAY_START: &str = "09:00";

/// Default last candidate slot start of the day (`HH:MM`, inclusive).
pub const DEFAULT_DAY_END: &str = "17:00";

/// Default reminder message template.
pub const DEFAULT_REMINDER_TEMPLATE: &str =
    "Reminder: You have an appointment scheduled on {date} at {time}. Please arrive 10 minutes early.";

/// Placeholder replaced with the appointment date in reminder templates.
pub const DATE_PLACEHOLDER: &str = "{date}";

/// Placeholder replaced with the appointment start time in reminder templates.
pub const TIME_PLACEHOLDER: &str = "{time}";

/// Prefix for synthetic patient identifiers.
pub const PATIENT_ID_PREFIX: &str = "Patient_";

/// Minimum digit width of the zero-padded patient sequence number.
pub const PATIENT_ID_WIDTH: usize = 3;

/// Format for parsing and rendering time-of-day values in config and requests.
pub const TIME_INPUT_FORMAT: &str = "%H:%M";

/// Format for rendering calendar dates in reminder messages.
pub const REMINDER_DATE_FORMAT: &str = "%Y-%m-%d";

/// Format for rendering start times in reminder messages (e.g. `09:00 AM`).
pub const REMINDER_TIME_FORMAT: &str = "%I:%M %p";

/// How many days ahead of the reference date reminders are produced for.
pub const REMINDER_LEAD_DAYS: u64 = 1;
