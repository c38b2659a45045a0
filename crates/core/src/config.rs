//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into the engine. Binaries read environment variables and hand the raw values to the
//! `*_from_env_value` helpers below; nothing in the engine reads the environment itself.

use crate::constants::{
    DATE_PLACEHOLDER, DEFAULT_DAY_END, DEFAULT_DAY_START, DEFAULT_REMINDER_TEMPLATE,
    TIME_INPUT_FORMAT, TIME_PLACEHOLDER,
};
use crate::{AppointmentError, AppointmentResult, NonEmptyText};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// What cancel and reschedule do when the target id is absent from the working set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingIdPolicy {
    /// Return the working set unchanged.
    #[default]
    Ignore,
    /// Fail with [`AppointmentError::NotFound`].
    Reject,
}

impl std::str::FromStr for MissingIdPolicy {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "reject" => Ok(Self::Reject),
            other => Err(AppointmentError::InvalidInput(format!(
                "unknown missing-id policy '{other}' (expected 'ignore' or 'reject')"
            ))),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    day_start: NaiveTime,
    day_end: NaiveTime,
    reminder_template: String,
    missing_id_policy: MissingIdPolicy,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `day_end` is the last candidate slot start and must come after `day_start`. The reminder
    /// template must mention at least one of `{date}` or `{time}`.
    pub fn new(
        day_start: NaiveTime,
        day_end: NaiveTime,
        reminder_template: NonEmptyText,
        missing_id_policy: MissingIdPolicy,
    ) -> AppointmentResult<Self> {
        if day_start >= day_end {
            return Err(AppointmentError::InvalidInput(format!(
                "day start {day_start} must be before day end {day_end}"
            )));
        }

        let template = reminder_template.as_str();
        if !template.contains(DATE_PLACEHOLDER) && !template.contains(TIME_PLACEHOLDER) {
            return Err(AppointmentError::InvalidInput(
                "reminder template must contain {date} or {time}".into(),
            ));
        }

        Ok(Self {
            day_start,
            day_end,
            reminder_template: reminder_template.as_str().to_owned(),
            missing_id_policy,
        })
    }

    pub fn day_start(&self) -> NaiveTime {
        self.day_start
    }

    pub fn day_end(&self) -> NaiveTime {
        self.day_end
    }

    pub fn reminder_template(&self) -> &str {
        &self.reminder_template
    }

    pub fn missing_id_policy(&self) -> MissingIdPolicy {
        self.missing_id_policy
    }

    /// Returns a copy of this config with a different missing-id policy.
    pub fn with_missing_id_policy(mut self, policy: MissingIdPolicy) -> Self {
        self.missing_id_policy = policy;
        self
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            day_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            day_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            reminder_template: DEFAULT_REMINDER_TEMPLATE.to_owned(),
            missing_id_policy: MissingIdPolicy::Ignore,
        }
    }
}

/// Parse an `HH:MM` time of day.
pub fn parse_time_of_day(value: &str) -> AppointmentResult<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), TIME_INPUT_FORMAT).map_err(|e| {
        AppointmentError::InvalidInput(format!("invalid time '{}': {e}", value.trim()))
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a slot grid bound from an optional string value.
///
/// If `value` is `None` or empty/whitespace, `default` (an `HH:MM` constant) is used.
pub fn time_of_day_from_env_value(
    value: Option<String>,
    default: &str,
) -> AppointmentResult<NaiveTime> {
    match non_blank(value) {
        Some(v) => parse_time_of_day(&v),
        None => parse_time_of_day(default),
    }
}

/// Parse the missing-id policy from an optional string value, defaulting to `Ignore`.
pub fn missing_id_policy_from_env_value(value: Option<String>) -> AppointmentResult<MissingIdPolicy> {
    let parsed = non_blank(value).map(|v| v.parse::<MissingIdPolicy>()).transpose()?;
    Ok(parsed.unwrap_or_default())
}

/// Parse the reminder template from an optional string value, defaulting to the standard one.
pub fn reminder_template_from_env_value(value: Option<String>) -> AppointmentResult<NonEmptyText> {
    let template = non_blank(value).unwrap_or_else(|| DEFAULT_REMINDER_TEMPLATE.to_string());
    Ok(NonEmptyText::new(template)?)
}

/// Build a `CoreConfig` from raw optional values, as read from the environment by a binary.
pub fn core_config_from_env_values(
    day_start: Option<String>,
    day_end: Option<String>,
    reminder_template: Option<String>,
    missing_id_policy: Option<String>,
) -> AppointmentResult<CoreConfig> {
    CoreConfig::new(
        time_of_day_from_env_value(day_start, DEFAULT_DAY_START)?,
        time_of_day_from_env_value(day_end, DEFAULT_DAY_END)?,
        reminder_template_from_env_value(reminder_template)?,
        missing_id_policy_from_env_value(missing_id_policy)?,
    )
}
