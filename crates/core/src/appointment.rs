//! The appointment record and its time arithmetic.

use crate::{AppointmentError, AppointmentResult, NonEmptyText};
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Sequential appointment identifier, unique within a working set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppointmentId(pub u32);

impl std::fmt::Display for AppointmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for AppointmentId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Identifier of the patient owning an appointment.
pub type PatientId = NonEmptyText;

/// A single booked appointment.
///
/// Fields are private so that `end_time = start_time + duration` holds for every value; the only
/// way to move an appointment is [`Appointment::rescheduled`], which recomputes the end time from
/// the appointment's own duration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Appointment {
    id: AppointmentId,
    patient_id: PatientId,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    duration_minutes: u32,
}

impl Appointment {
    /// Creates an appointment, deriving `end_time` from `start_time` and `duration_minutes`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a zero duration and `TimeOverflow` when the end time would
    /// fall on the next day.
    pub fn new(
        id: AppointmentId,
        patient_id: PatientId,
        date: NaiveDate,
        start_time: NaiveTime,
        duration_minutes: u32,
    ) -> AppointmentResult<Self> {
        let end_time = end_time_for(start_time, duration_minutes)?;
        Ok(Self {
            id,
            patient_id,
            date,
            start_time,
            end_time,
            duration_minutes,
        })
    }

    pub fn id(&self) -> AppointmentId {
        self.id
    }

    pub fn patient_id(&self) -> &PatientId {
        &self.patient_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    pub fn end_time(&self) -> NaiveTime {
        self.end_time
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    /// The `(date, start_time, end_time)` triple used for conflict detection.
    pub fn slot_key(&self) -> (NaiveDate, NaiveTime, NaiveTime) {
        (self.date, self.start_time, self.end_time)
    }

    /// Returns this appointment moved to `new_date` at `new_start`, keeping id and duration.
    pub fn rescheduled(&self, new_date: NaiveDate, new_start: NaiveTime) -> AppointmentResult<Self> {
        let end_time = end_time_for(new_start, self.duration_minutes)?;
        Ok(Self {
            date: new_date,
            start_time: new_start,
            end_time,
            ..self.clone()
        })
    }
}

/// Computes `start + duration_minutes`, refusing zero durations and wrap-around past midnight.
pub fn end_time_for(start: NaiveTime, duration_minutes: u32) -> AppointmentResult<NaiveTime> {
    if duration_minutes == 0 {
        return Err(AppointmentError::InvalidInput(
            "appointment duration must be greater than zero minutes".into(),
        ));
    }

    let (end, wrapped_secs) =
        start.overflowing_add_signed(Duration::minutes(i64::from(duration_minutes)));
    if wrapped_secs != 0 || end <= start {
        return Err(AppointmentError::TimeOverflow {
            start,
            duration_minutes,
        });
    }

    Ok(end)
}
