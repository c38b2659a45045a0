use crate::appointment::AppointmentId;
use chrono::NaiveTime;

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("appointment {0} not found")]
    NotFound(AppointmentId),
    #[error("appointment id {id} matches {count} appointments; ids must be unique")]
    DuplicateId { id: AppointmentId, count: usize },
    #[error("appointment starting at {start} with duration {duration_minutes} minutes would end past midnight")]
    TimeOverflow {
        start: NaiveTime,
        duration_minutes: u32,
    },
    #[error("invalid text: {0}")]
    Text(#[from] appointment_types::TextError),
}

pub type AppointmentResult<T> = std::result::Result<T, AppointmentError>;
