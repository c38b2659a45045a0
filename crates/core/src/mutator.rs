//! Cancel and reschedule operations over a working set.
//!
//! Both operations take the working set by value and hand back the updated set. When an
//! operation fails, the caller still owns its previous set (see [`crate::Session`]).

use crate::appointment::{Appointment, AppointmentId};
use crate::config::MissingIdPolicy;
use crate::{AppointmentError, AppointmentResult};
use chrono::{NaiveDate, NaiveTime};

fn handle_missing(
    id: AppointmentId,
    policy: MissingIdPolicy,
    appointments: Vec<Appointment>,
) -> AppointmentResult<Vec<Appointment>> {
    match policy {
        MissingIdPolicy::Ignore => {
            tracing::warn!(%id, "appointment not found; leaving working set unchanged");
            Ok(appointments)
        }
        MissingIdPolicy::Reject => Err(AppointmentError::NotFound(id)),
    }
}

/// Removes every appointment with `id`.
///
/// An absent id is handled according to `policy`.
pub fn cancel(
    id: AppointmentId,
    mut appointments: Vec<Appointment>,
    policy: MissingIdPolicy,
) -> AppointmentResult<Vec<Appointment>> {
    if !appointments.iter().any(|appt| appt.id() == id) {
        return handle_missing(id, policy, appointments);
    }

    let before = appointments.len();
    appointments.retain(|appt| appt.id() != id);

    tracing::info!(%id, removed = before - appointments.len(), "cancelled appointment");
    Ok(appointments)
}

/// Moves the appointment with `id` to `new_date` at `new_start`.
///
/// The new end time is computed from that appointment's own stored duration. An absent id is
/// handled according to `policy`.
///
/// # Errors
///
/// - `DuplicateId` if more than one appointment carries `id`; nothing is changed.
/// - `TimeOverflow` if the moved appointment would end past midnight.
pub fn reschedule(
    id: AppointmentId,
    new_date: NaiveDate,
    new_start: NaiveTime,
    mut appointments: Vec<Appointment>,
    policy: MissingIdPolicy,
) -> AppointmentResult<Vec<Appointment>> {
    let positions: Vec<usize> = appointments
        .iter()
        .enumerate()
        .filter(|(_, appt)| appt.id() == id)
        .map(|(index, _)| index)
        .collect();

    let index = match positions.as_slice() {
        [] => return handle_missing(id, policy, appointments),
        [index] => *index,
        many => {
            tracing::error!(%id, count = many.len(), "duplicate appointment ids in working set");
            return Err(AppointmentError::DuplicateId {
                id,
                count: many.len(),
            });
        }
    };

    let moved = appointments[index].rescheduled(new_date, new_start)?;
    tracing::info!(
        %id,
        date = %moved.date(),
        start = %moved.start_time(),
        end = %moved.end_time(),
        "rescheduled appointment"
    );
    appointments[index] = moved;

    Ok(appointments)
}
