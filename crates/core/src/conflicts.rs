//! Double-booking detection.
//!
//! Two appointments conflict when they share the exact `(date, start_time, end_time)` triple.
//! Partially overlapping intervals are not conflicts, and `patient_id` is ignored: the check
//! models contention for a slot, not a patient booked twice. Generated schedules draw every slot
//! from one fixed grid, so exact matching covers them.

use crate::appointment::{Appointment, AppointmentId};
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::collections::HashMap;

type SlotKey = (NaiveDate, NaiveTime, NaiveTime);

/// All appointments sharing one `(date, start_time, end_time)` triple.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConflictGroup {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub appointment_ids: Vec<AppointmentId>,
}

fn slot_counts(appointments: &[Appointment]) -> HashMap<SlotKey, usize> {
    let mut counts = HashMap::new();
    for appt in appointments {
        *counts.entry(appt.slot_key()).or_insert(0) += 1;
    }
    counts
}

/// Returns every appointment whose slot triple is shared with at least one other appointment,
/// in input order. All members of each group are returned, not only the repeats.
pub fn detect_conflicts(appointments: &[Appointment]) -> Vec<Appointment> {
    let counts = slot_counts(appointments);
    let conflicts: Vec<Appointment> = appointments
        .iter()
        .filter(|appt| counts.get(&appt.slot_key()).copied().unwrap_or(0) > 1)
        .cloned()
        .collect();

    tracing::debug!(
        scanned = appointments.len(),
        conflicting = conflicts.len(),
        "conflict scan complete"
    );

    conflicts
}

/// Groups conflicting appointments by slot triple, ordered by each group's first appearance.
pub fn conflict_groups(appointments: &[Appointment]) -> Vec<ConflictGroup> {
    let mut order: Vec<SlotKey> = Vec::new();
    let mut members: HashMap<SlotKey, Vec<AppointmentId>> = HashMap::new();

    for appt in appointments {
        let key = appt.slot_key();
        let ids = members.entry(key).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        ids.push(appt.id());
    }

    order
        .into_iter()
        .filter_map(|key| {
            let ids = members.remove(&key)?;
            (ids.len() > 1).then(|| ConflictGroup {
                date: key.0,
                start_time: key.1,
                end_time: key.2,
                appointment_ids: ids,
            })
        })
        .collect()
}
