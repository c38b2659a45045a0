//! Caller-owned working set.
//!
//! A `Session` bundles the resolved config with the current appointments so a presentation
//! layer can keep one value per operator session instead of process-wide state. Views
//! (conflicts, reminders) are recomputed on every call.

use crate::appointment::{Appointment, AppointmentId};
use crate::conflicts::{self, ConflictGroup};
use crate::generator::{self, GenerationParams};
use crate::reminders::{self, Reminder};
use crate::{mutator, AppointmentResult, CoreConfig};
use chrono::{NaiveDate, NaiveTime};
use rand::Rng;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Session {
    cfg: Arc<CoreConfig>,
    appointments: Vec<Appointment>,
}

impl Session {
    /// Creates an empty session.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            cfg,
            appointments: Vec::new(),
        }
    }

    /// Creates a session over an existing working set.
    pub fn with_appointments(cfg: Arc<CoreConfig>, appointments: Vec<Appointment>) -> Self {
        Self { cfg, appointments }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn into_appointments(self) -> Vec<Appointment> {
        self.appointments
    }

    /// Replaces the working set with a full generated grid.
    pub fn generate(
        &mut self,
        params: &GenerationParams,
        today: NaiveDate,
    ) -> AppointmentResult<&[Appointment]> {
        self.appointments = generator::generate(&self.cfg, params, today)?;
        Ok(&self.appointments)
    }

    /// Replaces the working set with a sampled schedule (one slot per patient per day).
    pub fn generate_sampled<R: Rng + ?Sized>(
        &mut self,
        params: &GenerationParams,
        today: NaiveDate,
        rng: &mut R,
    ) -> AppointmentResult<&[Appointment]> {
        self.appointments = generator::generate_sampled(&self.cfg, params, today, rng)?;
        Ok(&self.appointments)
    }

    pub fn conflicts(&self) -> Vec<Appointment> {
        conflicts::detect_conflicts(&self.appointments)
    }

    pub fn conflict_groups(&self) -> Vec<ConflictGroup> {
        conflicts::conflict_groups(&self.appointments)
    }

    /// Reminders for appointments on the day after `reference_date`.
    pub fn reminders(&self, reference_date: NaiveDate) -> Vec<Reminder> {
        reminders::generate_reminders(
            &self.appointments,
            reference_date,
            self.cfg.reminder_template(),
        )
    }

    /// Cancels `id`. On error the working set is left as it was.
    pub fn cancel(&mut self, id: AppointmentId) -> AppointmentResult<()> {
        self.appointments = mutator::cancel(
            id,
            self.appointments.clone(),
            self.cfg.missing_id_policy(),
        )?;
        Ok(())
    }

    /// Reschedules `id`. On error the working set is left as it was.
    pub fn reschedule(
        &mut self,
        id: AppointmentId,
        new_date: NaiveDate,
        new_start: NaiveTime,
    ) -> AppointmentResult<()> {
        self.appointments = mutator::reschedule(
            id,
            new_date,
            new_start,
            self.appointments.clone(),
            self.cfg.missing_id_policy(),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MissingIdPolicy;
    use crate::AppointmentError;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn params() -> GenerationParams {
        GenerationParams {
            num_patients: 2,
            num_days: 3,
            appointment_duration: 30,
            time_interval: 120,
        }
    }

    fn session(policy: MissingIdPolicy) -> Session {
        let cfg = CoreConfig::default().with_missing_id_policy(policy);
        let mut session = Session::new(Arc::new(cfg));
        session.generate(&params(), today()).expect("generate");
        session
    }

    #[test]
    fn views_are_recomputed_after_mutation() {
        let mut session = session(MissingIdPolicy::Ignore);
        assert_eq!(session.appointments().len(), 30);

        // Full grid: every slot of every day holds both patients.
        assert_eq!(session.conflicts().len(), 30);
        assert_eq!(session.reminders(today()).len(), 10);

        session.cancel(AppointmentId(6)).expect("cancel");
        assert_eq!(session.appointments().len(), 29);
        assert_eq!(session.reminders(today()).len(), 9);

        // Patient_002's copy of the cancelled slot no longer conflicts.
        assert_eq!(session.conflicts().len(), 28);
    }

    #[test]
    fn reschedule_moves_one_appointment() {
        let mut session = session(MissingIdPolicy::Ignore);
        let far = NaiveDate::from_ymd_opt(2026, 11, 2).unwrap();
        let start = NaiveTime::from_hms_opt(10, 15, 0).unwrap();

        session
            .reschedule(AppointmentId(1), far, start)
            .expect("reschedule");

        let moved = &session.appointments()[0];
        assert_eq!(moved.date(), far);
        assert_eq!(moved.end_time(), NaiveTime::from_hms_opt(10, 45, 0).unwrap());
        assert!(session.conflicts().iter().all(|a| a.id() != AppointmentId(1)));
    }

    #[test]
    fn failed_mutation_keeps_previous_working_set() {
        let mut session = session(MissingIdPolicy::Reject);
        let before = session.appointments().to_vec();

        let err = session.cancel(AppointmentId(999)).expect_err("not found");
        assert!(matches!(err, AppointmentError::NotFound(_)));
        assert_eq!(session.appointments(), before.as_slice());

        let late = NaiveTime::from_hms_opt(23, 45, 0).unwrap();
        let err = session
            .reschedule(AppointmentId(1), today(), late)
            .expect_err("ends after midnight");
        assert!(matches!(err, AppointmentError::TimeOverflow { .. }));
        assert_eq!(session.appointments(), before.as_slice());
    }

    #[test]
    fn failed_generation_keeps_previous_working_set() {
        let mut session = session(MissingIdPolicy::Ignore);
        let bad = GenerationParams {
            time_interval: 0,
            ..params()
        };
        session.generate(&bad, today()).expect_err("invalid params");
        assert_eq!(session.appointments().len(), 30);
    }
}
