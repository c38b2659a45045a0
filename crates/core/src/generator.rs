//! Synthetic schedule generation.
//!
//! The generator builds a daily slot grid from the configured day bounds, then either books every
//! patient into every slot of every day ([`generate`]) or books each patient into one randomly
//! chosen slot per day ([`generate_sampled`]). Ids are assigned from 1 in iteration order:
//! patients outer, dates middle, slots inner.

use crate::appointment::{end_time_for, Appointment, AppointmentId, PatientId};
use crate::constants::{PATIENT_ID_PREFIX, PATIENT_ID_WIDTH};
use crate::{AppointmentError, AppointmentResult, CoreConfig, NonEmptyText};
use chrono::{Days, Duration, NaiveDate, NaiveTime};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Upper bound on the number of appointments a single generation request may produce.
pub const MAX_GENERATED_APPOINTMENTS: u64 = 1_000_000;

/// A candidate `(start_time, end_time)` pair within the daily grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Parameters for a generation request, as supplied by the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub num_patients: u32,
    pub num_days: u32,
    /// Appointment length in minutes.
    pub appointment_duration: u32,
    /// Minutes between consecutive candidate slot starts.
    pub time_interval: u32,
}

impl GenerationParams {
    /// Checks the preconditions every generation entry point relies on.
    pub fn validate(&self) -> AppointmentResult<()> {
        let checks = [
            (self.num_patients, "num_patients"),
            (self.num_days, "num_days"),
            (self.appointment_duration, "appointment_duration"),
            (self.time_interval, "time_interval"),
        ];
        for (value, name) in checks {
            if value == 0 {
                return Err(AppointmentError::InvalidInput(format!(
                    "{name} must be greater than zero"
                )));
            }
        }
        Ok(())
    }
}

/// Zero-padded synthetic patient identifiers `Patient_001..`.
pub fn patient_ids(num_patients: u32) -> AppointmentResult<Vec<PatientId>> {
    (1..=num_patients)
        .map(|i| {
            NonEmptyText::new(format!("{PATIENT_ID_PREFIX}{i:0width$}", width = PATIENT_ID_WIDTH))
                .map_err(AppointmentError::from)
        })
        .collect()
}

/// `num_days` consecutive dates starting at `first` (inclusive).
pub fn schedule_dates(first: NaiveDate, num_days: u32) -> AppointmentResult<Vec<NaiveDate>> {
    (0..num_days)
        .map(|offset| {
            first
                .checked_add_days(Days::new(u64::from(offset)))
                .ok_or_else(|| {
                    AppointmentError::InvalidInput(format!(
                        "date range starting {first} exceeds the supported calendar"
                    ))
                })
        })
        .collect()
}

/// The daily slot grid: starts from `day_start` through `day_end` inclusive, stepped by
/// `time_interval` minutes, each ending `appointment_duration` minutes later.
pub fn daily_slots(
    cfg: &CoreConfig,
    appointment_duration: u32,
    time_interval: u32,
) -> AppointmentResult<Vec<Slot>> {
    if time_interval == 0 {
        return Err(AppointmentError::InvalidInput(
            "time_interval must be greater than zero".into(),
        ));
    }

    let step = Duration::minutes(i64::from(time_interval));
    let mut slots = Vec::new();
    let mut start = cfg.day_start();

    loop {
        slots.push(Slot {
            start_time: start,
            end_time: end_time_for(start, appointment_duration)?,
        });

        let (next, wrapped_secs) = start.overflowing_add_signed(step);
        if wrapped_secs != 0 || next > cfg.day_end() || next <= start {
            break;
        }
        start = next;
    }

    Ok(slots)
}

struct Grid {
    patients: Vec<PatientId>,
    dates: Vec<NaiveDate>,
    slots: Vec<Slot>,
}

fn build_grid(cfg: &CoreConfig, params: &GenerationParams, today: NaiveDate) -> AppointmentResult<Grid> {
    params.validate()?;

    let slots = daily_slots(cfg, params.appointment_duration, params.time_interval)?;
    let total = u64::from(params.num_patients)
        .saturating_mul(u64::from(params.num_days))
        .saturating_mul(u64::try_from(slots.len()).unwrap_or(u64::MAX));
    if total > MAX_GENERATED_APPOINTMENTS {
        return Err(AppointmentError::InvalidInput(format!(
            "request would generate {total} appointments (limit {MAX_GENERATED_APPOINTMENTS})"
        )));
    }

    Ok(Grid {
        patients: patient_ids(params.num_patients)?,
        dates: schedule_dates(today, params.num_days)?,
        slots,
    })
}

struct IdSequence(u32);

impl IdSequence {
    fn next(&mut self) -> AppointmentId {
        self.0 += 1;
        AppointmentId(self.0)
    }
}

/// Books every patient into every slot of every day starting at `today`.
///
/// The result holds exactly `num_patients * num_days * slots_per_day` appointments with ids
/// `1..=len`.
pub fn generate(
    cfg: &CoreConfig,
    params: &GenerationParams,
    today: NaiveDate,
) -> AppointmentResult<Vec<Appointment>> {
    let grid = build_grid(cfg, params, today)?;
    let mut ids = IdSequence(0);
    let mut appointments =
        Vec::with_capacity(grid.patients.len() * grid.dates.len() * grid.slots.len());

    for patient in &grid.patients {
        for &date in &grid.dates {
            for slot in &grid.slots {
                appointments.push(Appointment::new(
                    ids.next(),
                    patient.clone(),
                    date,
                    slot.start_time,
                    params.appointment_duration,
                )?);
            }
        }
    }

    tracing::info!(
        patients = params.num_patients,
        days = params.num_days,
        slots_per_day = grid.slots.len(),
        total = appointments.len(),
        "generated appointment grid"
    );

    Ok(appointments)
}

/// Books each patient into one randomly chosen slot per day starting at `today`.
///
/// Independent draws mean two patients can land on the same slot, which is what produces
/// conflicts in a sampled schedule. Pass a seeded RNG for reproducible output.
pub fn generate_sampled<R: Rng + ?Sized>(
    cfg: &CoreConfig,
    params: &GenerationParams,
    today: NaiveDate,
    rng: &mut R,
) -> AppointmentResult<Vec<Appointment>> {
    let grid = build_grid(cfg, params, today)?;
    let mut ids = IdSequence(0);
    let mut appointments = Vec::with_capacity(grid.patients.len() * grid.dates.len());

    for patient in &grid.patients {
        for &date in &grid.dates {
            let slot = grid.slots.choose(rng).ok_or_else(|| {
                AppointmentError::InvalidInput("daily slot grid is empty".into())
            })?;
            appointments.push(Appointment::new(
                ids.next(),
                patient.clone(),
                date,
                slot.start_time,
                params.appointment_duration,
            )?);
        }
    }

    tracing::info!(
        patients = params.num_patients,
        days = params.num_days,
        total = appointments.len(),
        "generated sampled schedule"
    );

    Ok(appointments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn params(p: u32, d: u32, dur: u32, interval: u32) -> GenerationParams {
        GenerationParams {
            num_patients: p,
            num_days: d,
            appointment_duration: dur,
            time_interval: interval,
        }
    }

    #[test]
    fn two_hour_grid_has_exact_slots() {
        let appts = generate(&CoreConfig::default(), &params(1, 1, 30, 120), today())
            .expect("generate");

        let pairs: Vec<(NaiveTime, NaiveTime)> = appts
            .iter()
            .map(|a| (a.start_time(), a.end_time()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (time(9, 0), time(9, 30)),
                (time(11, 0), time(11, 30)),
                (time(13, 0), time(13, 30)),
                (time(15, 0), time(15, 30)),
                (time(17, 0), time(17, 30)),
            ]
        );
        assert!(appts.iter().all(|a| a.date() == today()));
        assert!(appts.iter().all(|a| a.patient_id().as_str() == "Patient_001"));
    }

    #[test]
    fn count_and_ids_cover_full_product() {
        let cfg = CoreConfig::default();
        let p = params(3, 4, 20, 60);
        let slots = daily_slots(&cfg, 20, 60).expect("slots").len();
        assert_eq!(slots, 9);

        let appts = generate(&cfg, &p, today()).expect("generate");
        assert_eq!(appts.len(), 3 * 4 * slots);

        let ids: Vec<u32> = appts.iter().map(|a| a.id().0).collect();
        let expected: Vec<u32> = (1..=appts.len() as u32).collect();
        assert_eq!(ids, expected);

        for appt in &appts {
            assert_eq!(
                appt.end_time(),
                appt.start_time() + Duration::minutes(i64::from(appt.duration_minutes()))
            );
        }
    }

    #[test]
    fn iteration_order_is_patient_then_date_then_slot() {
        let appts =
            generate(&CoreConfig::default(), &params(2, 2, 30, 240), today()).expect("generate");
        // 09:00, 13:00, 17:00 per day
        assert_eq!(appts.len(), 12);

        assert_eq!(appts[0].patient_id().as_str(), "Patient_001");
        assert_eq!(appts[0].start_time(), time(9, 0));
        assert_eq!(appts[1].start_time(), time(13, 0));
        assert_eq!(appts[3].date(), today().succ_opt().unwrap());
        assert_eq!(appts[6].patient_id().as_str(), "Patient_002");
        assert_eq!(appts[6].date(), today());
    }

    #[test]
    fn patient_ids_are_zero_padded() {
        let ids = patient_ids(12).expect("ids");
        assert_eq!(ids[0].as_str(), "Patient_001");
        assert_eq!(ids[11].as_str(), "Patient_012");
    }

    #[test]
    fn rejects_non_positive_parameters() {
        let cfg = CoreConfig::default();
        for bad in [params(0, 1, 30, 60), params(1, 0, 30, 60), params(1, 1, 0, 60), params(1, 1, 30, 0)] {
            let err = generate(&cfg, &bad, today()).expect_err("zero parameter rejected");
            assert!(matches!(err, AppointmentError::InvalidInput(_)));
        }
    }

    #[test]
    fn rejects_durations_running_past_midnight() {
        let err = generate(&CoreConfig::default(), &params(1, 1, 8 * 60, 60), today())
            .expect_err("17:00 + 8h wraps");
        assert!(matches!(err, AppointmentError::TimeOverflow { .. }));
    }

    #[test]
    fn rejects_oversized_requests() {
        let err = generate(&CoreConfig::default(), &params(100_000, 100, 30, 15), today())
            .expect_err("too many appointments");
        assert!(matches!(err, AppointmentError::InvalidInput(_)));
    }

    #[test]
    fn sampled_generation_books_one_slot_per_patient_day() {
        let cfg = CoreConfig::default();
        let grid: HashSet<NaiveTime> = daily_slots(&cfg, 30, 120)
            .expect("slots")
            .into_iter()
            .map(|s| s.start_time)
            .collect();

        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let appts =
            generate_sampled(&cfg, &params(5, 7, 30, 120), today(), &mut rng).expect("sampled");

        assert_eq!(appts.len(), 35);
        let ids: Vec<u32> = appts.iter().map(|a| a.id().0).collect();
        assert_eq!(ids, (1..=35).collect::<Vec<u32>>());
        assert!(appts.iter().all(|a| grid.contains(&a.start_time())));

        let per_patient_day: HashSet<(String, NaiveDate)> = appts
            .iter()
            .map(|a| (a.patient_id().to_string(), a.date()))
            .collect();
        assert_eq!(per_patient_day.len(), 35);
    }

    #[test]
    fn sampled_generation_is_reproducible_with_a_seed() {
        let cfg = CoreConfig::default();
        let p = params(4, 3, 30, 60);
        let a = generate_sampled(&cfg, &p, today(), &mut ChaCha8Rng::seed_from_u64(7)).unwrap();
        let b = generate_sampled(&cfg, &p, today(), &mut ChaCha8Rng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
    }
}
