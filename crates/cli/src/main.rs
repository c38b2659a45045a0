use anyhow::Context;
use appointment_core::{
    config::{core_config_from_env_values, parse_time_of_day},
    dispatch_reminders, local_today, Appointment, AppointmentId, Contact, CoreConfig,
    EmailAddress, GenerationParams, MissingIdPolicy, NonEmptyText, PatientId, PhoneNumber,
    Session, TracingSink,
};
use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "appointments")]
#[command(about = "Appointment scheduling CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Flags shared by every command: how to build the working set.
#[derive(Args, Clone, Debug)]
struct ScheduleArgs {
    /// Number of patients
    #[arg(long, default_value_t = 5)]
    patients: u32,
    /// Number of days, starting today
    #[arg(long, default_value_t = 7)]
    days: u32,
    /// Appointment length in minutes
    #[arg(long, default_value_t = 30)]
    duration: u32,
    /// Minutes between candidate slot starts
    #[arg(long, default_value_t = 120)]
    interval: u32,
    /// Book one random slot per patient per day instead of every slot
    #[arg(long)]
    sampled: bool,
    /// Seed for --sampled
    #[arg(long, requires = "sampled")]
    seed: Option<u64>,
    /// Override today's date (YYYY-MM-DD)
    #[arg(long)]
    today: Option<NaiveDate>,
    /// Fail when cancel/reschedule targets an unknown id
    #[arg(long)]
    strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate and list appointments
    Generate {
        #[command(flatten)]
        schedule: ScheduleArgs,
    },
    /// List double-booked appointments
    Conflicts {
        #[command(flatten)]
        schedule: ScheduleArgs,
        /// Print one line per conflicting slot instead of per appointment
        #[arg(long)]
        grouped: bool,
    },
    /// Render reminders for tomorrow's appointments
    Reminders {
        #[command(flatten)]
        schedule: ScheduleArgs,
        /// Hand reminders to the notification sink
        #[arg(long)]
        send: bool,
        /// Patient contact as PATIENT=EMAIL or PATIENT=PHONE (repeatable)
        #[arg(long = "contact", value_name = "PATIENT=ADDRESS")]
        contacts: Vec<String>,
    },
    /// Cancel an appointment and list the remaining ones
    Cancel {
        /// Appointment id
        id: u32,
        #[command(flatten)]
        schedule: ScheduleArgs,
    },
    /// Move an appointment to a new date and start time
    Reschedule {
        /// Appointment id
        id: u32,
        /// New date (YYYY-MM-DD)
        new_date: NaiveDate,
        /// New start time (HH:MM)
        #[arg(value_parser = parse_start_time)]
        new_start: NaiveTime,
        #[command(flatten)]
        schedule: ScheduleArgs,
    },
}

fn parse_start_time(value: &str) -> Result<NaiveTime, String> {
    parse_time_of_day(value).map_err(|e| e.to_string())
}

fn parse_contact(value: &str) -> anyhow::Result<(PatientId, Contact)> {
    let (patient, address) = value
        .split_once('=')
        .with_context(|| format!("contact '{value}' must look like PATIENT=ADDRESS"))?;
    let patient_id = NonEmptyText::new(patient)?;
    let contact = if address.contains('@') {
        Contact::new(Some(EmailAddress::parse(address)?), None)?
    } else {
        Contact::new(None, Some(PhoneNumber::parse(address)?))?
    };
    Ok((patient_id, contact))
}

fn load_config() -> anyhow::Result<CoreConfig> {
    let cfg = core_config_from_env_values(
        std::env::var("APPOINTMENT_DAY_START").ok(),
        std::env::var("APPOINTMENT_DAY_END").ok(),
        std::env::var("APPOINTMENT_REMINDER_TEMPLATE").ok(),
        std::env::var("APPOINTMENT_MISSING_ID_POLICY").ok(),
    )?;
    Ok(cfg)
}

fn build_session(cfg: CoreConfig, args: &ScheduleArgs) -> anyhow::Result<(Session, NaiveDate)> {
    let cfg = if args.strict {
        cfg.with_missing_id_policy(MissingIdPolicy::Reject)
    } else {
        cfg
    };
    let today = args.today.unwrap_or_else(local_today);
    let params = GenerationParams {
        num_patients: args.patients,
        num_days: args.days,
        appointment_duration: args.duration,
        time_interval: args.interval,
    };

    let mut session = Session::new(Arc::new(cfg));
    if args.sampled {
        let mut rng = match args.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        session.generate_sampled(&params, today, &mut rng)?;
    } else {
        session.generate(&params, today)?;
    }

    Ok((session, today))
}

fn print_appointments(appointments: &[Appointment]) {
    if appointments.is_empty() {
        println!("No appointments.");
        return;
    }
    for appt in appointments {
        println!(
            "ID: {}, Patient: {}, Date: {}, Time: {}-{} ({} min)",
            appt.id(),
            appt.patient_id(),
            appt.date(),
            appt.start_time().format("%H:%M"),
            appt.end_time().format("%H:%M"),
            appt.duration_minutes()
        );
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("appointment_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = load_config()?;

    match cli.command {
        Some(Commands::Generate { schedule }) => {
            let (session, _) = build_session(cfg, &schedule)?;
            print_appointments(session.appointments());
        }
        Some(Commands::Conflicts { schedule, grouped }) => {
            let (session, _) = build_session(cfg, &schedule)?;
            if grouped {
                let groups = session.conflict_groups();
                if groups.is_empty() {
                    println!("No scheduling conflicts found!");
                }
                for group in groups {
                    let ids: Vec<String> =
                        group.appointment_ids.iter().map(ToString::to_string).collect();
                    println!(
                        "{} {}-{}: appointments {}",
                        group.date,
                        group.start_time.format("%H:%M"),
                        group.end_time.format("%H:%M"),
                        ids.join(", ")
                    );
                }
            } else {
                let conflicts = session.conflicts();
                if conflicts.is_empty() {
                    println!("No scheduling conflicts found!");
                } else {
                    print_appointments(&conflicts);
                }
            }
        }
        Some(Commands::Reminders {
            schedule,
            send,
            contacts,
        }) => {
            let (session, today) = build_session(cfg, &schedule)?;
            let reminders = session.reminders(today);
            if reminders.is_empty() {
                println!("No appointments scheduled for tomorrow.");
            }
            for reminder in &reminders {
                println!("{}: {}", reminder.patient_id, reminder.message);
            }

            if send {
                let contacts = contacts
                    .iter()
                    .map(|c| parse_contact(c))
                    .collect::<anyhow::Result<HashMap<_, _>>>()?;
                let summary = dispatch_reminders(&TracingSink, &reminders, &contacts);
                println!(
                    "Dispatched: {} delivered, {} failed, {} without contact",
                    summary.delivered, summary.failed, summary.skipped_no_contact
                );
            }
        }
        Some(Commands::Cancel { id, schedule }) => {
            let (mut session, _) = build_session(cfg, &schedule)?;
            match session.cancel(AppointmentId(id)) {
                Ok(()) => {
                    println!("Cancelled appointment {id}");
                    print_appointments(session.appointments());
                }
                Err(e) => eprintln!("Error cancelling appointment: {}", e),
            }
        }
        Some(Commands::Reschedule {
            id,
            new_date,
            new_start,
            schedule,
        }) => {
            let (mut session, _) = build_session(cfg, &schedule)?;
            match session.reschedule(AppointmentId(id), new_date, new_start) {
                Ok(()) => {
                    println!("Rescheduled appointment {id}");
                    print_appointments(session.appointments());
                }
                Err(e) => eprintln!("Error rescheduling appointment: {}", e),
            }
        }
        None => {
            println!("Use 'appointments --help' for commands");
        }
    }

    Ok(())
}
