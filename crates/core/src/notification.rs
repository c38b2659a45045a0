//! Hand-off of rendered reminders to an external delivery channel.
//!
//! The engine only knows the [`NotificationSink`] trait. Delivery outcomes never flow back into
//! reminder generation: failures are logged and counted in the [`DispatchSummary`].

use crate::appointment::PatientId;
use crate::reminders::Reminder;
use crate::{AppointmentError, AppointmentResult, EmailAddress, PhoneNumber};
use serde::Serialize;
use std::collections::HashMap;

/// Where a patient can be reached. At least one channel is present.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Contact {
    email: Option<EmailAddress>,
    phone: Option<PhoneNumber>,
}

impl Contact {
    pub fn new(email: Option<EmailAddress>, phone: Option<PhoneNumber>) -> AppointmentResult<Self> {
        if email.is_none() && phone.is_none() {
            return Err(AppointmentError::InvalidInput(
                "contact requires an email address or a phone number".into(),
            ));
        }
        Ok(Self { email, phone })
    }

    pub fn email(&self) -> Option<&EmailAddress> {
        self.email.as_ref()
    }

    pub fn phone(&self) -> Option<&PhoneNumber> {
        self.phone.as_ref()
    }
}

/// Failure reported by a sink for a single message.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("delivery channel unavailable: {0}")]
    Unavailable(String),
    #[error("recipient rejected: {0}")]
    Rejected(String),
}

/// An email/SMS gateway or anything else that can carry a reminder to a patient.
pub trait NotificationSink {
    fn send(
        &self,
        patient_id: &PatientId,
        message: &str,
        contact: &Contact,
    ) -> Result<(), DeliveryError>;
}

/// Sink that records each delivery as a `tracing` event instead of sending it.
#[derive(Clone, Debug, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn send(
        &self,
        patient_id: &PatientId,
        message: &str,
        contact: &Contact,
    ) -> Result<(), DeliveryError> {
        tracing::info!(
            %patient_id,
            email = contact.email().map(EmailAddress::as_str),
            phone = contact.phone().map(PhoneNumber::as_str),
            message,
            "reminder dispatched"
        );
        Ok(())
    }
}

/// Counts of what happened during a dispatch run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub delivered: usize,
    pub failed: usize,
    pub skipped_no_contact: usize,
}

impl DispatchSummary {
    /// Number of reminders handed to the sink.
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Hands every reminder to `sink`, looking up the patient's contact in `contacts`.
///
/// Reminders for patients without a contact are skipped. Sink errors are logged and counted,
/// never returned.
pub fn dispatch_reminders<S: NotificationSink + ?Sized>(
    sink: &S,
    reminders: &[Reminder],
    contacts: &HashMap<PatientId, Contact>,
) -> DispatchSummary {
    let mut summary = DispatchSummary::default();

    for reminder in reminders {
        let Some(contact) = contacts.get(&reminder.patient_id) else {
            tracing::debug!(patient_id = %reminder.patient_id, "no contact on file; skipping reminder");
            summary.skipped_no_contact += 1;
            continue;
        };

        match sink.send(&reminder.patient_id, &reminder.message, contact) {
            Ok(()) => summary.delivered += 1,
            Err(e) => {
                tracing::warn!(
                    patient_id = %reminder.patient_id,
                    appointment_id = %reminder.appointment_id,
                    error = %e,
                    "reminder delivery failed"
                );
                summary.failed += 1;
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointment::AppointmentId;
    use crate::NonEmptyText;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingSink {
        sent: RefCell<Vec<(String, String)>>,
        fail_for: Option<String>,
    }

    impl NotificationSink for RecordingSink {
        fn send(
            &self,
            patient_id: &PatientId,
            message: &str,
            _contact: &Contact,
        ) -> Result<(), DeliveryError> {
            if self.fail_for.as_deref() == Some(patient_id.as_str()) {
                return Err(DeliveryError::Unavailable("smtp timeout".into()));
            }
            self.sent
                .borrow_mut()
                .push((patient_id.to_string(), message.to_string()));
            Ok(())
        }
    }

    fn patient(id: &str) -> PatientId {
        NonEmptyText::new(id).unwrap()
    }

    fn reminder(appointment_id: u32, patient_id: &str) -> Reminder {
        Reminder {
            appointment_id: AppointmentId(appointment_id),
            patient_id: patient(patient_id),
            message: format!("reminder {appointment_id}"),
        }
    }

    fn email_contact(address: &str) -> Contact {
        Contact::new(Some(EmailAddress::parse(address).unwrap()), None).unwrap()
    }

    #[test]
    fn contact_requires_a_channel() {
        let err = Contact::new(None, None).expect_err("empty contact rejected");
        assert!(matches!(err, AppointmentError::InvalidInput(_)));

        let phone_only = Contact::new(None, Some(PhoneNumber::parse("07700 900123").unwrap()))
            .expect("phone-only contact");
        assert!(phone_only.email().is_none());
        assert_eq!(phone_only.phone().unwrap().as_str(), "07700900123");
    }

    #[test]
    fn delivers_to_patients_with_contacts_and_skips_the_rest() {
        let sink = RecordingSink::default();
        let contacts = HashMap::from([
            (patient("Patient_001"), email_contact("one@example.org")),
            (patient("Patient_002"), email_contact("two@example.org")),
        ]);
        let reminders = vec![
            reminder(1, "Patient_001"),
            reminder(2, "Patient_003"),
            reminder(3, "Patient_002"),
        ];

        let summary = dispatch_reminders(&sink, &reminders, &contacts);

        assert_eq!(
            summary,
            DispatchSummary {
                delivered: 2,
                failed: 0,
                skipped_no_contact: 1
            }
        );
        let sent = sink.sent.borrow();
        assert_eq!(sent[0], ("Patient_001".to_string(), "reminder 1".to_string()));
        assert_eq!(sent[1], ("Patient_002".to_string(), "reminder 3".to_string()));
    }

    #[test]
    fn sink_failures_are_counted_not_propagated() {
        let sink = RecordingSink {
            fail_for: Some("Patient_001".into()),
            ..Default::default()
        };
        let contacts = HashMap::from([
            (patient("Patient_001"), email_contact("one@example.org")),
            (patient("Patient_002"), email_contact("two@example.org")),
        ]);
        let reminders = vec![reminder(1, "Patient_001"), reminder(2, "Patient_002")];

        let summary = dispatch_reminders(&sink, &reminders, &contacts);

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.delivered, 1);
        assert_eq!(summary.attempted(), 2);
    }

    #[test]
    fn tracing_sink_always_accepts() {
        let contact = email_contact("one@example.org");
        TracingSink
            .send(&patient("Patient_001"), "hello", &contact)
            .expect("tracing sink never fails");
    }
}
