//! Deadline scheduler: keeps exactly one outstanding notification aligned
//! with the latest check-in.
//!
//! A check-in runs `cancel(old) -> compose -> schedule(now + 48h)`.
//! Cancellation is best-effort; scheduling defines success. If scheduling
//! fails the ledger comes back untouched, so the previous notification (if
//! any) stays the record.
//!
//! Cancel and schedule are two separate provider calls. A crash between
//! them leaves no outstanding notification until the next check-in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::dispatch::{Credential, NotificationDispatcher};
use crate::ledger::CheckInLedger;
use crate::liveness;
use crate::message;
use crate::storage::Contact;

/// Result of one check-in attempt. Only `Success` changes the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum CheckInOutcome {
    Success,
    MissingCredentials,
    MissingContact,
    /// Provider refused or could not be reached; carries its reason verbatim.
    ScheduleFailed(String),
}

impl CheckInOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CheckInOutcome::Success)
    }

    /// True when the user has to finish configuration before checking in.
    pub fn needs_configuration(&self) -> bool {
        matches!(
            self,
            CheckInOutcome::MissingContact | CheckInOutcome::MissingCredentials
        )
    }
}

pub struct DeadlineScheduler<D> {
    dispatcher: D,
}

impl<D: NotificationDispatcher> DeadlineScheduler<D> {
    pub fn new(dispatcher: D) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Move the deadline to `now + 48h`.
    ///
    /// Returns the ledger to keep and the outcome. Preconditions are checked
    /// before any provider call: no contact gives `MissingContact`, no
    /// credential gives `MissingCredentials`. Past that, exactly one cancel
    /// (when a handle is held) and one schedule request are made, never
    /// retried.
    pub async fn perform_check_in(
        &self,
        now: DateTime<Utc>,
        ledger: CheckInLedger,
        contact: Option<&Contact>,
        credential: Option<&Credential>,
    ) -> (CheckInLedger, CheckInOutcome) {
        let Some(contact) = contact.filter(|c| c.is_complete()) else {
            return (ledger, CheckInOutcome::MissingContact);
        };
        let Some(credential) = credential else {
            return (ledger, CheckInOutcome::MissingCredentials);
        };

        if let Some(previous) = &ledger.scheduled_delivery_id {
            if !self.dispatcher.cancel(credential, previous).await {
                // Already delivered, unknown to the provider, or unreachable.
                warn!(handle = %previous, "previous notification was not cancelled");
            }
        }

        let message = message::compose(contact, now);
        let deadline = liveness::deadline_at(now);

        match self.dispatcher.schedule(credential, deadline, &message).await {
            Ok(handle) => {
                info!(handle = %handle, deadline = %deadline, "check-in recorded");
                (CheckInLedger::checked_in(now, handle), CheckInOutcome::Success)
            }
            Err(e) => {
                error!(error = %e, "failed to schedule notification");
                (ledger, CheckInOutcome::ScheduleFailed(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{DeliveryHandle, DispatchCall, RecordingDispatcher};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 7, 0, 0).unwrap()
    }

    fn contact() -> Contact {
        Contact {
            name: "Amery".to_string(),
            email_address: "friend@example.com".to_string(),
        }
    }

    fn credential() -> Credential {
        Credential::new("re_key").unwrap()
    }

    #[tokio::test]
    async fn first_check_in_schedules_without_cancel() {
        let dispatcher = RecordingDispatcher::new();
        let scheduler = DeadlineScheduler::new(dispatcher.clone());

        let (ledger, outcome) = scheduler
            .perform_check_in(t0(), CheckInLedger::empty(), Some(&contact()), Some(&credential()))
            .await;

        assert_eq!(outcome, CheckInOutcome::Success);
        assert_eq!(ledger, CheckInLedger::checked_in(t0(), DeliveryHandle::new("id1")));
        assert_eq!(dispatcher.cancel_count(), 0);
        match &dispatcher.calls()[..] {
            [DispatchCall::Schedule { deadline, message }] => {
                assert_eq!(*deadline, t0() + Duration::hours(48));
                assert_eq!(message.recipient, "friend@example.com");
            }
            calls => panic!("unexpected calls: {calls:?}"),
        }
    }

    #[tokio::test]
    async fn cancels_previous_handle_before_scheduling() {
        let dispatcher = RecordingDispatcher::new().with_issued(1);
        let scheduler = DeadlineScheduler::new(dispatcher.clone());
        let before = CheckInLedger::checked_in(t0(), DeliveryHandle::new("id1"));
        let t1 = t0() + Duration::hours(1);

        let (ledger, outcome) = scheduler
            .perform_check_in(t1, before, Some(&contact()), Some(&credential()))
            .await;

        assert!(outcome.is_success());
        assert_eq!(ledger, CheckInLedger::checked_in(t1, DeliveryHandle::new("id2")));
        let calls = dispatcher.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0],
            DispatchCall::Cancel {
                handle: DeliveryHandle::new("id1")
            }
        );
        assert!(matches!(calls[1], DispatchCall::Schedule { .. }));
    }

    #[tokio::test]
    async fn cancel_failure_does_not_block() {
        let dispatcher = RecordingDispatcher::new().with_issued(1);
        dispatcher.fail_cancel(true);
        let scheduler = DeadlineScheduler::new(dispatcher.clone());
        let t1 = t0() + Duration::hours(1);

        let (ledger, outcome) = scheduler
            .perform_check_in(
                t1,
                CheckInLedger::checked_in(t0(), DeliveryHandle::new("id1")),
                Some(&contact()),
                Some(&credential()),
            )
            .await;

        assert_eq!(outcome, CheckInOutcome::Success);
        assert_eq!(ledger, CheckInLedger::checked_in(t1, DeliveryHandle::new("id2")));
    }

    #[tokio::test]
    async fn schedule_failure_keeps_ledger() {
        let dispatcher = RecordingDispatcher::new();
        dispatcher.fail_schedule(Some("API key is invalid"));
        let scheduler = DeadlineScheduler::new(dispatcher.clone());
        let before = CheckInLedger::checked_in(t0(), DeliveryHandle::new("id1"));

        let (ledger, outcome) = scheduler
            .perform_check_in(
                t0() + Duration::hours(5),
                before.clone(),
                Some(&contact()),
                Some(&credential()),
            )
            .await;

        assert_eq!(ledger, before);
        match outcome {
            CheckInOutcome::ScheduleFailed(reason) => assert!(reason.contains("API key is invalid")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(dispatcher.cancel_count(), 1);
        assert_eq!(dispatcher.schedule_count(), 1);
    }

    #[tokio::test]
    async fn missing_configuration_makes_no_calls() {
        let dispatcher = RecordingDispatcher::new();
        let scheduler = DeadlineScheduler::new(dispatcher.clone());
        let before = CheckInLedger::checked_in(t0(), DeliveryHandle::new("id1"));

        let (ledger, outcome) = scheduler
            .perform_check_in(t0(), before.clone(), Some(&contact()), None)
            .await;
        assert_eq!(outcome, CheckInOutcome::MissingCredentials);
        assert_eq!(ledger, before);

        let blank = Contact {
            name: String::new(),
            ..contact()
        };
        let (ledger, outcome) = scheduler
            .perform_check_in(t0(), before.clone(), Some(&blank), Some(&credential()))
            .await;
        assert_eq!(outcome, CheckInOutcome::MissingContact);
        assert!(outcome.needs_configuration());
        assert_eq!(ledger, before);

        assert!(dispatcher.calls().is_empty());
    }

    #[test]
    fn outcome_serializes_with_reason() {
        let json = serde_json::to_value(CheckInOutcome::ScheduleFailed("down".into())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "outcome": "schedule_failed", "reason": "down" })
        );
        let json = serde_json::to_value(CheckInOutcome::Success).unwrap();
        assert_eq!(json, serde_json::json!({ "outcome": "success" }));
    }
}
