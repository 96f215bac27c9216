//! End-to-end check-in scenarios.
//!
//! Runs `CheckInService` against the in-memory and file-backed stores, with
//! the recording dispatcher and with the Resend adapter behind a mocked
//! HTTP server.

use alive_core::dispatch::{DispatchCall, RecordingDispatcher};
use alive_core::storage::{self, DispatcherConfig, KeyValueStore, SETTINGS_KEY, STATE_KEY};
use alive_core::{
    CheckInLedger, CheckInOutcome, CheckInService, DeliveryHandle, FileStore, LivenessStatus,
    MemoryStore, ResendDispatcher, Settings,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use mockito::Matcher;
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// Test Helpers
// ============================================================================

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

fn full_settings() -> Settings {
    Settings {
        name: "Amery".to_string(),
        email: "friend@example.com".to_string(),
        resend_api_key: "re_test_key".to_string(),
    }
}

fn store_with(settings: &Settings, ledger: Option<&CheckInLedger>) -> MemoryStore {
    let store = MemoryStore::new();
    storage::save_record(&store, SETTINGS_KEY, settings).unwrap();
    if let Some(ledger) = ledger {
        storage::save_record(&store, STATE_KEY, ledger).unwrap();
    }
    store
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn scenario_a_first_check_in() {
    let dispatcher = RecordingDispatcher::new();
    let service =
        CheckInService::open(store_with(&full_settings(), None), dispatcher.clone()).unwrap();
    assert_eq!(service.current_status(t0()), LivenessStatus::NeverCheckedIn);

    let outcome = service.check_in(t0()).await.unwrap();

    assert_eq!(outcome, CheckInOutcome::Success);
    assert_eq!(
        service.ledger(),
        CheckInLedger::checked_in(t0(), DeliveryHandle::new("id1"))
    );
    assert_eq!(service.current_status(t0()), LivenessStatus::WithinGrace);
}

#[tokio::test]
async fn scenario_b_cancel_failure_does_not_block() {
    let before = CheckInLedger::checked_in(t0(), DeliveryHandle::new("id1"));
    let dispatcher = RecordingDispatcher::new().with_issued(1);
    dispatcher.fail_cancel(true);
    let service = CheckInService::open(
        store_with(&full_settings(), Some(&before)),
        dispatcher.clone(),
    )
    .unwrap();
    let t1 = t0() + Duration::hours(1);

    let outcome = service.check_in(t1).await.unwrap();

    assert_eq!(outcome, CheckInOutcome::Success);
    assert_eq!(
        service.ledger(),
        CheckInLedger::checked_in(t1, DeliveryHandle::new("id2"))
    );
    let calls = dispatcher.calls();
    assert_eq!(
        calls[0],
        DispatchCall::Cancel {
            handle: DeliveryHandle::new("id1")
        }
    );
    match &calls[1] {
        DispatchCall::Schedule { deadline, .. } => assert_eq!(*deadline, t1 + Duration::hours(48)),
        other => panic!("expected schedule, got {other:?}"),
    }
}

#[tokio::test]
async fn scenario_c_schedule_failure_leaves_ledger() {
    let before = CheckInLedger::checked_in(t0(), DeliveryHandle::new("id1"));
    let store = store_with(&full_settings(), Some(&before));
    let dispatcher = RecordingDispatcher::new();
    dispatcher.fail_schedule(Some("network unreachable"));
    let service = CheckInService::open(store.clone(), dispatcher.clone()).unwrap();

    let outcome = service.check_in(t0() + Duration::hours(1)).await.unwrap();

    assert!(matches!(outcome, CheckInOutcome::ScheduleFailed(ref r) if r.contains("network unreachable")));
    assert_eq!(service.ledger(), before);
    let stored: CheckInLedger = storage::load_record(&store, STATE_KEY).unwrap();
    assert_eq!(stored, before);
}

#[tokio::test]
async fn scenario_d_missing_credential_makes_no_calls() {
    let settings = Settings {
        resend_api_key: String::new(),
        ..full_settings()
    };
    let before = CheckInLedger::checked_in(t0(), DeliveryHandle::new("id1"));
    let dispatcher = RecordingDispatcher::new();
    let service =
        CheckInService::open(store_with(&settings, Some(&before)), dispatcher.clone()).unwrap();

    let outcome = service.check_in(t0() + Duration::hours(2)).await.unwrap();

    assert_eq!(outcome, CheckInOutcome::MissingCredentials);
    assert!(outcome.needs_configuration());
    assert!(dispatcher.calls().is_empty());
    assert_eq!(service.ledger(), before);
}

#[tokio::test]
async fn repeated_failures_never_advance_the_ledger() {
    let before = CheckInLedger::checked_in(t0(), DeliveryHandle::new("id1"));
    let dispatcher = RecordingDispatcher::new();
    dispatcher.fail_schedule(Some("provider down"));
    let service = CheckInService::open(
        store_with(&full_settings(), Some(&before)),
        dispatcher.clone(),
    )
    .unwrap();

    for hour in 1..=5 {
        let outcome = service.check_in(t0() + Duration::hours(hour)).await.unwrap();
        assert!(matches!(outcome, CheckInOutcome::ScheduleFailed(_)));
        assert_eq!(service.ledger(), before);
    }
    assert_eq!(dispatcher.schedule_count(), 5);
    assert_eq!(
        service.current_status(t0() + Duration::hours(48)),
        LivenessStatus::Overdue
    );

    // Recovery: the next successful check-in cancels the still-recorded handle.
    dispatcher.fail_schedule(None);
    let t6 = t0() + Duration::hours(49);
    assert_eq!(service.check_in(t6).await.unwrap(), CheckInOutcome::Success);
    assert_eq!(service.current_status(t6), LivenessStatus::WithinGrace);
    assert_eq!(
        dispatcher.calls().last(),
        Some(&DispatchCall::Schedule {
            deadline: t6 + Duration::hours(48),
            message: alive_core::message::compose(
                &full_settings().contact().unwrap(),
                t6
            ),
        })
    );
}

#[tokio::test]
async fn status_progresses_with_time_until_next_check_in() {
    let service = CheckInService::open(
        store_with(&full_settings(), None),
        RecordingDispatcher::new(),
    )
    .unwrap();
    service.check_in(t0()).await.unwrap();

    assert_eq!(service.current_status(t0() + Duration::hours(23)), LivenessStatus::WithinGrace);
    assert_eq!(
        service.current_status(t0() + Duration::hours(24)),
        LivenessStatus::AwaitingCheckIn
    );
    assert_eq!(service.current_status(t0() + Duration::hours(48)), LivenessStatus::Overdue);

    service.check_in(t0() + Duration::hours(50)).await.unwrap();
    assert_eq!(
        service.current_status(t0() + Duration::hours(50)),
        LivenessStatus::WithinGrace
    );
}

// ============================================================================
// File-backed persistence
// ============================================================================

#[tokio::test]
async fn ledger_survives_service_restart() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::new(temp_dir.path());
    storage::save_record(&store, SETTINGS_KEY, &full_settings()).unwrap();

    {
        let service = CheckInService::open(store.clone(), RecordingDispatcher::new()).unwrap();
        service.check_in(t0()).await.unwrap();
    }

    let raw = store.get(STATE_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        value,
        json!({ "lastCheckIn": t0().timestamp_millis(), "scheduledEmailId": "id1" })
    );

    let dispatcher = RecordingDispatcher::new().with_issued(1);
    let reopened = CheckInService::open(FileStore::new(temp_dir.path()), dispatcher.clone()).unwrap();
    assert_eq!(reopened.ledger().scheduled_delivery_id, Some(DeliveryHandle::new("id1")));

    reopened.check_in(t0() + Duration::hours(3)).await.unwrap();
    assert_eq!(
        dispatcher.calls()[0],
        DispatchCall::Cancel {
            handle: DeliveryHandle::new("id1")
        }
    );
}

// ============================================================================
// Resend adapter end to end
// ============================================================================

#[tokio::test]
async fn check_in_against_mocked_resend() {
    let mut server = mockito::Server::new_async().await;
    let cancel = server
        .mock("POST", "/emails/old-id/cancel")
        .match_header("authorization", "Bearer re_test_key")
        .with_status(200)
        .with_body(r#"{"object":"email","id":"old-id"}"#)
        .expect(1)
        .create_async()
        .await;
    let schedule = server
        .mock("POST", "/emails")
        .match_header("authorization", "Bearer re_test_key")
        .match_body(Matcher::PartialJson(json!({
            "to": "friend@example.com",
            "scheduled_at": "2026-01-03T01:00:00.000Z",
        })))
        .with_status(200)
        .with_body(r#"{"id":"new-id"}"#)
        .expect(1)
        .create_async()
        .await;

    let before = CheckInLedger::checked_in(t0(), DeliveryHandle::new("old-id"));
    let dispatcher = ResendDispatcher::new(&DispatcherConfig {
        base_url: server.url(),
        ..DispatcherConfig::default()
    })
    .unwrap();
    let service =
        CheckInService::open(store_with(&full_settings(), Some(&before)), dispatcher).unwrap();
    let t1 = t0() + Duration::hours(1);

    let outcome = service.check_in(t1).await.unwrap();

    assert_eq!(outcome, CheckInOutcome::Success);
    assert_eq!(
        service.ledger(),
        CheckInLedger::checked_in(t1, DeliveryHandle::new("new-id"))
    );
    cancel.assert_async().await;
    schedule.assert_async().await;
}

#[tokio::test]
async fn rejected_key_surfaces_provider_reason() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/emails")
        .with_status(403)
        .with_body(r#"{"statusCode":403,"message":"The API key is restricted"}"#)
        .create_async()
        .await;

    let dispatcher = ResendDispatcher::new(&DispatcherConfig {
        base_url: server.url(),
        ..DispatcherConfig::default()
    })
    .unwrap();
    let service =
        CheckInService::open(store_with(&full_settings(), None), dispatcher).unwrap();

    let outcome = service.check_in(t0()).await.unwrap();

    assert_eq!(
        outcome,
        CheckInOutcome::ScheduleFailed("The API key is restricted (HTTP 403)".to_string())
    );
    assert_eq!(service.ledger(), CheckInLedger::empty());
}
