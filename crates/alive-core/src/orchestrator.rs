//! Check-in use case.
//!
//! `CheckInService` loads settings and ledger once, runs check-ins through
//! the [`DeadlineScheduler`] and writes the ledger back after every
//! successful one. It is the only writer of the ledger.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::error;

use crate::dispatch::{DeliveryHandle, NotificationDispatcher};
use crate::error::{CoreError, Result};
use crate::ledger::CheckInLedger;
use crate::liveness::{self, LivenessStatus};
use crate::scheduler::{CheckInOutcome, DeadlineScheduler};
use crate::storage::{self, KeyValueStore, Settings, SETTINGS_KEY, STATE_KEY};

/// Point-in-time view of the switch for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub status: LivenessStatus,
    pub last_check_in_at: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub remaining_secs: Option<i64>,
    pub scheduled_delivery_id: Option<DeliveryHandle>,
}

/// Clears the busy flag however the check-in ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct CheckInService<S, D> {
    store: S,
    scheduler: DeadlineScheduler<D>,
    settings: Mutex<Settings>,
    ledger: Mutex<CheckInLedger>,
    busy: AtomicBool,
}

impl<S, D> CheckInService<S, D>
where
    S: KeyValueStore,
    D: NotificationDispatcher,
{
    /// Load both records from `store`. Records never written load as defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be read or does not decode.
    pub fn open(store: S, dispatcher: D) -> Result<Self> {
        let settings: Settings = storage::load_record(&store, SETTINGS_KEY)?;
        let ledger: CheckInLedger = storage::load_record(&store, STATE_KEY)?;
        Ok(Self {
            store,
            scheduler: DeadlineScheduler::new(dispatcher),
            settings: Mutex::new(settings),
            ledger: Mutex::new(ledger),
            busy: AtomicBool::new(false),
        })
    }

    fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
        m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Check in at `now`.
    ///
    /// Configuration gaps and provider refusals come back as `Ok` outcomes
    /// with the ledger untouched. `Err` means either another check-in is
    /// still running, or the new ledger could not be written. In the latter
    /// case the in-memory ledger keeps its previous value, whose handle has
    /// already been cancelled, and the new notification stays scheduled.
    pub async fn check_in(&self, now: DateTime<Utc>) -> Result<CheckInOutcome> {
        let _busy = BusyGuard::acquire(&self.busy).ok_or(CoreError::CheckInInProgress)?;

        let settings = Self::lock(&self.settings).clone();
        let ledger = Self::lock(&self.ledger).clone();
        let previous = ledger.scheduled_delivery_id.clone();
        let contact = settings.contact();
        let credential = settings.credential();

        let (next, outcome) = self
            .scheduler
            .perform_check_in(now, ledger, contact.as_ref(), credential.as_ref())
            .await;

        if outcome.is_success() {
            if let Err(e) = storage::save_record(&self.store, STATE_KEY, &next) {
                error!(
                    error = %e,
                    cancelled = ?previous,
                    scheduled = ?next.scheduled_delivery_id,
                    "ledger not persisted: the previous notification was already cancelled, \
                     cancel the newly scheduled one by hand"
                );
                return Err(e.into());
            }
            *Self::lock(&self.ledger) = next;
        }

        Ok(outcome)
    }

    pub fn current_status(&self, now: DateTime<Utc>) -> LivenessStatus {
        Self::lock(&self.ledger).status_at(now)
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> StatusSnapshot {
        let ledger = self.ledger();
        let remaining = ledger
            .last_check_in_at
            .map(|last| liveness::time_remaining(last, now))
            .map(|d: Duration| d.num_seconds());
        StatusSnapshot {
            status: ledger.status_at(now),
            last_check_in_at: ledger.last_check_in_at,
            deadline: ledger.deadline(),
            remaining_secs: remaining,
            scheduled_delivery_id: ledger.scheduled_delivery_id,
        }
    }

    pub fn ledger(&self) -> CheckInLedger {
        Self::lock(&self.ledger).clone()
    }

    pub fn settings(&self) -> Settings {
        Self::lock(&self.settings).clone()
    }

    /// Persist new settings, then adopt them.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings record cannot be written; the
    /// current settings stay in effect.
    pub fn update_settings(&self, settings: Settings) -> Result<()> {
        storage::save_record(&self.store, SETTINGS_KEY, &settings)?;
        *Self::lock(&self.settings) = settings;
        Ok(())
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn dispatcher(&self) -> &D {
        self.scheduler.dispatcher()
    }
}
