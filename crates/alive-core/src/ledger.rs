//! The persisted check-in record.
//!
//! Serialized in the stored record shape:
//! `{"lastCheckIn": <epoch ms | null>, "scheduledEmailId": <string | null>}`.

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::dispatch::DeliveryHandle;
use crate::liveness::{self, LivenessStatus};

/// Last check-in instant plus the handle of the one outstanding notification.
///
/// When `scheduled_delivery_id` is present it refers to a delivery scheduled
/// for `last_check_in_at + 48h`. Only a successful check-in produces a new
/// value; see [`DeadlineScheduler`](crate::scheduler::DeadlineScheduler).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInLedger {
    #[serde(
        rename = "lastCheckIn",
        default,
        serialize_with = "chrono::serde::ts_milliseconds_option::serialize",
        deserialize_with = "deserialize_last_check_in"
    )]
    pub last_check_in_at: Option<DateTime<Utc>>,

    #[serde(rename = "scheduledEmailId", default)]
    pub scheduled_delivery_id: Option<DeliveryHandle>,
}

impl CheckInLedger {
    /// Ledger state of a fresh installation.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Ledger state after a check-in at `at` whose notification was accepted as `handle`.
    pub fn checked_in(at: DateTime<Utc>, handle: DeliveryHandle) -> Self {
        Self {
            last_check_in_at: Some(at),
            scheduled_delivery_id: Some(handle),
        }
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> LivenessStatus {
        liveness::status_at(self.last_check_in_at, now)
    }

    /// When the outstanding notification is due, if there has been a check-in.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.last_check_in_at.map(liveness::deadline_at)
    }
}

/// Epoch milliseconds, rejecting instants whose deadline would not be representable.
fn deserialize_last_check_in<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let at = chrono::serde::ts_milliseconds_option::deserialize(deserializer)?;
    match at {
        Some(at) if at.checked_add_signed(liveness::deadline_window()).is_none() => Err(
            de::Error::custom(format!("lastCheckIn {at} is out of range")),
        ),
        other => Ok(other),
    }
}
