//! Liveness status derivation.
//!
//! Status is a pure function of the last check-in instant and the current
//! time. Nothing here is persisted; callers re-query whenever they need a
//! fresh value.
//!
//! ## State Transitions
//!
//! ```text
//! NeverCheckedIn -> WithinGrace -> AwaitingCheckIn -> Overdue
//!                        ^                                |
//!                        +------ successful check-in -----+
//! ```
//!
//! Time only moves a status to the right. The only way back to
//! `WithinGrace` is a new successful check-in.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Hours after a check-in before the switch trips.
pub const DEADLINE_WINDOW_HOURS: i64 = 48;

/// Hours after a check-in during which the user counts as freshly checked in.
pub const GRACE_WINDOW_HOURS: i64 = 24;

/// Fixed interval between a check-in and its scheduled notification.
pub fn deadline_window() -> Duration {
    Duration::hours(DEADLINE_WINDOW_HOURS)
}

pub fn grace_window() -> Duration {
    Duration::hours(GRACE_WINDOW_HOURS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LivenessStatus {
    NeverCheckedIn,
    WithinGrace,
    AwaitingCheckIn,
    /// The deadline has passed; the scheduled notification is expected to
    /// fire or has already fired.
    Overdue,
}

impl LivenessStatus {
    pub fn label(&self) -> &'static str {
        match self {
            LivenessStatus::NeverCheckedIn => "never checked in",
            LivenessStatus::WithinGrace => "checked in today",
            LivenessStatus::AwaitingCheckIn => "awaiting check-in",
            LivenessStatus::Overdue => "overdue",
        }
    }

    pub fn is_tripped(&self) -> bool {
        matches!(self, LivenessStatus::Overdue)
    }
}

impl std::fmt::Display for LivenessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Derive the status at `now` for a user whose last check-in was `last`.
///
/// Boundaries belong to the more severe state: exactly 24h elapsed is
/// `AwaitingCheckIn`, exactly 48h is `Overdue`. A `now` before `last`
/// (clock skew) counts as zero elapsed time.
pub fn status_at(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> LivenessStatus {
    let Some(last) = last else {
        return LivenessStatus::NeverCheckedIn;
    };

    let elapsed = (now - last).max(Duration::zero());
    if elapsed >= deadline_window() {
        LivenessStatus::Overdue
    } else if elapsed >= grace_window() {
        LivenessStatus::AwaitingCheckIn
    } else {
        LivenessStatus::WithinGrace
    }
}

/// Instant at which the notification scheduled by a check-in at `last` fires.
///
/// Saturates at the latest representable instant instead of overflowing.
pub fn deadline_at(last: DateTime<Utc>) -> DateTime<Utc> {
    last.checked_add_signed(deadline_window())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Time left before the deadline, clamped at zero once it has passed.
pub fn time_remaining(last: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (deadline_at(last) - now).max(Duration::zero())
}
