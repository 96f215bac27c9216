//! In-memory dispatcher that records every call.
//!
//! Used by tests and dry runs. Handles are issued as `id1`, `id2`, ... and
//! both operations can be scripted to fail.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::{Credential, DeliveryHandle, Message, NotificationDispatcher};
use crate::error::DispatchError;

/// One observed dispatcher call, in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchCall {
    Schedule {
        deadline: DateTime<Utc>,
        message: Message,
    },
    Cancel {
        handle: DeliveryHandle,
    },
}

#[derive(Debug, Default)]
struct RecorderState {
    calls: Vec<DispatchCall>,
    issued: u64,
    schedule_failure: Option<String>,
    cancel_fails: bool,
}

/// Clones share the same call log and failure script.
#[derive(Debug, Clone, Default)]
pub struct RecordingDispatcher {
    state: Arc<Mutex<RecorderState>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make every subsequent `schedule` fail with `reason` (`None` restores success).
    pub fn fail_schedule(&self, reason: Option<&str>) {
        self.state().schedule_failure = reason.map(str::to_string);
    }

    /// Make every subsequent `cancel` report failure.
    pub fn fail_cancel(&self, fails: bool) {
        self.state().cancel_fails = fails;
    }

    /// Continue issuing handles after `n` (the next one is `id{n+1}`).
    pub fn with_issued(self, n: u64) -> Self {
        self.state().issued = n;
        self
    }

    pub fn calls(&self) -> Vec<DispatchCall> {
        self.state().calls.clone()
    }

    pub fn schedule_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, DispatchCall::Schedule { .. }))
            .count()
    }

    pub fn cancel_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, DispatchCall::Cancel { .. }))
            .count()
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    async fn schedule(
        &self,
        _credential: &Credential,
        deadline: DateTime<Utc>,
        message: &Message,
    ) -> Result<DeliveryHandle, DispatchError> {
        let mut state = self.state();
        state.calls.push(DispatchCall::Schedule {
            deadline,
            message: message.clone(),
        });

        if let Some(reason) = &state.schedule_failure {
            return Err(DispatchError::Rejected {
                status: 503,
                message: reason.clone(),
            });
        }

        state.issued += 1;
        Ok(DeliveryHandle::new(format!("id{}", state.issued)))
    }

    async fn cancel(&self, _credential: &Credential, handle: &DeliveryHandle) -> bool {
        let mut state = self.state();
        state.calls.push(DispatchCall::Cancel {
            handle: handle.clone(),
        });
        !state.cancel_fails
    }
}
