//! Delivery of time-delayed notifications.
//!
//! The core only needs two things from a provider: accept a message for
//! delivery at a given instant (returning an opaque handle), and try to
//! withdraw a previously accepted message by handle.

pub mod recording;
pub mod resend;

pub use recording::{DispatchCall, RecordingDispatcher};
pub use resend::ResendDispatcher;

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// Provider-issued identifier of an accepted deferred notification.
///
/// Never interpreted by the core; only stored and handed back for cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryHandle(String);

impl DeliveryHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeliveryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// API key presented to the provider. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for an empty or whitespace-only key.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            None
        } else {
            Some(Self(key))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// A composed notification, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub recipient: String,
    pub subject: String,
    /// HTML body.
    pub body: String,
}

/// Every delivery provider implements this trait.
pub trait NotificationDispatcher: Send + Sync {
    /// Ask the provider to deliver `message` at `deadline`.
    fn schedule(
        &self,
        credential: &Credential,
        deadline: DateTime<Utc>,
        message: &Message,
    ) -> impl Future<Output = Result<DeliveryHandle, DispatchError>> + Send;

    /// Try to withdraw a scheduled delivery.
    ///
    /// Returns whether the provider acknowledged the cancellation. "Not
    /// found", "already sent" and transport failures all yield `false`;
    /// they are expected races, not errors.
    fn cancel(
        &self,
        credential: &Credential,
        handle: &DeliveryHandle,
    ) -> impl Future<Output = bool> + Send;
}
