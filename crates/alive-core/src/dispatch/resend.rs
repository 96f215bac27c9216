//! Resend email API adapter -- schedule and cancel deferred emails.
//!
//! - `POST /emails` with `scheduled_at` returns `{ "id": ... }`
//! - `POST /emails/{id}/cancel` withdraws a scheduled email

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use super::{Credential, DeliveryHandle, Message, NotificationDispatcher};
use crate::error::DispatchError;
use crate::storage::DispatcherConfig;

const FALLBACK_REJECTION: &str = "Failed to schedule email";

#[derive(Debug, Serialize)]
struct EmailPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
    scheduled_at: String,
}

pub struct ResendDispatcher {
    base_url: Url,
    from_address: String,
    http_client: Client,
}

impl ResendDispatcher {
    /// Build a dispatcher from the `[dispatcher]` config section.
    pub fn new(config: &DispatcherConfig) -> Result<Self, DispatchError> {
        let mut base_url = Url::parse(&config.base_url).map_err(|e| {
            DispatchError::Client(format!("invalid base_url '{}': {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(DispatchError::Client(format!(
                "base_url '{}' cannot carry a path",
                config.base_url
            )));
        }
        // `Url::join` replaces the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DispatchError::Client(e.to_string()))?;

        Ok(Self {
            base_url,
            from_address: config.from_address.clone(),
            http_client,
        })
    }

    fn emails_url(&self) -> Result<Url, DispatchError> {
        self.base_url
            .join("emails")
            .map_err(|e| DispatchError::Client(e.to_string()))
    }

    fn cancel_url(&self, handle: &DeliveryHandle) -> Result<Url, DispatchError> {
        let mut url = self.emails_url()?;
        url.path_segments_mut()
            .map_err(|_| DispatchError::Client("base_url cannot carry a path".to_string()))?
            .push(handle.as_str())
            .push("cancel");
        Ok(url)
    }

    async fn try_cancel(
        &self,
        credential: &Credential,
        handle: &DeliveryHandle,
    ) -> Result<bool, DispatchError> {
        let resp = self
            .http_client
            .post(self.cancel_url(handle)?)
            .bearer_auth(credential.expose())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(true)
        } else {
            debug!(handle = %handle, status = resp.status().as_u16(), "cancel not acknowledged");
            Ok(false)
        }
    }
}

/// Format an instant the way the API expects: ISO-8601 UTC, millisecond precision.
pub fn format_scheduled_at(deadline: DateTime<Utc>) -> String {
    deadline.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl NotificationDispatcher for ResendDispatcher {
    async fn schedule(
        &self,
        credential: &Credential,
        deadline: DateTime<Utc>,
        message: &Message,
    ) -> Result<DeliveryHandle, DispatchError> {
        let payload = EmailPayload {
            from: &self.from_address,
            to: &message.recipient,
            subject: &message.subject,
            html: &message.body,
            scheduled_at: format_scheduled_at(deadline),
        };
        debug!(scheduled_at = %payload.scheduled_at, "scheduling email");

        let resp = self
            .http_client
            .post(self.emails_url()?)
            .bearer_auth(credential.expose())
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        let body: Option<serde_json::Value> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            let message = body
                .as_ref()
                .and_then(|b| b.get("message"))
                .and_then(|m| m.as_str())
                .filter(|m| !m.is_empty())
                .unwrap_or(FALLBACK_REJECTION)
                .to_string();
            return Err(DispatchError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let id = body
            .as_ref()
            .and_then(|b| b.get("id"))
            .and_then(|id| id.as_str())
            .ok_or_else(|| DispatchError::InvalidResponse(format!("missing email id in: {text}")))?;

        Ok(DeliveryHandle::new(id))
    }

    async fn cancel(&self, credential: &Credential, handle: &DeliveryHandle) -> bool {
        match self.try_cancel(credential, handle).await {
            Ok(acknowledged) => acknowledged,
            Err(e) => {
                warn!(handle = %handle, error = %e, "error cancelling scheduled email");
                false
            }
        }
    }
}
