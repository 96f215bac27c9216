//! User settings record: who the message speaks for, who receives it, and
//! the provider key.

use serde::{Deserialize, Serialize};

use crate::dispatch::Credential;
use crate::error::ConfigError;

/// Emergency contact as seen by message composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    /// The user's own name; the notification is sent on their behalf.
    pub name: String,
    pub email_address: String,
}

impl Contact {
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.email_address.trim().is_empty()
    }
}

/// Persisted under [`SETTINGS_KEY`](super::SETTINGS_KEY).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub name: String,
    /// Emergency contact address.
    #[serde(default)]
    pub email: String,
    #[serde(rename = "resendApiKey", default)]
    pub resend_api_key: String,
}

impl Settings {
    /// `None` until both name and contact address are filled in.
    pub fn contact(&self) -> Option<Contact> {
        let contact = Contact {
            name: self.name.trim().to_string(),
            email_address: self.email.trim().to_string(),
        };
        contact.is_complete().then_some(contact)
    }

    pub fn credential(&self) -> Option<Credential> {
        Credential::new(self.resend_api_key.trim())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "name" => Some(self.name.as_str()),
            "email" => Some(self.email.as_str()),
            "resendApiKey" => Some(self.resend_api_key.as_str()),
            _ => None,
        }
    }

    /// Set a field by its stored key name.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim().to_string();
        match key {
            "name" => self.name = value,
            "email" => {
                if !value.is_empty() && !looks_like_email(&value) {
                    return Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        message: format!("'{value}' is not an email address"),
                    });
                }
                self.email = value;
            }
            "resendApiKey" => self.resend_api_key = value,
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.contains('@'),
        None => false,
    }
}
