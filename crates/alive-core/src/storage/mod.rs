mod config;
mod settings;
mod store;

pub use config::{Config, DispatcherConfig};
pub use settings::{Contact, Settings};
pub use store::{FileStore, KeyValueStore, MemoryStore};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;

use crate::error::StorageError;

/// Key of the user settings record (`{name, email, resendApiKey}`).
pub const SETTINGS_KEY: &str = "alive_settings";

/// Key of the check-in state record (`{lastCheckIn, scheduledEmailId}`).
pub const STATE_KEY: &str = "alive_state";

/// Returns `~/.config/alive[-dev]/` based on ALIVE_ENV.
///
/// Set ALIVE_ENV=dev to use development data directory. ALIVE_DATA_DIR
/// replaces the location entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("ALIVE_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("ALIVE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("alive-dev")
            } else {
                base_dir.join("alive")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Read and decode a JSON record, or `T::default()` if it was never written.
pub fn load_record<T, S>(store: &S, key: &str) -> Result<T, StorageError>
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
            key: key.to_string(),
            source,
        }),
        None => Ok(T::default()),
    }
}

/// Encode and write a JSON record.
pub fn save_record<T, S>(store: &S, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Corrupt {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw)
}
