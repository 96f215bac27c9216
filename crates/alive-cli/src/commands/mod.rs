pub mod checkin;
pub mod config;
pub mod settings;
pub mod status;

use alive_core::{CheckInService, Config, FileStore, ResendDispatcher};

/// Service over the default data directory with the configured provider.
pub fn open_service(
) -> Result<CheckInService<FileStore, ResendDispatcher>, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let dispatcher = ResendDispatcher::new(&config.dispatcher)?;
    let store = FileStore::open_default()?;
    Ok(CheckInService::open(store, dispatcher)?)
}
