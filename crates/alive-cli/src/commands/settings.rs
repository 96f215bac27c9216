use alive_core::Settings;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Get a setting
    Get {
        /// One of: name, email, resendApiKey
        key: String,
    },
    /// Set a setting
    Set {
        /// One of: name, email, resendApiKey
        key: String,
        /// New value (empty string clears it)
        value: String,
    },
    /// List all settings (API key redacted)
    List,
}

fn redact(key: &str) -> String {
    if key.is_empty() {
        String::new()
    } else {
        let prefix: String = key.chars().take(3).collect();
        format!("{prefix}***")
    }
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let service = super::open_service()?;
    let mut settings = service.settings();

    match action {
        SettingsAction::Get { key } => match settings.get(&key) {
            Some(value) => println!("{value}"),
            None => {
                eprintln!("unknown key: {key}");
                std::process::exit(1);
            }
        },
        SettingsAction::Set { key, value } => {
            settings.set(&key, &value)?;
            service.update_settings(settings)?;
            println!("ok");
        }
        SettingsAction::List => {
            let listed = Settings {
                resend_api_key: redact(&settings.resend_api_key),
                ..settings
            };
            println!("{}", serde_json::to_string_pretty(&listed)?);
        }
    }
    Ok(())
}
