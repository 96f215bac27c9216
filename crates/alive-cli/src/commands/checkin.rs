use alive_core::CheckInOutcome;
use chrono::{DateTime, Utc};

/// Exit status when settings are incomplete.
const EXIT_NEEDS_CONFIGURATION: i32 = 2;

pub fn run(now: DateTime<Utc>) -> Result<(), Box<dyn std::error::Error>> {
    let service = super::open_service()?;
    let runtime = tokio::runtime::Runtime::new()?;

    match runtime.block_on(service.check_in(now))? {
        CheckInOutcome::Success => {
            let snapshot = service.snapshot(now);
            println!("Checked in. The 48-hour countdown has been reset.");
            if let Some(deadline) = snapshot.deadline {
                println!("Next deadline: {}", deadline.format("%Y-%m-%d %H:%M UTC"));
            }
        }
        CheckInOutcome::MissingContact => {
            eprintln!("Set your name and emergency contact first:");
            eprintln!("  alive-cli settings set name <your name>");
            eprintln!("  alive-cli settings set email <contact address>");
            std::process::exit(EXIT_NEEDS_CONFIGURATION);
        }
        CheckInOutcome::MissingCredentials => {
            eprintln!("Set your Resend API key first:");
            eprintln!("  alive-cli settings set resendApiKey <key>");
            std::process::exit(EXIT_NEEDS_CONFIGURATION);
        }
        CheckInOutcome::ScheduleFailed(reason) => {
            return Err(format!("check-in failed: {reason}").into());
        }
    }
    Ok(())
}
