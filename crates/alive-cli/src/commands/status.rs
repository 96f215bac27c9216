use alive_core::display::{format_remaining, mask_email, mask_name};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;

pub fn run(now: DateTime<Utc>, as_json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let service = super::open_service()?;
    let snapshot = service.snapshot(now);
    let settings = service.settings();

    if as_json {
        let value = json!({
            "status": snapshot.status,
            "last_check_in_at": snapshot.last_check_in_at,
            "deadline": snapshot.deadline,
            "remaining_secs": snapshot.remaining_secs,
            "name": mask_name(&settings.name),
            "contact": mask_email(&settings.email),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Name:         {}", mask_name(&settings.name));
    println!("Contact:      {}", mask_email(&settings.email));
    println!("Status:       {}", snapshot.status);
    match (snapshot.last_check_in_at, snapshot.deadline) {
        (Some(last), Some(deadline)) => {
            println!("Last check-in: {}", last.format("%Y-%m-%d %H:%M UTC"));
            println!("Deadline:     {}", deadline.format("%Y-%m-%d %H:%M UTC"));
            let remaining = Duration::seconds(snapshot.remaining_secs.unwrap_or(0));
            println!("Remaining:    {}", format_remaining(remaining));
        }
        _ => println!("Last check-in: not started"),
    }
    if snapshot.status.is_tripped() {
        println!();
        println!("The deadline has passed; your contact has been (or is about to be) notified.");
    }
    Ok(())
}
