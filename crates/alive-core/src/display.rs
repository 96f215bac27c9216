//! Masking and formatting for status output.

use chrono::Duration;

/// Keep only the first and last characters of a name: `Amery` -> `A***y`.
///
/// Names of one or two characters are shown as is.
pub fn mask_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    match chars.as_slice() {
        [] => "(name not set)".to_string(),
        [_] | [_, _] => name.to_string(),
        [first, .., last] => format!("{first}***{last}"),
    }
}

/// Keep the first two characters of the local part: `example@gmail.com` -> `ex****@gmail.com`.
pub fn mask_email(email: &str) -> String {
    if email.is_empty() {
        return "(contact not set)".to_string();
    }
    let Some((local, domain)) = email.split_once('@') else {
        return email.to_string();
    };
    if domain.contains('@') {
        return email.to_string();
    }
    let visible: String = local.chars().take(2).collect();
    format!("{visible}****@{domain}")
}

/// Compact `1d 4h 05m` rendering; zero and negative spans render as `0m`.
pub fn format_remaining(remaining: Duration) -> String {
    let total_minutes = remaining.num_minutes();
    if total_minutes <= 0 {
        return "0m".to_string();
    }
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;
    match (days, hours) {
        (0, 0) => format!("{minutes}m"),
        (0, _) => format!("{hours}h {minutes:02}m"),
        _ => format!("{days}d {hours}h {minutes:02}m"),
    }
}
