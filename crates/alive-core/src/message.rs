//! Composition of the emergency notification.

use chrono::{DateTime, Utc};
use indoc::formatdoc;

use crate::dispatch::Message;
use crate::storage::Contact;

/// Build the notification sent to `contact` if no check-in follows `anchor`.
///
/// `anchor` is the check-in instant the notification is scheduled from, so
/// the recipient learns when the user was last known to be fine.
pub fn compose(contact: &Contact, anchor: DateTime<Utc>) -> Message {
    let body = formatdoc! {"
        <p>This is {name}. I have not been active for several days. Please come and check on me.</p>
        <p>Last check-in: {anchor}</p>
        ",
        name = escape_html(&contact.name),
        anchor = anchor.format("%Y-%m-%d %H:%M UTC"),
    };

    Message {
        recipient: contact.email_address.clone(),
        subject: format!("Urgent: {} has not checked in", contact.name),
        body,
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
