//! Card and message rendering.
//!
//! Every function here returns a `String`; printing happens in `commands.rs`. A card
//! looks like:
//!
//! ```text
//!  Offering Ride                                       posted 5 minutes ago
//!  Tue, Mar 4 at 3:30 PM
//!  Campus → LAX
//!  2 seats, leaving from the north lot
//!  Ana · 555-0100                                       id 1741102200_k3j9x0a1b
//! ```

use super::styles::THEME;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rideboardapp::filter::{EntryFilter, TypeFilter};
use rideboardapp::model::{Entry, SyncState};
use rideboardapp::notify::Notification;
use unicode_width::UnicodeWidthStr;

const CARD_WIDTH: usize = 72;
pub const EMPTY_MESSAGE: &str = "No travel plans match. Share yours with `rideboard add`.";

/// "Tue, Mar 4 at 3:30 PM". Time is shown only alongside a date.
pub fn format_when(date: Option<NaiveDate>, time: Option<NaiveTime>) -> Option<String> {
    let date = date?;
    let day = date.format("%a, %b %-d").to_string();
    Some(match time {
        Some(t) => format!("{} at {}", day, t.format("%-I:%M %p")),
        None => day,
    })
}

pub fn format_posted(created_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<String> {
    if created_at == DateTime::UNIX_EPOCH {
        return None;
    }
    let elapsed = now.signed_duration_since(created_at).to_std().unwrap_or_default();
    if elapsed.as_secs() < 60 {
        return Some("posted just now".to_string());
    }
    let formatter = timeago::Formatter::new();
    Some(format!("posted {}", formatter.convert(elapsed)))
}

/// Joins `left` and `right` with enough spaces to right-align `right` at `width`.
fn spread(left: &str, right: &str, width: usize) -> String {
    let used = left.width() + right.width();
    let gap = width.saturating_sub(used).max(2);
    format!("{}{}{}", left, " ".repeat(gap), right)
}

pub fn render_card(entry: &Entry, now: DateTime<Utc>) -> String {
    let mut out = String::new();

    let badge = format!(" {} ", entry.kind.label());
    let posted = format_posted(entry.created_at, now).unwrap_or_default();
    let header_gap = CARD_WIDTH
        .saturating_sub(badge.width() + posted.width())
        .max(2);
    out.push_str(&format!(
        "{}{}{}\n",
        THEME.badge(entry.kind).apply_to(&badge),
        " ".repeat(header_gap),
        THEME.time.apply_to(&posted)
    ));

    if let Some(when) = format_when(entry.date, entry.time) {
        out.push_str(&format!(" {}\n", THEME.title.apply_to(when)));
    }
    out.push_str(&format!(
        " {}\n",
        THEME
            .route
            .apply_to(format!("{} → {}", entry.from, entry.to))
    ));
    if let Some(details) = &entry.details {
        for line in details.lines() {
            out.push_str(&format!(" {}\n", line));
        }
    }

    let contact = match &entry.phone {
        Some(phone) => format!(" {} · {}", entry.display_name(), phone),
        None => format!(" {}", entry.display_name()),
    };
    let id = format!("id {}", entry.id);
    let contact_line = spread(&contact, &id, CARD_WIDTH);
    let (left, right) = contact_line.split_at(contact_line.len() - id.len());
    out.push_str(&format!("{}{}\n", left, THEME.faint.apply_to(right)));
    out
}

pub fn render_listing(entries: &[Entry], now: DateTime<Utc>) -> String {
    if entries.is_empty() {
        return format!("{}\n", THEME.muted.apply_to(EMPTY_MESSAGE));
    }
    entries
        .iter()
        .map(|e| render_card(e, now))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line summary of the active filter and sync state, shown under the listing.
pub fn render_status(
    filter: &EntryFilter,
    shown: usize,
    sync_state: Option<SyncState>,
    pending: usize,
) -> String {
    let mut parts = vec![format!(
        "{} travel plan{}",
        shown,
        if shown == 1 { "" } else { "s" }
    )];
    if let TypeFilter::Only(kind) = filter.kind {
        parts.push(kind.label().to_string());
    }
    if let Some(date) = filter.date {
        parts.push(date.format("%a, %b %-d").to_string());
    }
    match sync_state {
        Some(SyncState::LocalOnly) if pending > 0 => {
            parts.push(format!("local only, {} waiting to sync", pending))
        }
        Some(state) => parts.push(state.to_string()),
        None => {}
    }
    format!("{}\n", THEME.muted.apply_to(parts.join(" · ")))
}

pub fn render_messages(messages: &[Notification]) -> String {
    messages
        .iter()
        .map(|m| format!("{}\n", THEME.severity(m.severity).apply_to(&m.message)))
        .collect()
}

pub fn render_config(pairs: &[(&'static str, String)], config_file: Option<String>) -> String {
    let key_width = pairs.iter().map(|(k, _)| k.width()).max().unwrap_or(0);
    let mut out: String = pairs
        .iter()
        .map(|(k, v)| format!("{:<width$}  {}\n", k, v, width = key_width))
        .collect();
    if let Some(path) = config_file {
        out.push_str(&format!(
            "\n{}\n",
            THEME.muted.apply_to(format!("user config file: {}", path))
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rideboardapp::model::{EntryDraft, EntryType};
    use rideboardapp::notify::Severity;

    fn entry() -> Entry {
        EntryDraft {
            name: "Ana".into(),
            phone: "555-0100".into(),
            kind: "offering-ride".into(),
            date: "2026-03-03".into(),
            time: "15:30".into(),
            from: "Campus".into(),
            to: "LAX".into(),
            details: "2 seats".into(),
        }
        .build(
            "abc".into(),
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_format_when() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 3);
        let time = NaiveTime::from_hms_opt(15, 30, 0);
        assert_eq!(
            format_when(date, time).as_deref(),
            Some("Tue, Mar 3 at 3:30 PM")
        );
        assert_eq!(format_when(date, None).as_deref(), Some("Tue, Mar 3"));
        assert_eq!(format_when(None, time), None);
    }

    #[test]
    fn test_format_posted() {
        let created = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(
            format_posted(created, created + Duration::seconds(20)).as_deref(),
            Some("posted just now")
        );
        assert_eq!(
            format_posted(created, created + Duration::hours(2)).as_deref(),
            Some("posted 2 hours ago")
        );
        assert_eq!(format_posted(DateTime::UNIX_EPOCH, created), None);
    }

    #[test]
    fn test_card_contents() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 5, 0).unwrap();
        let card = console::strip_ansi_codes(&render_card(&entry(), now)).to_string();
        assert!(card.contains("Offering Ride"));
        assert!(card.contains("posted 5 minutes ago"));
        assert!(card.contains("Tue, Mar 3 at 3:30 PM"));
        assert!(card.contains("Campus → LAX"));
        assert!(card.contains("2 seats"));
        assert!(card.contains("Ana · 555-0100"));
        assert!(card.contains("id abc"));
    }

    #[test]
    fn test_empty_listing() {
        let out = console::strip_ansi_codes(&render_listing(&[], Utc::now())).to_string();
        assert_eq!(out.trim(), EMPTY_MESSAGE);
    }

    #[test]
    fn test_status_line() {
        let filter = EntryFilter::new(
            TypeFilter::Only(EntryType::FlightInfo),
            NaiveDate::from_ymd_opt(2026, 3, 3),
        );
        let out = render_status(&filter, 1, Some(SyncState::LocalOnly), 2);
        let out = console::strip_ansi_codes(&out).to_string();
        assert_eq!(
            out.trim(),
            "1 travel plan · Flight Info · Tue, Mar 3 · local only, 2 waiting to sync"
        );
    }

    #[test]
    fn test_messages_one_per_line() {
        let out = render_messages(&[
            Notification::success("Saved"),
            Notification {
                severity: Severity::Warning,
                message: "Offline".into(),
            },
        ]);
        let out = console::strip_ansi_codes(&out).to_string();
        assert_eq!(out, "Saved\nOffline\n");
    }
}
