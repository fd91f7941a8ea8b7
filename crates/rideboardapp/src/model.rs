//! # Domain Model: Entries
//!
//! This module defines [`Entry`], the record exchanged between the UI and the stores,
//! the [`EntryDraft`] a form submission produces, and the [`SyncState`] of the working set.
//!
//! ## Identity and Ordering
//!
//! - **Ids** are either generated here (`{micros}_{base36 suffix}`) or assigned by a
//!   remote store. They are opaque strings either way.
//! - **`created_at`** is stamped once, from a per-process monotonic clock, and is the
//!   only ordering key. Records without it (older payloads) sort as the Unix epoch.
//! - The working set is always ordered newest first via [`sort_newest_first`], which is
//!   a stable sort: entries sharing a timestamp keep their relative order.
//!
//! ## Wire Tolerance
//!
//! Hosted stores disagree on field names and types. Deserialization accepts:
//! - `from_location` / `to_location` as aliases of `from` / `to`
//! - `created_at` as an alias of `createdAt`
//! - integer ids (serial primary keys), converted to strings
//! - empty strings for optional fields, read as absent
//! - unknown `type` values, read as [`EntryType::Unknown`] so one bad row cannot
//!   hide the rest of a listing
//!
//! Entries are immutable once created. There is no update operation; only deletion.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::error::{RideboardError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryType {
    OfferingRide,
    SeekingRide,
    RideshareSplit,
    FlightInfo,
    #[serde(other)]
    Unknown,
}

impl EntryType {
    pub const ALL: [EntryType; 4] = [
        EntryType::OfferingRide,
        EntryType::SeekingRide,
        EntryType::RideshareSplit,
        EntryType::FlightInfo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::OfferingRide => "offering-ride",
            EntryType::SeekingRide => "seeking-ride",
            EntryType::RideshareSplit => "rideshare-split",
            EntryType::FlightInfo => "flight-info",
            EntryType::Unknown => "unknown",
        }
    }

    /// Human label used on cards.
    pub fn label(&self) -> &'static str {
        match self {
            EntryType::OfferingRide => "Offering Ride",
            EntryType::SeekingRide => "Seeking Ride",
            EntryType::RideshareSplit => "Rideshare/Split",
            EntryType::FlightInfo => "Flight Info",
            EntryType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = RideboardError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        EntryType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| {
                RideboardError::InvalidEntry(format!(
                    "unknown type '{}' (expected one of: offering-ride, seeking-ride, rideshare-split, flight-info)",
                    wanted
                ))
            })
    }
}

/// Whether the working set reflects a confirmed remote read/write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncState {
    Synced,
    LocalOnly,
    Unknown,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Synced => f.write_str("synced"),
            SyncState::LocalOnly => f.write_str("local only"),
            SyncState::Unknown => f.write_str("unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(default, deserialize_with = "wire_fields::id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "wire_fields::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone: Option<String>,
    #[serde(rename = "type")]
    pub kind: EntryType,
    #[serde(
        default,
        deserialize_with = "wire_fields::date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "wire_fields::time",
        serialize_with = "wire_fields::serialize_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<NaiveTime>,
    #[serde(default, alias = "from_location")]
    pub from: String,
    #[serde(default, alias = "to_location")]
    pub to: String,
    #[serde(
        default,
        deserialize_with = "wire_fields::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub details: Option<String>,
    #[serde(
        default = "epoch",
        alias = "created_at",
        deserialize_with = "wire_fields::timestamp"
    )]
    pub created_at: DateTime<Utc>,
}

impl Entry {
    /// Display name, falling back to "Anonymous" for nameless legacy rows.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Anonymous"
        } else {
            &self.name
        }
    }
}

fn epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

/// Sorts newest first by `created_at`. Stable on ties.
pub fn sort_newest_first(entries: &mut [Entry]) {
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

static LAST_CREATED_MICROS: AtomicI64 = AtomicI64::new(0);

/// Returns a creation timestamp strictly greater than any previously issued in this process.
pub fn next_created_at() -> DateTime<Utc> {
    let now = Utc::now().timestamp_micros();
    let prev = LAST_CREATED_MICROS
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or_else(|last| last);
    let issued = now.max(prev + 1);
    DateTime::from_timestamp_micros(issued).unwrap_or_else(Utc::now)
}

const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Client-side id: creation micros plus a random base36 suffix.
pub fn generate_id(created_at: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("{}_{}", created_at.timestamp_micros(), suffix)
}

/// Raw form values, exactly as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub name: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: String,
    pub time: String,
    pub from: String,
    pub to: String,
    pub details: String,
}

impl EntryDraft {
    /// Validates the draft and stamps a fresh id and creation time.
    pub fn into_entry(self) -> Result<Entry> {
        let created_at = next_created_at();
        let id = generate_id(created_at);
        self.build(id, created_at)
    }

    /// Validates the draft into an [`Entry`] with the given identity.
    pub fn build(self, id: String, created_at: DateTime<Utc>) -> Result<Entry> {
        let name = required("name", &self.name)?;
        let from = required("from", &self.from)?;
        let to = required("to", &self.to)?;
        let kind: EntryType = self.kind.parse()?;

        let date = match non_blank(&self.date) {
            Some(raw) => Some(parse_date(&raw).ok_or_else(|| {
                RideboardError::InvalidEntry(format!("date '{}' is not YYYY-MM-DD", raw))
            })?),
            None => None,
        };
        let time = match non_blank(&self.time) {
            Some(raw) => Some(parse_time(&raw).ok_or_else(|| {
                RideboardError::InvalidEntry(format!("time '{}' is not HH:MM", raw))
            })?),
            None => None,
        };

        Ok(Entry {
            id,
            name,
            phone: non_blank(&self.phone),
            kind,
            date,
            time,
            from,
            to,
            details: non_blank(&self.details),
            created_at,
        })
    }
}

fn required(field: &str, value: &str) -> Result<String> {
    non_blank(value).ok_or_else(|| RideboardError::InvalidEntry(format!("{} is required", field)))
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

mod wire_fields {
    use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
    }

    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Option::<RawId>::deserialize(d)? {
            Some(RawId::Text(s)) => s,
            Some(RawId::Int(n)) => n.to_string(),
            None => String::new(),
        })
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<String>::deserialize(d)?.and_then(|s| super::non_blank(&s)))
    }

    pub fn date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        match text(d)? {
            Some(raw) => super::parse_date(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", raw))),
            None => Ok(None),
        }
    }

    pub fn time<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        match text(d)? {
            Some(raw) => super::parse_time(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid time '{}'", raw))),
            None => Ok(None),
        }
    }

    pub fn serialize_time<S: Serializer>(t: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match t {
            Some(t) => s.serialize_str(&t.format("%H:%M").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(raw) if !raw.trim().is_empty() => DateTime::parse_from_rfc3339(raw.trim())
                .map(|t| t.with_timezone(&Utc))
                .map_err(serde::de::Error::custom),
            _ => Ok(super::epoch()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn draft() -> EntryDraft {
        EntryDraft {
            name: "Ana".into(),
            kind: "offering-ride".into(),
            from: "LAX".into(),
            to: "Campus".into(),
            ..Default::default()
        }
    }

    #[test]
    fn draft_builds_entry_with_blank_optionals_absent() {
        let entry = draft().into_entry().unwrap();
        assert_eq!(entry.name, "Ana");
        assert_eq!(entry.kind, EntryType::OfferingRide);
        assert_eq!(entry.phone, None);
        assert_eq!(entry.date, None);
        assert_eq!(entry.details, None);
        assert!(!entry.id.is_empty());
    }

    #[test]
    fn draft_requires_name_and_route() {
        let mut d = draft();
        d.name = "   ".into();
        assert!(matches!(
            d.into_entry(),
            Err(RideboardError::InvalidEntry(msg)) if msg.contains("name")
        ));

        let mut d = draft();
        d.to = String::new();
        assert!(d.into_entry().is_err());
    }

    #[test]
    fn draft_rejects_unknown_type_and_bad_date() {
        let mut d = draft();
        d.kind = "teleport".into();
        assert!(d.into_entry().is_err());

        let mut d = draft();
        d.date = "03/04/2026".into();
        assert!(d.into_entry().is_err());
    }

    #[test]
    fn draft_parses_date_and_time() {
        let mut d = draft();
        d.date = "2026-03-04".into();
        d.time = "15:30".into();
        let entry = d.into_entry().unwrap();
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2026, 3, 4));
        assert_eq!(entry.time, NaiveTime::from_hms_opt(15, 30, 0));
    }

    #[test]
    fn created_at_is_strictly_increasing() {
        let a = next_created_at();
        let b = next_created_at();
        let c = next_created_at();
        assert!(a < b && b < c);
    }

    #[test]
    fn generated_ids_differ() {
        let t = next_created_at();
        let a = generate_id(t);
        let b = generate_id(t);
        assert_ne!(a, b);
        assert!(a.starts_with(&t.timestamp_micros().to_string()));
    }

    #[test]
    fn deserializes_row_dialect_fields() {
        let row = json!({
            "id": 42,
            "name": "Ben",
            "phone": "",
            "type": "flight-info",
            "date": "2026-05-01",
            "time": "08:15:00",
            "from_location": "SFO",
            "to_location": "LAX",
            "details": null,
            "created_at": "2026-04-01T10:00:00+00:00"
        });
        let entry: Entry = serde_json::from_value(row).unwrap();
        assert_eq!(entry.id, "42");
        assert_eq!(entry.phone, None);
        assert_eq!(entry.from, "SFO");
        assert_eq!(entry.to, "LAX");
        assert_eq!(entry.time, NaiveTime::from_hms_opt(8, 15, 0));
        assert_eq!(
            entry.created_at,
            Utc.with_ymd_and_hms(2026, 4, 1, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn unknown_type_and_missing_created_at_are_tolerated() {
        let entry: Entry = serde_json::from_value(json!({
            "id": "x",
            "name": "Cy",
            "type": "hovercraft",
            "from": "A",
            "to": "B"
        }))
        .unwrap();
        assert_eq!(entry.kind, EntryType::Unknown);
        assert_eq!(entry.created_at, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn serializes_camel_case_and_short_time() {
        let mut d = draft();
        d.time = "07:05".into();
        let entry = d.build("id-1".into(), DateTime::UNIX_EPOCH).unwrap();
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "offering-ride");
        assert_eq!(value["time"], "07:05");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("phone").is_none());
    }

    #[test]
    fn sort_is_newest_first_and_stable() {
        let t = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mk = |id: &str, at| draft().build(id.to_string(), at).unwrap();
        let mut entries = vec![
            mk("a", t),
            mk("b", t + chrono::Duration::seconds(1)),
            mk("c", t),
        ];
        sort_newest_first(&mut entries);
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }
}
