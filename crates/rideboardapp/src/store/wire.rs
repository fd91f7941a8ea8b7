//! JSON shapes exchanged with hosted stores.
//!
//! A listing body may be any of:
//!
//! ```text
//! null                                  -> empty (fresh database)
//! [ {entry}, ... ]                      -> rows
//! { "entries": [ ... ] }                -> wrapped
//! { "record": { "entries": [ ... ] } }  -> bin envelope
//! { "<key>": {entry}, ... }             -> keyed; the key becomes the entry id
//! ```
//!
//! Rows that fail to decode are skipped with a warning rather than failing the listing.

use crate::error::{RideboardError, Result};
use crate::model::Entry;
use serde_json::{Map, Value};
use tracing::warn;

pub fn decode_listing(status: u16, body: Option<Value>) -> Result<Vec<Entry>> {
    match body {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(rows)) => Ok(decode_rows(rows)),
        Some(Value::Object(mut obj)) => {
            if let Some(record) = obj.remove("record") {
                return decode_listing(status, Some(record));
            }
            if let Some(entries) = obj.remove("entries") {
                return decode_listing(status, Some(entries));
            }
            Ok(decode_keyed(obj))
        }
        Some(other) => Err(RideboardError::rejected(
            status,
            format!("unexpected listing payload: {}", kind_of(&other)),
        )),
    }
}

pub fn decode_rows(rows: Vec<Value>) -> Vec<Entry> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<Entry>(row) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping undecodable entry");
                None
            }
        })
        .collect()
}

fn decode_keyed(obj: Map<String, Value>) -> Vec<Entry> {
    obj.into_iter()
        .filter_map(|(key, value)| {
            if !value.is_object() {
                return None;
            }
            match serde_json::from_value::<Entry>(value) {
                Ok(mut entry) => {
                    entry.id = key;
                    Some(entry)
                }
                Err(e) => {
                    warn!(%key, error = %e, "skipping undecodable entry");
                    None
                }
            }
        })
        .collect()
}

/// The rows of a whole-document body, left as raw JSON.
///
/// Accepts `null`, a bare array, `{"entries": [...]}` and the `{"record": ...}`
/// envelope. Rows are not decoded, so rewriting them keeps whatever this client
/// does not understand.
pub fn document_rows(status: u16, body: Option<Value>) -> Result<Vec<Value>> {
    match body {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(rows)) => Ok(rows),
        Some(Value::Object(mut obj)) => {
            if let Some(record) = obj.remove("record") {
                return document_rows(status, Some(record));
            }
            if let Some(entries) = obj.remove("entries") {
                return document_rows(status, Some(entries));
            }
            if obj.is_empty() {
                return Ok(Vec::new());
            }
            Err(RideboardError::rejected(
                status,
                "unexpected document payload: object without entries",
            ))
        }
        Some(other) => Err(RideboardError::rejected(
            status,
            format!("unexpected document payload: {}", kind_of(&other)),
        )),
    }
}

/// The `id` of a raw row, as text. Integer ids are rendered in decimal.
pub fn row_id(row: &Value) -> Option<String> {
    match row.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Entry fields without the id, for stores that assign their own.
pub fn entry_payload(entry: &Entry) -> Result<Value> {
    let mut value = serde_json::to_value(entry)?;
    if let Value::Object(obj) = &mut value {
        obj.remove("id");
    }
    Ok(value)
}

/// Entry fields renamed to the row dialect's column names, without the id.
pub fn row_payload(entry: &Entry) -> Result<Value> {
    let mut value = entry_payload(entry)?;
    if let Value::Object(obj) = &mut value {
        for (from, to) in [
            ("from", "from_location"),
            ("to", "to_location"),
            ("createdAt", "created_at"),
        ] {
            if let Some(v) = obj.remove(from) {
                obj.insert(to.to_string(), v);
            }
        }
    }
    Ok(value)
}

/// Extracts the stored entry from a create response, if the store echoed one.
///
/// Row stores answer with an array holding the inserted row; keyed stores answer with
/// `{"name": "<key>"}`. Returns `None` for an empty acknowledgment.
pub fn decode_created(body: Option<Value>, sent: &Entry) -> Option<Entry> {
    match body? {
        Value::Array(mut rows) if !rows.is_empty() => {
            serde_json::from_value::<Entry>(rows.swap_remove(0)).ok()
        }
        Value::Object(obj) => {
            if let Some(Value::String(key)) = obj.get("name") {
                if obj.len() == 1 {
                    let mut stored = sent.clone();
                    stored.id = key.clone();
                    return Some(stored);
                }
            }
            serde_json::from_value::<Entry>(Value::Object(obj)).ok()
        }
        _ => None,
    }
}
