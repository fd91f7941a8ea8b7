//! Entry filtering.
//!
//! An [`EntryFilter`] combines a type predicate and a date predicate with AND logic.
//! Both have a wildcard: [`TypeFilter::All`] and an unset date. Filtering is pure and
//! order preserving; it never touches the repository's working set.

use chrono::NaiveDate;
use std::str::FromStr;

use crate::error::{RideboardError, Result};
use crate::model::{parse_date, Entry, EntryType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Only(EntryType),
}

impl TypeFilter {
    pub fn matches(&self, kind: EntryType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Only(wanted) => *wanted == kind,
        }
    }
}

impl FromStr for TypeFilter {
    type Err = RideboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" | "all" => Ok(TypeFilter::All),
            other => other.parse().map(TypeFilter::Only),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub kind: TypeFilter,
    /// `None` matches every entry, including those without a date.
    pub date: Option<NaiveDate>,
}

impl EntryFilter {
    pub fn new(kind: TypeFilter, date: Option<NaiveDate>) -> Self {
        Self { kind, date }
    }

    /// Builds a filter from raw UI values: `"all"` or a type name, and `""` or `YYYY-MM-DD`.
    pub fn from_raw(kind: &str, date: &str) -> Result<Self> {
        let kind = kind.parse()?;
        let date = if date.trim().is_empty() {
            None
        } else {
            Some(parse_date(date).ok_or_else(|| {
                RideboardError::InvalidEntry(format!("date filter '{}' is not YYYY-MM-DD", date))
            })?)
        };
        Ok(Self { kind, date })
    }

    pub fn is_wildcard(&self) -> bool {
        self.kind == TypeFilter::All && self.date.is_none()
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        let type_match = self.kind.matches(entry.kind);
        let date_match = match self.date {
            None => true,
            Some(wanted) => entry.date == Some(wanted),
        };
        type_match && date_match
    }

    pub fn apply(&self, entries: &[Entry]) -> Vec<Entry> {
        entries.iter().filter(|e| self.matches(e)).cloned().collect()
    }
}
