use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::date::parse_date;

/// 1-based index of a listing page.
pub type PageIndex = u32;

/// Identifies one listing on the remote platform (a product slug, a review URL, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(String);

impl ListingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One listing item. The payload is opaque to the harvester; only the date is inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub date: Option<NaiveDate>,
    pub payload: Value,
}

impl Record {
    pub fn new(date: Option<NaiveDate>, payload: Value) -> Self {
        Self { date, payload }
    }

    /// Builds a record from the raw date text shown on the page.
    /// Text that matches none of the known formats leaves the record undated.
    pub fn with_date_text(date_text: Option<&str>, payload: Value) -> Self {
        Self {
            date: date_text.and_then(parse_date),
            payload,
        }
    }
}
