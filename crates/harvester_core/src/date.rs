use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::WindowError;

/// A textual date layout accepted by [`parse_date`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFormat {
    pub name: &'static str,
    pub pattern: &'static str,
}

impl DateFormat {
    pub fn parse(&self, text: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(text, self.pattern).ok()
    }
}

/// Accepted date layouts, in the order they are tried.
pub const DATE_FORMATS: &[DateFormat] = &[
    DateFormat {
        name: "iso",
        pattern: "%Y-%m-%d",
    },
    DateFormat {
        name: "day-month-year",
        pattern: "%d %B %Y",
    },
    DateFormat {
        name: "month-day-year",
        pattern: "%B %d, %Y",
    },
];

/// Parses `text` with the first matching entry of [`DATE_FORMATS`].
///
/// Surrounding whitespace is ignored. Returns `None` instead of failing so that
/// a single malformed date never aborts the page it belongs to.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    DATE_FORMATS.iter().find_map(|format| format.parse(text))
}

/// Which end of a [`DateWindow`] a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start,
    End,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Start => write!(f, "start"),
            Bound::End => write!(f, "end"),
        }
    }
}

/// Inclusive calendar date range. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, WindowError> {
        if start > end {
            return Err(WindowError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Normalizes caller-supplied bounds in any of the [`DATE_FORMATS`].
    pub fn parse(start: &str, end: &str) -> Result<Self, WindowError> {
        let start = parse_bound(Bound::Start, start)?;
        let end = parse_bound(Bound::End, end)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Length of the window in whole days (0 for a single-day window).
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

fn parse_bound(bound: Bound, text: &str) -> Result<NaiveDate, WindowError> {
    parse_date(text).ok_or_else(|| WindowError::Unparsable {
        bound,
        text: text.to_string(),
    })
}
