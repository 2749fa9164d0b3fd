use chrono::NaiveDate;

use crate::date::DateWindow;
use crate::record::Record;

/// Keeps the records dated inside `window`, preserving page order.
/// Undated records are dropped.
pub fn filter_records(records: &[Record], window: &DateWindow) -> Vec<Record> {
    records
        .iter()
        .filter(|record| record.date.is_some_and(|date| window.contains(date)))
        .cloned()
        .collect()
}

/// Oldest and newest parseable dates found on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    pub oldest: NaiveDate,
    pub newest: NaiveDate,
}

impl DateSpan {
    /// Span of the dated records, or `None` when no record carries a date.
    pub fn of(records: &[Record]) -> Option<Self> {
        let mut dates = records.iter().filter_map(|record| record.date);
        let first = dates.next()?;
        let (oldest, newest) = dates.fold((first, first), |(oldest, newest), date| {
            (oldest.min(date), newest.max(date))
        });
        Some(Self { oldest, newest })
    }

    /// Range test: ties at either edge count as overlap.
    pub fn overlaps(&self, window: &DateWindow) -> bool {
        window.start() <= self.newest && self.oldest <= window.end()
    }

    /// Every date on the page predates the window.
    pub fn is_older_than(&self, window: &DateWindow) -> bool {
        self.newest < window.start()
    }

    /// Every date on the page postdates the window.
    pub fn is_newer_than(&self, window: &DateWindow) -> bool {
        self.oldest > window.end()
    }
}

/// What a fetched page tells the search about its position in the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSpan {
    /// No records: the page lies beyond the end of the listing.
    Exhausted,
    /// Records exist but none has a parseable date.
    Undated,
    Dated(DateSpan),
}

impl PageSpan {
    pub fn of(records: &[Record]) -> Self {
        if records.is_empty() {
            return PageSpan::Exhausted;
        }
        DateSpan::of(records).map_or(PageSpan::Undated, PageSpan::Dated)
    }
}
