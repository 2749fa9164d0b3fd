use chrono::NaiveDate;
use serde::Serialize;

use crate::date::DateWindow;
use crate::filter::DateSpan;
use crate::record::{PageIndex, Record};

/// Used when every page-1 date coincides, so the span would be zero days.
pub const FALLBACK_DAYS_PER_PAGE: i64 = 1;

/// Density figures taken from the first listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DensityEstimate {
    pub days_per_page: i64,
    pub newest: NaiveDate,
    pub oldest_on_first_page: NaiveDate,
}

/// Why a window cannot intersect the listing, judged from page 1 alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rejection {
    /// The window ends before the oldest date shown on page 1.
    EndsBeforeFirstPage,
    /// The window starts after the newest date in the listing.
    StartsAfterNewest,
}

impl DensityEstimate {
    /// Returns `None` when page 1 carries no parseable date.
    pub fn from_first_page(records: &[Record]) -> Option<Self> {
        let span = DateSpan::of(records)?;
        let days = (span.newest - span.oldest).num_days();
        let days_per_page = if days > 0 {
            days
        } else {
            FALLBACK_DAYS_PER_PAGE
        };
        Some(Self {
            days_per_page,
            newest: span.newest,
            oldest_on_first_page: span.oldest,
        })
    }

    pub fn first_page_span(&self) -> DateSpan {
        DateSpan {
            oldest: self.oldest_on_first_page,
            newest: self.newest,
        }
    }

    pub fn rejection(&self, window: &DateWindow) -> Option<Rejection> {
        if window.end() < self.oldest_on_first_page {
            Some(Rejection::EndsBeforeFirstPage)
        } else if window.start() > self.newest {
            Some(Rejection::StartsAfterNewest)
        } else {
            None
        }
    }

    /// Number of pages covering `days`, scaled by `buffer`. Saturates instead of overflowing.
    pub fn pages_for(&self, days: i64, buffer: f64) -> PageIndex {
        let days = days.max(0) as f64;
        // `as` saturates on overflow and maps NaN to 0.
        (days / self.days_per_page as f64 * buffer) as PageIndex
    }
}
