use chrono::NaiveDate;
use thiserror::Error;

use crate::date::Bound;
use crate::record::PageIndex;

/// Rejected caller window. Raised before any page is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("unparsable {bound} date {text:?}")]
    Unparsable { bound: Bound, text: String },
    #[error("start date {start} is after end date {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },
}

/// Failures surfaced by a harvest. Everything else degrades to fewer or no records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarvestError {
    #[error("invalid date window: {0}")]
    InvalidWindow(#[from] WindowError),
    #[error("page {page} is still blocked after retry")]
    FetchBlocked { page: PageIndex },
}
