use std::fmt;

use harvest_logging::{harvest_debug, harvest_info};
use serde::Serialize;

use crate::date::DateWindow;
use crate::error::HarvestError;
use crate::filter::filter_records;
use crate::record::{PageIndex, Record};
use crate::session::HarvestSession;

/// Why a linear scan stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScanStop {
    /// A page came back empty.
    ListingEnd { page: PageIndex },
    /// `pages` consecutive pages had no record inside the window.
    NoMatchStreak { pages: u32 },
    /// The scan reached the configured page limit.
    PageLimit { page: PageIndex },
}

impl fmt::Display for ScanStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanStop::ListingEnd { page } => write!(f, "listing ended at page {page}"),
            ScanStop::NoMatchStreak { pages } => {
                write!(f, "{pages} consecutive pages without matches")
            }
            ScanStop::PageLimit { page } => write!(f, "page limit {page} reached"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearScan {
    pub records: Vec<Record>,
    /// Pages that held records (the empty end page is not counted).
    pub pages_scanned: PageIndex,
    pub stop: ScanStop,
}

/// Sequential scan from page 1 for listings without a usable density estimate.
#[derive(Debug, Clone, Copy)]
pub struct LinearHarvester {
    max_empty_pages: u32,
    max_page: PageIndex,
}

impl LinearHarvester {
    pub fn new(max_empty_pages: u32, max_page: PageIndex) -> Self {
        Self {
            max_empty_pages: max_empty_pages.max(1),
            max_page: max_page.max(1),
        }
    }

    pub fn scan(
        &self,
        session: &mut HarvestSession<'_>,
        window: &DateWindow,
    ) -> Result<LinearScan, HarvestError> {
        let mut records = Vec::new();
        let mut streak = 0u32;
        let mut page: PageIndex = 1;

        let stop = loop {
            if page > self.max_page {
                break ScanStop::PageLimit {
                    page: self.max_page,
                };
            }

            let page_records = session.page(page)?;
            if page_records.is_empty() {
                break ScanStop::ListingEnd { page };
            }

            let matches = filter_records(page_records, window);
            if matches.is_empty() {
                streak += 1;
                if streak >= self.max_empty_pages {
                    break ScanStop::NoMatchStreak { pages: streak };
                }
            } else {
                harvest_debug!(
                    "Page {}: {} of {} records match",
                    page,
                    matches.len(),
                    page_records.len()
                );
                streak = 0;
                records.extend(matches);
            }
            page += 1;
        };

        let pages_scanned = match stop {
            ScanStop::ListingEnd { page } => page - 1,
            ScanStop::NoMatchStreak { .. } => page,
            ScanStop::PageLimit { page } => page,
        };
        harvest_info!(
            "Linear scan of {} stopped: {} ({} records)",
            session.listing(),
            stop,
            records.len()
        );

        Ok(LinearScan {
            records,
            pages_scanned,
            stop,
        })
    }
}
