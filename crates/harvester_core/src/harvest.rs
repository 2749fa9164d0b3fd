use std::fmt;

use harvest_logging::{harvest_info, harvest_warn};
use serde::Serialize;

use crate::config::{HarvestConfig, Strategy};
use crate::date::DateWindow;
use crate::density::{DensityEstimate, Rejection};
use crate::error::HarvestError;
use crate::linear::{LinearHarvester, ScanStop};
use crate::locate::{collect_range, BoundaryLocator, PageRange};
use crate::pacing::RateLimiter;
use crate::record::{ListingId, PageIndex, Record};
use crate::session::{HarvestSession, PageFetcher};

/// How a harvest ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HarvestOutcome {
    /// Page 1 had no records, or none with a parseable date.
    NoListingData,
    /// Page 1 proves the window cannot intersect the listing.
    Rejected(Rejection),
    /// Boundary search found no overlapping page.
    NoMatchingPages,
    /// Boundary search harvested the given pages.
    Located(PageRange),
    /// Linear scan harvested `pages` pages.
    Scanned { pages: PageIndex, stop: ScanStop },
}

impl fmt::Display for HarvestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarvestOutcome::NoListingData => write!(f, "listing has no data"),
            HarvestOutcome::Rejected(Rejection::EndsBeforeFirstPage) => {
                write!(f, "window ends before the first page")
            }
            HarvestOutcome::Rejected(Rejection::StartsAfterNewest) => {
                write!(f, "window starts after the newest record")
            }
            HarvestOutcome::NoMatchingPages => write!(f, "no matching pages"),
            HarvestOutcome::Located(range) => {
                write!(f, "pages {} to {}", range.first, range.last)
            }
            HarvestOutcome::Scanned { pages, stop } => {
                write!(f, "scanned {pages} pages, {stop}")
            }
        }
    }
}

/// Everything one harvest call produced.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestReport {
    /// Records inside the window, newest first.
    pub records: Vec<Record>,
    pub outcome: HarvestOutcome,
    /// Requests sent to the fetcher, retries included.
    pub pages_fetched: usize,
}

/// Entry point: validates the window, picks a strategy and gathers the records.
///
/// Each call runs in its own [`HarvestSession`]; nothing is shared between calls.
pub struct Harvester<'a> {
    fetcher: &'a dyn PageFetcher,
    limiter: &'a dyn RateLimiter,
    config: HarvestConfig,
}

impl<'a> Harvester<'a> {
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        limiter: &'a dyn RateLimiter,
        config: HarvestConfig,
    ) -> Self {
        Self {
            fetcher,
            limiter,
            config,
        }
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Harvests `listing` for the window given as text in any accepted date format.
    pub fn harvest(
        &self,
        listing: &ListingId,
        start: &str,
        end: &str,
    ) -> Result<Vec<Record>, HarvestError> {
        let window = DateWindow::parse(start, end)?;
        self.harvest_window(listing, window)
            .map(|report| report.records)
    }

    pub fn harvest_window(
        &self,
        listing: &ListingId,
        window: DateWindow,
    ) -> Result<HarvestReport, HarvestError> {
        harvest_info!("Harvesting {} for {}", listing, window);
        let mut session = HarvestSession::new(listing, self.fetcher, self.limiter);

        let first_page = session.page(1)?;
        if first_page.is_empty() {
            harvest_warn!("No records on the first page of {}", listing);
            return Ok(finish(&session, Vec::new(), HarvestOutcome::NoListingData));
        }
        let estimate = DensityEstimate::from_first_page(first_page);

        let (records, outcome) = match (self.config.strategy, estimate) {
            (Strategy::Auto, Some(estimate)) => {
                self.locate(&mut session, window, estimate)?
            }
            (Strategy::Auto, None) => {
                harvest_warn!("No parseable dates on the first page of {}", listing);
                (Vec::new(), HarvestOutcome::NoListingData)
            }
            (Strategy::Linear, _) => self.scan(&mut session, &window)?,
        };

        Ok(finish(&session, records, outcome))
    }

    fn locate(
        &self,
        session: &mut HarvestSession<'_>,
        window: DateWindow,
        estimate: DensityEstimate,
    ) -> Result<(Vec<Record>, HarvestOutcome), HarvestError> {
        harvest_info!(
            "First page spans {} to {} ({} days/page)",
            estimate.oldest_on_first_page,
            estimate.newest,
            estimate.days_per_page
        );

        match estimate.rejection(&window) {
            Some(Rejection::EndsBeforeFirstPage) if self.config.probe_older_windows => {}
            Some(rejection) => {
                let outcome = HarvestOutcome::Rejected(rejection);
                harvest_info!("Skipping search: {}", outcome);
                return Ok((Vec::new(), outcome));
            }
            None => {}
        }

        let range = BoundaryLocator::new(session, window, estimate, &self.config).locate()?;
        match range {
            Some(range) => {
                let records = collect_range(session, range, &window)?;
                Ok((records, HarvestOutcome::Located(range)))
            }
            None => Ok((Vec::new(), HarvestOutcome::NoMatchingPages)),
        }
    }

    fn scan(
        &self,
        session: &mut HarvestSession<'_>,
        window: &DateWindow,
    ) -> Result<(Vec<Record>, HarvestOutcome), HarvestError> {
        let scan = LinearHarvester::new(self.config.max_empty_pages, self.config.max_page)
            .scan(session, window)?;
        let outcome = HarvestOutcome::Scanned {
            pages: scan.pages_scanned,
            stop: scan.stop,
        };
        Ok((scan.records, outcome))
    }
}

fn finish(
    session: &HarvestSession<'_>,
    records: Vec<Record>,
    outcome: HarvestOutcome,
) -> HarvestReport {
    harvest_info!(
        "Harvest of {} done: {} records, {} ({} fetches)",
        session.listing(),
        records.len(),
        outcome,
        session.fetch_count()
    );
    HarvestReport {
        records,
        outcome,
        pages_fetched: session.fetch_count(),
    }
}
