use std::collections::HashMap;

use harvest_logging::{harvest_debug, harvest_trace, harvest_warn};

use crate::error::HarvestError;
use crate::filter::PageSpan;
use crate::pacing::RateLimiter;
use crate::record::{ListingId, PageIndex, Record};

/// Result of asking the platform for one page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageFetch {
    /// Extracted records. Empty means the listing has no such page.
    Records(Vec<Record>),
    /// The platform refused the request (bot check, throttling, ...).
    Blocked,
}

/// Retrieves listing pages from the remote platform.
pub trait PageFetcher: Send + Sync {
    fn fetch_page(&self, listing: &ListingId, page: PageIndex) -> PageFetch;

    /// Called after `fetch_page` reported [`PageFetch::Blocked`]. Returning `true`
    /// means the block is cleared and the page may be requested once more.
    fn await_clearance(&self, _listing: &ListingId, _page: PageIndex) -> bool {
        true
    }
}

/// Page cache for one harvest call.
///
/// Every page the strategies look at goes through [`HarvestSession::page`], so
/// each index reaches the fetcher at most once (plus one retry when blocked).
/// The cache is dropped with the session: listings drift between runs.
pub struct HarvestSession<'a> {
    listing: &'a ListingId,
    fetcher: &'a dyn PageFetcher,
    limiter: &'a dyn RateLimiter,
    pages: HashMap<PageIndex, Vec<Record>>,
    fetches: usize,
}

impl<'a> HarvestSession<'a> {
    pub fn new(
        listing: &'a ListingId,
        fetcher: &'a dyn PageFetcher,
        limiter: &'a dyn RateLimiter,
    ) -> Self {
        Self {
            listing,
            fetcher,
            limiter,
            pages: HashMap::new(),
            fetches: 0,
        }
    }

    pub fn listing(&self) -> &ListingId {
        self.listing
    }

    /// Records of `page`, fetching them on first access.
    pub fn page(&mut self, page: PageIndex) -> Result<&[Record], HarvestError> {
        if !self.pages.contains_key(&page) {
            let records = self.fetch_unblocked(page)?;
            self.pages.insert(page, records);
        } else {
            harvest_trace!("Page {} served from cache", page);
        }
        Ok(self.pages.get(&page).map(Vec::as_slice).unwrap_or_default())
    }

    pub fn span(&mut self, page: PageIndex) -> Result<PageSpan, HarvestError> {
        self.page(page).map(PageSpan::of)
    }

    pub fn is_cached(&self, page: PageIndex) -> bool {
        self.pages.contains_key(&page)
    }

    /// Number of requests sent to the fetcher so far, retries included.
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }

    fn fetch_unblocked(&mut self, page: PageIndex) -> Result<Vec<Record>, HarvestError> {
        if let PageFetch::Records(records) = self.fetch_fresh(page) {
            return Ok(records);
        }

        harvest_warn!("Page {} of {} is blocked; waiting for clearance", page, self.listing);
        if !self.fetcher.await_clearance(self.listing, page) {
            return Err(HarvestError::FetchBlocked { page });
        }

        match self.fetch_fresh(page) {
            PageFetch::Records(records) => Ok(records),
            PageFetch::Blocked => {
                harvest_warn!("Page {} of {} still blocked after retry", page, self.listing);
                Err(HarvestError::FetchBlocked { page })
            }
        }
    }

    fn fetch_fresh(&mut self, page: PageIndex) -> PageFetch {
        if self.fetches > 0 {
            self.limiter.wait();
        }
        self.fetches += 1;
        harvest_debug!("Fetching page {} of {}", page, self.listing);
        self.fetcher.fetch_page(self.listing, page)
    }
}
