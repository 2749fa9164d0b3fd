//! Page-boundary search over a newest-first listing.
//!
//! The locator finds the lowest and highest page whose date span overlaps the
//! window. Page 1 seeds a density estimate, exponential probing brackets the
//! first overlapping page, and binary searches narrow both boundaries. Every
//! lookup goes through the [`HarvestSession`] cache and no page above the
//! ceiling is ever requested, so the search ends after O(log ceiling) lookups
//! whatever the real density turns out to be.

use harvest_logging::{harvest_debug, harvest_info};
use serde::Serialize;

use crate::config::HarvestConfig;
use crate::date::DateWindow;
use crate::density::DensityEstimate;
use crate::error::HarvestError;
use crate::filter::{filter_records, PageSpan};
use crate::record::{PageIndex, Record};
use crate::session::HarvestSession;

/// Inclusive range of pages overlapping the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRange {
    pub first: PageIndex,
    pub last: PageIndex,
}

/// Highest page the search may request: the estimated distance to the window
/// start, widened by `probe_buffer`, clamped to `[min_ceiling, max_page]`.
pub fn page_ceiling(
    estimate: &DensityEstimate,
    window: &DateWindow,
    config: &HarvestConfig,
) -> PageIndex {
    let days_to_start = (estimate.newest - window.start()).num_days();
    estimate
        .pages_for(days_to_start, config.probe_buffer)
        .max(config.min_ceiling)
        .min(config.max_page)
        // keeps `page + 1` in range everywhere below
        .min(PageIndex::MAX - 1)
        .max(1)
}

#[derive(Debug)]
struct SearchState {
    ceiling: PageIndex,
    /// Lowest page seen empty. Nothing at or past it is requested again.
    listing_end: Option<PageIndex>,
    lookups: u32,
}

pub struct BoundaryLocator<'s, 'a> {
    session: &'s mut HarvestSession<'a>,
    window: DateWindow,
    estimate: DensityEstimate,
    span_buffer: f64,
    state: SearchState,
}

impl<'s, 'a> BoundaryLocator<'s, 'a> {
    pub fn new(
        session: &'s mut HarvestSession<'a>,
        window: DateWindow,
        estimate: DensityEstimate,
        config: &HarvestConfig,
    ) -> Self {
        let ceiling = page_ceiling(&estimate, &window, config);
        Self {
            session,
            window,
            estimate,
            span_buffer: config.span_buffer,
            state: SearchState {
                ceiling,
                listing_end: None,
                lookups: 0,
            },
        }
    }

    pub fn ceiling(&self) -> PageIndex {
        self.state.ceiling
    }

    /// Returns `None` when no page overlaps the window. That is a normal outcome.
    pub fn locate(mut self) -> Result<Option<PageRange>, HarvestError> {
        harvest_debug!(
            "Searching {} with {} days/page, ceiling {}",
            self.window,
            self.estimate.days_per_page,
            self.state.ceiling
        );

        let Some(first) = self.find_first()? else {
            harvest_info!(
                "No page overlaps {} ({} lookups)",
                self.window,
                self.state.lookups
            );
            return Ok(None);
        };
        let last = self.find_last(first)?;

        harvest_info!(
            "Pages {}..={} overlap {} ({} lookups)",
            first,
            last,
            self.window,
            self.state.lookups
        );
        Ok(Some(PageRange { first, last }))
    }

    fn span(&mut self, page: PageIndex) -> Result<PageSpan, HarvestError> {
        if page > self.state.ceiling {
            return Ok(PageSpan::Exhausted);
        }
        if self.state.listing_end.is_some_and(|end| page >= end) {
            return Ok(PageSpan::Exhausted);
        }

        self.state.lookups += 1;
        let span = self.session.span(page)?;
        if span == PageSpan::Exhausted {
            harvest_debug!("Page {} is empty; listing ends before it", page);
            let end = self.state.listing_end.map_or(page, |end| end.min(page));
            self.state.listing_end = Some(end);
        }
        Ok(span)
    }

    fn find_first(&mut self) -> Result<Option<PageIndex>, HarvestError> {
        let window = self.window;
        if self.estimate.first_page_span().overlaps(&window) {
            return Ok(Some(1));
        }

        let days_past_end = (self.estimate.newest - window.end()).num_days();
        let mut probe = self.estimate.pages_for(days_past_end, 1.0).max(2);
        let mut step: PageIndex = 1;
        // Highest page known to hold only dates newer than the window.
        let mut newer_until: PageIndex = 1;

        while probe <= self.state.ceiling {
            match self.span(probe)? {
                PageSpan::Exhausted => {
                    return self.search_first(newer_until + 1, probe - 1, None);
                }
                PageSpan::Undated => {
                    harvest_debug!("Page {} has no parseable dates; probing on", probe);
                }
                PageSpan::Dated(span) if span.overlaps(&window) => {
                    harvest_debug!("Probe hit page {}", probe);
                    return self.search_first(newer_until + 1, probe - 1, Some(probe));
                }
                PageSpan::Dated(span) if span.is_older_than(&window) => {
                    harvest_debug!("Probe overshot at page {}", probe);
                    return self.search_first(newer_until + 1, probe - 1, None);
                }
                PageSpan::Dated(_) => newer_until = probe,
            }

            match probe.checked_add(step) {
                Some(next) => probe = next,
                None => break,
            }
            step = step.saturating_mul(2);
        }

        harvest_debug!(
            "Probing passed ceiling {}; searching up to it",
            self.state.ceiling
        );
        self.search_first(newer_until + 1, self.state.ceiling, None)
    }

    /// Lowest overlapping page in `[lo, hi]`, or `candidate` if none lies below it.
    fn search_first(
        &mut self,
        mut lo: PageIndex,
        mut hi: PageIndex,
        candidate: Option<PageIndex>,
    ) -> Result<Option<PageIndex>, HarvestError> {
        let window = self.window;
        let mut first = candidate;

        while lo <= hi {
            let mid = lo + (hi - lo) / 2;
            match self.span(mid)? {
                PageSpan::Dated(span) if span.is_newer_than(&window) => lo = mid + 1,
                PageSpan::Dated(span) if span.overlaps(&window) => {
                    first = Some(mid);
                    hi = mid - 1;
                }
                // Older than the window, unknown span, or past the listing end.
                _ => hi = mid - 1,
            }
        }
        Ok(first)
    }

    /// Highest overlapping page at or after `first`.
    ///
    /// The upper bound starts at the window's estimated page span and doubles
    /// while the bound itself still overlaps, up to the ceiling.
    fn find_last(&mut self, first: PageIndex) -> Result<PageIndex, HarvestError> {
        let window = self.window;
        let ceiling = self.state.ceiling;

        if let PageSpan::Dated(span) = self.span(first)? {
            if span.oldest < window.start() {
                return Ok(first);
            }
        }

        let mut last = first;
        let mut reach = self
            .estimate
            .pages_for(window.span_days(), self.span_buffer)
            .max(1);
        let mut lo = first + 1;

        loop {
            let hi = first.saturating_add(reach).min(ceiling);
            let (mut l, mut h) = (lo, hi);
            while l <= h {
                let mid = l + (h - l) / 2;
                match self.span(mid)? {
                    PageSpan::Dated(span) if span.is_newer_than(&window) => l = mid + 1,
                    PageSpan::Dated(span) if span.overlaps(&window) => {
                        last = mid;
                        // Later pages are older still.
                        if span.oldest < window.start() {
                            return Ok(last);
                        }
                        l = mid + 1;
                    }
                    _ => h = mid - 1,
                }
            }

            if last < hi || hi >= ceiling {
                return Ok(last);
            }
            harvest_debug!("Page {} still overlaps; widening last-page search", hi);
            lo = hi + 1;
            reach = reach.saturating_mul(2);
        }
    }
}

/// Fetches every page of `range` through the cache and keeps the records inside `window`.
/// Output follows page order, i.e. newest first.
pub fn collect_range(
    session: &mut HarvestSession<'_>,
    range: PageRange,
    window: &DateWindow,
) -> Result<Vec<Record>, HarvestError> {
    let mut records = Vec::new();
    for page in range.first..=range.last {
        let page_records = session.page(page)?;
        if page_records.is_empty() {
            break;
        }
        records.extend(filter_records(page_records, window));
    }
    Ok(records)
}
