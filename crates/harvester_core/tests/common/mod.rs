#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};

use chrono::{Days, NaiveDate};
use harvester_core::{ListingId, PageFetch, PageFetcher, PageIndex, RateLimiter, Record};
use serde_json::json;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(harvest_logging::initialize_for_tests);
}

pub fn date(text: &str) -> NaiveDate {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").expect("test date")
}

pub fn record(date_text: &str) -> Record {
    Record::new(Some(date(date_text)), json!({ "date": date_text }))
}

pub fn undated(label: &str) -> Record {
    Record::new(None, json!({ "label": label }))
}

pub fn listing() -> ListingId {
    ListingId::new("acme-widgets")
}

type PageFn = Box<dyn Fn(PageIndex) -> Vec<Record> + Send + Sync>;

/// In-memory listing that records every request it receives.
pub struct FakeListing {
    pages: PageFn,
    calls: Mutex<Vec<PageIndex>>,
    blocked: Mutex<HashMap<PageIndex, usize>>,
    clearance: bool,
}

impl FakeListing {
    pub fn from_fn(pages: impl Fn(PageIndex) -> Vec<Record> + Send + Sync + 'static) -> Self {
        Self {
            pages: Box::new(pages),
            calls: Mutex::new(Vec::new()),
            blocked: Mutex::new(HashMap::new()),
            clearance: true,
        }
    }

    /// Explicit pages; anything past the last one is empty.
    pub fn from_pages(pages: Vec<Vec<Record>>) -> Self {
        Self::from_fn(move |page| {
            pages
                .get(page as usize - 1)
                .cloned()
                .unwrap_or_default()
        })
    }

    /// One record per day going back from `newest`, `per_page` records per page.
    pub fn daily(newest: NaiveDate, per_page: usize, total: usize) -> Self {
        Self::from_fn(move |page| {
            let start = (page as usize - 1) * per_page;
            (start..(start + per_page).min(total))
                .map(|i| {
                    let day = newest - Days::new(i as u64);
                    Record::new(Some(day), json!({ "n": i }))
                })
                .collect()
        })
    }

    /// Report `page` as blocked for its next `times` requests.
    pub fn block(self, page: PageIndex, times: usize) -> Self {
        self.blocked.lock().unwrap().insert(page, times);
        self
    }

    pub fn refuse_clearance(mut self) -> Self {
        self.clearance = false;
        self
    }

    pub fn calls(&self) -> Vec<PageIndex> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_page_requested(&self) -> PageIndex {
        self.calls().into_iter().max().unwrap_or(0)
    }

    pub fn has_duplicate_requests(&self) -> bool {
        let mut calls = self.calls();
        let before = calls.len();
        calls.sort_unstable();
        calls.dedup();
        calls.len() != before
    }
}

impl PageFetcher for FakeListing {
    fn fetch_page(&self, _listing: &ListingId, page: PageIndex) -> PageFetch {
        self.calls.lock().unwrap().push(page);
        let mut blocked = self.blocked.lock().unwrap();
        if let Some(remaining) = blocked.get_mut(&page) {
            if *remaining > 0 {
                *remaining -= 1;
                return PageFetch::Blocked;
            }
        }
        PageFetch::Records((self.pages)(page))
    }

    fn await_clearance(&self, _listing: &ListingId, _page: PageIndex) -> bool {
        self.clearance
    }
}

/// Rate limiter that only counts how often it was asked to wait.
#[derive(Default)]
pub struct CountingLimiter {
    waits: AtomicUsize,
}

impl CountingLimiter {
    pub fn waits(&self) -> usize {
        self.waits.load(Ordering::SeqCst)
    }
}

impl RateLimiter for CountingLimiter {
    fn wait(&self) {
        self.waits.fetch_add(1, Ordering::SeqCst);
    }
}
