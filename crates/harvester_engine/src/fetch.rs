use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use futures_util::StreamExt;
use harvest_logging::{harvest_debug, harvest_error, harvest_info, harvest_warn};
use harvester_core::{ListingId, PageFetch, PageFetcher, PageIndex, Record};
use reqwest::header::CONTENT_TYPE;
use tokio::runtime::Runtime;
use url::Url;

use crate::decode::decode_page;
use crate::extract::{Extractor, SelectorError, SelectorExtractor};
use crate::source::ListingSource;
use crate::{FailureKind, FetchError, FetchMetadata, FetchOutput};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub user_agent: String,
    /// Statuses that mean the platform is refusing us.
    pub blocking_statuses: Vec<u16>,
    /// Statuses that mean the page lies past the end of the listing.
    pub end_statuses: Vec<u16>,
    /// Case-insensitive body text that marks a challenge page; only checked on pages without items.
    pub blocked_markers: Vec<String>,
    /// Cool-down before a blocked page is retried; `None` gives up immediately.
    /// Failures that waiting cannot fix are never retried.
    pub clearance_wait: Option<Duration>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
            user_agent: concat!("listing-harvester/", env!("CARGO_PKG_VERSION")).to_string(),
            blocking_statuses: vec![403, 429, 503],
            end_statuses: vec![404, 410, 500],
            blocked_markers: [
                "captcha__human__title",
                "verification required",
                "cf-turnstile",
                "just a moment...",
                "verify you are human",
            ]
            .iter()
            .map(|marker| marker.to_string())
            .collect(),
            clearance_wait: Some(Duration::from_secs(30)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Selector(#[from] SelectorError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Async download of a single page, bounded by [`FetchSettings`].
#[derive(Debug, Clone)]
pub struct Downloader {
    client: reqwest::Client,
    settings: FetchSettings,
}

impl Downloader {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }

    pub async fn download(&self, url: &Url) -> Result<FetchOutput, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, content_len));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        if let Some(ct) = content_type.as_deref() {
            if !self.is_content_type_allowed(ct) {
                return Err(FetchError::new(
                    FailureKind::UnsupportedContentType {
                        content_type: ct.to_string(),
                    },
                    "unsupported content type",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, next_len));
            }
            bytes.extend_from_slice(&chunk);
        }

        let metadata = FetchMetadata {
            url: url.to_string(),
            final_url,
            content_type,
            byte_len: bytes.len() as u64,
        };
        Ok(FetchOutput { bytes, metadata })
    }
}

/// Whether waiting can turn a blocked page into a readable one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockCause {
    /// Blocking status, challenge page, timeout or connection trouble.
    Transient,
    /// The page will fail the same way on every attempt.
    Permanent,
}

/// [`PageFetcher`] over HTTP for one [`ListingSource`].
///
/// Owns its own tokio runtime and blocks on it, so it must not be called from async code.
pub struct HttpPageFetcher {
    runtime: Runtime,
    downloader: Downloader,
    source: ListingSource,
    extractor: Box<dyn Extractor>,
    blocks: Mutex<HashMap<(ListingId, PageIndex), BlockCause>>,
}

impl HttpPageFetcher {
    pub fn new(settings: FetchSettings, source: ListingSource) -> Result<Self, SetupError> {
        let extractor = SelectorExtractor::new(&source.selectors)?;
        Self::with_extractor(settings, source, Box::new(extractor))
    }

    pub fn with_extractor(
        settings: FetchSettings,
        source: ListingSource,
        extractor: Box<dyn Extractor>,
    ) -> Result<Self, SetupError> {
        // Reject unusable templates up front rather than on every page.
        source.page_url(&ListingId::new("listing"), 1)?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .map_err(|err| FetchError::new(FailureKind::Runtime, err.to_string()))?;
        Ok(Self {
            runtime,
            downloader: Downloader::new(settings)?,
            source,
            extractor,
            blocks: Mutex::new(HashMap::new()),
        })
    }

    fn settings(&self) -> &FetchSettings {
        self.downloader.settings()
    }

    fn blocks(&self) -> MutexGuard<'_, HashMap<(ListingId, PageIndex), BlockCause>> {
        self.blocks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fetch_records(
        &self,
        listing: &ListingId,
        page: PageIndex,
    ) -> Result<Vec<Record>, BlockCause> {
        let url = self.source.page_url(listing, page).map_err(|err| {
            harvest_error!("No URL for page {} of {}: {}", page, listing, err);
            BlockCause::Permanent
        })?;

        harvest_debug!("GET {}", url);
        match self.runtime.block_on(self.downloader.download(&url)) {
            Ok(output) => self.read_page(page, output),
            Err(err) => self.classify_failure(page, err),
        }
    }

    fn read_page(
        &self,
        page: PageIndex,
        output: FetchOutput,
    ) -> Result<Vec<Record>, BlockCause> {
        let decoded = decode_page(&output.bytes, output.metadata.content_type.as_deref())
            .map_err(|err| {
                harvest_error!("Page {} unreadable: {}", page, err);
                BlockCause::Permanent
            })?;

        let records = self.extractor.extract(&decoded.html);
        harvest_debug!(
            "Page {}: {} records from {} bytes ({})",
            page,
            records.len(),
            output.metadata.byte_len,
            decoded.encoding_label
        );

        // A page with items is never a challenge page, whatever scripts it loads.
        if records.is_empty() {
            if let Some(marker) = self.challenge_marker(&decoded.html) {
                harvest_warn!("Page {} looks like a challenge page (\"{}\")", page, marker);
                return Err(BlockCause::Transient);
            }
        }
        Ok(records)
    }

    fn challenge_marker(&self, html: &str) -> Option<&str> {
        let lowered = html.to_lowercase();
        self.settings()
            .blocked_markers
            .iter()
            .find(|marker| lowered.contains(&marker.to_lowercase()))
            .map(String::as_str)
    }

    fn classify_failure(
        &self,
        page: PageIndex,
        err: FetchError,
    ) -> Result<Vec<Record>, BlockCause> {
        let settings = self.settings();
        match err.kind {
            FailureKind::HttpStatus(code) if settings.end_statuses.contains(&code) => {
                harvest_info!("Page {} answered {}; treating as end of listing", page, code);
                Ok(Vec::new())
            }
            FailureKind::HttpStatus(code) if settings.blocking_statuses.contains(&code) => {
                harvest_warn!("Page {} blocked with status {}", page, code);
                Err(BlockCause::Transient)
            }
            FailureKind::Timeout | FailureKind::Network => {
                harvest_warn!("Page {} failed: {}", page, err);
                Err(BlockCause::Transient)
            }
            _ => {
                harvest_error!("Page {} failed for good: {}", page, err);
                Err(BlockCause::Permanent)
            }
        }
    }
}

impl PageFetcher for HttpPageFetcher {
    fn fetch_page(&self, listing: &ListingId, page: PageIndex) -> PageFetch {
        let fetched = self.fetch_records(listing, page);
        let key = (listing.clone(), page);
        match fetched {
            Ok(records) => {
                self.blocks().remove(&key);
                PageFetch::Records(records)
            }
            Err(cause) => {
                self.blocks().insert(key, cause);
                PageFetch::Blocked
            }
        }
    }

    fn await_clearance(&self, listing: &ListingId, page: PageIndex) -> bool {
        let cause = self.blocks().get(&(listing.clone(), page)).copied();
        if cause == Some(BlockCause::Permanent) {
            harvest_error!(
                "Page {} of {} fails the same way on every attempt; not retrying",
                page,
                listing
            );
            return false;
        }
        match self.settings().clearance_wait {
            Some(wait) => {
                harvest_warn!(
                    "Blocked on page {} of {}; waiting {:?} before retrying",
                    page,
                    listing,
                    wait
                );
                thread::sleep(wait);
                true
            }
            None => false,
        }
    }
}

fn too_large(max_bytes: u64, actual: u64) -> FetchError {
    FetchError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
