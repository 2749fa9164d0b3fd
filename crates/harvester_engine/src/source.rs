use harvester_core::{ListingId, PageIndex};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::extract::RecordSelectors;
use crate::{FailureKind, FetchError};

const LISTING_PLACEHOLDER: &str = "{listing}";
const PAGE_PLACEHOLDER: &str = "{page}";

/// A remote listing platform: how to address its pages and read its records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSource {
    /// Page URL with `{listing}` and `{page}` placeholders,
    /// e.g. `https://reviews.example.com/products/{listing}/reviews?page={page}`.
    pub url_template: String,
    pub selectors: RecordSelectors,
}

impl ListingSource {
    pub fn page_url(&self, listing: &ListingId, page: PageIndex) -> Result<Url, FetchError> {
        if !self.url_template.contains(PAGE_PLACEHOLDER) {
            return Err(FetchError::new(
                FailureKind::InvalidUrl,
                format!("template has no {PAGE_PLACEHOLDER} placeholder"),
            ));
        }
        let raw = self
            .url_template
            .replace(LISTING_PLACEHOLDER, listing.as_str())
            .replace(PAGE_PLACEHOLDER, &page.to_string());
        Url::parse(&raw).map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))
    }
}
