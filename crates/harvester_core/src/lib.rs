//! Harvester core: date-windowed harvesting of newest-first paginated listings.
mod config;
mod date;
mod density;
mod error;
mod filter;
mod harvest;
mod linear;
mod locate;
mod pacing;
mod record;
mod session;

pub use config::{HarvestConfig, Strategy};
pub use date::{parse_date, Bound, DateFormat, DateWindow, DATE_FORMATS};
pub use density::{DensityEstimate, Rejection, FALLBACK_DAYS_PER_PAGE};
pub use error::{HarvestError, WindowError};
pub use filter::{filter_records, DateSpan, PageSpan};
pub use harvest::{HarvestOutcome, HarvestReport, Harvester};
pub use linear::{LinearHarvester, LinearScan, ScanStop};
pub use locate::{collect_range, page_ceiling, BoundaryLocator, PageRange};
pub use pacing::{DelayPolicy, Pacer, RateLimiter};
pub use record::{ListingId, PageIndex, Record};
pub use session::{HarvestSession, PageFetch, PageFetcher};
