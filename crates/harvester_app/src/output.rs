use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use harvester_core::{DateWindow, HarvestOutcome, HarvestReport, ListingId, Record};
use harvester_engine::{output_filename, AtomicFileWriter, PersistError};
use serde::Serialize;

/// On-disk shape of one harvest result.
#[derive(Debug, Serialize)]
pub struct HarvestFile<'a> {
    pub listing: &'a ListingId,
    pub window: DateWindow,
    pub harvested_at: DateTime<Utc>,
    pub outcome: HarvestOutcome,
    pub pages_fetched: usize,
    pub record_count: usize,
    pub records: &'a [Record],
}

pub fn write_report(
    dir: &Path,
    listing: &ListingId,
    window: DateWindow,
    report: &HarvestReport,
    harvested_at: DateTime<Utc>,
) -> Result<PathBuf, PersistError> {
    let file = HarvestFile {
        listing,
        window,
        harvested_at,
        outcome: report.outcome,
        pages_fetched: report.pages_fetched,
        record_count: report.records.len(),
        records: &report.records,
    };
    AtomicFileWriter::new(dir.to_path_buf()).write_json(&output_filename(listing, &window), &file)
}
