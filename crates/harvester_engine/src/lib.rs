//! Harvester engine: HTTP page fetching, record extraction and result persistence.
mod decode;
mod extract;
mod fetch;
mod filename;
mod persist;
mod source;
mod types;

pub use decode::{decode_page, DecodeError, DecodedPage};
pub use extract::{Extractor, FieldSelector, RecordSelectors, SelectorError, SelectorExtractor};
pub use fetch::{Downloader, FetchSettings, HttpPageFetcher, SetupError};
pub use filename::output_filename;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use source::ListingSource;
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput};
