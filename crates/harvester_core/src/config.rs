use serde::{Deserialize, Serialize};

use crate::record::PageIndex;

/// Which harvesting strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Strategy {
    /// Boundary search seeded by page 1; a page 1 without parseable dates yields nothing.
    #[default]
    Auto,
    /// Always scan linearly from page 1.
    Linear,
}

/// Tuning knobs for one harvest.
///
/// The buffer multipliers are empirical; they widen the estimated search
/// range and should be validated per platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Hard upper bound for any page index the search may request.
    pub max_page: PageIndex,
    /// Lower bound for the density-derived page ceiling.
    pub min_ceiling: PageIndex,
    /// Multiplier on the estimated distance to the window start.
    pub probe_buffer: f64,
    /// Multiplier on the estimated page span of the window.
    pub span_buffer: f64,
    /// Linear scan stops after this many consecutive pages without a match.
    pub max_empty_pages: u32,
    pub strategy: Strategy,
    /// Probe beyond page 1 for windows ending before page 1's oldest date
    /// instead of rejecting them outright.
    pub probe_older_windows: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_page: 1000,
            min_ceiling: 10,
            probe_buffer: 1.5,
            span_buffer: 1.2,
            max_empty_pages: 8,
            strategy: Strategy::Auto,
            probe_older_windows: false,
        }
    }
}
