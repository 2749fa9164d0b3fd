use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

use crate::logging::LogDestination;

/// Harvest the records of a newest-first paginated listing that fall inside a date window.
#[derive(Debug, Parser)]
#[command(name = "harvest", version)]
pub struct Args {
    /// Listing identifier substituted for `{listing}` in the source URL template.
    pub listing: String,

    /// First day of the window, inclusive (e.g. 2024-03-01, "1 March 2024", "March 1, 2024").
    pub start: String,

    /// Last day of the window, inclusive.
    pub end: String,

    /// RON configuration describing the listing source.
    #[arg(short, long)]
    pub config: PathBuf,

    /// Directory for the result file; overrides the configured one.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Scan page by page instead of searching for the window.
    #[arg(long)]
    pub linear: bool,

    #[arg(long, value_enum, default_value_t = LogTarget::Terminal)]
    pub log: LogTarget,

    /// Log debug output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    File,
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}
