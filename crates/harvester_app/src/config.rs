//! RON configuration file for the `harvest` binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use harvest_logging::harvest_info;
use harvester_core::{DelayPolicy, HarvestConfig};
use harvester_engine::{FetchSettings, ListingSource};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub source: ListingSource,
    #[serde(default)]
    pub fetch: FetchOptions,
    #[serde(default)]
    pub harvest: HarvestConfig,
    #[serde(default)]
    pub delay: DelayPolicy,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

/// File-friendly mirror of [`FetchSettings`], with durations in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub user_agent: String,
    pub blocking_statuses: Vec<u16>,
    pub end_statuses: Vec<u16>,
    pub blocked_markers: Vec<String>,
    pub clearance_wait_ms: Option<u64>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        let settings = FetchSettings::default();
        Self {
            connect_timeout_ms: millis(settings.connect_timeout),
            request_timeout_ms: millis(settings.request_timeout),
            redirect_limit: settings.redirect_limit,
            max_bytes: settings.max_bytes,
            allowed_content_types: settings.allowed_content_types,
            user_agent: settings.user_agent,
            blocking_statuses: settings.blocking_statuses,
            end_statuses: settings.end_statuses,
            blocked_markers: settings.blocked_markers,
            clearance_wait_ms: settings.clearance_wait.map(millis),
        }
    }
}

impl FetchOptions {
    pub fn settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            redirect_limit: self.redirect_limit,
            max_bytes: self.max_bytes,
            allowed_content_types: self.allowed_content_types.clone(),
            user_agent: self.user_agent.clone(),
            blocking_statuses: self.blocking_statuses.clone(),
            end_statuses: self.end_statuses.clone(),
            blocked_markers: self.blocked_markers.clone(),
            clearance_wait: self.clearance_wait_ms.map(Duration::from_millis),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

pub fn parse(text: &str) -> anyhow::Result<AppConfig> {
    ron::from_str(text).context("invalid harvest configuration")
}

pub fn load(path: &Path) -> anyhow::Result<AppConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("could not read config file {}", path.display()))?;
    let config = parse(&text).with_context(|| format!("in {}", path.display()))?;
    harvest_info!("Loaded configuration from {:?}", path);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvester_core::Strategy;
    use pretty_assertions::assert_eq;

    #[test]
    fn example_config_parses() {
        let config = parse(include_str!("../../../config/harvest.example.ron")).unwrap();

        assert_eq!(config.source.selectors.item, "div.review");
        assert_eq!(
            config.source.selectors.date_attribute.as_deref(),
            Some("datetime")
        );
        assert_eq!(config.source.selectors.fields.len(), 3);
        assert_eq!(config.fetch.clearance_wait_ms, Some(60_000));
        assert_eq!(config.fetch.end_statuses, vec![404, 410, 500]);
        assert_eq!(config.harvest.strategy, Strategy::Auto);
        assert_eq!(
            config.delay,
            DelayPolicy::Uniform {
                min_ms: 3000,
                max_ms: 5000
            }
        );
        assert_eq!(config.output_dir, Some(PathBuf::from("harvests")));
    }

    #[test]
    fn omitted_sections_use_defaults() {
        let config = parse(
            r#"(
                source: (
                    url_template: "https://example.com/{listing}?page={page}",
                    selectors: (item: "li", date: ".date"),
                ),
                harvest: (strategy: Linear),
            )"#,
        )
        .unwrap();

        assert_eq!(config.fetch, FetchOptions::default());
        assert_eq!(config.delay, DelayPolicy::default());
        assert_eq!(config.harvest.strategy, Strategy::Linear);
        assert_eq!(config.harvest.max_empty_pages, 8);
        assert_eq!(config.harvest.max_page, 1000);
        assert_eq!(config.output_dir, None);
    }

    #[test]
    fn fetch_options_round_trip_default_settings() {
        let settings = FetchOptions::default().settings();
        let defaults = FetchSettings::default();

        assert_eq!(settings.request_timeout, defaults.request_timeout);
        assert_eq!(settings.clearance_wait, defaults.clearance_wait);
        assert_eq!(settings.blocking_statuses, defaults.blocking_statuses);
    }

    #[test]
    fn missing_source_is_an_error() {
        assert!(parse("(harvest: (max_page: 10))").is_err());
    }
}
