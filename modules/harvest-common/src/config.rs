use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;
use url::Url;

use crate::error::HarvestError;

pub const DEFAULT_BASE_URL: &str = "https://www.bcci.tv";
pub const DEFAULT_LISTING_URL: &str = "https://www.bcci.tv/international/men/videos/player";

/// Harvest configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    // Sources
    pub base_url: Url,
    pub listing_url: String,
    pub api_url: Option<String>,

    // Loop ceilings
    pub max_attempts: u32,
    pub max_pages: u32,

    // Waits
    pub settle: Duration,
    pub wait_timeout: Duration,
    pub http_timeout: Duration,

    // Browser
    pub headless: bool,
    pub chrome_bin: Option<String>,

    // Output
    pub output_dir: PathBuf,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            listing_url: DEFAULT_LISTING_URL.to_string(),
            api_url: None,
            max_attempts: 10,
            max_pages: 100,
            settle: Duration::from_millis(3000),
            wait_timeout: Duration::from_secs(10),
            http_timeout: Duration::from_secs(30),
            headless: true,
            chrome_bin: None,
            output_dir: PathBuf::from("."),
        }
    }
}

impl HarvestConfig {
    /// Load configuration from environment variables. Unset variables keep
    /// their defaults; malformed values are rejected.
    pub fn from_env() -> Result<Self, HarvestError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env` but reads through `lookup`, so callers can supply
    /// values without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, HarvestError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = match get("HARVEST_BASE_URL") {
            Some(raw) => Url::parse(raw.trim()).map_err(|e| {
                HarvestError::Config(format!("HARVEST_BASE_URL is not a valid URL: {e}"))
            })?,
            None => defaults.base_url,
        };

        Ok(Self {
            base_url,
            listing_url: get("HARVEST_LISTING_URL").unwrap_or(defaults.listing_url),
            api_url: get("HARVEST_API_URL"),
            max_attempts: parse_or("HARVEST_MAX_ATTEMPTS", get("HARVEST_MAX_ATTEMPTS"), defaults.max_attempts)?,
            max_pages: parse_or("HARVEST_MAX_PAGES", get("HARVEST_MAX_PAGES"), defaults.max_pages)?,
            settle: parse_or("HARVEST_SETTLE_MS", get("HARVEST_SETTLE_MS"), 3000u64)
                .map(Duration::from_millis)?,
            wait_timeout: parse_or("HARVEST_WAIT_TIMEOUT_SECS", get("HARVEST_WAIT_TIMEOUT_SECS"), 10u64)
                .map(Duration::from_secs)?,
            http_timeout: parse_or("HARVEST_HTTP_TIMEOUT_SECS", get("HARVEST_HTTP_TIMEOUT_SECS"), 30u64)
                .map(Duration::from_secs)?,
            headless: parse_or("HARVEST_HEADLESS", get("HARVEST_HEADLESS"), defaults.headless)?,
            chrome_bin: get("CHROME_BIN"),
            output_dir: get("HARVEST_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
        })
    }

    /// The API endpoint, or a config error naming the variable to set.
    pub fn require_api_url(&self) -> Result<&str, HarvestError> {
        self.api_url.as_deref().ok_or_else(|| {
            HarvestError::Config(
                "HARVEST_API_URL (or --api-url) is required for the api driver".to_string(),
            )
        })
    }

    pub fn log_summary(&self) {
        info!(
            base_url = %self.base_url,
            listing_url = self.listing_url.as_str(),
            api_url = self.api_url.as_deref().unwrap_or("-"),
            max_attempts = self.max_attempts,
            max_pages = self.max_pages,
            wait_timeout_secs = self.wait_timeout.as_secs(),
            headless = self.headless,
            output_dir = %self.output_dir.display(),
            "Harvest config loaded"
        );
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, HarvestError>
where
    T::Err: std::fmt::Display,
{
    match raw {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|e| HarvestError::Config(format!("{key} is invalid ({v}): {e}"))),
        None => Ok(default),
    }
}
