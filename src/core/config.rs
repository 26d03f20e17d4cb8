//! Client configuration
//!
//! [`ClientConfig`] gathers the knobs of a session: where the backend lives,
//! how often to poll, how long to wait for a request, and how long an
//! unconfirmed local report may linger. Values can be taken from the
//! environment with [`ClientConfig::from_env`]; anything missing or malformed
//! falls back to the default with a logged warning.

use crate::{model::filter::TimeFilter, Error, Result};
use std::{env, fmt::Display, str::FromStr, time::Duration};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8001";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_MISSED_POLLS: u32 = 2;
pub const DEFAULT_COMMENT_CACHE_CAPACITY: usize = 64;

/// Path segments of the reports resource, appended to the backend root
pub const REPORTS_PATH: [&str; 2] = ["api", "reports"];

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend root, without the `/api/reports` suffix
    pub backend_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    /// Time window selected when the session starts
    pub time_filter: TimeFilter,
    /// Snapshots a locally appended report may be missing from before it is dropped
    pub max_missed_polls: u32,
    /// Reject report submissions without a photo
    pub require_photo: bool,
    /// Number of per-report comment threads kept in memory
    pub comment_cache_capacity: usize,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            time_filter: TimeFilter::default(),
            max_missed_polls: DEFAULT_MAX_MISSED_POLLS,
            require_photo: false,
            comment_cache_capacity: DEFAULT_COMMENT_CACHE_CAPACITY,
            user_agent: concat!("aquaroute/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Build a configuration from `AQUAROUTE_*` environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend_url: var("AQUAROUTE_BACKEND_URL").unwrap_or(defaults.backend_url),
            poll_interval: Duration::from_secs(try_load(
                "AQUAROUTE_POLL_INTERVAL_SECS",
                defaults.poll_interval.as_secs(),
            )),
            request_timeout: Duration::from_secs(try_load(
                "AQUAROUTE_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )),
            time_filter: try_load("AQUAROUTE_TIME_FILTER", defaults.time_filter),
            max_missed_polls: try_load("AQUAROUTE_MAX_MISSED_POLLS", defaults.max_missed_polls),
            require_photo: try_load("AQUAROUTE_REQUIRE_PHOTO", defaults.require_photo),
            ..defaults
        }
    }

    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_time_filter(mut self, filter: TimeFilter) -> Self {
        self.time_filter = filter;
        self
    }

    /// Full URL of the reports collection, `{backend_url}/api/reports`.
    /// A path prefix on the backend URL is kept.
    pub fn reports_url(&self) -> Result<url::Url> {
        let mut url = url::Url::parse(self.backend_url.trim())
            .map_err(|e| Error::Config(format!("invalid backend URL {:?}: {}", self.backend_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("backend URL {:?} cannot take a path", self.backend_url)))?
            .pop_if_empty()
            .extend(REPORTS_PATH);
        Ok(url)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::Config("poll interval must be non-zero".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::Config("request timeout must be non-zero".into()));
        }
        if self.comment_cache_capacity == 0 {
            return Err(Error::Config("comment cache capacity must be non-zero".into()));
        }
        self.reports_url().map(|_| ())
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match var(key) {
        None => {
            log::debug!("{} not set, using default: {}", key, default);
            default
        }
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            log::warn!("Invalid {} value {:?}: {}, using default: {}", key, raw, e, default);
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.time_filter, TimeFilter::TwentyFourHours);
        assert_eq!(config.max_missed_polls, 2);
        assert!(!config.require_photo);
        assert!(config.user_agent.starts_with("aquaroute/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reports_url() {
        let config = ClientConfig::default().with_backend_url("https://flood.example.org/");
        assert_eq!(
            config.reports_url().unwrap().as_str(),
            "https://flood.example.org/api/reports"
        );
        let bare = ClientConfig::default().with_backend_url("http://localhost:8001");
        assert_eq!(
            bare.reports_url().unwrap().as_str(),
            "http://localhost:8001/api/reports"
        );
    }

    #[test]
    fn test_reports_url_keeps_path_prefix() {
        for backend in [
            "https://flood.example.org/aquaroute",
            "https://flood.example.org/aquaroute/",
        ] {
            let config = ClientConfig::default().with_backend_url(backend);
            assert_eq!(
                config.reports_url().unwrap().as_str(),
                "https://flood.example.org/aquaroute/api/reports"
            );
        }
    }

    #[test]
    fn test_reports_url_rejects_non_base() {
        let config = ClientConfig::default().with_backend_url("mailto:ops@example.org");
        assert!(matches!(config.reports_url(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_interval = ClientConfig::default().with_poll_interval(Duration::ZERO);
        assert!(matches!(zero_interval.validate(), Err(Error::Config(_))));

        let bad_url = ClientConfig::default().with_backend_url("not a url");
        assert!(matches!(bad_url.validate(), Err(Error::Config(_))));

        let no_cache = ClientConfig {
            comment_cache_capacity: 0,
            ..Default::default()
        };
        assert!(no_cache.validate().is_err());
    }

    #[test]
    fn test_try_load_falls_back_on_garbage() {
        env::set_var("AQUAROUTE_TEST_GARBAGE_U32", "many");
        assert_eq!(try_load("AQUAROUTE_TEST_GARBAGE_U32", 7u32), 7);
        env::set_var("AQUAROUTE_TEST_GOOD_U32", " 12 ");
        assert_eq!(try_load("AQUAROUTE_TEST_GOOD_U32", 7u32), 12);
        assert_eq!(try_load("AQUAROUTE_TEST_UNSET_U32", 3u32), 3);
    }
}
