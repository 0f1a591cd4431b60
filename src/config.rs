use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_FEED_BASE_URL: &str = "https://api.loxewyx.com/drive";
pub const DEFAULT_DEVTOOLS_URL: &str = "http://127.0.0.1:9222";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub feed_base_url: String,
    pub devtools_url: String,
    pub feed_timeout: Duration,
    pub devtools_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            data_path: PathBuf::from("data/preferences.json"),
            feed_base_url: DEFAULT_FEED_BASE_URL.to_string(),
            devtools_url: DEFAULT_DEVTOOLS_URL.to_string(),
            feed_timeout: Duration::from_secs(10),
            devtools_timeout: Duration::from_secs(5),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: lookup("PORT")
                .and_then(|value| value.parse::<u16>().ok())
                .unwrap_or(defaults.port),
            data_path: lookup("APP_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            feed_base_url: lookup("FEED_BASE_URL")
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(defaults.feed_base_url),
            devtools_url: lookup("DEVTOOLS_URL")
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(defaults.devtools_url),
            feed_timeout: seconds(lookup("FEED_TIMEOUT_SECS")).unwrap_or(defaults.feed_timeout),
            devtools_timeout: seconds(lookup("DEVTOOLS_TIMEOUT_SECS")).unwrap_or(defaults.devtools_timeout),
        }
    }
}

fn seconds(value: Option<String>) -> Option<Duration> {
    value
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}
