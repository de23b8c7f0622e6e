use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Slack-Archiver
///
/// Every section is optional; a missing section or key falls back to the
/// values the exporter has always used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default, rename = "rate-limit")]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ApiConfig {
    /// Base URL every Web API method name is appended to
    pub base_url: String,

    /// Name of the environment variable holding the bot token
    pub token_env: String,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://slack.com/api/".to_string(),
            token_env: "SLACK_BOT_TOKEN".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Sliding-window rate limit and retry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RateLimitConfig {
    /// Maximum number of calls inside one window
    pub window_size: usize,

    /// Length of the window (seconds)
    pub interval_secs: u64,

    /// Extra wait added whenever the window is full (seconds)
    pub margin_secs: u64,

    /// Upper bound on a single limiter sleep (seconds)
    pub max_sleep_secs: u64,

    /// Fixed delay before retrying a rate-limited or reset call (seconds)
    pub retry_delay_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_size: 95,
            interval_secs: 55,
            margin_secs: 2,
            max_sleep_secs: 60,
            retry_delay_secs: 5,
        }
    }
}

impl RateLimitConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn margin(&self) -> Duration {
        Duration::from_secs(self.margin_secs)
    }

    pub fn max_sleep(&self) -> Duration {
        Duration::from_secs(self.max_sleep_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// Directory holding one dated sub-directory per export day
    pub archive_root: PathBuf,

    /// Curated JSON array of channel names whose messages are exported
    pub channels_file: PathBuf,

    /// Where the list of every available channel name is written
    pub template_file: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            archive_root: PathBuf::from("archives"),
            channels_file: PathBuf::from("channels_to_export.json"),
            template_file: PathBuf::from("channels_to_export_template.json"),
        }
    }
}
