use std::path::PathBuf;
use std::time::Duration;

use crate::logging::LogFormat;

/// Default backend base URL (includes the `/api/v1` prefix).
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// Default directory for the file-backed draft store.
pub const DEFAULT_DRAFT_DIR: &str = ".glafrica";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Invalid configuration value.
#[derive(Debug, thiserror::Error)]
#[error("{var}: {message}")]
pub struct ConfigError {
    pub var: &'static str,
    pub message: String,
}

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local backend. Command-line
/// flags override individual values after loading.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, without trailing slash.
    pub api_url: String,
    /// Bearer access token. Takes precedence over username/password.
    pub api_token: Option<String>,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    /// Directory holding the saved draft.
    pub draft_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub log_format: LogFormat,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            admin_username: None,
            admin_password: None,
            draft_dir: PathBuf::from(DEFAULT_DRAFT_DIR),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            log_format: LogFormat::Text,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                         |
    /// |---------------------------|---------------------------------|
    /// | `GLAFRICA_API_URL`        | `http://localhost:8000/api/v1`  |
    /// | `GLAFRICA_API_TOKEN`      | --                              |
    /// | `GLAFRICA_ADMIN_USERNAME` | --                              |
    /// | `GLAFRICA_ADMIN_PASSWORD` | --                              |
    /// | `GLAFRICA_DRAFT_DIR`      | `.glafrica`                     |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                            |
    /// | `LOG_FORMAT`              | `text`                          |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let request_timeout_secs = match non_empty("REQUEST_TIMEOUT_SECS") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError {
                var: "REQUEST_TIMEOUT_SECS",
                message: format!("must be a whole number of seconds, got '{v}'"),
            })?,
            None => defaults.request_timeout_secs,
        };

        let log_format = match non_empty("LOG_FORMAT") {
            Some(v) => v.parse().map_err(|message| ConfigError {
                var: "LOG_FORMAT",
                message,
            })?,
            None => defaults.log_format,
        };

        Ok(Self {
            api_url: non_empty("GLAFRICA_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            api_token: non_empty("GLAFRICA_API_TOKEN"),
            admin_username: non_empty("GLAFRICA_ADMIN_USERNAME"),
            admin_password: non_empty("GLAFRICA_ADMIN_PASSWORD"),
            draft_dir: non_empty("GLAFRICA_DRAFT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.draft_dir),
            request_timeout_secs,
            log_format,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Shared HTTP client honouring the configured timeout.
    pub fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .timeout(self.request_timeout())
            .build()
    }
}
