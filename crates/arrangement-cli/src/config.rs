//! Settings: defaults, then an optional TOML file, then environment and flags.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use arrangement_engine::{CurrentUser, TemporalNormalizer, DEFAULT_TIMEZONE};
use serde::{Deserialize, Serialize};

/// Read from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "arrangement.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Base URL of the backend event API.
    pub api_base_url: String,
    /// IANA name of the organization's timezone.
    pub timezone: String,
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
    /// The `[user]` table: who the token belongs to.
    pub user: Option<CurrentUser>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            api_token: None,
            request_timeout_secs: 10,
            user: None,
        }
    }
}

/// Values from flags or environment; `None` keeps the file/default value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_base_url: Option<String>,
    pub timezone: Option<String>,
    pub api_token: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl Settings {
    /// Load `path`, or [`DEFAULT_CONFIG_FILE`] if it exists, or defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(url) = overrides.api_base_url {
            self.api_base_url = url;
        }
        if let Some(tz) = overrides.timezone {
            self.timezone = tz;
        }
        if overrides.api_token.is_some() {
            self.api_token = overrides.api_token;
        }
        if let Some(secs) = overrides.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        self
    }

    pub fn normalizer(&self) -> Result<TemporalNormalizer> {
        TemporalNormalizer::from_name(&self.timezone).context("configured timezone")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
