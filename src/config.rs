//! Client settings
//!
//! Settings are resolved from defaults, then an optional YAML file, then
//! environment variables.

use crate::auth::REFRESH_PATH;
use crate::error::{Error, Result, ResultExt};
use crate::http::HttpClientConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the API base URL
pub const ENV_BASE_URL: &str = "STOREFRONT_API_BASE_URL";

/// Environment variable overriding the session file location
pub const ENV_SESSION_FILE: &str = "STOREFRONT_SESSION_FILE";

/// Settings for building a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// API base URL
    pub base_url: String,

    /// Refresh endpoint path
    pub refresh_path: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// User agent override
    pub user_agent: Option<String>,

    /// Where the CLI keeps the session between runs
    pub session_file: PathBuf,

    /// Extra headers sent with every request
    pub headers: HashMap<String, String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            refresh_path: REFRESH_PATH.to_string(),
            timeout_secs: 30,
            user_agent: None,
            session_file: PathBuf::from(".storefront-session.json"),
            headers: HashMap::new(),
        }
    }
}

impl ClientSettings {
    /// Parse settings from YAML; missing keys take their defaults
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read settings from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_yaml(&contents)
    }

    /// Resolve settings: defaults, then `path` if given, then the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let settings = settings.with_env(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Apply environment overrides using `lookup`
    #[must_use]
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(file) = lookup(ENV_SESSION_FILE).filter(|v| !v.trim().is_empty()) {
            self.session_file = PathBuf::from(file);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::invalid_config(
                "base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }

        if self.refresh_path.trim().is_empty() {
            return Err(Error::invalid_config("refresh_path", "must not be empty"));
        }

        if self.timeout_secs == 0 {
            return Err(Error::invalid_config("timeout_secs", "must be positive"));
        }

        Ok(())
    }

    /// HTTP client configuration for these settings
    pub fn http_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .base_url(&self.base_url)
            .refresh_path(&self.refresh_path)
            .timeout(Duration::from_secs(self.timeout_secs));

        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }
        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }

        builder.build()
    }
}
