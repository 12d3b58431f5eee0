//! Client configuration: environment, YAML and programmatic construction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::protocol::{DEFAULT_API_VERSION, DEFAULT_BASE_URL, MESSAGES_PATH};
use crate::{Error, ErrorContext, Result};

const VERSION_HEADER: &str = "anthropic-version";
const BETA_HEADER: &str = "anthropic-beta";

/// Connection settings for the Messages endpoint.
///
/// The API key is carried here and handed to the translator explicitly; the
/// client never looks it up from global state once constructed.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_key: String,
    #[serde(alias = "api_url")]
    pub base_url: String,
    #[serde(alias = "anthropic_version")]
    pub api_version: String,
    /// Extra request headers, e.g. `anthropic-beta`.
    pub extra_headers: BTreeMap<String, String>,
    /// Whole-request timeout for the default HTTP transport.
    pub timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            extra_headers: BTreeMap::new(),
            timeout_secs: None,
        }
    }
}

// Keep the key out of logs.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("extra_headers", &self.extra_headers)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct LlmsDocument {
    llms: LlmsSection,
}

#[derive(Debug, Deserialize)]
struct LlmsSection {
    anthropic: ClientConfig,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Read settings from the environment.
    ///
    /// - `ANTHROPIC_API_KEY`
    /// - `ANTHROPIC_URL` (default `https://api.anthropic.com/v1/`)
    /// - `ANTHROPIC_VERSION` (default `2023-06-01`)
    /// - `ANTHROPIC_BETA` (sent as `anthropic-beta`)
    /// - `ANTHROPIC_TIMEOUT_SECS`
    ///
    /// A missing key is not an error here; requests fail validation instead.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            config.api_key = key;
        }
        if let Ok(url) = std::env::var("ANTHROPIC_URL") {
            config.base_url = url;
        }
        if let Ok(version) = std::env::var("ANTHROPIC_VERSION") {
            config.api_version = version;
        }
        if let Ok(beta) = std::env::var("ANTHROPIC_BETA") {
            if !beta.trim().is_empty() {
                config.extra_headers.insert(BETA_HEADER.to_string(), beta);
            }
        }
        if let Ok(raw) = std::env::var("ANTHROPIC_TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                Error::configuration_with_context(
                    format!("invalid timeout '{}'", raw),
                    ErrorContext::new()
                        .with_field_path("ANTHROPIC_TIMEOUT_SECS")
                        .with_details("expected a whole number of seconds")
                        .with_source("client_config"),
                )
            })?;
            config.timeout_secs = Some(secs);
        }
        config.normalized()
    }

    /// Parse YAML, either flat or nested under `llms.anthropic`:
    ///
    /// ```yaml
    /// llms:
    ///   anthropic:
    ///     api_key: sk-ant-...
    ///     api_url: https://api.anthropic.com/v1/
    ///     extra_headers:
    ///       anthropic-version: "2023-06-01"
    ///       anthropic-beta: prompt-caching-2024-07-31
    /// ```
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config = match serde_yaml::from_str::<LlmsDocument>(yaml) {
            Ok(doc) => doc.llms.anthropic,
            Err(_) => serde_yaml::from_str::<ClientConfig>(yaml).map_err(|e| {
                Error::configuration_with_context(
                    format!("invalid client config: {}", e),
                    ErrorContext::new().with_source("client_config"),
                )
            })?,
        };
        config.normalized()
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("cannot read client config: {}", e),
                ErrorContext::new()
                    .with_details(path.display().to_string())
                    .with_source("client_config"),
            )
        })?;
        Self::from_yaml_str(&text)
    }

    /// Validate the base URL and fold header-borne settings into fields.
    ///
    /// An `anthropic-version` entry in `extra_headers` becomes `api_version`;
    /// the base URL always ends with `/` afterwards.
    pub fn normalized(mut self) -> Result<Self> {
        if let Some(version) = self.extra_headers.remove(VERSION_HEADER) {
            self.api_version = version;
        }
        self.extra_headers = self
            .extra_headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();

        let base = url::Url::parse(self.base_url.trim()).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid base url '{}': {}", self.base_url, e),
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_source("client_config"),
            )
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::configuration_with_context(
                format!("unsupported url scheme '{}'", base.scheme()),
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_source("client_config"),
            ));
        }
        let mut base = base.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        self.base_url = base;
        Ok(self)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs().max(1));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Full URL of the Messages endpoint.
    pub fn messages_url(&self) -> String {
        if self.base_url.ends_with('/') {
            format!("{}{}", self.base_url, MESSAGES_PATH)
        } else {
            format!("{}/{}", self.base_url, MESSAGES_PATH)
        }
    }
}
