use std::sync::Arc;
use std::time::Duration;

use crate::client::core::AnthropicClient;
use crate::client::ClientConfig;
use crate::drivers::{AnthropicDriver, ProviderDriver};
use crate::pipeline::chat_pipeline;
use crate::transport::{HttpTransport, WireClient};
use crate::Result;

/// Builder for creating clients with custom configuration.
///
/// Keep this surface area small and predictable.
pub struct AnthropicClientBuilder {
    config: ClientConfig,
    wire: Option<Arc<dyn WireClient>>,
    driver: Option<Arc<dyn ProviderDriver>>,
}

impl AnthropicClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            wire: None,
            driver: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Override the base URL (mock servers, gateways).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.config.api_version = version.into();
        self
    }

    /// Add an extra request header, e.g. `anthropic-beta`.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config = self.config.with_header(name, value);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    /// Inject a custom wire client. Default is [`HttpTransport`].
    pub fn wire_client(mut self, wire: Arc<dyn WireClient>) -> Self {
        self.wire = Some(wire);
        self
    }

    /// Inject a custom driver. Default is [`AnthropicDriver`].
    pub fn driver(mut self, driver: Arc<dyn ProviderDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<AnthropicClient> {
        let config = Arc::new(self.config.normalized()?);
        let wire: Arc<dyn WireClient> = match self.wire {
            Some(wire) => wire,
            None => Arc::new(HttpTransport::new(&config)?),
        };
        let driver: Arc<dyn ProviderDriver> = match self.driver {
            Some(driver) => driver,
            None => Arc::new(AnthropicDriver::default()),
        };
        let pipeline = Arc::new(chat_pipeline(driver.clone(), config.clone(), wire)?);

        Ok(AnthropicClient {
            config,
            driver,
            pipeline,
        })
    }
}

impl Default for AnthropicClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
