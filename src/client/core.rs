use std::sync::Arc;
use tracing::debug;

use crate::client::{AnthropicClientBuilder, CallControl, ClientConfig};
use crate::drivers::ProviderDriver;
use crate::pipeline::{ChatContext, Pipeline};
use crate::protocol::ProviderRequest;
use crate::types::{ChatRequest, ChatResponse};
use crate::Result;

/// Client for the Messages endpoint.
///
/// Cheap to clone; clones share the transport and the pipeline. Invocations
/// share no mutable state, so one client serves concurrent calls.
#[derive(Clone)]
pub struct AnthropicClient {
    pub(crate) config: Arc<ClientConfig>,
    pub(crate) driver: Arc<dyn ProviderDriver>,
    pub(crate) pipeline: Arc<Pipeline<ChatContext>>,
}

impl AnthropicClient {
    pub fn builder() -> AnthropicClientBuilder {
        AnthropicClientBuilder::new()
    }

    /// Client with the default HTTP transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        AnthropicClientBuilder::new().config(config).build()
    }

    /// Client configured from `ANTHROPIC_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn driver(&self) -> &dyn ProviderDriver {
        self.driver.as_ref()
    }

    /// Translate and validate without sending anything.
    pub fn prepare(&self, request: &ChatRequest) -> Result<ProviderRequest> {
        self.driver.translate_request(request, &self.config)
    }

    /// Run one chat call. Streaming requests are assembled before returning.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.chat_with_control(request, CallControl::new()).await
    }

    /// Like [`chat`](Self::chat), observing `control` for cancellation and deadline.
    pub async fn chat_with_control(
        &self,
        request: ChatRequest,
        control: CallControl,
    ) -> Result<ChatResponse> {
        debug!(
            model = request.model(),
            stream = request.is_stream(),
            messages = request.messages().len(),
            "chat invoked"
        );
        let ctx = self.pipeline.run(ChatContext::new(request, control)).await?;
        ctx.into_result()
    }
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("config", &self.config)
            .field("driver", &self.driver)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}
