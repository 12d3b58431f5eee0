//! Chat stages: prepare → call → finalize.

use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::client::{CallControl, ClientConfig};
use crate::drivers::ProviderDriver;
use crate::pipeline::{
    assemble, Pipeline, PipelineBuilder, PipelineError, SseDecoder, Stage, Transition,
};
use crate::protocol::ProviderRequest;
use crate::transport::{TransportError, WireBody, WireClient};
use crate::types::{ChatRequest, ChatResponse};
use crate::{BoxStream, Result};

pub const PREPARE: &str = "prepare";
pub const CALL: &str = "call";
pub const FINALIZE: &str = "finalize";

/// Transition labels of the chat pipeline.
pub mod labels {
    pub const CALL: &str = "call";
    pub const WRAP_UP: &str = "wrap-up";
    pub const FINISHED: &str = "finished";
}

/// Raw provider reply, before assembly and translation.
pub enum RawResponse {
    Json(Value),
    Stream(BoxStream<'static, Bytes>),
}

impl std::fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawResponse::Json(v) => f.debug_tuple("Json").field(v).finish(),
            RawResponse::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Per-invocation context shared by the chat stages.
///
/// Each field is written by exactly one stage: `prepared` by prepare, `raw`
/// by call, `result` by finalize.
#[derive(Debug)]
pub struct ChatContext {
    pub request: ChatRequest,
    pub control: CallControl,
    pub prepared: Option<ProviderRequest>,
    pub raw: Option<RawResponse>,
    pub result: Option<ChatResponse>,
}

impl ChatContext {
    pub fn new(request: ChatRequest, control: CallControl) -> Self {
        Self {
            request,
            control,
            prepared: None,
            raw: None,
            result: None,
        }
    }

    /// Take the final response out of a finished context.
    pub fn into_result(self) -> Result<ChatResponse> {
        self.result.ok_or_else(|| {
            PipelineError::missing_artifact("<end>", "response")
                .with_hint("the pipeline ended before the finalize stage ran")
                .into()
        })
    }
}

/// Translate and validate the request. No I/O.
pub struct PrepareStage {
    driver: Arc<dyn ProviderDriver>,
    config: Arc<ClientConfig>,
}

impl PrepareStage {
    pub fn new(driver: Arc<dyn ProviderDriver>, config: Arc<ClientConfig>) -> Self {
        Self { driver, config }
    }
}

#[async_trait::async_trait]
impl Stage<ChatContext> for PrepareStage {
    type Input = ChatRequest;
    type Output = ProviderRequest;

    fn prepare(&self, ctx: &mut ChatContext) -> Result<ChatRequest> {
        Ok(ctx.request.clone())
    }

    async fn compute(&self, request: ChatRequest) -> Result<ProviderRequest> {
        self.driver.translate_request(&request, &self.config)
    }

    fn commit(&self, ctx: &mut ChatContext, prepared: ProviderRequest) -> Result<Transition> {
        ctx.prepared = Some(prepared);
        Ok(labels::CALL.into())
    }
}

/// Execute the prepared request on the wire.
pub struct CallStage {
    wire: Arc<dyn WireClient>,
}

impl CallStage {
    pub fn new(wire: Arc<dyn WireClient>) -> Self {
        Self { wire }
    }
}

#[async_trait::async_trait]
impl Stage<ChatContext> for CallStage {
    type Input = (ProviderRequest, CallControl);
    type Output = RawResponse;

    fn prepare(&self, ctx: &mut ChatContext) -> Result<Self::Input> {
        let prepared = ctx
            .prepared
            .clone()
            .ok_or_else(|| PipelineError::missing_artifact(CALL, "prepared request"))?;
        Ok((prepared, ctx.control.clone()))
    }

    async fn compute(&self, (request, control): Self::Input) -> Result<RawResponse> {
        let response = control.run(self.wire.send(&request)).await?;
        if !response.is_success() {
            let err = match &response.body {
                WireBody::Json(body) => TransportError::from_error_body(response.status, body),
                WireBody::Stream(_) => TransportError::from_error_body(response.status, &Value::Null),
            };
            info!(status = response.status, error = %err, "provider rejected request");
            return Err(err.into());
        }
        debug!(
            status = response.status,
            request_id = response.request_id().unwrap_or_default(),
            "call completed"
        );
        Ok(match response.body {
            WireBody::Json(body) => RawResponse::Json(body),
            WireBody::Stream(bytes) => RawResponse::Stream(bytes),
        })
    }

    fn commit(&self, ctx: &mut ChatContext, raw: RawResponse) -> Result<Transition> {
        ctx.raw = Some(raw);
        Ok(labels::WRAP_UP.into())
    }
}

/// Assemble a streamed reply if needed, then translate it.
pub struct FinalizeStage {
    driver: Arc<dyn ProviderDriver>,
    decoder: SseDecoder,
}

impl FinalizeStage {
    pub fn new(driver: Arc<dyn ProviderDriver>) -> Self {
        Self {
            driver,
            decoder: SseDecoder::default(),
        }
    }
}

#[async_trait::async_trait]
impl Stage<ChatContext> for FinalizeStage {
    type Input = (RawResponse, CallControl);
    type Output = ChatResponse;

    fn prepare(&self, ctx: &mut ChatContext) -> Result<Self::Input> {
        // The byte stream is move-only; take it out of the context.
        let raw = ctx
            .raw
            .take()
            .ok_or_else(|| PipelineError::missing_artifact(FINALIZE, "raw response"))?;
        Ok((raw, ctx.control.clone()))
    }

    async fn compute(&self, (raw, control): Self::Input) -> Result<ChatResponse> {
        let body = match raw {
            RawResponse::Json(body) => body,
            RawResponse::Stream(bytes) => {
                assemble(self.decoder.decode_stream(bytes), &control).await?
            }
        };
        self.driver.translate_response(body)
    }

    fn commit(&self, ctx: &mut ChatContext, response: ChatResponse) -> Result<Transition> {
        info!(
            id = %response.id,
            model = %response.model,
            stop_reason = response.stop_reason.as_ref().map(|r| r.as_str()).unwrap_or("none"),
            input_tokens = response.total_input_tokens(),
            output_tokens = response.usage.output_tokens,
            "chat completed"
        );
        ctx.result = Some(response);
        Ok(labels::FINISHED.into())
    }
}

/// The default chat pipeline:
/// `prepare` -"call"-> `call` -"wrap-up"-> `finalize` -"finished"-> end.
pub fn chat_pipeline(
    driver: Arc<dyn ProviderDriver>,
    config: Arc<ClientConfig>,
    wire: Arc<dyn WireClient>,
) -> std::result::Result<Pipeline<ChatContext>, PipelineError> {
    PipelineBuilder::new()
        .stage(PREPARE, PrepareStage::new(driver.clone(), config))
        .stage(CALL, CallStage::new(wire))
        .stage(FINALIZE, FinalizeStage::new(driver))
        .route(PREPARE, labels::CALL, CALL)
        .route(CALL, labels::WRAP_UP, FINALIZE)
        .build()
}
