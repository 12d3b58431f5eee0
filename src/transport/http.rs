use bytes::Bytes;
use futures::TryStreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use std::env;
use std::time::Duration;
use tracing::{debug, info};

use crate::client::ClientConfig;
use crate::protocol::{ProtocolError, ProviderRequest};
use crate::transport::{TransportError, WireBody, WireClient, WireResponse};
use crate::{BoxStream, Error, Result};

const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Default [`WireClient`] on a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let timeout = config
            .timeout()
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(
                env::var("ANTHROPIC_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(32),
            )
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self { client })
    }

    /// Wrap an existing client, e.g. one with custom TLS or proxy settings.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(headers.len() + 1);
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                TransportError::Other(format!("invalid header name '{}': {}", name, e))
            })?;
            // Header values may carry secrets, never echo them.
            let value = HeaderValue::from_str(value).map_err(|_| {
                TransportError::Other(format!("invalid value for header '{}'", name))
            })?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

#[async_trait::async_trait]
impl WireClient for HttpTransport {
    async fn send(&self, request: &ProviderRequest) -> Result<WireResponse> {
        let client_request_id = uuid::Uuid::new_v4().to_string();
        let mut headers = Self::header_map(&request.headers)?;
        if let Ok(v) = HeaderValue::from_str(&client_request_id) {
            // Our own correlation id. The provider ignores it; logs can join on it.
            headers.insert("x-client-request-id", v);
        }

        info!(
            endpoint = %request.url,
            model = request.body.get("model").and_then(|m| m.as_str()).unwrap_or_default(),
            stream = request.stream,
            client_request_id = %client_request_id,
            "dispatching request"
        );

        let resp = self
            .client
            .post(&request.url)
            .headers(headers)
            .json(&request.body)
            .send()
            .await
            .map_err(TransportError::Http)?;

        let status_code = resp.status();
        let status = status_code.as_u16();
        let response_headers: BTreeMap<String, String> = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        debug!(
            status,
            client_request_id = %client_request_id,
            request_id = response_headers.get("request-id").map(String::as_str).unwrap_or_default(),
            "response received"
        );

        let is_event_stream = response_headers
            .get("content-type")
            .is_some_and(|ct| ct.starts_with("text/event-stream"));

        let body = if status_code.is_success() && (request.stream || is_event_stream) {
            let byte_stream: BoxStream<'static, Bytes> = Box::pin(
                resp.bytes_stream()
                    .map_err(|e| Error::Transport(TransportError::Http(e))),
            );
            WireBody::Stream(byte_stream)
        } else {
            let bytes = resp.bytes().await.map_err(TransportError::Http)?;
            match serde_json::from_slice(&bytes) {
                Ok(v) => WireBody::Json(v),
                Err(e) if status_code.is_success() => {
                    return Err(ProtocolError::MalformedBody(format!(
                        "response body is not JSON: {}",
                        e
                    ))
                    .into())
                }
                // Error pages from proxies are often plain text.
                Err(_) => WireBody::Json(serde_json::Value::String(
                    String::from_utf8_lossy(&bytes).trim().to_string(),
                )),
            }
        };

        Ok(WireResponse {
            status,
            headers: response_headers,
            body,
        })
    }
}
