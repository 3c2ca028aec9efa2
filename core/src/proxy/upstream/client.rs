//! Upstream client for calling the fal queue and storage APIs

use std::sync::Arc;

use bytes::Bytes;
use reqwest::{header, multipart, Client, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::time::Duration;

use crate::config::{ApiKey, Config};
use crate::error::GatewayError;

/// Multipart field name the storage API expects
const UPLOAD_FIELD: &str = "file";

/// Successful upstream answer, relayed as-is
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: Value,
}

/// A file re-encoded for the storage upload
#[derive(Debug, Clone)]
pub struct FilePart {
    pub bytes: Bytes,
    pub filename: String,
    pub content_type: String,
}

#[derive(Clone)]
pub struct UpstreamClient {
    http_client: Client,
    limiter: Option<Arc<Semaphore>>,
}

impl UpstreamClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(config.timeouts.connect_timeout))
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .user_agent(concat!("nanobana-proxy/", env!("CARGO_PKG_VERSION")));

        if let Some(secs) = config.timeouts.request_timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        if let Some(proxy) = &config.upstream.proxy_url {
            if !proxy.is_empty() {
                builder = builder.proxy(reqwest::Proxy::all(proxy)?);
                tracing::info!("Using upstream proxy: {}", proxy);
            }
        }

        let limiter = match config.upstream.max_concurrent_requests {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n))),
        };

        Ok(Self {
            http_client: builder.build()?,
            limiter,
        })
    }

    fn json_request(builder: RequestBuilder, key: &ApiKey) -> RequestBuilder {
        builder
            .header(header::AUTHORIZATION, key.authorization())
            .header(header::CONTENT_TYPE, "application/json")
    }

    /// POST a JSON payload unchanged
    pub async fn post_json(
        &self,
        url: Url,
        key: &ApiKey,
        body: &Value,
    ) -> Result<UpstreamReply, GatewayError> {
        let request = Self::json_request(self.http_client.post(url), key).json(body);
        self.send(request).await
    }

    pub async fn get_json(&self, url: Url, key: &ApiKey) -> Result<UpstreamReply, GatewayError> {
        let request = Self::json_request(self.http_client.get(url), key);
        self.send(request).await
    }

    /// POST a single file as a fresh multipart body. reqwest picks the multipart content type.
    pub async fn upload(
        &self,
        url: Url,
        key: &ApiKey,
        file: FilePart,
    ) -> Result<UpstreamReply, GatewayError> {
        let part = multipart::Part::bytes(file.bytes.to_vec())
            .file_name(file.filename)
            .mime_str(&file.content_type)
            .map_err(|_| {
                GatewayError::BadRequest(format!("Invalid file content type {:?}", file.content_type))
            })?;
        let form = multipart::Form::new().part(UPLOAD_FIELD, part);

        let request = self
            .http_client
            .post(url)
            .header(header::AUTHORIZATION, key.authorization())
            .multipart(form);
        self.send(request).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<UpstreamReply, GatewayError> {
        // The semaphore is never closed, so a failed acquire only means "no cap".
        let _permit = match &self.limiter {
            Some(limiter) => limiter.acquire().await.ok(),
            None => None,
        };

        let response = request.send().await?;
        Self::into_reply(response).await
    }

    async fn into_reply(response: Response) -> Result<UpstreamReply, GatewayError> {
        let status = response.status();

        if status.is_success() {
            let body = decode_body(&response.bytes().await?);
            return Ok(UpstreamReply {
                status,
                body: body.unwrap_or(Value::Null),
            });
        }

        // The upstream status is relayed even when its error body cannot be read.
        let body = match response.bytes().await {
            Ok(bytes) => decode_body(&bytes),
            Err(e) => {
                tracing::warn!("Failed to read upstream error body: {}", e);
                None
            }
        };
        tracing::debug!("Upstream returned {}", status);
        Err(GatewayError::Upstream { status, body })
    }
}

/// JSON when possible, otherwise the raw text. Empty bodies are `None`.
fn decode_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}
