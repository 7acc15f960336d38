use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use thiserror::Error;

use crate::context::RequestContext;
use crate::multipart::ModelForm;

/// A POST to the transformation endpoint. The form's `Content-Type`, with
/// its boundary, is set by the transport.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub form: ModelForm,
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

#[derive(Debug, Error)]
pub enum TransportError {
    /// The form could not be encoded; nothing was sent.
    #[error("unable to encode multipart body: {0}")]
    Encode(String),

    /// No response was obtained from the service.
    #[error("{0}")]
    Send(String),
}

/// The HTTP capability the client is bound to.
///
/// Implementations must be safe to share between concurrent callers; the
/// client adds no synchronization of its own.
#[async_trait]
pub trait TransformTransport: Send + Sync {
    async fn send(
        &self,
        ctx: &RequestContext,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError>;
}

/// Transport backed by a shared `reqwest::Client` connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl TransformTransport for ReqwestTransport {
    async fn send(
        &self,
        ctx: &RequestContext,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        let form = request
            .form
            .into_multipart()
            .map_err(|e| TransportError::Encode(e.to_string()))?;

        let mut builder = self
            .http_client
            .post(&request.url)
            .headers(request.headers)
            .multipart(form);
        if let Some(timeout) = ctx.timeout() {
            builder = builder.timeout(timeout);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| TransportError::Send(format!("failed to read response body: {}", e)))?;

        Ok(TransportResponse { status, body })
    }
}
