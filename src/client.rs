use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::io::AsyncRead;
use tracing::{debug, error, info, Instrument};

use crate::classify::{CommonErrorClassifier, ErrorClassifier};
use crate::context::RequestContext;
use crate::error::{Result, TransformError};
use crate::multipart::{read_model, ModelForm};
use crate::transport::{
    ReqwestTransport, TransformTransport, TransportError, TransportRequest,
};

pub const DEFAULT_ENDPOINT_PATH: &str = "/v1.0/flowmodels/transform";

/// Filename sent for the `model` part when the caller has none.
pub const DEFAULT_MODEL_FILENAME: &str = "model";

const MODEL_FIELD: &str = "model";
const TARGET_FORMAT_FIELD: &str = "targetformat";
const SOURCE_FORMAT_FIELD: &str = "sourceformat";

/// Metadata for a transform call, as it appears in JSON/YAML job files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOptions {
    pub target_format: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_format: Option<String>,
}

/// A model stream together with the options describing how to convert it.
///
/// The stream is consumed by the call; closing it remains the owner's concern.
#[derive(Debug)]
pub struct TransformRequest<R> {
    pub model: R,
    pub target_format: String,
    pub filename: Option<String>,
    pub source_format: Option<String>,
}

impl<R> TransformRequest<R> {
    pub fn new(model: R, target_format: impl Into<String>) -> Self {
        Self {
            model,
            target_format: target_format.into(),
            filename: None,
            source_format: None,
        }
    }

    pub fn from_options(model: R, options: TransformOptions) -> Self {
        Self {
            model,
            target_format: options.target_format,
            filename: options.file_name,
            source_format: options.source_format,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_source_format(mut self, source_format: impl Into<String>) -> Self {
        self.source_format = Some(source_format.into());
        self
    }
}

/// Sends models to the tenant's transformation endpoint and returns the
/// converted bytes.
///
/// Holds no per-call state; one instance can serve concurrent callers as
/// long as its transport can.
#[derive(Debug, Clone)]
pub struct ModelTransformClient<T = ReqwestTransport, C = CommonErrorClassifier> {
    transport: T,
    classifier: C,
    endpoint_path: String,
}

impl ModelTransformClient {
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::default())
    }
}

impl Default for ModelTransformClient {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TransformTransport> ModelTransformClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            classifier: CommonErrorClassifier,
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
        }
    }
}

impl<T, C> ModelTransformClient<T, C>
where
    T: TransformTransport,
    C: ErrorClassifier,
{
    pub fn with_classifier<C2: ErrorClassifier>(self, classifier: C2) -> ModelTransformClient<T, C2> {
        ModelTransformClient {
            transport: self.transport,
            classifier,
            endpoint_path: self.endpoint_path,
        }
    }

    pub fn with_endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.endpoint_path = path.into();
        self
    }

    pub fn endpoint_path(&self) -> &str {
        &self.endpoint_path
    }

    /// Convert the model read from `model` into `target_format`.
    ///
    /// The stream is read once, to completion, before anything is sent.
    /// Only a 200 response counts as success; its body is returned as is.
    pub async fn transform<R>(
        &self,
        ctx: &RequestContext,
        model: &mut R,
        target_format: &str,
        filename: Option<&str>,
        source_format: Option<&str>,
    ) -> Result<Bytes>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        self.transform_inner(ctx, model, target_format, filename, source_format)
            .instrument(ctx.span().clone())
            .await
    }

    /// Convert the model stored at `path`. The filename sent is the final
    /// path segment.
    pub async fn transform_from_file(
        &self,
        ctx: &RequestContext,
        path: impl AsRef<Path>,
        target_format: &str,
        source_format: Option<&str>,
    ) -> Result<Bytes> {
        let path = path.as_ref();
        let mut file = match tokio::fs::File::open(path).await {
            Ok(file) => file,
            Err(source) => {
                ctx.span().in_scope(|| {
                    error!(path = %path.display(), "unable to open model file; err={}", source)
                });
                return Err(TransformError::FileAccess {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        // `file` is dropped, and so closed, when this returns on any path.
        self.transform(ctx, &mut file, target_format, filename.as_deref(), source_format)
            .await
    }

    pub async fn transform_from_request<R>(
        &self,
        ctx: &RequestContext,
        request: TransformRequest<R>,
    ) -> Result<Bytes>
    where
        R: AsyncRead + Unpin,
    {
        let TransformRequest {
            mut model,
            target_format,
            filename,
            source_format,
        } = request;
        self.transform(
            ctx,
            &mut model,
            &target_format,
            filename.as_deref(),
            source_format.as_deref(),
        )
        .await
    }

    async fn transform_inner<R>(
        &self,
        ctx: &RequestContext,
        model: &mut R,
        target_format: &str,
        filename: Option<&str>,
        source_format: Option<&str>,
    ) -> Result<Bytes>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        if target_format.trim().is_empty() {
            error!("target format must not be empty");
            return Err(TransformError::InvalidRequest(
                "target format must not be empty".to_string(),
            ));
        }
        let mut authorization = HeaderValue::from_str(&ctx.bearer()).map_err(|e| {
            error!("unable to build authorization header; err={}", e);
            TransformError::InvalidRequest("bearer token is not a valid header value".to_string())
        })?;
        authorization.set_sensitive(true);

        let filename = filename
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_MODEL_FILENAME);
        let content = read_model(model).await.map_err(|e| {
            error!("unable to copy model file; err={}", e);
            TransformError::Encoding
        })?;
        let model_bytes = content.len();

        let mut form = ModelForm::new()
            .file(MODEL_FIELD, filename, content)
            .text(TARGET_FORMAT_FIELD, target_format);
        if let Some(source_format) = source_format {
            form = form.text(SOURCE_FORMAT_FIELD, source_format);
        }

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);

        let url = ctx.endpoint_url(&self.endpoint_path);
        debug!(
            url = %url,
            filename,
            target_format,
            source_format,
            model_bytes,
            parts = form.len(),
            "dispatching model transform"
        );

        let resp = self
            .transport
            .send(ctx, TransportRequest { url, headers, form })
            .await
            .map_err(|e| match e {
                TransportError::Encode(cause) => {
                    error!("unable to finalize multipart body; err={}", cause);
                    TransformError::Encoding
                }
                TransportError::Send(cause) => {
                    error!("unable to transform model; err={}", cause);
                    TransformError::Transport(cause)
                }
            })?;

        if resp.status != StatusCode::OK {
            if let Some(cause) = self.classifier.classify(resp.status, &resp.body) {
                error!(status = resp.status.as_u16(), "unable to transform the model; err={}", cause);
                return Err(TransformError::Classified(cause));
            }

            let body = String::from_utf8_lossy(&resp.body).into_owned();
            error!(
                "unable to transform the model; code={}, body={}",
                resp.status.as_u16(),
                body
            );
            return Err(TransformError::Status {
                status: resp.status.as_u16(),
                body,
            });
        }

        info!(bytes = resp.body.len(), target_format, "model transformed");
        Ok(resp.body)
    }
}
