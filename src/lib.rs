//! Client for the tenant model transformation service: upload a workflow
//! model as `multipart/form-data` and get the converted model back.

pub mod classify;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod multipart;
pub mod transport;

pub use classify::{ClassifiedError, CommonErrorClassifier, ErrorClassifier};
pub use client::{ModelTransformClient, TransformOptions, TransformRequest};
pub use context::RequestContext;
pub use error::{Result, TransformError};
pub use multipart::{FieldValue, FormField, ModelForm};
pub use transport::{
    ReqwestTransport, TransformTransport, TransportError, TransportRequest, TransportResponse,
};
