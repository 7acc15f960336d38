use std::path::PathBuf;
use thiserror::Error;

use crate::classify::ClassifiedError;

pub type Result<T> = std::result::Result<T, TransformError>;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("unable to open model file {}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Building the multipart body failed. The cause is only logged.
    #[error("unable to transform model")]
    Encoding,

    #[error("unable to transform model; transport error: {0}")]
    Transport(String),

    #[error("unable to transform the model; err={0}")]
    Classified(#[from] ClassifiedError),

    #[error("unable to transform the model; code={status}, body={body}")]
    Status { status: u16, body: String },

    #[error("invalid transform request: {0}")]
    InvalidRequest(String),
}

impl TransformError {
    /// HTTP status of the failed response, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Classified(ClassifiedError::Service { status, .. }) => Some(*status),
            Self::Classified(ClassifiedError::Unauthorized) => Some(401),
            _ => None,
        }
    }
}
