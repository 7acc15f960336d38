use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// A non-success response whose cause was recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifiedError {
    #[error("the access token is invalid or has expired; log in again")]
    Unauthorized,

    #[error("{message_id}: {description}")]
    Service {
        status: u16,
        message_id: String,
        description: String,
    },
}

/// Maps a failed HTTP response to a known cause.
///
/// Returning `None` means the response was not recognized and the caller
/// falls back to reporting the raw status and body.
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, status: StatusCode, body: &[u8]) -> Option<ClassifiedError>;
}

/// Error envelope returned by the tenant's management APIs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceErrorBody {
    message_id: String,
    #[serde(default)]
    message_description: String,
}

/// Recognizes authentication failures and the service's JSON error envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonErrorClassifier;

impl ErrorClassifier for CommonErrorClassifier {
    fn classify(&self, status: StatusCode, body: &[u8]) -> Option<ClassifiedError> {
        if status == StatusCode::UNAUTHORIZED {
            return Some(ClassifiedError::Unauthorized);
        }

        let parsed: ServiceErrorBody = serde_json::from_slice(body).ok()?;
        if parsed.message_id.is_empty() {
            return None;
        }
        Some(ClassifiedError::Service {
            status: status.as_u16(),
            message_id: parsed.message_id,
            description: parsed.message_description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_is_recognized_regardless_of_body() {
        let c = CommonErrorClassifier;
        assert_eq!(
            c.classify(StatusCode::UNAUTHORIZED, b"nope"),
            Some(ClassifiedError::Unauthorized)
        );
    }

    #[test]
    fn service_envelope_is_recognized() {
        let c = CommonErrorClassifier;
        let body = br#"{"messageId":"CSIAQ0158E","messageDescription":"The target format is not supported."}"#;
        let classified = c.classify(StatusCode::BAD_REQUEST, body).unwrap();
        assert_eq!(
            classified,
            ClassifiedError::Service {
                status: 400,
                message_id: "CSIAQ0158E".to_string(),
                description: "The target format is not supported.".to_string(),
            }
        );
        assert_eq!(
            classified.to_string(),
            "CSIAQ0158E: The target format is not supported."
        );
    }

    #[test]
    fn plain_text_body_is_unrecognized() {
        let c = CommonErrorClassifier;
        assert!(c.classify(StatusCode::FORBIDDEN, b"forbidden").is_none());
    }

    #[test]
    fn json_without_message_id_is_unrecognized() {
        let c = CommonErrorClassifier;
        assert!(c
            .classify(StatusCode::INTERNAL_SERVER_ERROR, br#"{"error":"boom"}"#)
            .is_none());
        assert!(c
            .classify(StatusCode::INTERNAL_SERVER_ERROR, br#"{"messageId":""}"#)
            .is_none());
    }
}
