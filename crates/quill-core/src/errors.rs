use crate::ids::ExtensionId;

/// Errors talking to the counterpart service.
/// Classifies errors as fatal (don't retry) or retryable.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ApiError {
    // Fatal
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("server rejected request (code {code}): {msg}")]
    Server { code: i64, msg: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    // Retryable
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
}

impl ApiError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Network(_))
    }

    pub fn is_fatal(&self) -> bool {
        !self.is_retryable()
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Server { .. } => "server",
            Self::MalformedResponse(_) => "malformed_response",
            Self::Http { .. } => "http",
            Self::Network(_) => "network",
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::Unauthorized(body),
            400 | 404 | 422 => Self::InvalidRequest(body),
            _ => Self::Http { status, body },
        }
    }
}

/// A known command arrived with a payload that does not fit its shape.
#[derive(Debug, thiserror::Error)]
#[error("malformed payload for `{cmd}`: {source}")]
pub struct DecodeError {
    pub cmd: String,
    #[source]
    pub source: serde_json::Error,
}

/// Failure loading or reloading a single extension.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ExtensionError {
    #[error("extension not found: {0}")]
    NotFound(ExtensionId),
    #[error("extension {id} failed to initialise: {reason}")]
    InitFailed { id: ExtensionId, reason: String },
    #[error("extension listing failed: {0}")]
    Listing(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(ApiError::from_status(401, "no".into()).is_fatal());
        assert!(ApiError::from_status(403, "no".into()).is_fatal());
        assert!(ApiError::from_status(404, "missing".into()).is_fatal());
        assert!(ApiError::from_status(500, "boom".into()).is_retryable());
        assert!(ApiError::from_status(502, "gateway".into()).is_retryable());
    }

    #[test]
    fn server_code_is_fatal() {
        let e = ApiError::Server { code: -1, msg: "denied".into() };
        assert!(e.is_fatal());
        assert_eq!(e.error_kind(), "server");
        assert!(e.to_string().contains("denied"));
    }

    #[test]
    fn network_is_retryable() {
        assert!(ApiError::Network("reset".into()).is_retryable());
        assert_eq!(ApiError::Network("reset".into()).error_kind(), "network");
    }

    #[test]
    fn extension_error_display() {
        let e = ExtensionError::InitFailed {
            id: ExtensionId::from("calendar"),
            reason: "bad manifest".into(),
        };
        assert_eq!(e.to_string(), "extension calendar failed to initialise: bad manifest");
    }
}
