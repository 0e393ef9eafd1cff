use crate::FailureKind;

/// Error type returned by this crate.
///
/// Every variant maps onto one [`FailureKind`] through [`ApiError::kind`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No response was received (connection refused, timeout, DNS, offline).
    #[error("network error: {0}")]
    Network(reqwest::Error),
    /// The backend answered `401`; the session has already been cleared.
    #[error("authentication required: {message}")]
    Auth { message: String },
    /// Non-retryable `4xx` (other than `401`) or an unexpected status.
    #[error("client error {status}: {message}")]
    Client {
        status: u16,
        /// `message` field of the error body, or a generic fallback.
        message: String,
        /// Raw response body.
        body: String,
    },
    /// `5xx` returned after the retry budget was exhausted.
    #[error("server error {status}: {message}")]
    Server {
        status: u16,
        message: String,
        body: String,
    },
    /// Success response whose body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
    /// The request could not be built (bad URL, bad header value).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The durable session storage failed.
    #[error("session storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Failure classification of this error.
    ///
    /// Anything that is neither a transport failure nor a `401`/`5xx` is
    /// treated as a client error and never retried.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network(_) => FailureKind::Network,
            Self::Auth { .. } => FailureKind::Auth,
            Self::Server { .. } => FailureKind::Server,
            Self::Client { .. }
            | Self::Decode(_)
            | Self::InvalidRequest(_)
            | Self::Storage(_) => FailureKind::Client,
        }
    }

    /// HTTP status carried by the error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { .. } => Some(401),
            Self::Client { status, .. } | Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message string for the calling page to display.
    pub fn message(&self) -> String {
        match self {
            Self::Auth { message }
            | Self::Client { message, .. }
            | Self::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
