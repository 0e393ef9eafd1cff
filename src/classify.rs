use reqwest::StatusCode;
use serde::Deserialize;

/// Classification of one failed attempt.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FailureKind {
    /// No response was received.
    Network,
    /// `4xx` other than `401`, or anything unexpected.
    Client,
    /// `401`.
    Auth,
    /// `5xx`.
    Server,
}

impl FailureKind {
    /// Whether the retry scheduler may re-issue the request.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::Server)
    }
}

/// Classifies a non-success response status.
pub fn classify_status(status: StatusCode) -> FailureKind {
    match status.as_u16() {
        401 => FailureKind::Auth,
        400..=499 => FailureKind::Client,
        500..=599 => FailureKind::Server,
        _ => FailureKind::Client,
    }
}

/// Classifies a failure where no response status is available.
///
/// Errors raised while building the request never reached the wire and
/// cannot succeed on retry.
pub fn classify_transport(err: &reqwest::Error) -> FailureKind {
    if err.is_builder() {
        return FailureKind::Client;
    }
    match err.status() {
        Some(status) => classify_status(status),
        None => FailureKind::Network,
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Extracts the `{ "message": "..." }` text from an error body.
///
/// Falls back to a generic message when the body is not JSON, has no
/// `message` field, or the field is blank.
pub fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()))
}
