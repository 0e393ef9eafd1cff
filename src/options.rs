/// Configures HTTP timeout, retry behavior and the login entry point.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Base retry backoff in milliseconds (linear strategy).
    pub retry_backoff_ms: u64,
    /// Path handed to the login redirect when the backend answers `401`.
    pub login_path: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_retries: 3,
            retry_backoff_ms: 1_000,
            login_path: "/login".to_owned(),
        }
    }
}
