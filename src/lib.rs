//! `dashboard-http` is the shared async HTTP client every dashboard page
//! routes its REST calls through.
//!
//! One [`ApiClient`] wraps the backend base URL and a shared [`SessionStore`]:
//! - the bearer token is attached to every outbound request,
//! - failures are classified into [`FailureKind`],
//! - network and server failures are retried with linear backoff,
//! - a `401` clears the session and redirects to the login path.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use dashboard_http::{ApiClient, MemoryStorage, SessionStore};
//!
//! # async fn run() -> dashboard_http::Result<()> {
//! let session = Arc::new(SessionStore::restore(MemoryStorage::new())?);
//! let api = ApiClient::new("https://admin.example.com/api", session);
//!
//! let questions: serde_json::Value = api.get("/questions").await?;
//! # let _ = questions;
//! # Ok(())
//! # }
//! ```

mod auth;
mod classify;
mod client;
mod error;
mod options;
mod request;
mod retry;
mod session;

pub use auth::apply_bearer;
pub use classify::{classify_status, classify_transport, error_message, FailureKind};
pub use client::{ApiClient, LoginRedirect};
pub use error::ApiError;
pub use options::ClientOptions;
pub use request::{Body, RequestDescriptor};
pub use retry::{RetryDecision, RetryPolicy};
pub use session::{MemoryStorage, SessionStore, TokenStorage, SESSION_TOKEN_KEY};

#[cfg(not(target_arch = "wasm32"))]
pub use session::FileStorage;

#[cfg(target_arch = "wasm32")]
pub use client::BrowserRedirect;
#[cfg(target_arch = "wasm32")]
pub use session::BrowserStorage;

pub type Result<T> = std::result::Result<T, ApiError>;
