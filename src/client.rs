use std::{fmt, sync::Arc, time::Duration};

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    auth::apply_bearer,
    classify::{classify_status, classify_transport, error_message},
    request::Body,
    retry::{sleep, RetryDecision, RetryPolicy},
    ApiError, ClientOptions, FailureKind, RequestDescriptor, Result, SessionStore,
};

/// Navigation hook fired when the backend rejects the session with `401`.
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self, login_path: &str);
}

impl<F> LoginRedirect for F
where
    F: Fn(&str) + Send + Sync,
{
    fn redirect_to_login(&self, login_path: &str) {
        self(login_path)
    }
}

/// Navigates the current browser window to the login path.
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserRedirect;

#[cfg(target_arch = "wasm32")]
impl LoginRedirect for BrowserRedirect {
    fn redirect_to_login(&self, login_path: &str) {
        use wasm_bindgen::JsValue;

        let location = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("location"));
        if let Ok(location) = location {
            let _ = js_sys::Reflect::set(
                &location,
                &JsValue::from_str("href"),
                &JsValue::from_str(login_path),
            );
        }
    }
}

#[derive(Clone)]
/// Shared HTTP client for the dashboard REST backend.
///
/// Every call goes through the same pipeline: bearer injection, send,
/// classification of failures, and linear-backoff retry of network and
/// server failures. The retry budget lives on each [`RequestDescriptor`],
/// so concurrent calls never share it.
///
/// The retry policy is applied to every method alike, including `POST`,
/// `PUT` and `DELETE`; endpoints behind this client must tolerate a
/// duplicate submission after a `5xx` or a dropped connection.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
    redirect: Option<Arc<dyn LoginRedirect>>,
    options: ClientOptions,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .field("options", &self.options)
            .finish()
    }
}

impl ApiClient {
    /// Creates a client for `base_url` bound to `session`.
    pub fn new(base_url: impl Into<String>, session: Arc<SessionStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            session,
            redirect: default_login_redirect(),
            options: ClientOptions::default(),
        }
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `DASHBOARD_API_URL` — backend base URL (required)
    /// - `DASHBOARD_SESSION_FILE` — JSON file the session token is
    ///   persisted in (optional; in-memory session when unset)
    ///
    /// **Not available on `wasm32` targets**; use [`ApiClient::new`] with a
    /// [`BrowserStorage`](crate::BrowserStorage)-backed session instead.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> std::result::Result<Self, String> {
        let url = std::env::var("DASHBOARD_API_URL")
            .map_err(|_| "missing DASHBOARD_API_URL environment variable".to_owned())?;
        if url.trim().is_empty() {
            return Err("DASHBOARD_API_URL is set but empty".to_owned());
        }
        let session = match std::env::var("DASHBOARD_SESSION_FILE") {
            Ok(path) if !path.trim().is_empty() => {
                SessionStore::restore(crate::FileStorage::new(path)).map_err(|err| err.to_string())?
            }
            _ => SessionStore::in_memory(),
        };
        Ok(Self::new(url, Arc::new(session)))
    }

    /// Applies client options such as timeout and retry behavior.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    /// Installs the navigation hook fired on `401`.
    ///
    /// Browser builds navigate with `BrowserRedirect` unless overridden;
    /// native builds have no redirect until one is installed here.
    pub fn with_login_redirect(mut self, redirect: impl LoginRedirect + 'static) -> Self {
        self.redirect = Some(Arc::new(redirect));
        self
    }

    /// Replaces the underlying `reqwest` client (proxies, custom TLS, ...).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Session shared by every request of this client.
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Options currently applied to requests.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Stores the token issued by the login endpoint.
    pub fn login(&self, token: impl Into<String>) -> Result<()> {
        self.session.login(token)
    }

    /// Clears the session. Returns whether a token was cleared.
    pub fn logout(&self) -> Result<bool> {
        self.session.logout()
    }

    /// `GET path`, decoding the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(RequestDescriptor::get(path)).await
    }

    /// `GET path?query`, decoding the JSON response.
    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send(RequestDescriptor::get(path).query_params(query)?)
            .await
    }

    /// `POST path` with a JSON body.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(RequestDescriptor::post(path).json(body)?).await
    }

    /// `PUT path` with a JSON body.
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(RequestDescriptor::put(path).json(body)?).await
    }

    /// `DELETE path`.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(RequestDescriptor::delete(path)).await
    }

    /// Runs one request chain to completion.
    ///
    /// Resolves with the decoded success body, or rejects with the last
    /// classified failure once the retry policy gives up.
    pub async fn send<T: DeserializeOwned>(&self, mut request: RequestDescriptor) -> Result<T> {
        let policy = RetryPolicy::from_options(&self.options);
        loop {
            let failure = match self.send_once(&request).await {
                Ok(body) => return decode_body(&body),
                Err(err) => err,
            };

            let kind = failure.kind();
            if kind == FailureKind::Auth {
                self.end_session(&request);
                return Err(failure);
            }

            match policy.decide(kind, request.attempt) {
                RetryDecision::Propagate => return Err(failure),
                RetryDecision::RetryAfter(delay) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        method = %request.method,
                        path = %request.path,
                        retry = request.attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %failure,
                        "retrying request"
                    );
                    sleep(delay).await;
                    request.attempt += 1;
                }
            }
        }
    }

    /// Sends a single attempt and returns the success body text.
    async fn send_once(&self, request: &RequestDescriptor) -> Result<String> {
        let mut headers = HeaderMap::new();
        let payload = match &request.body {
            Some(Body::Json(value)) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                Some(serde_json::to_vec(value).map_err(|err| {
                    ApiError::InvalidRequest(format!("invalid JSON body: {err}"))
                })?)
            }
            Some(Body::Bytes { content_type, data }) => {
                let value = HeaderValue::from_str(content_type).map_err(|err| {
                    ApiError::InvalidRequest(format!("invalid content type '{content_type}': {err}"))
                })?;
                headers.insert(CONTENT_TYPE, value);
                Some(data.clone())
            }
            None => None,
        };
        for (name, value) in &request.headers {
            headers.insert(name.clone(), value.clone());
        }
        apply_bearer(&mut headers, &self.session);

        let mut builder = self
            .http
            .request(request.method.clone(), self.url_for(&request.path))
            .headers(headers)
            .timeout(Duration::from_millis(self.options.timeout_ms));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(payload) = payload {
            builder = builder.body(payload);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        // Once a status line arrived the failure is classified by status; a
        // truncated body only loses the error message.
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) if status.is_success() => {
                return Err(ApiError::Decode(format!(
                    "could not read response body: {err}"
                )))
            }
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    status = status.as_u16(),
                    error = %_err,
                    "could not read error response body"
                );
                String::new()
            }
        };

        if status.is_success() {
            return Ok(body);
        }

        let message = error_message(status, &body);
        Err(match classify_status(status) {
            FailureKind::Auth => ApiError::Auth { message },
            FailureKind::Server => ApiError::Server {
                status: status.as_u16(),
                message,
                body,
            },
            FailureKind::Client | FailureKind::Network => ApiError::Client {
                status: status.as_u16(),
                message,
                body,
            },
        })
    }

    /// Clears the session and hands control to the login redirect.
    fn end_session(&self, request: &RequestDescriptor) {
        let outcome = self.session.invalidate();
        log_invalidation(request, &outcome);

        if let Some(redirect) = &self.redirect {
            redirect.redirect_to_login(&self.options.login_path);
        }
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_owned();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(target_arch = "wasm32")]
fn default_login_redirect() -> Option<Arc<dyn LoginRedirect>> {
    Some(Arc::new(BrowserRedirect))
}

#[cfg(not(target_arch = "wasm32"))]
fn default_login_redirect() -> Option<Arc<dyn LoginRedirect>> {
    None
}

#[cfg(feature = "tracing")]
fn log_invalidation(request: &RequestDescriptor, outcome: &Result<bool>) {
    match outcome {
        Ok(true) => tracing::warn!(
            method = %request.method,
            path = %request.path,
            "session rejected by backend; token cleared"
        ),
        Ok(false) => tracing::debug!(
            method = %request.method,
            path = %request.path,
            "request rejected with 401; session already cleared"
        ),
        Err(err) => tracing::warn!(
            method = %request.method,
            path = %request.path,
            error = %err,
            "could not remove persisted session token"
        ),
    }
}

#[cfg(not(feature = "tracing"))]
fn log_invalidation(_request: &RequestDescriptor, _outcome: &Result<bool>) {}

fn transport_error(err: reqwest::Error) -> ApiError {
    match classify_transport(&err) {
        FailureKind::Client => ApiError::InvalidRequest(err.to_string()),
        _ => ApiError::Network(err),
    }
}

fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T> {
    let parsed = if body.trim().is_empty() {
        serde_json::from_value(serde_json::Value::Null)
    } else {
        serde_json::from_str(body)
    };
    parsed.map_err(|err| ApiError::Decode(format!("invalid response JSON: {err}; body: {body}")))
}
