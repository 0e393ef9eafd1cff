use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use crate::SessionStore;

/// Attaches `Authorization: Bearer <token>` when the session holds a token.
///
/// Leaves `headers` untouched when there is no token, so unauthenticated
/// requests still go out and are rejected by the backend.
pub fn apply_bearer(headers: &mut HeaderMap, session: &SessionStore) {
    let Some(token) = session.token() else {
        return;
    };
    if token.trim().is_empty() {
        return;
    }
    match HeaderValue::from_str(&normalize_bearer_authorization(&token)) {
        Ok(mut value) => {
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Err(_) => {
            #[cfg(feature = "tracing")]
            tracing::warn!("session token is not a valid header value; sending request without it");
        }
    }
}

fn normalize_bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}
