use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Method,
};
use serde::Serialize;

use crate::{ApiError, Result};

/// Request payload. Kept in memory so the same body can be re-sent on retry.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    /// Sent as `application/json`.
    Json(serde_json::Value),
    /// Pre-encoded payload with its own content type, e.g. a
    /// `multipart/form-data; boundary=...` upload.
    Bytes {
        content_type: String,
        data: Vec<u8>,
    },
}

/// One logical call: method, path, query, headers, body and the number of
/// retries already spent on it.
///
/// The retry counter is internal state and never serialized onto the wire.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Body>,
    pub(crate) attempt: u32,
}

impl RequestDescriptor {
    /// Creates a descriptor for `method path` with no retries spent.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            attempt: 0,
        }
    }

    /// `GET path`.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST path`.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT path`.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `DELETE path`.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Appends one query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Appends every field of a serializable struct or map as query
    /// parameters. `null` fields are skipped.
    pub fn query_params<Q: Serialize + ?Sized>(mut self, params: &Q) -> Result<Self> {
        let value = serde_json::to_value(params)
            .map_err(|err| ApiError::InvalidRequest(format!("invalid query parameters: {err}")))?;
        let serde_json::Value::Object(fields) = value else {
            return Err(ApiError::InvalidRequest(
                "query parameters must serialize to an object".to_owned(),
            ));
        };
        for (key, value) in fields {
            match value {
                serde_json::Value::Null => {}
                serde_json::Value::String(text) => self.query.push((key, text)),
                other => self.query.push((key, other.to_string())),
            }
        }
        Ok(self)
    }

    /// Sets a per-call header, overriding any default for the same name.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|err| ApiError::InvalidRequest(format!("invalid JSON body: {err}")))?;
        self.body = Some(Body::Json(value));
        Ok(self)
    }

    /// Sets a raw body with an explicit content type.
    pub fn bytes(mut self, content_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.body = Some(Body::Bytes {
            content_type: content_type.into(),
            data: data.into(),
        });
        self
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path relative to the client base URL, or an absolute URL.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Per-call header overrides.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Captured request body, if any.
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Retries already spent on this request chain; `0` for the first send.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}
