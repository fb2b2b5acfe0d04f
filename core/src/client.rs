//! Stateless HTTP request builder and response classifier.
//!
//! # Design
//! `ApiClient` holds a base URL and a token provider and carries no mutable
//! state between calls. `build_request` produces an `HttpRequest` with the
//! header policy applied; `parse_response` turns an `HttpResponse` into the
//! unwrapped payload or an `ApiError`. Neither touches the network or the
//! UI. Side effects for the signal errors (`Unauthorized`,
//! `SessionTerminated`) belong to `RequestAdapter`.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::config::AdapterConfig;
use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::http::{Body, HttpMethod, HttpRequest, HttpResponse, RequestBody};
use crate::session::{SessionExpiry, DEFAULT_REDIRECT};
use crate::token::TokenProvider;

pub const CSRF_HEADER: &str = "X-CSRFToken";
pub const REQUESTED_WITH_HEADER: &str = "X-Requested-With";
/// Marks programmatic calls so the backend answers JSON instead of
/// redirecting or rendering HTML.
pub const REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    default_redirect: String,
    tokens: Arc<dyn TokenProvider>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("default_redirect", &self.default_redirect)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            default_redirect: DEFAULT_REDIRECT.to_string(),
            tokens,
        }
    }

    /// Client using the configured base URL and default redirect.
    pub fn from_config(config: &AdapterConfig, tokens: Arc<dyn TokenProvider>) -> Self {
        Self::new(&config.base_url, tokens).with_default_redirect(config.default_redirect.clone())
    }

    /// Target used when a session-expiry response has no `redirect_url`.
    pub fn with_default_redirect(mut self, url: impl Into<String>) -> Self {
        self.default_redirect = url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URLs pass through; site-relative ones get the base URL.
    pub fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") || self.base_url.is_empty() {
            return url.to_string();
        }
        if url.starts_with('/') {
            format!("{}{url}", self.base_url)
        } else {
            format!("{}/{url}", self.base_url)
        }
    }

    /// Build a request with the anti-forgery and programmatic-call headers.
    ///
    /// JSON bodies are serialized and get a JSON content type. Multipart
    /// bodies get no content type at all: the transport sets it along with
    /// the boundary.
    pub fn build_request(&self, method: HttpMethod, url: &str, body: Body) -> Result<HttpRequest, ApiError> {
        let token = self.tokens.csrf_token().unwrap_or_else(|| {
            tracing::warn!(url, "no anti-forgery token available");
            String::new()
        });
        let mut headers = vec![
            (CSRF_HEADER.to_string(), token),
            (REQUESTED_WITH_HEADER.to_string(), REQUESTED_WITH_VALUE.to_string()),
        ];

        let body = match body {
            Body::Empty => RequestBody::None,
            Body::Multipart(form) => RequestBody::Multipart(form),
            Body::Json(value) => {
                let text = serde_json::to_string(&value).map_err(|e| ApiError::SerializationError(e.to_string()))?;
                headers.push(("Content-Type".to_string(), "application/json".to_string()));
                RequestBody::Json(text)
            }
        };

        Ok(HttpRequest {
            method,
            url: self.resolve(url),
            headers,
            body,
        })
    }

    /// Classify a response.
    ///
    /// Order matters:
    /// 1. non-JSON content type: 401/403 are `Unauthorized`, 5xx are
    ///    `ServerError`, anything else `InvalidResponse`;
    /// 2. malformed JSON is a `DeserializationError`;
    /// 3. 403 with the `TIEMPO_AGOTADO` sentinel is `SessionTerminated`;
    /// 4. everything else goes through envelope decoding.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, ApiError> {
        let status = response.status;
        if !response.is_json() {
            return Err(match status {
                401 | 403 => ApiError::Unauthorized { status },
                s if s >= 500 => ApiError::ServerError { status },
                _ => ApiError::InvalidResponse { status },
            });
        }

        let value: Value =
            serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))?;

        if let Some(expiry) = SessionExpiry::detect_with(status, &value, &self.default_redirect) {
            return Err(ApiError::SessionTerminated {
                redirect_url: expiry.redirect_url,
            });
        }

        Envelope::decode(value).into_result(status)
    }
}
