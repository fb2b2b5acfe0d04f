//! Anti-forgery token lookup.
//!
//! The backend expects the token in the `X-CSRFToken` header. It normally
//! lives in the `csrftoken` cookie; pages also embed it on the root element
//! as a fallback for when the cookie is not readable.

use cookie::Cookie;

use crate::config::AdapterConfig;

/// Default cookie carrying the anti-forgery token.
pub const DEFAULT_CSRF_COOKIE: &str = "csrftoken";

/// Supplies the anti-forgery token for each request.
pub trait TokenProvider: Send + Sync {
    fn csrf_token(&self) -> Option<String>;
}

/// Reads the token from a `Cookie` header string, falling back to the
/// token embedded in the document.
#[derive(Debug, Clone)]
pub struct CookieTokenProvider {
    cookie_header: String,
    cookie_name: String,
    document_token: Option<String>,
}

impl CookieTokenProvider {
    pub fn new(cookie_header: impl Into<String>) -> Self {
        Self {
            cookie_header: cookie_header.into(),
            cookie_name: DEFAULT_CSRF_COOKIE.to_string(),
            document_token: None,
        }
    }

    /// Provider reading the cookie named by `csrf_cookie_name`.
    pub fn from_config(config: &AdapterConfig, cookie_header: impl Into<String>) -> Self {
        Self::new(cookie_header).cookie_name(config.csrf_cookie_name.clone())
    }

    pub fn cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn document_token(mut self, token: impl Into<String>) -> Self {
        self.document_token = Some(token.into());
        self
    }

    fn from_cookie(&self) -> Option<String> {
        Cookie::split_parse_encoded(self.cookie_header.as_str())
            .filter_map(Result::ok)
            .find(|c| c.name() == self.cookie_name)
            .map(|c| c.value().to_string())
            .filter(|value| !value.is_empty())
    }
}

impl TokenProvider for CookieTokenProvider {
    fn csrf_token(&self) -> Option<String> {
        self.from_cookie().or_else(|| {
            self.document_token
                .clone()
                .filter(|token| !token.is_empty())
        })
    }
}

/// A fixed token, or none.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider(pub Option<String>);

impl TokenProvider for StaticTokenProvider {
    fn csrf_token(&self) -> Option<String> {
        self.0.clone()
    }
}
