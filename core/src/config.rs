//! Adapter configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::session::DEFAULT_REDIRECT;
use crate::token::DEFAULT_CSRF_COOKIE;

const DEFAULT_NOTICE_DELAY_MS: u64 = 4_000;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AdapterConfig {
    /// Prefix for site-relative URLs. Empty keeps them relative.
    pub base_url: String,
    pub csrf_cookie_name: String,
    /// How long the session-expiry notice waits before navigating anyway.
    pub notice_delay_ms: u64,
    pub default_redirect: String,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            csrf_cookie_name: DEFAULT_CSRF_COOKIE.to_string(),
            notice_delay_ms: DEFAULT_NOTICE_DELAY_MS,
            default_redirect: DEFAULT_REDIRECT.to_string(),
        }
    }
}

impl AdapterConfig {
    /// Defaults overridden by `ZONAS_BASE_URL`, `ZONAS_CSRF_COOKIE` and
    /// `ZONAS_NOTICE_DELAY_MS`. Unparseable values are ignored with a warning.
    ///
    /// Entry point for host applications:
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use zonas_core::{AdapterConfig, ApiClient, CookieTokenProvider};
    ///
    /// let config = AdapterConfig::from_env();
    /// let tokens = CookieTokenProvider::from_config(&config, "csrftoken=abc");
    /// let client = ApiClient::from_config(&config, Arc::new(tokens));
    /// assert_eq!(client.base_url(), config.base_url.trim_end_matches('/'));
    /// ```
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup("ZONAS_BASE_URL") {
            config.base_url = url;
        }
        if let Some(name) = lookup("ZONAS_CSRF_COOKIE").filter(|n| !n.is_empty()) {
            config.csrf_cookie_name = name;
        }
        if let Some(raw) = lookup("ZONAS_NOTICE_DELAY_MS") {
            match raw.trim().parse() {
                Ok(ms) => config.notice_delay_ms = ms,
                Err(e) => tracing::warn!(value = %raw, error = %e, "ignoring ZONAS_NOTICE_DELAY_MS"),
            }
        }
        config
    }

    pub fn notice_delay(&self) -> Duration {
        Duration::from_millis(self.notice_delay_ms)
    }
}
