//! Detection of the server-enforced session time budget running out.
//!
//! The backend answers any AJAX call made after the budget expired with
//! HTTP 403 and `{"message": "TIEMPO_AGOTADO", "payload": {"redirect_url": ...}}`.
//! Detection is pure; the adapter owns the notice and the redirect.

use std::time::Duration;

use serde_json::Value;

use crate::ui::Notice;

/// Literal value of `message` that marks an exhausted time budget.
pub const SESSION_EXPIRED_SENTINEL: &str = "TIEMPO_AGOTADO";

/// Navigation target when the server omits `payload.redirect_url`.
pub const DEFAULT_REDIRECT: &str = "/";

/// Display text of `ApiError::SessionTerminated`, stable for matching.
pub const SESSION_TERMINATED_MESSAGE: &str = "session terminated by server";

/// A detected session expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionExpiry {
    pub redirect_url: String,
}

impl SessionExpiry {
    /// Returns `Some` only for status 403 with the sentinel message.
    pub fn detect(status: u16, body: &Value) -> Option<Self> {
        Self::detect_with(status, body, DEFAULT_REDIRECT)
    }

    /// Like `detect`, with a custom target for a missing `redirect_url`.
    pub fn detect_with(status: u16, body: &Value, default_redirect: &str) -> Option<Self> {
        if status != 403 {
            return None;
        }
        if body.get("message").and_then(Value::as_str) != Some(SESSION_EXPIRED_SENTINEL) {
            return None;
        }
        let redirect_url = body
            .get("payload")
            .and_then(|payload| payload.get("redirect_url"))
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .unwrap_or(default_redirect)
            .to_string();
        Some(Self { redirect_url })
    }

    /// Blocking notice shown before navigating away.
    pub fn notice(&self, auto_advance: Duration) -> Notice {
        Notice {
            title: "Session ended".to_string(),
            text: "Your time budget in the zone is exhausted. You will be redirected.".to_string(),
            dismissible: false,
            auto_advance: Some(auto_advance),
        }
    }
}
