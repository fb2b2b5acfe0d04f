//! UI collaborators injected into the adapter.
//!
//! The adapter never reaches for a page-global alert manager or the
//! browser location. It receives a `Notifier` and a `Navigator` at
//! construction, which keeps it usable headless and in tests.

use std::time::Duration;

use async_trait::async_trait;

/// A modal notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub text: String,
    /// When false, neither outside clicks nor the escape key close it.
    pub dismissible: bool,
    /// The notice proceeds on its own after this delay.
    pub auto_advance: Option<Duration>,
}

/// Presents notices to the user.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Show a blocking notice. Resolves when the user acknowledges it.
    /// Callers bound the wait themselves.
    async fn show_blocking(&self, notice: Notice);

    /// Show an error dialog.
    async fn show_error(&self, title: &str, message: &str);
}

/// Page navigation primitives.
pub trait Navigator: Send + Sync {
    /// Full reload of the current page.
    fn reload(&self);

    /// Navigate replacing the current history entry.
    fn replace(&self, url: &str);

    /// Ordinary navigation that keeps history.
    fn assign(&self, url: &str);
}

/// Headless collaborator that only logs. Blocking notices never get
/// acknowledged, so the caller's timeout decides when to move on.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingUi;

#[async_trait]
impl Notifier for TracingUi {
    async fn show_blocking(&self, notice: Notice) {
        tracing::warn!(title = %notice.title, text = %notice.text, "blocking notice");
        std::future::pending::<()>().await
    }

    async fn show_error(&self, title: &str, message: &str) {
        tracing::error!(title, message, "error notice");
    }
}

impl Navigator for TracingUi {
    fn reload(&self) {
        tracing::info!("reload requested");
    }

    fn replace(&self, url: &str) {
        tracing::info!(url, "replace navigation requested");
    }

    fn assign(&self, url: &str) {
        tracing::info!(url, "navigation requested");
    }
}
