//! The request adapter: one HTTP exchange plus the session policy.
//!
//! # Design
//! `RequestAdapter` combines the stateless `ApiClient` with a `Transport`
//! and the injected UI collaborators. It is the only place with side
//! effects:
//! - `Unauthorized` (non-JSON 401/403) triggers a full reload;
//! - `SessionTerminated` shows a blocking notice, bounded by the configured
//!   delay, then replaces the current location with the redirect target.
//!
//! Both errors are still returned so the caller's control flow ends. No
//! state is shared between calls: concurrent expiries each navigate, and
//! the last navigation wins.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::ApiClient;
use crate::config::AdapterConfig;
use crate::error::ApiError;
use crate::http::{Body, HttpMethod};
use crate::session::SessionExpiry;
use crate::transport::Transport;
use crate::ui::{Navigator, Notifier};

#[derive(Clone)]
pub struct RequestAdapter {
    client: ApiClient,
    transport: Arc<dyn Transport>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    config: AdapterConfig,
}

impl fmt::Debug for RequestAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestAdapter")
            .field("client", &self.client)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RequestAdapter {
    pub fn new(
        client: ApiClient,
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        config: AdapterConfig,
    ) -> Self {
        Self {
            client,
            transport,
            notifier,
            navigator,
            config,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub async fn get(&self, url: &str) -> Result<Value, ApiError> {
        self.request(url, HttpMethod::Get, Body::Empty).await
    }

    pub async fn post(&self, url: &str, body: impl Into<Body>) -> Result<Value, ApiError> {
        self.request(url, HttpMethod::Post, body.into()).await
    }

    pub async fn put(&self, url: &str, body: impl Into<Body>) -> Result<Value, ApiError> {
        self.request(url, HttpMethod::Put, body.into()).await
    }

    pub async fn delete(&self, url: &str) -> Result<Value, ApiError> {
        self.request(url, HttpMethod::Delete, Body::Empty).await
    }

    /// Perform one exchange and return the unwrapped payload.
    pub async fn request(&self, url: &str, method: HttpMethod, body: Body) -> Result<Value, ApiError> {
        let result = self.exchange(url, method, body).await;
        if let Err(err) = &result {
            self.handle_failure(url, method, err).await;
        }
        result
    }

    /// `request` followed by deserialization into `T`.
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        url: &str,
        method: HttpMethod,
        body: Body,
    ) -> Result<T, ApiError> {
        let value = self.request(url, method, body).await?;
        serde_json::from_value(value).map_err(|e| ApiError::DeserializationError(e.to_string()))
    }

    async fn exchange(&self, url: &str, method: HttpMethod, body: Body) -> Result<Value, ApiError> {
        let request = self.client.build_request(method, url, body)?;
        tracing::debug!(method = method.as_str(), url = %request.url, "sending request");
        let response = self.transport.execute(request).await?;
        tracing::debug!(status = response.status, "received response");
        self.client.parse_response(response)
    }

    async fn handle_failure(&self, url: &str, method: HttpMethod, err: &ApiError) {
        match err {
            ApiError::SessionTerminated { redirect_url } => {
                tracing::info!(url, redirect_url = %redirect_url, "session time budget exhausted");
                let expiry = SessionExpiry {
                    redirect_url: redirect_url.clone(),
                };
                let delay = self.config.notice_delay();
                let notice = expiry.notice(delay);
                if tokio::time::timeout(delay, self.notifier.show_blocking(notice))
                    .await
                    .is_err()
                {
                    tracing::debug!("session notice auto-advanced");
                }
                self.navigator.replace(&expiry.redirect_url);
            }
            ApiError::Unauthorized { status } => {
                tracing::warn!(url, status, "unauthorized, reloading page");
                self.navigator.reload();
            }
            other => {
                tracing::error!(method = method.as_str(), url, error = %other, "API error");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpRequest, HttpResponse, MultipartForm};
    use crate::token::StaticTokenProvider;
    use crate::ui::Notice;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    struct CannedTransport {
        response: HttpResponse,
        seen: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.lock().unwrap().push(request);
            Ok(self.response.clone())
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl Transport for FailingTransport {
        async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, ApiError> {
            Err(ApiError::transport(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )))
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum UiEvent {
        Notice(Notice),
        Error(String, String),
        Reload,
        Replace(String),
        Assign(String),
    }

    #[derive(Default)]
    struct RecordingUi {
        events: Mutex<Vec<UiEvent>>,
        acknowledge: bool,
    }

    impl RecordingUi {
        fn events(&self) -> Vec<UiEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingUi {
        async fn show_blocking(&self, notice: Notice) {
            self.events.lock().unwrap().push(UiEvent::Notice(notice));
            if !self.acknowledge {
                std::future::pending::<()>().await
            }
        }

        async fn show_error(&self, title: &str, message: &str) {
            self.events.lock().unwrap().push(UiEvent::Error(title.to_string(), message.to_string()));
        }
    }

    impl Navigator for RecordingUi {
        fn reload(&self) {
            self.events.lock().unwrap().push(UiEvent::Reload);
        }

        fn replace(&self, url: &str) {
            self.events.lock().unwrap().push(UiEvent::Replace(url.to_string()));
        }

        fn assign(&self, url: &str) {
            self.events.lock().unwrap().push(UiEvent::Assign(url.to_string()));
        }
    }

    fn adapter_with(
        status: u16,
        content_type: &str,
        body: &str,
        ui: Arc<RecordingUi>,
    ) -> (RequestAdapter, Arc<CannedTransport>) {
        let transport = Arc::new(CannedTransport {
            response: HttpResponse {
                status,
                headers: vec![("content-type".to_string(), content_type.to_string())],
                body: body.to_string(),
            },
            seen: Mutex::new(Vec::new()),
        });
        let client = ApiClient::new("", Arc::new(StaticTokenProvider(Some("tok".to_string()))));
        let adapter = RequestAdapter::new(
            client,
            transport.clone(),
            ui.clone(),
            ui,
            AdapterConfig::default(),
        );
        (adapter, transport)
    }

    const SENTINEL: &str = r#"{"success":false,"message":"TIEMPO_AGOTADO","payload":{"redirect_url":"/x"},"timestamp":"2024-05-01T10:00:00"}"#;

    #[tokio::test(start_paused = true)]
    async fn session_expiry_notifies_then_replaces_location() {
        let ui = Arc::new(RecordingUi::default());
        let (adapter, _) = adapter_with(403, "application/json", SENTINEL, ui.clone());

        let err = adapter.post("/actividades/api/iniciar/", json!({})).await.unwrap_err();
        assert!(err.is_session_terminated());
        assert_eq!(err.to_string(), "session terminated by server");

        let events = ui.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], UiEvent::Notice(n) if !n.dismissible));
        assert_eq!(events[1], UiEvent::Replace("/x".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn session_expiry_waits_for_auto_advance() {
        let ui = Arc::new(RecordingUi::default());
        let (adapter, _) = adapter_with(403, "application/json", SENTINEL, ui.clone());

        let started = tokio::time::Instant::now();
        adapter.get("/any/").await.unwrap_err();
        assert!(started.elapsed() >= Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn headless_ui_relies_on_auto_advance() {
        let transport = Arc::new(CannedTransport {
            response: HttpResponse {
                status: 403,
                headers: vec![("Content-Type".to_string(), "application/json".to_string())],
                body: SENTINEL.to_string(),
            },
            seen: Mutex::new(Vec::new()),
        });
        let config = AdapterConfig {
            notice_delay_ms: 1_000,
            ..AdapterConfig::default()
        };
        let client = ApiClient::from_config(&config, Arc::new(StaticTokenProvider(None)));
        let adapter = RequestAdapter::new(
            client,
            transport,
            Arc::new(crate::ui::TracingUi),
            Arc::new(crate::ui::TracingUi),
            config,
        );

        let started = tokio::time::Instant::now();
        let err = adapter.get("/x/").await.unwrap_err();
        assert!(err.is_session_terminated());
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn acknowledged_notice_navigates_immediately() {
        let ui = Arc::new(RecordingUi {
            acknowledge: true,
            ..Default::default()
        });
        let (adapter, _) = adapter_with(403, "application/json", r#"{"message":"TIEMPO_AGOTADO"}"#, ui.clone());

        let err = adapter.delete("/x/1/").await.unwrap_err();
        assert!(err.is_session_terminated());
        assert_eq!(ui.events().last(), Some(&UiEvent::Replace("/".to_string())));
    }

    #[tokio::test]
    async fn non_json_401_reloads() {
        let ui = Arc::new(RecordingUi::default());
        let (adapter, _) = adapter_with(401, "text/html", "<html>login</html>", ui.clone());

        let err = adapter.get("/api/").await.unwrap_err();
        assert_eq!(err.to_string(), "session expired or unauthorized");
        assert_eq!(ui.events(), vec![UiEvent::Reload]);
    }

    #[tokio::test]
    async fn business_error_has_no_ui_side_effect() {
        let ui = Arc::new(RecordingUi::default());
        let (adapter, _) = adapter_with(
            400,
            "application/json",
            r#"{"success":false,"message":"Empresa inactiva","payload":null}"#,
            ui.clone(),
        );

        let err = adapter.put("/empresas/1/", json!({"estado": false})).await.unwrap_err();
        assert_eq!(err.to_string(), "Empresa inactiva");
        assert!(ui.events().is_empty());
    }

    #[tokio::test]
    async fn transport_error_propagates() {
        let ui = Arc::new(RecordingUi::default());
        let client = ApiClient::new("", Arc::new(StaticTokenProvider(None)));
        let adapter = RequestAdapter::new(
            client,
            Arc::new(FailingTransport),
            ui.clone(),
            ui.clone(),
            AdapterConfig::default(),
        );
        let err = adapter.get("/x/").await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert!(ui.events().is_empty());
    }

    #[tokio::test]
    async fn sends_built_request_through_transport() {
        let ui = Arc::new(RecordingUi::default());
        let (adapter, transport) = adapter_with(
            200,
            "application/json",
            r#"{"success":true,"payload":{"id":9}}"#,
            ui,
        );

        let form = MultipartForm::new().text("titulo", "Corte");
        let value = adapter.post("/iniciar/", form).await.unwrap();
        assert_eq!(value, json!({"id": 9}));

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, HttpMethod::Post);
        assert_eq!(seen[0].header("content-type"), None);
        assert_eq!(seen[0].header("x-csrftoken"), Some("tok"));
    }

    #[tokio::test]
    async fn request_as_deserializes_payload() {
        #[derive(serde::Deserialize)]
        struct Item {
            id: u32,
            nombre: String,
        }

        let ui = Arc::new(RecordingUi::default());
        let (adapter, _) = adapter_with(
            200,
            "application/json",
            r#"{"status":true,"data":{"id":3,"nombre":"Taladro"}}"#,
            ui,
        );
        let item: Item = adapter.request_as("/inventario/3/", HttpMethod::Get, Body::Empty).await.unwrap();
        assert_eq!(item.id, 3);
        assert_eq!(item.nombre, "Taladro");
    }
}
