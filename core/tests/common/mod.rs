//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use zonas_core::{ApiError, HttpRequest, HttpResponse, Navigator, Notice, Notifier, Transport};

/// Everything the UI collaborators were asked to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Notice(Notice),
    Error { title: String, message: String },
    Reload,
    Replace(String),
    Assign(String),
}

/// Notifier and navigator that only record. Blocking notices are never
/// acknowledged unless `acknowledge` is set.
#[derive(Debug, Default)]
pub struct RecordingUi {
    pub events: Mutex<Vec<UiEvent>>,
    pub acknowledge: bool,
}

impl RecordingUi {
    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl Notifier for RecordingUi {
    async fn show_blocking(&self, notice: Notice) {
        self.push(UiEvent::Notice(notice));
        if !self.acknowledge {
            std::future::pending::<()>().await
        }
    }

    async fn show_error(&self, title: &str, message: &str) {
        self.push(UiEvent::Error {
            title: title.to_string(),
            message: message.to_string(),
        });
    }
}

impl Navigator for RecordingUi {
    fn reload(&self) {
        self.push(UiEvent::Reload);
    }

    fn replace(&self, url: &str) {
        self.push(UiEvent::Replace(url.to_string()));
    }

    fn assign(&self, url: &str) {
        self.push(UiEvent::Assign(url.to_string()));
    }
}

/// Answers every request with the same response and keeps what it saw.
#[derive(Debug)]
pub struct CannedTransport {
    pub response: HttpResponse,
    pub seen: Mutex<Vec<HttpRequest>>,
}

impl CannedTransport {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            response: HttpResponse {
                status,
                headers: vec![("content-type".to_string(), "application/json".to_string())],
                body: body.to_string(),
            },
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for CannedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.seen.lock().unwrap().push(request);
        Ok(self.response.clone())
    }
}
