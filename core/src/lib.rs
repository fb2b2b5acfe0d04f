//! Shared HTTP request adapter for the zone access-control web client.
//!
//! # Overview
//! Every page controller talks to the backend through `RequestAdapter`. It
//! attaches the anti-forgery and programmatic-call headers, serializes the
//! body (JSON or multipart), normalizes the backend's envelope shapes into a
//! single payload and intercepts the server-enforced session expiry.
//!
//! # Design
//! - `ApiClient` is stateless: `build_request` produces an `HttpRequest`,
//!   `parse_response` consumes an `HttpResponse`. No I/O, no UI.
//! - `Transport`, `Notifier`, `Navigator` and `TokenProvider` are injected,
//!   so the adapter runs headless and in tests.
//! - Envelope classification is an explicit ordered decode (`Envelope`).
//! - `SessionCountdown` mirrors the server's time budget on the client.

pub mod adapter;
pub mod client;
pub mod config;
pub mod countdown;
pub mod envelope;
pub mod error;
pub mod http;
pub mod session;
pub mod token;
pub mod transport;
pub mod ui;

pub use adapter::RequestAdapter;
pub use client::ApiClient;
pub use config::AdapterConfig;
pub use countdown::SessionCountdown;
pub use envelope::Envelope;
pub use error::ApiError;
pub use http::{Body, HttpMethod, HttpRequest, HttpResponse, MultipartForm, RequestBody};
pub use session::{SessionExpiry, SESSION_EXPIRED_SENTINEL, SESSION_TERMINATED_MESSAGE};
pub use token::{CookieTokenProvider, StaticTokenProvider, TokenProvider};
pub use transport::{ReqwestTransport, Transport};
pub use ui::{Navigator, Notice, Notifier, TracingUi};
