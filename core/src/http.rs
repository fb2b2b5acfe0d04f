//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The
//! `ApiClient` builds `HttpRequest` values and parses `HttpResponse` values
//! without touching the network; a `Transport` implementation performs the
//! actual exchange. Keeping the exchange behind plain data lets the whole
//! classification path be tested with hand-written responses.

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// One field of a multipart form, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub value: PartValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValue {
    Text(String),
    File {
        filename: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

/// A multipart form payload. The boundary is never chosen here; the
/// transport derives it when encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    pub parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            value: PartValue::Text(value.into()),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            value: PartValue::File {
                filename: filename.into(),
                content_type: content_type.into(),
                bytes,
            },
        });
        self
    }

    /// First text value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|part| match &part.value {
            PartValue::Text(value) if part.name == name => Some(value.as_str()),
            _ => None,
        })
    }
}

/// Caller-facing request body.
///
/// `Empty` means no body is sent at all. An empty JSON object is still a
/// body and goes out as `{}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    Json(Value),
    Multipart(MultipartForm),
}

impl Body {
    /// Serialize any value into a JSON body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(Body::Json)
            .map_err(|e| ApiError::SerializationError(e.to_string()))
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

impl From<MultipartForm> for Body {
    fn from(form: MultipartForm) -> Self {
        Body::Multipart(form)
    }
}

impl From<Option<Value>> for Body {
    fn from(value: Option<Value>) -> Self {
        value.map(Body::Json).unwrap_or(Body::Empty)
    }
}

/// Body as it goes on the wire: JSON is already serialized text.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    None,
    Json(String),
    Multipart(MultipartForm),
}

impl RequestBody {
    pub fn is_none(&self) -> bool {
        matches!(self, RequestBody::None)
    }

    pub fn as_json(&self) -> Option<&str> {
        match self {
            RequestBody::Json(text) => Some(text),
            _ => None,
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `ApiClient::build_request`. A `Transport` executes it and
/// returns the corresponding `HttpResponse`.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the declared content type is JSON. A missing header counts
    /// as not JSON.
    pub fn is_json(&self) -> bool {
        self.content_type()
            .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
            .unwrap_or(false)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(content_type: Option<&str>) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: content_type
                .map(|ct| vec![("Content-Type".to_string(), ct.to_string())])
                .unwrap_or_default(),
            body: String::new(),
        }
    }

    #[test]
    fn header_lookup_ignores_case() {
        let resp = response(Some("application/json"));
        assert_eq!(resp.header("content-type"), Some("application/json"));
        assert_eq!(resp.header("CONTENT-TYPE"), Some("application/json"));
    }

    #[test]
    fn json_detection_accepts_charset_suffix() {
        assert!(response(Some("application/json; charset=utf-8")).is_json());
        assert!(!response(Some("text/html; charset=utf-8")).is_json());
        assert!(!response(None).is_json());
    }

    #[test]
    fn success_range_is_2xx() {
        let mut resp = response(None);
        for (status, ok) in [(199, false), (200, true), (204, true), (299, true), (302, false), (404, false)] {
            resp.status = status;
            assert_eq!(resp.is_success(), ok, "status {status}");
        }
    }

    #[test]
    fn multipart_get_returns_first_text_value() {
        let form = MultipartForm::new()
            .file("foto", "a.png", "image/png", vec![1, 2, 3])
            .text("id", "7")
            .text("id", "8");
        assert_eq!(form.get("id"), Some("7"));
        assert_eq!(form.get("foto"), None);
    }

    #[test]
    fn optional_value_maps_to_empty_body() {
        assert_eq!(Body::from(None::<Value>), Body::Empty);
        assert_eq!(Body::from(Some(json!({}))), Body::Json(json!({})));
    }

    #[test]
    fn body_json_serializes_structs() {
        #[derive(Serialize)]
        struct Estado {
            estado: bool,
        }
        let body = Body::json(&Estado { estado: true }).unwrap();
        assert_eq!(body, Body::Json(json!({"estado": true})));
    }
}
