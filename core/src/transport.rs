//! Network execution of `HttpRequest` values.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, PartValue, RequestBody};

/// Executes one HTTP exchange.
///
/// Implementations return 4xx/5xx responses as data; only failures before a
/// response arrives are errors, reported as `ApiError::Transport`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// `reqwest`-backed transport. No request timeout is configured: a hung
/// request blocks its caller until the connection gives up.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        builder = match request.body {
            RequestBody::None => builder,
            RequestBody::Json(text) => builder.body(text),
            RequestBody::Multipart(form) => {
                let mut multipart = reqwest::multipart::Form::new();
                for part in form.parts {
                    multipart = match part.value {
                        PartValue::Text(value) => multipart.text(part.name, value),
                        PartValue::File {
                            filename,
                            content_type,
                            bytes,
                        } => {
                            let file = reqwest::multipart::Part::bytes(bytes)
                                .file_name(filename)
                                .mime_str(&content_type)
                                .map_err(ApiError::transport)?;
                            multipart.part(part.name, file)
                        }
                    };
                }
                builder.multipart(multipart)
            }
        };

        let response = builder.send().await.map_err(ApiError::transport)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(ApiError::transport)?;

        Ok(HttpResponse { status, headers, body })
    }
}
