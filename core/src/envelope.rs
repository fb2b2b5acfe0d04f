//! Tagged-union decoding of the backend's response envelopes.
//!
//! # Design
//! The backend answered with several envelope shapes over time. Each shape
//! has a named decoder; `Envelope::decode` runs them in a fixed priority
//! order and the first one that accepts the body wins. Some bodies carry
//! keys of more than one shape (`success`, `payload` and `data` together),
//! so the order is part of the contract.
//!
//! | Shape           | Keys                  | Value returned |
//! |-----------------|-----------------------|----------------|
//! | `Standard`      | `success` + `payload` | `payload`      |
//! | `LegacyStatus`  | `status` + `data`     | `data`         |
//! | `LegacyData`    | `success` + `data`    | `data`         |
//! | `Raw`           | anything else         | whole body     |

use serde_json::{Map, Value};

use crate::error::ApiError;

/// Conventional error-message fields, in lookup order.
pub const ERROR_MESSAGE_FIELDS: [&str; 4] = ["error", "message", "detail", "mensaje"];

/// Message used when a failure carries no usable text.
pub const FALLBACK_ERROR_MESSAGE: &str = "operation failed";

/// A classified response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// `{success, message, payload, timestamp}` as produced by `api_response`.
    Standard {
        success: bool,
        payload: Value,
        message: Option<String>,
        timestamp: Option<String>,
        body: Map<String, Value>,
    },
    /// `{status, data, mensaje | message}`.
    LegacyStatus {
        status: bool,
        data: Value,
        body: Map<String, Value>,
    },
    /// `{success, data, message}`.
    LegacyData {
        success: bool,
        data: Value,
        body: Map<String, Value>,
    },
    /// None of the above.
    Raw(Value),
}

type Decoder = fn(&Map<String, Value>) -> Option<Envelope>;

const DECODERS: [(&str, Decoder); 3] = [
    ("standard", decode_standard),
    ("legacy-status", decode_legacy_status),
    ("legacy-data", decode_legacy_data),
];

impl Envelope {
    /// Classify a parsed body. Never fails: unknown shapes become `Raw`.
    pub fn decode(value: Value) -> Self {
        let Value::Object(body) = value else {
            return Envelope::Raw(value);
        };
        for (name, decoder) in DECODERS {
            if let Some(envelope) = decoder(&body) {
                tracing::trace!(shape = name, "classified response envelope");
                return envelope;
            }
        }
        Envelope::Raw(Value::Object(body))
    }

    pub fn shape(&self) -> &'static str {
        match self {
            Envelope::Standard { .. } => "standard",
            Envelope::LegacyStatus { .. } => "legacy-status",
            Envelope::LegacyData { .. } => "legacy-data",
            Envelope::Raw(_) => "raw",
        }
    }

    /// Unwrap the envelope into the caller's value or a business error.
    ///
    /// Recognized shapes decide success from their own flag; only `Raw`
    /// bodies look at the HTTP status.
    pub fn into_result(self, status: u16) -> Result<Value, ApiError> {
        match self {
            Envelope::Standard {
                success: true,
                payload,
                ..
            } => Ok(payload),
            Envelope::Standard { body, .. } => Err(business(status, &body, &["message"])),
            Envelope::LegacyStatus {
                status: true, data, ..
            } => Ok(data),
            Envelope::LegacyStatus { body, .. } => {
                Err(business(status, &body, &["mensaje", "message"]))
            }
            Envelope::LegacyData {
                success: true, data, ..
            } => Ok(data),
            Envelope::LegacyData { body, .. } => Err(business(status, &body, &["message"])),
            Envelope::Raw(value) if (200..300).contains(&status) => Ok(value),
            Envelope::Raw(Value::Object(body)) => Err(business(status, &body, &[])),
            Envelope::Raw(_) => Err(ApiError::Business {
                status,
                message: FALLBACK_ERROR_MESSAGE.to_string(),
            }),
        }
    }
}

fn decode_standard(body: &Map<String, Value>) -> Option<Envelope> {
    if !(body.contains_key("success") && body.contains_key("payload")) {
        return None;
    }
    Some(Envelope::Standard {
        success: body.get("success") == Some(&Value::Bool(true)),
        payload: body.get("payload").cloned().unwrap_or(Value::Null),
        message: body.get("message").and_then(Value::as_str).map(str::to_string),
        timestamp: body.get("timestamp").and_then(Value::as_str).map(str::to_string),
        body: body.clone(),
    })
}

fn decode_legacy_status(body: &Map<String, Value>) -> Option<Envelope> {
    if !(body.contains_key("status") && body.contains_key("data")) {
        return None;
    }
    Some(Envelope::LegacyStatus {
        status: body.get("status").map(is_truthy).unwrap_or(false),
        data: body.get("data").cloned().unwrap_or(Value::Null),
        body: body.clone(),
    })
}

fn decode_legacy_data(body: &Map<String, Value>) -> Option<Envelope> {
    if !(body.contains_key("success") && body.contains_key("data")) {
        return None;
    }
    Some(Envelope::LegacyData {
        success: body.get("success") == Some(&Value::Bool(true)),
        data: body.get("data").cloned().unwrap_or(Value::Null),
        body: body.clone(),
    })
}

/// Loose truthiness used by the legacy `status` flag.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Pick the first non-empty string among `preferred`, then the conventional
/// fields, then the fixed fallback.
pub fn error_message(body: &Map<String, Value>, preferred: &[&str]) -> String {
    preferred
        .iter()
        .chain(ERROR_MESSAGE_FIELDS.iter())
        .find_map(|field| {
            body.get(*field)
                .and_then(Value::as_str)
                .filter(|text| !text.is_empty())
        })
        .unwrap_or(FALLBACK_ERROR_MESSAGE)
        .to_string()
}

fn business(status: u16, body: &Map<String, Value>, preferred: &[&str]) -> ApiError {
    ApiError::Business {
        status,
        message: error_message(body, preferred),
    }
}
