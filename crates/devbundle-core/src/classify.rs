//! Classify a completed dev server response as a bundle or a structured error.
//!
//! The decision is made from the content type alone; the body is only parsed
//! once the response is known to be JSON.

use serde::Serialize;
use serde_json::{Map, Value};

/// Error payload the dev server sends with a JSON content type.
///
/// Only a string `message` is relied upon. Metro also sends `type`, `errors`
/// and assorted diagnostic keys whose shape varies; they are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServerErrorPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServerErrorPayload {
    /// Split a decoded JSON object into the known keys and the rest. A
    /// `message` that is not a string stays in `extra`.
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        let message = match map.remove("message") {
            Some(Value::String(s)) => Some(s),
            Some(other) => {
                map.insert("message".to_string(), other);
                None
            }
            None => None,
        };
        Self {
            message,
            kind: map.remove("type"),
            errors: map.remove("errors"),
            extra: map,
        }
    }

    /// `type` when the server sent it as a string.
    pub fn kind_str(&self) -> Option<&str> {
        self.kind.as_ref().and_then(Value::as_str)
    }
}

/// Why a response is not a bundle.
#[derive(Debug)]
pub enum BundleError {
    /// Decoded JSON error payload.
    Server(ServerErrorPayload),
    /// JSON content type, body not a JSON object.
    Malformed(serde_json::Error),
}

/// Outcome of classifying a completed response.
#[derive(Debug)]
pub enum BundleResponse {
    Bundle(String),
    BundleError(BundleError),
}

/// True when the content type names JSON, parameters (`; charset=...`) allowed.
pub fn is_json_content_type(content_type: &str) -> bool {
    content_type
        .to_ascii_lowercase()
        .contains("application/json")
}

/// Classify a response body by its content type.
///
/// A missing content type is treated as a bundle. Bundle text is never
/// validated here.
pub fn classify(content_type: Option<&str>, body: String) -> BundleResponse {
    match content_type {
        Some(ct) if is_json_content_type(ct) => {
            match serde_json::from_str::<Map<String, Value>>(&body) {
                Ok(map) => BundleResponse::BundleError(BundleError::Server(
                    ServerErrorPayload::from_map(map),
                )),
                Err(e) => BundleResponse::BundleError(BundleError::Malformed(e)),
            }
        }
        _ => BundleResponse::Bundle(body),
    }
}
