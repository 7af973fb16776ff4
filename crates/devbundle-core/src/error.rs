//! Error taxonomy for bundle loads.
//!
//! Every failure reaches the caller through the future returned by
//! [`crate::loader::BundleLoader::load_bundle_from_server`]; nothing here is
//! raised synchronously.

use thiserror::Error;

use crate::classify::ServerErrorPayload;

/// Why a bundle could not be loaded from the dev server.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The transport reported a failure (connection refused, timeout, ...) or
    /// the request was dropped before it completed.
    #[error("Network Error: {message}")]
    Network { url: String, message: String },

    /// The dev server answered with a JSON error payload. `message` is the
    /// payload's `message` field verbatim, or a generic fallback.
    #[error("{message}")]
    Server {
        message: String,
        payload: ServerErrorPayload,
    },

    /// JSON content type but the body is not a JSON object.
    #[error("failed to decode error response for '{path}': {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    pub(crate) fn network(url: &str, message: impl Into<String>) -> Self {
        LoadError::Network {
            url: url.to_string(),
            message: message.into(),
        }
    }

    /// True for transport-level failures.
    pub fn is_network(&self) -> bool {
        matches!(self, LoadError::Network { .. })
    }
}
