//! Coordinator state: pending requests by id and the in-flight counter.

use std::collections::HashMap;
use tokio::sync::oneshot;

use crate::classify::{classify, BundleError, BundleResponse};
use crate::error::LoadError;
use crate::transport::{RequestId, ResponseHeaders};

use super::FetchedBundle;

pub(super) type Outcome = Result<FetchedBundle, LoadError>;

/// One bundle fetch awaiting its terminal event.
pub(super) struct PendingRequest {
    path: String,
    url: String,
    status: Option<u32>,
    headers: Option<ResponseHeaders>,
    buffer: String,
    respond_to: oneshot::Sender<Outcome>,
}

impl PendingRequest {
    pub(super) fn new(path: &str, url: &str, respond_to: oneshot::Sender<Outcome>) -> Self {
        Self {
            path: path.to_string(),
            url: url.to_string(),
            status: None,
            headers: None,
            buffer: String::new(),
            respond_to,
        }
    }

    pub(super) fn url(&self) -> &str {
        &self.url
    }

    pub(super) fn status(&self) -> Option<u32> {
        self.status
    }

    pub(super) fn headers_received(&self) -> bool {
        self.headers.is_some()
    }

    pub(super) fn record_response(&mut self, status: u32, headers: ResponseHeaders) {
        self.status = Some(status);
        self.headers = Some(headers);
    }

    pub(super) fn append(&mut self, chunk: &str) {
        self.buffer.push_str(chunk);
    }

    /// Turn the finished request into its outcome. `error` is the transport's
    /// completion error, if any.
    pub(super) fn outcome(&mut self, error: Option<String>) -> Outcome {
        if let Some(message) = error {
            return Err(LoadError::network(&self.url, message));
        }
        let content_type = self.headers.as_ref().and_then(ResponseHeaders::content_type);
        let body = std::mem::take(&mut self.buffer);
        match classify(content_type, body) {
            BundleResponse::Bundle(source) => Ok(FetchedBundle {
                url: self.url.clone(),
                source,
            }),
            BundleResponse::BundleError(BundleError::Server(payload)) => {
                let message = payload
                    .message
                    .clone()
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| format!("Unknown error fetching '{}'", self.path));
                Err(LoadError::Server { message, payload })
            }
            BundleResponse::BundleError(BundleError::Malformed(source)) => Err(LoadError::Decode {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Settle the caller's future. A caller that dropped its future is not an
    /// error.
    pub(super) fn respond(self, outcome: Outcome) {
        let _ = self.respond_to.send(outcome);
    }
}

/// Everything the issuing path and the dispatcher share.
#[derive(Default)]
pub(super) struct LoaderState {
    pub(super) pending: HashMap<RequestId, PendingRequest>,
    in_flight: usize,
}

impl LoaderState {
    pub(super) fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Count a request about to be issued. True on the 0 -> 1 transition.
    pub(super) fn begin(&mut self) -> bool {
        self.in_flight += 1;
        self.in_flight == 1
    }

    /// Count a settled request. True on the transition to 0.
    pub(super) fn finish(&mut self) -> bool {
        match self.in_flight {
            0 => {
                tracing::warn!("in-flight counter underflow ignored");
                false
            }
            n => {
                self.in_flight = n - 1;
                self.in_flight == 0
            }
        }
    }
}
