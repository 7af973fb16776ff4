//! Transport collaborator: request description, the three event classes and
//! the sink a transport reports them through.
//!
//! A transport assigns each request an id and later emits, for that id,
//! an optional `ResponseReceived`, zero or more `DataReceived` and exactly one
//! `ResponseComplete`, in that order.

mod headers;
pub mod libcurl;

pub use headers::ResponseHeaders;
pub use libcurl::CurlTransport;

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;

/// Opaque transport-assigned request identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outbound request. Responses are always delivered as text.
#[derive(Debug, Clone)]
pub struct NetworkRequest {
    pub method: String,
    /// Free-form label for transport-side diagnostics.
    pub tracking_name: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: String,
    /// Deliver body chunks as they arrive instead of once at the end.
    pub incremental_updates: bool,
    /// None = transport default.
    pub timeout: Option<Duration>,
    pub with_credentials: bool,
}

/// Event emitted by a transport for one request.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    ResponseReceived {
        id: RequestId,
        status: u32,
        headers: ResponseHeaders,
    },
    DataReceived {
        id: RequestId,
        chunk: String,
    },
    /// `error` is set when the request failed at the network level.
    ResponseComplete {
        id: RequestId,
        error: Option<String>,
    },
}

impl TransportEvent {
    pub fn request_id(&self) -> RequestId {
        match self {
            TransportEvent::ResponseReceived { id, .. }
            | TransportEvent::DataReceived { id, .. }
            | TransportEvent::ResponseComplete { id, .. } => *id,
        }
    }
}

/// Where a transport reports events. Sending never blocks; events sent after
/// the loader has shut down are dropped.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<TransportEvent>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<TransportEvent>) -> Self {
        Self { tx }
    }

    pub fn send(&self, event: TransportEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("transport event dropped: loader is gone");
        }
    }

    pub fn response_received(&self, id: RequestId, status: u32, headers: ResponseHeaders) {
        self.send(TransportEvent::ResponseReceived {
            id,
            status,
            headers,
        });
    }

    pub fn data_received(&self, id: RequestId, chunk: impl Into<String>) {
        self.send(TransportEvent::DataReceived {
            id,
            chunk: chunk.into(),
        });
    }

    pub fn response_complete(&self, id: RequestId, error: Option<String>) {
        self.send(TransportEvent::ResponseComplete { id, error });
    }
}

/// Event-based network primitive.
///
/// `send_request` must not block and must not deliver events by calling back
/// into the loader; it hands them to `events`. The returned id is the one all
/// of this request's events carry.
pub trait Transport: Send + Sync {
    fn send_request(&self, request: NetworkRequest, events: EventSink) -> RequestId;
}
