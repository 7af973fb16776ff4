//! Bundle fetch coordinator.
//!
//! `load_bundle_from_server` builds the bundle URL, counts the request in
//! flight (showing the loading indicator on the first one), issues a GET
//! through the [`Transport`] and registers a pending entry under the
//! transport's request id. A dispatch task consumes transport events, looks
//! the entry up by id, and on completion classifies the response, settles
//! the caller's future, and uncounts the request (hiding the indicator on
//! the last one).
//!
//! Invariant: the in-flight count is non-zero exactly while the indicator is
//! in the shown state this loader last requested.

mod state;

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, oneshot};

use crate::config::LoaderConfig;
use crate::dev_server::{join_bundle_url, DevServerInfo, StaticDevServer};
use crate::error::LoadError;
use crate::indicator::LoadingIndicator;
use crate::transport::{EventSink, NetworkRequest, Transport, TransportEvent};

use state::{LoaderState, PendingRequest};

/// Source text of a successfully fetched bundle. Executing it is up to the
/// caller; `url` is the natural source URL for evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBundle {
    pub url: String,
    pub source: String,
}

struct Shared {
    state: Mutex<LoaderState>,
    indicator: Arc<dyn LoadingIndicator>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, LoaderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(&self, event: TransportEvent) {
        let mut state = self.lock();
        match event {
            TransportEvent::ResponseReceived {
                id,
                status,
                headers,
            } => match state.pending.get_mut(&id) {
                Some(pending) => pending.record_response(status, headers),
                None => tracing::trace!(request_id = %id, "response for unknown request ignored"),
            },
            TransportEvent::DataReceived { id, chunk } => match state.pending.get_mut(&id) {
                Some(pending) => pending.append(&chunk),
                None => tracing::trace!(request_id = %id, "data for unknown request ignored"),
            },
            TransportEvent::ResponseComplete { id, error } => {
                let Some(mut pending) = state.pending.remove(&id) else {
                    tracing::trace!(request_id = %id, "completion for unknown request ignored");
                    return;
                };
                if !pending.headers_received() && error.is_none() {
                    tracing::debug!(request_id = %id, "completed without response headers");
                }
                let outcome = pending.outcome(error);
                match &outcome {
                    Ok(bundle) => tracing::debug!(
                        request_id = %id,
                        url = %bundle.url,
                        status = ?pending.status(),
                        bytes = bundle.source.len(),
                        "bundle fetched"
                    ),
                    Err(e) => tracing::warn!(
                        request_id = %id,
                        url = %pending.url(),
                        status = ?pending.status(),
                        "bundle load failed: {}",
                        e
                    ),
                }
                pending.respond(outcome);
                if state.finish() {
                    self.indicator.hide();
                }
            }
        }
    }
}

async fn dispatch_loop(shared: Arc<Shared>, mut events: mpsc::UnboundedReceiver<TransportEvent>) {
    while let Some(event) = events.recv().await {
        shared.dispatch(event);
    }
    tracing::debug!("transport event stream closed");
}

/// Fetches bundles from the dev server and drives the loading indicator.
pub struct BundleLoader {
    config: LoaderConfig,
    server: Arc<dyn DevServerInfo>,
    transport: Arc<dyn Transport>,
    shared: Arc<Shared>,
    events: EventSink,
}

impl BundleLoader {
    /// Build a loader and start its event dispatch task on the current Tokio
    /// runtime (panics outside of one).
    pub fn spawn(
        config: LoaderConfig,
        server: Arc<dyn DevServerInfo>,
        transport: Arc<dyn Transport>,
        indicator: Arc<dyn LoadingIndicator>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            state: Mutex::new(LoaderState::default()),
            indicator,
        });
        tokio::spawn(dispatch_loop(Arc::clone(&shared), rx));
        Self {
            config,
            server,
            transport,
            shared,
            events: EventSink::new(tx),
        }
    }

    /// Like `spawn`, with the dev server taken from `config.dev_server_url`.
    pub fn from_config(
        config: LoaderConfig,
        transport: Arc<dyn Transport>,
        indicator: Arc<dyn LoadingIndicator>,
    ) -> anyhow::Result<Self> {
        let server = StaticDevServer::from_config(&config)?;
        Ok(Self::spawn(config, Arc::new(server), transport, indicator))
    }

    /// The URL a load of `bundle_path_and_query` requests.
    pub fn bundle_url(&self, bundle_path_and_query: &str) -> String {
        join_bundle_url(&self.server.url(), bundle_path_and_query)
    }

    /// Requests issued and not yet settled.
    pub fn in_flight(&self) -> usize {
        self.shared.lock().in_flight()
    }

    /// Fetch `bundle_path_and_query` (e.g. `/Banana.bundle?platform=ios&dev=true`)
    /// from the dev server.
    ///
    /// The request is issued and the indicator updated before this returns;
    /// the future only waits for the outcome. Every call issues its own
    /// request, there is no deduplication. Dropping the future does not
    /// cancel the request.
    pub fn load_bundle_from_server(
        &self,
        bundle_path_and_query: &str,
    ) -> impl Future<Output = Result<FetchedBundle, LoadError>> + Send + 'static {
        let url = self.bundle_url(bundle_path_and_query);
        let request = NetworkRequest {
            method: "GET".to_string(),
            tracking_name: self.config.tracking_name.clone(),
            url: url.clone(),
            headers: self.config.default_headers.clone(),
            body: String::new(),
            incremental_updates: false,
            timeout: self.config.timeout(),
            with_credentials: self.config.with_credentials,
        };
        let (tx, rx) = oneshot::channel();

        {
            // Held across send_request so no event for the new id can be
            // dispatched before its entry exists.
            let mut state = self.shared.lock();
            if state.begin() {
                self.shared.indicator.show_message(&self.config.loading_message);
            }
            let id = self.transport.send_request(request, self.events.clone());
            tracing::debug!(
                request_id = %id,
                url = %url,
                in_flight = state.in_flight(),
                "bundle request issued"
            );
            let pending = PendingRequest::new(bundle_path_and_query, &url, tx);
            if let Some(stale) = state.pending.insert(id, pending) {
                tracing::warn!(request_id = %id, "transport reused a pending request id");
                let outcome = Err(LoadError::network(
                    stale.url(),
                    "request id reused by transport",
                ));
                stale.respond(outcome);
                if state.finish() {
                    self.shared.indicator.hide();
                }
            }
        }

        async move {
            match rx.await {
                Ok(outcome) => outcome,
                Err(_) => Err(LoadError::network(&url, "request dropped before completion")),
            }
        }
    }
}
