//! Transport backed by libcurl (via the `curl` crate).
//!
//! Each request runs a blocking `Easy` transfer on Tokio's blocking pool and
//! reports progress through the request's [`EventSink`].

use anyhow::{Context, Result};
use std::cell::RefCell;
use std::str;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;

use super::headers::parse_status_line;
use super::{EventSink, NetworkRequest, RequestId, ResponseHeaders, Transport};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// libcurl transport. Request ids start at 1 and are unique per instance.
#[derive(Debug)]
pub struct CurlTransport {
    next_id: AtomicU64,
    runtime: Handle,
}

impl CurlTransport {
    /// Uses the current Tokio runtime; panics outside of one.
    pub fn new() -> Self {
        Self::with_handle(Handle::current())
    }

    pub fn with_handle(runtime: Handle) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            runtime,
        }
    }
}

impl Transport for CurlTransport {
    fn send_request(&self, request: NetworkRequest, events: EventSink) -> RequestId {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(
            request_id = %id,
            tracking_name = %request.tracking_name,
            method = %request.method,
            url = %request.url,
            "curl request queued"
        );
        self.runtime.spawn_blocking(move || {
            let error = match perform(id, &request, &events) {
                Ok(()) => None,
                Err(e) => {
                    tracing::debug!(request_id = %id, "curl request failed: {:#}", e);
                    Some(format!("{:#}", e))
                }
            };
            events.response_complete(id, error);
        });
        id
    }
}

/// Per-transfer state shared between libcurl's header and write callbacks.
struct TransferState<'a> {
    id: RequestId,
    events: &'a EventSink,
    incremental: bool,
    header_lines: Vec<String>,
    headers_sent: bool,
    body: Vec<u8>,
}

impl TransferState<'_> {
    /// Emit `ResponseReceived` once, before any body chunk.
    fn flush_headers(&mut self) {
        if self.headers_sent {
            return;
        }
        self.headers_sent = true;
        let status = parse_status_line(&self.header_lines).unwrap_or(0);
        let headers = ResponseHeaders::from_lines(&self.header_lines);
        self.events.response_received(self.id, status, headers);
    }

    fn on_data(&mut self, data: &[u8]) {
        self.flush_headers();
        self.body.extend_from_slice(data);
        if self.incremental {
            let chunk = take_utf8(&mut self.body);
            if !chunk.is_empty() {
                self.events.data_received(self.id, chunk);
            }
        }
    }

    fn finish(mut self) {
        self.flush_headers();
        if !self.body.is_empty() {
            let rest = String::from_utf8_lossy(&self.body).into_owned();
            self.events.data_received(self.id, rest);
        }
    }
}

/// Drain the longest valid UTF-8 prefix of `buf`, leaving an incomplete
/// trailing sequence for the next chunk. Invalid bytes are replaced.
fn take_utf8(buf: &mut Vec<u8>) -> String {
    match str::from_utf8(buf) {
        Ok(s) => {
            let out = s.to_string();
            buf.clear();
            out
        }
        Err(e) if e.error_len().is_none() => {
            let valid = e.valid_up_to();
            let rest = buf.split_off(valid);
            let out = String::from_utf8_lossy(buf).into_owned();
            *buf = rest;
            out
        }
        Err(_) => {
            let out = String::from_utf8_lossy(buf).into_owned();
            buf.clear();
            out
        }
    }
}

fn perform(id: RequestId, request: &NetworkRequest, events: &EventSink) -> Result<()> {
    let mut easy = curl::easy::Easy::new();
    easy.url(&request.url).context("invalid URL")?;

    let method = request.method.to_ascii_uppercase();
    if !request.body.is_empty() {
        easy.post_fields_copy(request.body.as_bytes())?;
    }
    match method.as_str() {
        "GET" if request.body.is_empty() => easy.get(true)?,
        "HEAD" => easy.nobody(true)?,
        "POST" => easy.post(true)?,
        other => easy.custom_request(other)?,
    }

    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(CONNECT_TIMEOUT)?;
    if let Some(timeout) = request.timeout {
        easy.timeout(timeout)?;
    }
    if request.with_credentials {
        // Empty path enables the in-memory cookie engine.
        easy.cookie_file("")?;
    }

    let mut list = curl::easy::List::new();
    for (k, v) in &request.headers {
        list.append(&format!("{}: {}", k.trim(), v.trim()))?;
    }
    if !request.headers.is_empty() {
        easy.http_headers(list)?;
    }

    let state = RefCell::new(TransferState {
        id,
        events,
        incremental: request.incremental_updates,
        header_lines: Vec::new(),
        headers_sent: false,
        body: Vec::new(),
    });

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                let line = s.trim_end();
                if !line.is_empty() {
                    state.borrow_mut().header_lines.push(line.to_string());
                }
            }
            true
        })?;
        transfer.write_function(|data| {
            state.borrow_mut().on_data(data);
            Ok(data.len())
        })?;
        transfer
            .perform()
            .with_context(|| format!("{} {} failed", method, request.url))?;
    }

    state.into_inner().finish();
    Ok(())
}
