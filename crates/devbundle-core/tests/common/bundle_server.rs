//! Minimal HTTP/1.1 dev server stand-in for integration tests.
//!
//! Routes on the request path:
//! - `/Fail...`   -> 500, `application/json`, `{"message":"Error thrown from Metro"}`
//! - `/Broken...` -> 500, `application/json`, non-JSON body
//! - `/Slow...`   -> like any bundle but answers after `SLOW_DELAY`
//! - anything else -> 200, `application/javascript`, `BUNDLE_BODY`

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const BUNDLE_BODY: &str = "\"code\";";
pub const SLOW_DELAY: Duration = Duration::from_millis(300);

/// JSON body served for `/Fail...`.
pub const FAIL_BODY: &str =
    r#"{"type":"InternalError","message":"Error thrown from Metro","errors":[]}"#;

/// Running server: base URL plus the request targets it has seen.
pub struct BundleServer {
    pub base_url: String,
    seen: Arc<Mutex<Vec<String>>>,
}

impl BundleServer {
    /// Request targets (path and query) in arrival order.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

/// Starts a server in a background thread. The server runs until the
/// process exits. `body_override` replaces `BUNDLE_BODY` for bundle routes.
pub fn start(body_override: Option<String>) -> BundleServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_srv = Arc::clone(&seen);
    let body = Arc::new(body_override.unwrap_or_else(|| BUNDLE_BODY.to_string()));
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let seen = Arc::clone(&seen_srv);
            let body = Arc::clone(&body);
            thread::spawn(move || handle(stream, &seen, &body));
        }
    });
    BundleServer {
        base_url: format!("http://127.0.0.1:{}/", port),
        seen,
    }
}

/// A base URL nothing listens on.
pub fn dead_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/", port)
}

fn handle(mut stream: std::net::TcpStream, seen: &Mutex<Vec<String>>, body: &str) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("");
    let target = parts.next().unwrap_or("/").to_string();
    seen.lock().unwrap().push(target.clone());

    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }

    let (status, content_type, payload) = if target.starts_with("/Fail") {
        (
            "500 Internal Server Error",
            "application/json; charset=UTF-8",
            FAIL_BODY.to_string(),
        )
    } else if target.starts_with("/Broken") {
        (
            "500 Internal Server Error",
            "application/json",
            "<html>Internal Server Error</html>".to_string(),
        )
    } else {
        if target.starts_with("/Slow") {
            thread::sleep(SLOW_DELAY);
        }
        ("200 OK", "application/javascript; charset=UTF-8", body.to_string())
    };

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        payload.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(payload.as_bytes());
}
