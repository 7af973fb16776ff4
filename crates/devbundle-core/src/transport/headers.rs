//! Case-insensitive response header map.

use std::collections::HashMap;

/// Response headers keyed by lowercased name. Repeated headers keep the last
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    map: HashMap<String, String>,
}

impl ResponseHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.map
            .insert(name.trim().to_ascii_lowercase(), value.into().trim().to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get("content-type")
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Build from raw header lines. A status line (`HTTP/...`) discards what
    /// came before it so only the final response of a redirect chain is kept.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut headers = Self::new();
        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with("HTTP/") {
                headers.map.clear();
                continue;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers.insert(name, value);
            }
        }
        headers
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for ResponseHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (k, v) in iter {
            headers.insert(k.as_ref(), v);
        }
        headers
    }
}

/// Status code from the last `HTTP/x y ...` line, if any.
pub(crate) fn parse_status_line<S: AsRef<str>>(lines: &[S]) -> Option<u32> {
    lines
        .iter()
        .rev()
        .map(|l| l.as_ref().trim())
        .find(|l| l.starts_with("HTTP/"))
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
}
