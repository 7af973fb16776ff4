//! Dev server base URL lookup and bundle URL construction.

use anyhow::{Context, Result};

use crate::config::LoaderConfig;

/// Source of the dev server's base URL.
///
/// The returned URL ends with a `/`.
pub trait DevServerInfo: Send + Sync {
    fn url(&self) -> String;
}

/// Fixed base URL (from config or the command line).
#[derive(Debug, Clone)]
pub struct StaticDevServer {
    url: String,
}

impl StaticDevServer {
    /// Accepts any base, with or without scheme (e.g. `localhost:8081`).
    pub fn new(url: impl Into<String>) -> Self {
        let mut url = url.into();
        if !url.ends_with('/') {
            url.push('/');
        }
        Self { url }
    }

    /// Like `new` but requires an absolute http(s) URL.
    pub fn parse(url: &str) -> Result<Self> {
        let parsed =
            url::Url::parse(url).with_context(|| format!("invalid dev server URL: {}", url))?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => anyhow::bail!("unsupported dev server scheme '{}' in {}", other, url),
        }
        if parsed.host_str().is_none() {
            anyhow::bail!("dev server URL has no host: {}", url);
        }
        Ok(Self::new(parsed.as_str()))
    }

    /// The `dev_server_url` from config, validated like `parse`.
    pub fn from_config(config: &LoaderConfig) -> Result<Self> {
        let url = config
            .dev_server_url
            .as_deref()
            .context("dev_server_url is not set in config")?;
        Self::parse(url)
    }
}

impl DevServerInfo for StaticDevServer {
    fn url(&self) -> String {
        self.url.clone()
    }
}

/// Join base and path-and-query with exactly one `/` between them.
pub fn join_bundle_url(base: &str, bundle_path_and_query: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        bundle_path_and_query.trim_start_matches('/')
    )
}
