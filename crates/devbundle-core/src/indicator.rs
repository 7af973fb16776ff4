//! Loading indicator collaborator.

/// On-screen loading indicator. Both calls are fire-and-forget and must not
/// call back into the loader.
pub trait LoadingIndicator: Send + Sync {
    fn show_message(&self, message: &str);
    fn hide(&self);
}

/// Indicator that only logs; used headless and in tooling.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingIndicator;

impl LoadingIndicator for TracingIndicator {
    fn show_message(&self, message: &str) {
        tracing::info!(text = message, "loading indicator shown");
    }

    fn hide(&self) {
        tracing::info!("loading indicator hidden");
    }
}
