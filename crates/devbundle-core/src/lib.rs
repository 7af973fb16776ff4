//! Development-time bundle loader.
//!
//! Fetches JavaScript bundles from a dev server through an event-based
//! [`transport::Transport`], keeps a [`indicator::LoadingIndicator`] visible
//! while any fetch is pending, and tells bundles apart from structured server
//! errors by content type.

pub mod config;
pub mod logging;

pub mod classify;
pub mod dev_server;
pub mod error;
pub mod indicator;
pub mod loader;
pub mod transport;

pub use error::LoadError;
pub use loader::{BundleLoader, FetchedBundle};
