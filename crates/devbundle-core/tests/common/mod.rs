#![allow(dead_code)]

pub mod bundle_server;

use std::sync::atomic::{AtomicUsize, Ordering};

use devbundle_core::indicator::LoadingIndicator;

/// Counts show/hide calls.
#[derive(Default)]
pub struct CountingIndicator {
    shows: AtomicUsize,
    hides: AtomicUsize,
}

impl CountingIndicator {
    pub fn shows(&self) -> usize {
        self.shows.load(Ordering::SeqCst)
    }

    pub fn hides(&self) -> usize {
        self.hides.load(Ordering::SeqCst)
    }
}

impl LoadingIndicator for CountingIndicator {
    fn show_message(&self, _message: &str) {
        self.shows.fetch_add(1, Ordering::SeqCst);
    }

    fn hide(&self) {
        self.hides.fetch_add(1, Ordering::SeqCst);
    }
}
